//! The polled half of the sniffer's serial link.
//!
//! [`SerialLink`] drains the UART ring, reassembles host messages and acts on
//! them: ACK and NACK move the [`SendWindow`], RESET and STOP drive the radio,
//! the LEDs and the transmit path through the [`hal`](crate::hal) traits.
//!
//! Every failure is recovered from the same way: the transmit cursor goes back
//! to the last acknowledged packet. Window faults additionally light the orange
//! LED.

use crate::buffer::PacketBuffer;
use crate::error::LinkError;
use crate::frame::Framer;
use crate::hal::{Indicator, Indicators, Radio, Transmitter};
use crate::message::{Channel, Message};
use crate::ring::RxConsumer;
use crate::window::{OutboundPacket, SendWindow};

/// Counters kept by the [`SerialLink`].
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames that decoded to a message.
    pub frames_ok: u32,
    /// Bytes or frames the framer rejected.
    pub frames_bad: u32,
    /// ACK/NACK messages that did not fit the window.
    pub window_faults: u32,
    /// Times the transmit cursor was sent back to the acknowledged index.
    pub resends: u32,
}

/// Host link state machine.
///
/// # Type Parameters
/// - `RADIO`: the radio, see [`Radio`]
/// - `LEDS`: the status LEDs, see [`Indicators`]
/// - `TX`: the transmit path, see [`Transmitter`]
/// - `N`: capacity of the shared [`PacketBuffer`]
///
/// ## Example
///
/// ```rust,ignore
/// use sniffer_link::buffer::PacketBuffer;
/// use sniffer_link::link::SerialLink;
///
/// static PACKETS: PacketBuffer<1024> = PacketBuffer::new();
///
/// let mut link = SerialLink::new(&PACKETS, radio, leds, tx);
/// loop {
///     let _ = link.receive(&mut consumer);
///     while let Some(packet) = link.next_packet() {
///         uart.write_all(&packet.data);
///     }
/// }
/// ```
#[derive(Debug)]
pub struct SerialLink<'a, RADIO, LEDS, TX, const N: usize>
where
    RADIO: Radio,
    LEDS: Indicators,
    TX: Transmitter,
{
    framer: Framer,
    window: SendWindow<'a, N>,
    stats: LinkStats,
    /// The radio
    pub radio: RADIO,
    /// The status LEDs
    pub leds: LEDS,
    /// The transmit path
    pub tx: TX,
}

impl<'a, RADIO, LEDS, TX, const N: usize> SerialLink<'a, RADIO, LEDS, TX, N>
where
    RADIO: Radio,
    LEDS: Indicators,
    TX: Transmitter,
{
    /// Creates a link over `buffer`. The collaborators are not touched until
    /// the first RESET or STOP.
    pub fn new(buffer: &'a PacketBuffer<N>, radio: RADIO, leds: LEDS, tx: TX) -> Self {
        Self {
            framer: Framer::new(),
            window: SendWindow::new(buffer),
            stats: LinkStats::default(),
            radio,
            leds,
            tx,
        }
    }

    /// The framer, for inspecting the receive state.
    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    /// The send window.
    pub fn window(&self) -> &SendWindow<'a, N> {
        &self.window
    }

    /// Counters since creation.
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Drains the ring and processes every byte in arrival order.
    ///
    /// # Returns
    /// The number of bytes processed.
    pub fn receive<const Q: usize>(&mut self, consumer: &mut RxConsumer<'_, Q>) -> usize {
        let mut count = 0;
        while let Some(byte) = consumer.next_byte() {
            let _ = self.process_byte(byte);
            count += 1;
        }
        count
    }

    /// Feeds one byte to the framer and handles the message it completes.
    ///
    /// # Returns
    /// The message, if this byte closed a valid frame. The message has already
    /// been acted on.
    pub fn process_byte(&mut self, byte: u8) -> Option<Message> {
        match self.framer.process_byte(byte) {
            Ok(None) => None,
            Ok(Some(message)) => {
                self.stats.frames_ok = self.stats.frames_ok.wrapping_add(1);
                if let Err(e) = self.handle_message(message) {
                    warn!("message type {} rejected: {}", u8::from(message.kind()), e);
                }
                Some(message)
            }
            Err(e) => {
                warn!("frame rejected: {}", e);
                self.stats.frames_bad = self.stats.frames_bad.wrapping_add(1);
                self.resend();
                None
            }
        }
    }

    /// Acts on a decoded message.
    ///
    /// Errors are already recovered from when they are returned:
    /// - window errors on ACK/NACK: orange LED on, resend from the acknowledged index
    /// - [`LinkError::InvalidChannel`] on RESET: radio left disabled, no READY sent
    pub fn handle_message(&mut self, message: Message) -> Result<(), LinkError> {
        match message {
            Message::Ack { index, seq_nr } => self
                .window
                .on_ack(index, seq_nr)
                .map(|_| ())
                .inspect_err(|_| self.invalid_message()),
            Message::Nack { index, seq_nr } => self
                .window
                .on_nack(index, seq_nr)
                .inspect_err(|_| self.invalid_message()),
            Message::Reset { channel } => self.reset(channel),
            Message::Stop => {
                self.stop();
                Ok(())
            }
        }
    }

    /// Takes the next packet for the host, see [`SendWindow::next_packet`].
    pub fn next_packet(&mut self) -> Option<OutboundPacket> {
        self.window.next_packet()
    }

    fn resend(&mut self) {
        self.window.force_resend();
        self.stats.resends = self.stats.resends.wrapping_add(1);
    }

    fn invalid_message(&mut self) {
        self.leds.set(Indicator::Orange, true);
        self.stats.window_faults = self.stats.window_faults.wrapping_add(1);
        self.resend();
    }

    fn reset(&mut self, channel: u8) -> Result<(), LinkError> {
        self.radio.disable_rx_interrupt();
        self.leds.idle_pattern();
        self.window.reset();

        let channel = Channel::new(channel)?;
        self.radio.set_channel(channel);
        self.tx.send_ready();
        self.radio.flush_rx();
        self.radio.enable_rx_interrupt();
        debug!("reset, listening on channel {}", channel.get());
        Ok(())
    }

    fn stop(&mut self) {
        self.radio.disable_rx_interrupt();
        self.radio.flush_rx();
        self.leds.all_off();
        self.window.reset();
        debug!("stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::HDLC_FLAG;
    use crate::frame::tests::encode;
    use crate::hal::StatusLeds;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum RadioCall {
        Disable,
        Enable,
        Flush,
        SetChannel(u8),
    }

    #[derive(Debug, Default)]
    struct FakeRadio {
        calls: Vec<RadioCall>,
    }

    impl Radio for FakeRadio {
        fn disable_rx_interrupt(&mut self) {
            self.calls.push(RadioCall::Disable);
        }
        fn enable_rx_interrupt(&mut self) {
            self.calls.push(RadioCall::Enable);
        }
        fn flush_rx(&mut self) {
            self.calls.push(RadioCall::Flush);
        }
        fn set_channel(&mut self, channel: Channel) {
            self.calls.push(RadioCall::SetChannel(channel.get()));
        }
    }

    #[derive(Debug, Default)]
    struct FakeLeds {
        state: [bool; 4],
    }

    impl FakeLeds {
        fn is_on(&self, indicator: Indicator) -> bool {
            self.state[indicator as usize]
        }
    }

    impl Indicators for FakeLeds {
        fn set(&mut self, indicator: Indicator, on: bool) {
            self.state[indicator as usize] = on;
        }
    }

    #[derive(Debug, Default)]
    struct FakeTx {
        ready: usize,
    }

    impl Transmitter for FakeTx {
        fn send_ready(&mut self) {
            self.ready += 1;
        }
    }

    type TestLink<'a> = SerialLink<'a, FakeRadio, FakeLeds, FakeTx, 128>;

    fn link(buffer: &PacketBuffer<128>) -> TestLink<'_> {
        SerialLink::new(
            buffer,
            FakeRadio::default(),
            FakeLeds::default(),
            FakeTx::default(),
        )
    }

    fn feed(link: &mut TestLink<'_>, bytes: &[u8]) -> Vec<Message> {
        bytes.iter().filter_map(|&b| link.process_byte(b)).collect()
    }

    fn ack(index: u16, seq_nr: u16) -> Vec<u8> {
        let [i_hi, i_lo] = index.to_be_bytes();
        let [s_hi, s_lo] = seq_nr.to_be_bytes();
        encode(&[0x01, 0x04, i_hi, i_lo, s_hi, s_lo])
    }

    fn nack(index: u16, seq_nr: u16) -> Vec<u8> {
        let [i_hi, i_lo] = index.to_be_bytes();
        let [s_hi, s_lo] = seq_nr.to_be_bytes();
        encode(&[0x02, 0x04, i_hi, i_lo, s_hi, s_lo])
    }

    fn store(buffer: &PacketBuffer<128>, count: usize) {
        for i in 0..count {
            let _ = buffer.store_packet(&[i as u8; 5]).unwrap();
        }
    }

    #[test]
    fn test_ack_in_window_advances() {
        let buffer = PacketBuffer::new();
        store(&buffer, 3);
        let mut link = link(&buffer);

        let messages = feed(&mut link, &ack(8, 2));
        assert_eq!(messages, [Message::Ack { index: 8, seq_nr: 2 }]);
        assert_eq!(link.window().acked_index(), 16);
        assert_eq!(link.window().previous_received_index(), Some(8));
        assert!(!link.leds.is_on(Indicator::Orange));
        assert_eq!(link.stats().frames_ok, 1);
        assert_eq!(link.stats().window_faults, 0);
    }

    #[test]
    fn test_ack_past_radio_raises_fault() {
        let buffer = PacketBuffer::new();
        store(&buffer, 3);
        let mut link = link(&buffer);
        while link.next_packet().is_some() {}
        assert_eq!(link.window().serial_send_index(), 24);

        let _ = feed(&mut link, &ack(25, 4));
        assert!(link.leds.is_on(Indicator::Orange));
        assert_eq!(link.window().acked_index(), 0);
        assert_eq!(link.window().serial_send_index(), 0);
        assert_eq!(link.stats().window_faults, 1);
        assert_eq!(link.stats().resends, 1);
    }

    #[test]
    fn test_nack_with_wrong_sequence_raises_fault() {
        let buffer = PacketBuffer::new();
        store(&buffer, 3);
        let mut link = link(&buffer);
        while link.next_packet().is_some() {}

        assert_eq!(feed(&mut link, &nack(8, 99)).len(), 1);
        assert!(link.leds.is_on(Indicator::Orange));
        assert_eq!(link.window().acked_index(), 0);
        assert_eq!(link.window().serial_send_index(), 0);
        assert_eq!(link.window().previous_received_index(), None);
        assert_eq!(link.stats().window_faults, 1);
    }

    #[test]
    fn test_nack_outside_window_raises_fault() {
        let buffer = PacketBuffer::new();
        store(&buffer, 3);
        let mut link = link(&buffer);
        let _ = feed(&mut link, &ack(0, 1));
        while link.next_packet().is_some() {}
        assert_eq!(link.window().serial_send_index(), 24);

        let _ = feed(&mut link, &nack(40, 5));
        assert!(link.leds.is_on(Indicator::Orange));
        assert_eq!(link.window().acked_index(), 8);
        assert_eq!(link.window().serial_send_index(), 8);
        assert_eq!(link.window().previous_received_index(), Some(0));
        assert_eq!(link.stats().window_faults, 1);
        assert_eq!(link.stats().resends, 1);
    }

    #[test]
    fn test_nack_resends_from_acked() {
        let buffer = PacketBuffer::new();
        store(&buffer, 4);
        let mut link = link(&buffer);
        while link.next_packet().is_some() {}

        let _ = feed(&mut link, &nack(0, 1));
        assert_eq!(link.window().acked_index(), 8);
        assert_eq!(link.window().serial_send_index(), 8);
        assert!(!link.leds.is_on(Indicator::Orange));
    }

    #[test]
    fn test_corrupt_frame_forces_resend_without_fault_led() {
        let buffer = PacketBuffer::new();
        store(&buffer, 2);
        let mut link = link(&buffer);
        while link.next_packet().is_some() {}

        let mut frame = ack(0, 1);
        frame[4] ^= 0x01;
        assert!(feed(&mut link, &frame).is_empty());
        assert_eq!(link.window().serial_send_index(), 0);
        assert!(!link.leds.is_on(Indicator::Orange));
        assert_eq!(link.stats().frames_bad, 1);
        assert_eq!(link.stats().resends, 1);
    }

    #[test]
    fn test_reset_retunes_and_reenables() {
        let buffer = PacketBuffer::new();
        store(&buffer, 2);
        let mut link = link(&buffer);
        link.leds.set(Indicator::Orange, true);

        let messages = feed(&mut link, &encode(&[0x03, 0x01, 15]));
        assert_eq!(messages, [Message::Reset { channel: 15 }]);
        assert_eq!(
            link.radio.calls,
            [
                RadioCall::Disable,
                RadioCall::SetChannel(15),
                RadioCall::Flush,
                RadioCall::Enable
            ]
        );
        assert_eq!(link.tx.ready, 1);
        assert!(link.leds.is_on(Indicator::Green));
        assert!(!link.leds.is_on(Indicator::Orange));
        assert_eq!(buffer.radio_snapshot().index(), 0);
        assert_eq!(buffer.seq_nr(), 0);
    }

    #[test]
    fn test_reset_with_bad_channel_stays_disabled() {
        let buffer = PacketBuffer::new();
        store(&buffer, 2);
        let mut link = link(&buffer);

        assert_eq!(
            link.handle_message(Message::Reset { channel: 30 }),
            Err(LinkError::InvalidChannel(30))
        );
        assert_eq!(link.radio.calls, [RadioCall::Disable]);
        assert_eq!(link.tx.ready, 0);
        assert_eq!(link.window().acked_index(), 0);
        assert_eq!(link.window().serial_send_index(), 0);
        assert_eq!(buffer.radio_snapshot().index(), 0);
        assert_eq!(buffer.seq_nr(), 0);
        assert_eq!(link.stats().resends, 0);
    }

    #[test]
    fn test_stop_halts_radio() {
        let buffer = PacketBuffer::new();
        store(&buffer, 2);
        let mut link = link(&buffer);
        link.leds.idle_pattern();

        let _ = feed(&mut link, &encode(&[0x04, 0x00]));
        assert_eq!(link.radio.calls, [RadioCall::Disable, RadioCall::Flush]);
        assert_eq!(link.leds.state, [false; 4]);
        assert_eq!(buffer.radio_snapshot().index(), 0);
        assert_eq!(link.tx.ready, 0);
    }

    #[test]
    fn test_empty_frame_resyncs() {
        let buffer = PacketBuffer::new();
        store(&buffer, 2);
        let mut link = link(&buffer);
        while link.next_packet().is_some() {}

        assert!(feed(&mut link, &[HDLC_FLAG, HDLC_FLAG]).is_empty());
        assert_eq!(link.window().serial_send_index(), 0);
        assert_eq!(link.stats().frames_bad, 1);
        // The second delimiter already opened the next frame.
        let frame = encode(&[0x04, 0x00]);
        assert_eq!(feed(&mut link, &frame[1..]), [Message::Stop]);
    }

    #[test]
    fn test_reset_drives_led_pins() {
        let buffer = PacketBuffer::new();
        let leds = StatusLeds::new(
            PinMock::new(&[PinTransaction::set(PinState::High)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
        );
        let mut link: SerialLink<'_, _, _, _, 128> =
            SerialLink::new(&buffer, FakeRadio::default(), leds, FakeTx::default());

        assert_eq!(link.handle_message(Message::Reset { channel: 11 }), Ok(()));
        link.leds.green.done();
        link.leds.yellow.done();
        link.leds.orange.done();
        link.leds.red.done();
    }
}
