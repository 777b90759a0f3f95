//! Hardware the serial link talks to.
//!
//! The protocol core never touches registers. RESET and STOP handling reach
//! the radio, the status LEDs and the transmit path through these traits, so
//! the whole link can be driven on the host with fakes.

use embedded_hal::digital::OutputPin;

use crate::message::Channel;

/// The 2.4 GHz radio, as far as the serial link is concerned.
pub trait Radio {
    /// Masks the radio receive interrupt. No packet is stored afterwards.
    fn disable_rx_interrupt(&mut self);

    /// Unmasks the radio receive interrupt and turns the receiver on.
    fn enable_rx_interrupt(&mut self);

    /// Drops everything in the radio receive FIFO.
    fn flush_rx(&mut self);

    /// Tunes the radio.
    fn set_channel(&mut self, channel: Channel);
}

/// The outbound half of the serial link.
pub trait Transmitter {
    /// Queues the READY notification that tells the host a RESET completed.
    fn send_ready(&mut self);
}

/// The four status LEDs on the sniffer board.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Running.
    Green,
    /// Free for the radio path.
    Yellow,
    /// The host sent an ACK or NACK that did not fit the window.
    Orange,
    /// Free for the radio path.
    Red,
}

/// On/off status outputs.
pub trait Indicators {
    /// Switches one indicator.
    fn set(&mut self, indicator: Indicator, on: bool);

    /// Green on, everything else off.
    fn idle_pattern(&mut self) {
        self.set(Indicator::Green, true);
        self.set(Indicator::Yellow, false);
        self.set(Indicator::Orange, false);
        self.set(Indicator::Red, false);
    }

    /// Everything off.
    fn all_off(&mut self) {
        self.set(Indicator::Green, false);
        self.set(Indicator::Yellow, false);
        self.set(Indicator::Orange, false);
        self.set(Indicator::Red, false);
    }
}

/// [`Indicators`] backed by four GPIO pins, active high.
///
/// ## Example
///
/// ```rust,ignore
/// # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
/// use sniffer_link::hal::{Indicator, Indicators, StatusLeds};
///
/// let mut leds = StatusLeds::new(
///     Pin::new(&[PinTransaction::set(PinState::High)]),
///     Pin::new(&[]),
///     Pin::new(&[]),
///     Pin::new(&[]),
/// );
/// leds.set(Indicator::Green, true);
/// # leds.green.done();
/// # leds.yellow.done();
/// # leds.orange.done();
/// # leds.red.done();
/// ```
#[derive(Debug)]
pub struct StatusLeds<G, Y, O, R>
where
    G: OutputPin,
    Y: OutputPin,
    O: OutputPin,
    R: OutputPin,
{
    /// Green LED pin
    pub green: G,
    /// Yellow LED pin
    pub yellow: Y,
    /// Orange LED pin
    pub orange: O,
    /// Red LED pin
    pub red: R,
}

impl<G, Y, O, R> StatusLeds<G, Y, O, R>
where
    G: OutputPin,
    Y: OutputPin,
    O: OutputPin,
    R: OutputPin,
{
    /// Wraps the four pins without touching them.
    pub fn new(green: G, yellow: Y, orange: O, red: R) -> Self {
        Self {
            green,
            yellow,
            orange,
            red,
        }
    }
}

impl<G, Y, O, R> Indicators for StatusLeds<G, Y, O, R>
where
    G: OutputPin,
    Y: OutputPin,
    O: OutputPin,
    R: OutputPin,
{
    fn set(&mut self, indicator: Indicator, on: bool) {
        match indicator {
            Indicator::Green => write_pin(&mut self.green, on),
            Indicator::Yellow => write_pin(&mut self.yellow, on),
            Indicator::Orange => write_pin(&mut self.orange, on),
            Indicator::Red => write_pin(&mut self.red, on),
        }
    }
}

// LED failures are not worth failing the link for.
fn write_pin<P: OutputPin>(pin: &mut P, on: bool) {
    if on {
        let _ = pin.set_high();
    } else {
        let _ = pin.set_low();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn test_idle_pattern_drives_pins() {
        let mut leds = StatusLeds::new(
            PinMock::new(&[PinTransaction::set(PinState::High)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
        );
        leds.idle_pattern();
        leds.green.done();
        leds.yellow.done();
        leds.orange.done();
        leds.red.done();
    }

    #[test]
    fn test_all_off_then_orange_on() {
        let mut leds = StatusLeds::new(
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[
                PinTransaction::set(PinState::Low),
                PinTransaction::set(PinState::High),
            ]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
        );
        leds.all_off();
        leds.set(Indicator::Orange, true);
        leds.green.done();
        leds.yellow.done();
        leds.orange.done();
        leds.red.done();
    }
}
