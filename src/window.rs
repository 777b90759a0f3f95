//! Sliding send window over the outbound [`PacketBuffer`].
//!
//! The host acknowledges packets by buffer index and sequence number. A valid
//! index lies in the circular range `[acked, radio]`:
//!
//! ```text
//!  no wrap:   0 ..... acked ===== radio ..... N
//!  wrapped:   0 ===== radio ..... acked ===== N
//! ```
//!
//! `serial_send` is the transmit cursor and always lies inside the window.
//! An ACK moves `acked` past the acknowledged packet and only touches
//! `serial_send` if `acked` overtook it; a NACK does the same and always
//! rewinds `serial_send` to it so that everything after the packet is sent
//! again.

use heapless::Vec;

use crate::buffer::{PacketBuffer, RadioSnapshot};
use crate::consts::{END_OF_BUFFER_BYTE, MAX_PACKET_LEN, PACKET_HEADER_LEN};
use crate::error::LinkError;

/// Result of a successfully handled ACK.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Same index as the previous acknowledgment; nothing changed.
    Duplicate,
    /// The acknowledged index moved to the given position.
    Advanced(u16),
}

/// A packet handed to the transmit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPacket {
    /// Buffer index of the packet, echoed back by the host in ACK/NACK.
    pub index: u16,
    /// Sequence number stored in the packet.
    pub seq_nr: u16,
    /// The whole packet, header included.
    pub data: Vec<u8, MAX_PACKET_LEN>,
}

/// Whether `index` lies in the circular range `[acked, radio]`.
pub fn in_window(index: u16, acked: u16, radio: RadioSnapshot) -> bool {
    let radio = radio.index();
    if acked > radio {
        !(index < acked && index > radio)
    } else {
        index >= acked && index <= radio
    }
}

/// Acknowledgment bookkeeping for the outbound buffer.
#[derive(Debug)]
pub struct SendWindow<'a, const N: usize> {
    buffer: &'a PacketBuffer<N>,
    serial_send: u16,
    previous_received: Option<u16>,
}

impl<'a, const N: usize> SendWindow<'a, N> {
    /// Creates a window over `buffer` with nothing sent yet.
    pub fn new(buffer: &'a PacketBuffer<N>) -> Self {
        Self {
            buffer,
            serial_send: buffer.acked_index(),
            previous_received: None,
        }
    }

    /// The shared buffer.
    pub fn buffer(&self) -> &'a PacketBuffer<N> {
        self.buffer
    }

    /// Next index the transmit path will send.
    pub fn serial_send_index(&self) -> u16 {
        self.serial_send
    }

    /// First index not yet acknowledged.
    pub fn acked_index(&self) -> u16 {
        self.buffer.acked_index()
    }

    /// Index of the last ACK/NACK that was accepted.
    pub fn previous_received_index(&self) -> Option<u16> {
        self.previous_received
    }

    /// Rewinds the transmit cursor to the first unacknowledged byte.
    pub fn force_resend(&mut self) {
        self.serial_send = self.buffer.acked_index();
    }

    /// Empties the window: buffer indices and sequence number go to zero.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.serial_send = 0;
        self.previous_received = None;
    }

    /// Handles an ACK for the packet at `index`.
    ///
    /// A repeat of the previous index is ignored. Otherwise the index and
    /// sequence number are validated and `acked` jumps past the packet. The
    /// transmit cursor stays where it is unless it fell behind `acked`, which
    /// happens when the host acknowledges past a NACK rewind.
    pub fn on_ack(&mut self, index: u16, seq_nr: u16) -> Result<AckOutcome, LinkError> {
        if self.previous_received == Some(index) {
            trace!("duplicate ack for {}", index);
            return Ok(AckOutcome::Duplicate);
        }

        self.check_index_and_seq(index, seq_nr)?;
        let acked = index.wrapping_add(self.packet_len(index));
        self.buffer.set_acked(acked);
        self.previous_received = Some(index);
        if !in_window(self.serial_send, acked, self.buffer.radio_snapshot()) {
            trace!("transmit cursor {} behind acked, moving up", self.serial_send);
            self.serial_send = acked;
        }
        debug!("ack {} (seq {}), acked now {}", index, seq_nr, acked);
        Ok(AckOutcome::Advanced(acked))
    }

    /// Handles a NACK naming the last packet the host received intact.
    ///
    /// A repeat of the previous index is accepted without revalidation.
    /// `acked` jumps past the packet (to 0 if the buffer wraps there) and the
    /// transmit cursor is rewound to it.
    pub fn on_nack(&mut self, index: u16, seq_nr: u16) -> Result<(), LinkError> {
        if self.previous_received != Some(index) {
            self.check_index_and_seq(index, seq_nr)?;
        }

        let mut acked = index.wrapping_add(self.packet_len(index));
        if self.buffer.byte_at(usize::from(acked)).is_none_or(|b| b == END_OF_BUFFER_BYTE) {
            acked = 0;
        }
        self.buffer.set_acked(acked);
        self.serial_send = acked;
        self.previous_received = Some(index);
        debug!("nack {} (seq {}), resending from {}", index, seq_nr, acked);
        Ok(())
    }

    /// Validates an acknowledged index against the window and the sequence
    /// number stored in the packet there.
    ///
    /// The radio index is read once; see [`RadioSnapshot`].
    pub fn check_index_and_seq(&self, index: u16, seq_nr: u16) -> Result<(), LinkError> {
        if usize::from(index) >= N {
            return Err(LinkError::IndexOutOfRange {
                index,
                capacity: N,
            });
        }

        let radio = self.buffer.radio_snapshot();
        let acked = self.buffer.acked_index();
        if !in_window(index, acked, radio) {
            return Err(LinkError::IndexOutsideWindow {
                index,
                acked,
                radio: radio.index(),
            });
        }

        match self.buffer.seq_nr_at(index) {
            Some(stored) if stored == seq_nr => Ok(()),
            stored => Err(LinkError::SequenceMismatch {
                index,
                stored: stored.unwrap_or_default(),
                received: seq_nr,
            }),
        }
    }

    /// Takes the next packet for the transmit path and advances the cursor.
    ///
    /// Returns `None` once the cursor caught up with the radio index.
    pub fn next_packet(&mut self) -> Option<OutboundPacket> {
        let radio = self.buffer.radio_snapshot().index();
        if self.serial_send == radio {
            return None;
        }
        if self.buffer.byte_at(usize::from(self.serial_send)) == Some(END_OF_BUFFER_BYTE) {
            self.serial_send = 0;
            if radio == 0 {
                return None;
            }
        }

        let index = self.serial_send;
        let mut data = Vec::new();
        if !self.buffer.copy_packet(index, &mut data) {
            return None;
        }
        let seq_nr = u16::from_be_bytes([data[1], data[2]]);
        self.serial_send = index.wrapping_add(data.len() as u16);
        Some(OutboundPacket {
            index,
            seq_nr,
            data,
        })
    }

    fn packet_len(&self, index: u16) -> u16 {
        self.buffer
            .byte_at(usize::from(index))
            .map_or(PACKET_HEADER_LEN as u16, u16::from)
    }
}
