//! Outbound packet buffer shared between the radio path and the serial link.
//!
//! Sniffed radio frames are stored back to back in a circular byte buffer
//! until the host acknowledges them. Each packet is laid out as
//!
//! ```text
//! [len, seq_hi, seq_lo, data..]
//! ```
//!
//! where `len` counts the whole packet. When the tail of the buffer is too
//! short for the next packet, [`END_OF_BUFFER_BYTE`] is written at the
//! current position and writing continues at offset 0.
//!
//! ## Indices
//!
//! - `radio`: where the next sniffed packet goes. Only the radio path moves it.
//! - `acked`: first byte the host has not confirmed. Only the serial link moves it.
//!
//! The radio index is advanced from interrupt context, so the serial link
//! must read it exactly once per decision; see [`PacketBuffer::radio_snapshot`].
//!
//! All state sits behind a single `critical_section::Mutex` and every accessor
//! is one short critical section.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use heapless::Vec;

use crate::consts::{
    BUFFER_SEQNR_OFFSET, EMPTY_SLOT_BYTE, END_OF_BUFFER_BYTE, MAX_PACKET_DATA_LEN,
    MAX_PACKET_LEN, PACKET_HEADER_LEN,
};
use crate::error::LinkError;

/// One read of the radio index.
///
/// Window checks take this instead of the buffer so that every comparison in a
/// check sees the same value, even if a radio interrupt moves the index (and
/// wraps it to 0) in the middle of the check.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioSnapshot(u16);

impl RadioSnapshot {
    #[cfg(test)]
    pub(crate) const fn from_raw(index: u16) -> Self {
        RadioSnapshot(index)
    }

    /// The radio index at the time of the snapshot.
    pub fn index(self) -> u16 {
        self.0
    }
}

/// Where [`PacketBuffer::store_packet`] put a packet.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredPacket {
    /// Buffer index of the length byte.
    pub index: u16,
    /// Sequence number assigned to the packet.
    pub seq_nr: u16,
}

struct Slots<const N: usize> {
    bytes: [u8; N],
    radio: u16,
    acked: u16,
    seq_nr: u16,
}

/// Circular store of packets waiting for acknowledgment.
///
/// `N` must not exceed `u16::MAX`; indices travel over the wire as 16 bit values.
pub struct PacketBuffer<const N: usize> {
    inner: Mutex<RefCell<Slots<N>>>,
}

impl<const N: usize> PacketBuffer<N> {
    const CAPACITY_FITS_U16: () = assert!(N > PACKET_HEADER_LEN && N <= u16::MAX as usize);

    /// Creates an empty buffer. Usable in `static` initializers.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_FITS_U16;
        Self {
            inner: Mutex::new(RefCell::new(Slots {
                bytes: [EMPTY_SLOT_BYTE; N],
                radio: 0,
                acked: 0,
                seq_nr: 0,
            })),
        }
    }

    /// Buffer size in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Reads the radio index once.
    pub fn radio_snapshot(&self) -> RadioSnapshot {
        critical_section::with(|cs| RadioSnapshot(self.inner.borrow_ref(cs).radio))
    }

    /// First index not yet acknowledged by the host.
    pub fn acked_index(&self) -> u16 {
        critical_section::with(|cs| self.inner.borrow_ref(cs).acked)
    }

    pub(crate) fn set_acked(&self, index: u16) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).acked = index);
    }

    /// Sequence number of the most recently stored packet (0 after a reset).
    pub fn seq_nr(&self) -> u16 {
        critical_section::with(|cs| self.inner.borrow_ref(cs).seq_nr)
    }

    /// Byte at `index`, or `None` past the end of the buffer.
    pub fn byte_at(&self, index: usize) -> Option<u8> {
        critical_section::with(|cs| self.inner.borrow_ref(cs).bytes.get(index).copied())
    }

    /// Big-endian 16 bit value at `index`.
    pub fn read_u16(&self, index: usize) -> Option<u16> {
        critical_section::with(|cs| {
            let slots = self.inner.borrow_ref(cs);
            let hi = *slots.bytes.get(index)?;
            let lo = *slots.bytes.get(index + 1)?;
            Some(u16::from_be_bytes([hi, lo]))
        })
    }

    /// Sequence number stored in the packet starting at `index`.
    pub fn seq_nr_at(&self, index: u16) -> Option<u16> {
        self.read_u16(usize::from(index) + BUFFER_SEQNR_OFFSET)
    }

    /// Zeroes both indices and the sequence number.
    pub(crate) fn clear(&self) {
        critical_section::with(|cs| {
            let mut slots = self.inner.borrow_ref_mut(cs);
            slots.radio = 0;
            slots.acked = 0;
            slots.seq_nr = 0;
        });
    }

    /// Stores a sniffed radio frame. Called by the radio receive path.
    ///
    /// The packet gets the next sequence number; numbering wraps from 65535
    /// back to 1 so that 0 always means "nothing sent since reset".
    ///
    /// # Returns
    /// - [`LinkError::PacketTooLarge`] when `data` exceeds [`MAX_PACKET_DATA_LEN`]
    /// - [`LinkError::BufferFull`] when the packet would run into unacknowledged data
    pub fn store_packet(&self, data: &[u8]) -> Result<StoredPacket, LinkError> {
        if data.len() > MAX_PACKET_DATA_LEN {
            return Err(LinkError::PacketTooLarge(data.len()));
        }
        let len = data.len() + PACKET_HEADER_LEN;

        critical_section::with(|cs| {
            let mut slots = self.inner.borrow_ref_mut(cs);
            let radio = usize::from(slots.radio);
            let acked = usize::from(slots.acked);

            // One byte always stays free so radio never lands on acked.
            let start = if radio >= acked {
                if radio + len < N {
                    radio
                } else if len < acked {
                    slots.bytes[radio] = END_OF_BUFFER_BYTE;
                    0
                } else {
                    return Err(LinkError::BufferFull(len));
                }
            } else if radio + len < acked {
                radio
            } else {
                return Err(LinkError::BufferFull(len));
            };

            let seq_nr = match slots.seq_nr.wrapping_add(1) {
                0 => 1,
                n => n,
            };
            let end = start + len;
            slots.bytes[start] = len as u8;
            slots.bytes[start + BUFFER_SEQNR_OFFSET..start + PACKET_HEADER_LEN]
                .copy_from_slice(&seq_nr.to_be_bytes());
            slots.bytes[start + PACKET_HEADER_LEN..end].copy_from_slice(data);
            slots.bytes[end] = EMPTY_SLOT_BYTE;
            slots.seq_nr = seq_nr;
            slots.radio = end as u16;
            trace!("stored packet {} at {} ({} bytes)", seq_nr, start, len);

            Ok(StoredPacket {
                index: start as u16,
                seq_nr,
            })
        })
    }

    /// Copies the packet at `index` into `out`.
    ///
    /// Returns `false` when `index` does not hold a plausible packet.
    pub(crate) fn copy_packet(&self, index: u16, out: &mut Vec<u8, MAX_PACKET_LEN>) -> bool {
        critical_section::with(|cs| {
            let slots = self.inner.borrow_ref(cs);
            let start = usize::from(index);
            let len = match slots.bytes.get(start) {
                Some(&len) => usize::from(len),
                None => return false,
            };
            if len < PACKET_HEADER_LEN || len > MAX_PACKET_LEN || start + len > N {
                return false;
            }
            out.clear();
            out.extend_from_slice(&slots.bytes[start..start + len]).is_ok()
        })
    }
}

impl<const N: usize> Default for PacketBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for PacketBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (radio, acked, seq_nr) = critical_section::with(|cs| {
            let slots = self.inner.borrow_ref(cs);
            (slots.radio, slots.acked, slots.seq_nr)
        });
        f.debug_struct("PacketBuffer")
            .field("capacity", &N)
            .field("radio", &radio)
            .field("acked", &acked)
            .field("seq_nr", &seq_nr)
            .finish()
    }
}
