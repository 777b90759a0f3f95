//! Constants used across the serial link protocol implementation.
//!
//! This module defines the protocol-wide constants used for frame delimiting,
//! byte escaping, message layout, buffer sizing and outbound packet layout.
//!
//! The framing values follow HDLC-style asynchronous framing as used by the
//! host capture tool on the other end of the UART.
//!
//! ## Key Concepts
//!
//! - **Flag**: delimits frames; never appears literally inside a frame body.
//! - **Escape**: marks the next byte as XORed with [`HDLC_ESCAPE_MASK`].
//! - **Messages**: `[type, length, payload.., crc_hi, crc_lo]` after unescaping.
//! - **Outbound packets**: `[len, seq_hi, seq_lo, data..]` stored back to back
//!   in the [`PacketBuffer`](crate::buffer::PacketBuffer).

/// Frame delimiter. Opens and closes every frame.
pub const HDLC_FLAG: u8 = 0x7E;

/// Escape marker. The byte following it was XORed with [`HDLC_ESCAPE_MASK`].
pub const HDLC_ESCAPE: u8 = 0x7D;

/// Mask applied to escaped bytes.
pub const HDLC_ESCAPE_MASK: u8 = 0x20;

/// Initial value of the running frame CRC.
pub const CRC_INIT: u16 = 0xFFFF;

/// Length (in bytes) of the trailing CRC of every frame.
pub const CRC_LEN: usize = 2;

/// Length (in bytes) of the message header: type byte and length byte.
pub const MESSAGE_HEADER_LEN: usize = 2;

/// Smallest legal frame after unescaping: type, length and the two CRC bytes.
pub const MIN_MESSAGE_LEN: usize = MESSAGE_HEADER_LEN + CRC_LEN;

/// Maximum number of unescaped bytes accepted in a single frame.
///
/// The largest message the host sends (ACK/NACK) needs 8 bytes.
pub const SERIAL_RX_MAX_MESSAGE_LEN: usize = 16;

/// Default capacity of the UART receive queue.
///
/// The `heapless` queue keeps one slot free, so this holds `SERIAL_RX_BUFFER_LEN - 1`
/// bytes between two drains.
pub const SERIAL_RX_BUFFER_LEN: usize = 128;

/// Payload length of an ACK message: 16 bit buffer index and 16 bit sequence number.
pub const ACK_MESSAGE_LENGTH: u8 = 4;

/// Payload length of a NACK message. Same shape as ACK.
pub const NACK_MESSAGE_LENGTH: u8 = 4;

/// Payload length of a RESET message: the radio channel.
pub const RESET_MESSAGE_LENGTH: u8 = 1;

/// Payload length of a STOP message.
pub const STOP_MESSAGE_LENGTH: u8 = 0;

/// Offset of the buffer index inside an ACK/NACK message.
pub const ACK_INDEX_OFFSET: usize = 2;

/// Offset of the sequence number inside an ACK/NACK message.
pub const ACK_SEQNR_OFFSET: usize = 4;

/// Offset of the channel byte inside a RESET message.
pub const RESET_CHANNEL_OFFSET: usize = 2;

/// Lowest IEEE 802.15.4 channel in the 2.4 GHz band.
pub const MIN_CHANNEL: u8 = 11;

/// Highest IEEE 802.15.4 channel in the 2.4 GHz band.
pub const MAX_CHANNEL: u8 = 26;

/// Offset of the sequence number inside a buffered outbound packet.
pub const BUFFER_SEQNR_OFFSET: usize = 1;

/// Length of the outbound packet header: length byte and sequence number.
pub const PACKET_HEADER_LEN: usize = 3;

/// Marks the end of the used region of the outbound buffer.
///
/// Readers reaching this byte at a packet boundary continue at offset 0.
pub const END_OF_BUFFER_BYTE: u8 = 0xFF;

/// Written after the newest packet so that a sentinel left over from a previous
/// lap is never taken for the wrap point.
pub const EMPTY_SLOT_BYTE: u8 = 0x00;

/// Largest outbound packet (header included). One less than the sentinel.
pub const MAX_PACKET_LEN: usize = (END_OF_BUFFER_BYTE - 1) as usize;

/// Largest data section of an outbound packet.
pub const MAX_PACKET_DATA_LEN: usize = MAX_PACKET_LEN - PACKET_HEADER_LEN;
