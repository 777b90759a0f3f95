//! Error types for the serial link.
//!
//! None of these are fatal. Every framing, validation and window error is
//! recovered from by retransmitting everything after the last acknowledged
//! packet; they are surfaced as values so the caller can count and log them.

use thiserror::Error;

/// Reasons a byte or a completed frame was rejected by the [`Framer`](crate::frame::Framer).
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// A non-delimiter byte arrived while no frame was open.
    #[error("byte {0:#04x} received outside of a frame")]
    UnexpectedByte(u8),
    /// Two escape markers in a row.
    #[error("escape marker followed by another escape marker")]
    DoubleEscape,
    /// The frame grew past the receive buffer capacity.
    #[error("frame exceeds {0} bytes")]
    Overflow(usize),
    /// Two delimiters with nothing between them.
    #[error("empty frame, link out of sync")]
    OutOfSync,
    /// The closing delimiter directly followed an escape marker.
    #[error("frame ended in the middle of an escape sequence")]
    TrailingEscape,
    /// Fewer bytes than type, length and CRC.
    #[error("frame of {0} bytes is too short")]
    TooShort(usize),
    /// The running CRC did not fold to zero.
    #[error("CRC check failed (residual {0:#06x})")]
    BadCrc(u16),
    /// The length byte disagrees with the number of bytes received.
    #[error("declared payload length {declared} but received {actual} payload bytes")]
    LengthMismatch {
        /// Value of the length byte.
        declared: u8,
        /// Payload bytes actually received.
        actual: usize,
    },
    /// Unknown message type, or a known type with the wrong length.
    #[error("unrecognised message type {kind:#04x} with length {len}")]
    UnknownType {
        /// Type byte.
        kind: u8,
        /// Length byte.
        len: u8,
    },
}

/// Errors raised by the send window, the outbound buffer and the collaborators.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Acknowledged index lies beyond the physical buffer.
    #[error("index {index} is outside of the {capacity} byte buffer")]
    IndexOutOfRange {
        /// Received index.
        index: u16,
        /// Buffer capacity.
        capacity: usize,
    },
    /// Acknowledged index lies outside of `[acked, radio]`.
    #[error("index {index} is outside of the window [{acked}, {radio}]")]
    IndexOutsideWindow {
        /// Received index.
        index: u16,
        /// Acknowledged index at the time of the check.
        acked: u16,
        /// Radio index snapshot used for the check.
        radio: u16,
    },
    /// The packet at the acknowledged index carries another sequence number.
    #[error("sequence number {received} does not match {stored} stored at index {index}")]
    SequenceMismatch {
        /// Received index.
        index: u16,
        /// Sequence number found in the buffer.
        stored: u16,
        /// Sequence number received from the host.
        received: u16,
    },
    /// Reset requested a channel outside of 11..=26.
    #[error("radio channel {0} is not within 11..=26")]
    InvalidChannel(u8),
    /// Not enough free space between the radio index and the acknowledged index.
    #[error("outbound buffer has no room for a {0} byte packet")]
    BufferFull(usize),
    /// Packet data does not fit in a single outbound packet.
    #[error("packet data of {0} bytes is too large")]
    PacketTooLarge(usize),
    /// The UART receive queue was full and a byte was dropped.
    #[error("UART receive queue overrun")]
    RxOverrun,
}
