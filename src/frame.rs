//! HDLC-style frame reassembly.
//!
//! This module provides the [`Framer`], the byte-at-a-time state machine that
//! turns the drained UART stream back into host messages.
//!
//! ## Wire format
//!
//! `FLAG, <escaped bytes>, FLAG` where the escaped bytes are
//! `[type, length, payload.., crc_hi, crc_lo]` with every literal
//! [`HDLC_FLAG`] or [`HDLC_ESCAPE`] replaced by `HDLC_ESCAPE, byte ^ HDLC_ESCAPE_MASK`.
//! The CRC covers all unescaped bytes before it, so the running CRC over the
//! whole frame folds to zero for an intact frame.
//!
//! ## Errors
//!
//! Every error returned by [`Framer::process_byte`] means the same thing to the
//! caller: the host has to resend from the last acknowledged packet. The framer
//! already reset itself by the time the error is returned.

use heapless::Vec;

use crate::consts::{
    CRC_INIT, CRC_LEN, HDLC_ESCAPE, HDLC_ESCAPE_MASK, HDLC_FLAG, MESSAGE_HEADER_LEN,
    MIN_MESSAGE_LEN, SERIAL_RX_MAX_MESSAGE_LEN,
};
use crate::crc::crc_step;
use crate::error::FrameError;
use crate::message::Message;

/// Receive state of the [`Framer`].
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum RxState {
    /// Waiting for an opening delimiter.
    #[default]
    Idle,
    /// Inside a frame.
    Receiving {
        /// The previous byte was an escape marker.
        escaping: bool,
    },
}

/// Reassembles frames from a byte stream and validates them.
///
/// ## Example
///
/// ```rust,ignore
/// use sniffer_link::frame::Framer;
///
/// let mut framer = Framer::new();
/// for &byte in bytes {
///     match framer.process_byte(byte) {
///         Ok(Some(message)) => handle(message),
///         Ok(None) => {}
///         Err(_) => resend_from_acked(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Framer {
    state: RxState,
    crc: u16,
    message: Vec<u8, SERIAL_RX_MAX_MESSAGE_LEN>,
}

impl Framer {
    /// Creates an idle framer.
    pub const fn new() -> Self {
        Self {
            state: RxState::Idle,
            crc: CRC_INIT,
            message: Vec::new(),
        }
    }

    /// Current receive state.
    pub fn state(&self) -> RxState {
        self.state
    }

    /// Unescaped bytes of the frame in progress.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Feeds one byte from the UART.
    ///
    /// # Returns
    /// - `Ok(None)`: the byte was consumed, no frame completed
    /// - `Ok(Some(message))`: the byte closed a valid frame
    /// - `Err(_)`: the byte or the frame it closed was rejected
    pub fn process_byte(&mut self, byte: u8) -> Result<Option<Message>, FrameError> {
        if byte == HDLC_FLAG {
            return match self.state {
                RxState::Receiving { escaping } => self.end_of_frame(escaping),
                RxState::Idle => {
                    self.start_of_frame();
                    Ok(None)
                }
            };
        }

        let escaping = match self.state {
            RxState::Idle => return Err(FrameError::UnexpectedByte(byte)),
            RxState::Receiving { escaping } => escaping,
        };
        if self.message.is_full() {
            self.abort();
            return Err(FrameError::Overflow(SERIAL_RX_MAX_MESSAGE_LEN));
        }

        if byte == HDLC_ESCAPE {
            if escaping {
                self.abort();
                return Err(FrameError::DoubleEscape);
            }
            self.state = RxState::Receiving { escaping: true };
            return Ok(None);
        }

        let byte = if escaping {
            byte ^ HDLC_ESCAPE_MASK
        } else {
            byte
        };
        self.state = RxState::Receiving { escaping: false };
        if self.message.push(byte).is_err() {
            self.abort();
            return Err(FrameError::Overflow(SERIAL_RX_MAX_MESSAGE_LEN));
        }
        self.crc = crc_step(self.crc, byte);
        Ok(None)
    }

    /// Drops the frame in progress and waits for the next delimiter.
    pub fn abort(&mut self) {
        self.state = RxState::Idle;
        self.message.clear();
    }

    fn start_of_frame(&mut self) {
        self.state = RxState::Receiving { escaping: false };
        self.message.clear();
        self.crc = CRC_INIT;
    }

    fn end_of_frame(&mut self, escaping: bool) -> Result<Option<Message>, FrameError> {
        // Back to back delimiters: resync and treat the second one as an opener.
        if self.message.is_empty() {
            self.start_of_frame();
            return Err(FrameError::OutOfSync);
        }

        self.state = RxState::Idle;
        let len = self.message.len();
        if escaping {
            return Err(FrameError::TrailingEscape);
        }
        if len < MIN_MESSAGE_LEN {
            return Err(FrameError::TooShort(len));
        }
        if self.crc != 0 {
            return Err(FrameError::BadCrc(self.crc));
        }
        let declared = self.message[1];
        if len != usize::from(declared) + MESSAGE_HEADER_LEN + CRC_LEN {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: len - MESSAGE_HEADER_LEN - CRC_LEN,
            });
        }
        Message::decode(&self.message).map(Some)
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}
