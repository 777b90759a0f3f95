//! Messages the host sends to the sniffer.
//!
//! After unescaping, every frame is laid out as
//! `[type, length, payload.., crc_hi, crc_lo]` where `length` counts the
//! payload bytes only. Each message type has exactly one legal length; a
//! known type with any other length is treated like an unknown type.
//!
//! | Type    | Value  | Length | Payload                          |
//! |---------|--------|--------|----------------------------------|
//! | `Ack`   | `0x01` | 4      | buffer index, sequence number    |
//! | `Nack`  | `0x02` | 4      | buffer index, sequence number    |
//! | `Reset` | `0x03` | 1      | radio channel                    |
//! | `Stop`  | `0x04` | 0      |                                  |
//!
//! Multi-byte fields are big-endian.

use crate::consts::{
    ACK_INDEX_OFFSET, ACK_MESSAGE_LENGTH, ACK_SEQNR_OFFSET, MAX_CHANNEL, MIN_CHANNEL,
    NACK_MESSAGE_LENGTH, RESET_CHANNEL_OFFSET, RESET_MESSAGE_LENGTH, STOP_MESSAGE_LENGTH,
};
use crate::error::{FrameError, LinkError};

/// Type byte of a host message.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Acknowledges a packet; the sniffer may forget it.
    Ack = 0x01,
    /// Acknowledges a packet and asks for everything after it again.
    Nack = 0x02,
    /// Clears all state and starts sniffing on a channel.
    Reset = 0x03,
    /// Clears all state and stops sniffing.
    Stop = 0x04,
}

impl MessageType {
    /// The only payload length accepted for this type.
    pub const fn payload_len(self) -> u8 {
        match self {
            MessageType::Ack => ACK_MESSAGE_LENGTH,
            MessageType::Nack => NACK_MESSAGE_LENGTH,
            MessageType::Reset => RESET_MESSAGE_LENGTH,
            MessageType::Stop => STOP_MESSAGE_LENGTH,
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(MessageType::Ack),
            0x02 => Ok(MessageType::Nack),
            0x03 => Ok(MessageType::Reset),
            0x04 => Ok(MessageType::Stop),
            other => Err(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(kind: MessageType) -> Self {
        kind as u8
    }
}

/// An IEEE 802.15.4 channel in the 2.4 GHz band (11 to 26).
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    /// Validates a raw channel number.
    pub fn new(channel: u8) -> Result<Self, LinkError> {
        if (MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            Ok(Channel(channel))
        } else {
            Err(LinkError::InvalidChannel(channel))
        }
    }

    /// The raw channel number.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Channel {
    type Error = LinkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Channel::new(value)
    }
}

/// A decoded host message.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// See [`MessageType::Ack`].
    Ack {
        /// Buffer index of the acknowledged packet.
        index: u16,
        /// Sequence number of the acknowledged packet.
        seq_nr: u16,
    },
    /// See [`MessageType::Nack`].
    Nack {
        /// Buffer index of the last packet the host received intact.
        index: u16,
        /// Sequence number of that packet.
        seq_nr: u16,
    },
    /// See [`MessageType::Reset`]. The channel is validated by the handler,
    /// not by the decoder.
    Reset {
        /// Requested radio channel.
        channel: u8,
    },
    /// See [`MessageType::Stop`].
    Stop,
}

impl Message {
    /// Decodes an unescaped frame whose length and CRC were already checked.
    ///
    /// # Arguments
    /// - `frame`: `[type, length, payload.., crc_hi, crc_lo]`
    ///
    /// # Returns
    /// [`FrameError::UnknownType`] for an unknown type byte or a length that does
    /// not belong to the type.
    pub fn decode(frame: &[u8]) -> Result<Self, FrameError> {
        let (kind, len) = match frame {
            [kind, len, ..] => (*kind, *len),
            _ => return Err(FrameError::TooShort(frame.len())),
        };
        let unknown = FrameError::UnknownType { kind, len };
        let kind = MessageType::try_from(kind).map_err(|_| unknown)?;
        if len != kind.payload_len() || frame.len() < usize::from(len) + 2 {
            return Err(unknown);
        }

        let message = match kind {
            MessageType::Ack => Message::Ack {
                index: read_u16(frame, ACK_INDEX_OFFSET),
                seq_nr: read_u16(frame, ACK_SEQNR_OFFSET),
            },
            MessageType::Nack => Message::Nack {
                index: read_u16(frame, ACK_INDEX_OFFSET),
                seq_nr: read_u16(frame, ACK_SEQNR_OFFSET),
            },
            MessageType::Reset => Message::Reset {
                channel: frame[RESET_CHANNEL_OFFSET],
            },
            MessageType::Stop => Message::Stop,
        };
        Ok(message)
    }

    /// The type byte of this message.
    pub fn kind(&self) -> MessageType {
        match self {
            Message::Ack { .. } => MessageType::Ack,
            Message::Nack { .. } => MessageType::Nack,
            Message::Reset { .. } => MessageType::Reset,
            Message::Stop => MessageType::Stop,
        }
    }
}

// Callers check the length first.
fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}
