//! Typed view of completed EV3 messages
//!
//! The parser reports outcomes and exposes its payload by reference; this
//! module turns a terminal outcome into an owned [`HostMessage`] that can
//! outlive the next byte.

use heapless::Vec;

use crate::framing::{
    frame_cmd_select_message, frame_cmd_write_message, frame_sys_message, FrameError,
    MAX_PAYLOAD_SIZE,
};
use crate::magics::SysMessage;
use crate::parser::{ParseResult, ParserReturn};

/// Why a terminal parser outcome did not yield a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Byte was not a recognised header
    InvalidHeader(u8),
    /// CMD frame arrived with a bad checksum
    InvalidChecksum { header: u8 },
    /// Payload view shorter than the length the header announced
    PayloadTruncated,
}

impl core::fmt::Display for MessageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MessageError::InvalidHeader(byte) => write!(f, "invalid header byte {:#04x}", byte),
            MessageError::InvalidChecksum { header } => {
                write!(f, "checksum mismatch on frame with header {:#04x}", header)
            }
            MessageError::PayloadTruncated => f.write_str("payload shorter than announced"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MessageError {}

/// A complete message from the EV3
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostMessage {
    /// SYS ACK
    Ack,
    /// SYS NACK
    Nack,
    /// CMD SELECT: switch to the given sensor mode
    Select { mode: u8 },
    /// CMD WRITE: opaque data, padded to a power of two by the EV3
    Write { payload: Vec<u8, MAX_PAYLOAD_SIZE> },
}

impl HostMessage {
    /// Build a message from a parser outcome and the parser's payload view
    ///
    /// Returns `Ok(None)` while the frame is still incomplete.
    pub fn from_parse(rtn: &ParserReturn, payload: &[u8]) -> Result<Option<Self>, MessageError> {
        match rtn.result {
            ParseResult::InsufficientData => Ok(None),
            ParseResult::ReceivedInvalidHeader => Err(MessageError::InvalidHeader(rtn.header)),
            ParseResult::ReceivedCmdInvalidFcs => {
                Err(MessageError::InvalidChecksum { header: rtn.header })
            }
            ParseResult::ReceivedSysAck => Ok(Some(HostMessage::Ack)),
            ParseResult::ReceivedSysNack => Ok(Some(HostMessage::Nack)),
            ParseResult::ReceivedCmdSelect => {
                let mode = *payload.first().ok_or(MessageError::PayloadTruncated)?;
                Ok(Some(HostMessage::Select { mode }))
            }
            ParseResult::ReceivedCmdWrite => {
                let data = payload
                    .get(..rtn.len as usize)
                    .ok_or(MessageError::PayloadTruncated)?;
                let mut payload = Vec::new();
                payload
                    .extend_from_slice(data)
                    .map_err(|_| MessageError::PayloadTruncated)?;
                Ok(Some(HostMessage::Write { payload }))
            }
        }
    }

    /// Encode this message as the EV3 would send it (for testing or simulation)
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        match self {
            HostMessage::Ack => frame_sys_message(buffer, SysMessage::Ack),
            HostMessage::Nack => frame_sys_message(buffer, SysMessage::Nack),
            HostMessage::Select { mode } => frame_cmd_select_message(buffer, *mode),
            HostMessage::Write { payload } => frame_cmd_write_message(buffer, payload),
        }
    }
}
