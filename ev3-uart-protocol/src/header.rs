//! Header byte classification
//!
//! Decides whether a byte can start a message the EV3 sends to a sensor and,
//! if so, how many payload bytes follow it.

use crate::framing::two_pow;
use crate::magics::{
    Command, SysMessage, CLASS_MASK, CMD_BASE, CMD_SELECT, CMD_WRITE, LENGTH_MASK, LENGTH_SHIFT,
    SUBTYPE_MASK, SYS_ACK, SYS_BASE, SYS_NACK,
};

/// Highest length code a WRITE header may carry (32-byte payload)
pub const MAX_WRITE_LENGTH_CODE: u8 = 5;

/// The message a valid header byte introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderKind {
    /// Complete one-byte SYS message
    Sys(SysMessage),
    /// CMD message followed by `payload_length` bytes and a checksum
    Cmd { command: Command, payload_length: u8 },
}

impl HeaderKind {
    /// Number of payload bytes following the header (0 for SYS)
    pub fn payload_length(&self) -> u8 {
        match self {
            HeaderKind::Sys(_) => 0,
            HeaderKind::Cmd { payload_length, .. } => *payload_length,
        }
    }
}

/// Result of classifying a single header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeaderInfo {
    /// Header with the length code cleared
    pub sanitized: u8,
    /// `None` if the byte is not a header the EV3 sends to sensors
    pub kind: Option<HeaderKind>,
}

impl HeaderInfo {
    /// Whether the byte is a recognised header
    pub fn is_valid(&self) -> bool {
        self.kind.is_some()
    }

    /// Payload bytes announced by the header (0 for SYS or invalid headers)
    pub fn payload_length(&self) -> u8 {
        self.kind.map_or(0, |kind| kind.payload_length())
    }

    /// Subtype bits of the sanitized header
    pub fn subtype(&self) -> u8 {
        self.sanitized & SUBTYPE_MASK
    }
}

/// Extract the 3-bit length code
pub const fn length_code(header: u8) -> u8 {
    (header & LENGTH_MASK) >> LENGTH_SHIFT
}

/// Clear the length code, leaving type and subtype
pub const fn sanitize(header: u8) -> u8 {
    header & CLASS_MASK
}

/// Classify a header byte
///
/// Valid headers:
/// - SYS ACK / SYS NACK with length code 0 (no payload)
/// - CMD SELECT with length code 0 (1-byte payload)
/// - CMD WRITE with length code 0..=5 (1 to 32-byte payload)
pub fn analyze_header(header: u8) -> HeaderInfo {
    let sanitized = sanitize(header);
    let code = length_code(header);

    let kind = match sanitized {
        c if c == SYS_BASE | SYS_ACK && code == 0 => Some(HeaderKind::Sys(SysMessage::Ack)),
        c if c == SYS_BASE | SYS_NACK && code == 0 => Some(HeaderKind::Sys(SysMessage::Nack)),
        c if c == CMD_BASE | CMD_SELECT && code == 0 => Some(HeaderKind::Cmd {
            command: Command::Select,
            payload_length: two_pow(code),
        }),
        c if c == CMD_BASE | CMD_WRITE && code <= MAX_WRITE_LENGTH_CODE => Some(HeaderKind::Cmd {
            command: Command::Write,
            payload_length: two_pow(code),
        }),
        _ => None,
    };

    HeaderInfo { sanitized, kind }
}
