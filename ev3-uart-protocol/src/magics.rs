//! Header byte catalog for messages sent by the EV3
//!
//! A header byte packs three fields:
//! ```text
//!  7   6   5   4   3   2   1   0
//! ┌───────┬───────────┬───────────┐
//! │ TYPE  │ LENGTH    │ SUBTYPE   │
//! └───────┴───────────┴───────────┘
//! ```
//! LENGTH is a power-of-two exponent; the payload is `2^LENGTH` bytes for
//! message classes that carry one.

/// Bits 6-7: message type
pub const TYPE_MASK: u8 = 0xC0;
/// Bits 3-5: payload length code
pub const LENGTH_MASK: u8 = 0x38;
/// Bits 0-2: message subtype
pub const SUBTYPE_MASK: u8 = 0x07;
/// Clears the length code, keeping type and subtype
pub const CLASS_MASK: u8 = TYPE_MASK | SUBTYPE_MASK;
/// Position of the length code within the header byte
pub const LENGTH_SHIFT: u8 = 3;

// Message types
pub const SYS_BASE: u8 = 0x00;
pub const CMD_BASE: u8 = 0x40;
pub const INFO_BASE: u8 = 0x80;
pub const DATA_BASE: u8 = 0xC0;

// SYS subtypes
pub const SYS_SYNC: u8 = 0x00;
pub const SYS_NACK: u8 = 0x02;
pub const SYS_ACK: u8 = 0x04;
pub const SYS_ESC: u8 = 0x06;

// CMD subtypes
pub const CMD_TYPE: u8 = 0x00;
pub const CMD_MODES: u8 = 0x01;
pub const CMD_SPEED: u8 = 0x02;
pub const CMD_SELECT: u8 = 0x03;
pub const CMD_WRITE: u8 = 0x04;

/// Single-byte SYS messages the EV3 may send to a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysMessage {
    /// Acknowledge (handshake complete, or keep-alive)
    Ack,
    /// Not-acknowledge (EV3 wants a fresh data message)
    Nack,
}

impl SysMessage {
    /// Full header byte for this message
    pub fn to_byte(self) -> u8 {
        match self {
            SysMessage::Ack => SYS_BASE | SYS_ACK,
            SysMessage::Nack => SYS_BASE | SYS_NACK,
        }
    }

    /// Parse a SYS message from a complete header byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b if b == SYS_BASE | SYS_ACK => Some(SysMessage::Ack),
            b if b == SYS_BASE | SYS_NACK => Some(SysMessage::Nack),
            _ => None,
        }
    }
}

/// CMD messages the EV3 may send to a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Select a sensor mode (1-byte payload)
    Select,
    /// Write arbitrary data to the sensor
    Write,
}

impl Command {
    /// Header class (type and subtype, length code cleared)
    pub fn class(self) -> u8 {
        match self {
            Command::Select => CMD_BASE | CMD_SELECT,
            Command::Write => CMD_BASE | CMD_WRITE,
        }
    }

    /// Full header byte for this command with the given length code
    pub fn header(self, length_code: u8) -> u8 {
        self.class() | ((length_code & 0x07) << LENGTH_SHIFT)
    }
}
