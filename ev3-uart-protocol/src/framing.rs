//! Frame encoding for messages sent by the EV3
//!
//! Frame format:
//! - HEADER (1 byte): type, length code, subtype (see [`crate::magics`])
//! - PAYLOAD (0 or 2^n bytes, n in 0..=5): message data
//! - CHECKSUM (1 byte): 0xFF XOR HEADER XOR all PAYLOAD bytes
//!
//! SYS messages are a lone header byte with neither payload nor checksum.
//!
//! The encoder mirrors what the EV3 puts on the wire and is used to build
//! frames for tests and host-side simulation.

use crate::magics::{Command, SysMessage};

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Smallest buffer able to hold any frame (HEADER + MAX_PAYLOAD + CHECKSUM)
pub const BUFFER_MIN: usize = 1 + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during frame encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// WRITE messages carry at least one byte
    EmptyPayload,
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::EmptyPayload => f.write_str("WRITE payload is empty"),
            FrameError::PayloadTooLarge => f.write_str("payload exceeds 32 bytes"),
            FrameError::BufferTooSmall => f.write_str("output buffer too small for frame"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

/// Raises two to the power of `code`
///
/// Only the low three bits of `code` are used, so the result never
/// overflows a byte.
pub const fn two_pow(code: u8) -> u8 {
    1 << (code & 0x07)
}

/// Smallest length code whose payload size holds `len` bytes
///
/// `len` of 0 maps to code 0. Lengths above 128 saturate at code 7.
pub const fn log2_ceil(len: usize) -> u8 {
    let mut code = 0u8;
    while code < 7 && (1usize << code) < len {
        code += 1;
    }
    code
}

/// Checksum over a header byte and its payload
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0xFF, |acc, &b| acc ^ b)
}

/// Encode a SYS message
///
/// Returns the number of bytes written (always 1).
pub fn frame_sys_message(buffer: &mut [u8], msg: SysMessage) -> Result<usize, FrameError> {
    let slot = buffer.first_mut().ok_or(FrameError::BufferTooSmall)?;
    *slot = msg.to_byte();
    Ok(1)
}

/// Encode a CMD SELECT message choosing `mode`
///
/// Returns the number of bytes written.
pub fn frame_cmd_select_message(buffer: &mut [u8], mode: u8) -> Result<usize, FrameError> {
    frame_command(buffer, Command::Select, 0, &[mode])
}

/// Encode a CMD WRITE message
///
/// The payload is zero-padded up to the next power of two, which is the
/// length the header advertises. Returns the number of bytes written.
pub fn frame_cmd_write_message(buffer: &mut [u8], payload: &[u8]) -> Result<usize, FrameError> {
    if payload.is_empty() {
        return Err(FrameError::EmptyPayload);
    }
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }
    frame_command(buffer, Command::Write, log2_ceil(payload.len()), payload)
}

fn frame_command(
    buffer: &mut [u8],
    command: Command,
    length_code: u8,
    payload: &[u8],
) -> Result<usize, FrameError> {
    let padded_len = two_pow(length_code) as usize;
    let frame_len = 1 + padded_len + 1;
    if buffer.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    buffer[0] = command.header(length_code);
    buffer[1..1 + payload.len()].copy_from_slice(payload);
    buffer[1 + payload.len()..1 + padded_len].fill(0);
    buffer[1 + padded_len] = checksum(&buffer[..1 + padded_len]);

    Ok(frame_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_pow() {
        let expected = [1u8, 2, 4, 8, 16, 32, 64, 128];
        for (code, &value) in expected.iter().enumerate() {
            assert_eq!(two_pow(code as u8), value);
        }
    }

    #[test]
    fn test_log2_ceil_rounds_up() {
        assert_eq!(log2_ceil(1), 0);
        assert_eq!(log2_ceil(2), 1);
        assert_eq!(log2_ceil(3), 2);
        assert_eq!(log2_ceil(4), 2);
        assert_eq!(log2_ceil(5), 3);
        assert_eq!(log2_ceil(12), 4);
        assert_eq!(log2_ceil(17), 5);
        assert_eq!(log2_ceil(32), 5);
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(&[]), 0xFF);
        assert_eq!(checksum(&[0x43, 0x01]), 0xFF ^ 0x43 ^ 0x01);
        // Running the checksum over a frame including its own checksum gives zero
        let mut buffer = [0u8; BUFFER_MIN];
        let len = frame_cmd_write_message(&mut buffer, b"Goodbye").unwrap();
        assert_eq!(checksum(&buffer[..len]), 0x00);
    }

    #[test]
    fn test_frame_sys_message() {
        let mut buffer = [0u8; 1];
        assert_eq!(frame_sys_message(&mut buffer, SysMessage::Nack), Ok(1));
        assert_eq!(buffer[0], 0x02);
        assert_eq!(
            frame_sys_message(&mut [], SysMessage::Ack),
            Err(FrameError::BufferTooSmall)
        );
    }

    #[test]
    fn test_frame_cmd_select_message() {
        let mut buffer = [0u8; BUFFER_MIN];
        let len = frame_cmd_select_message(&mut buffer, 0x02).unwrap();

        assert_eq!(len, 3);
        assert_eq!(buffer[0], 0x43);
        assert_eq!(buffer[1], 0x02);
        assert_eq!(buffer[2], 0xFF ^ 0x43 ^ 0x02);
    }

    #[test]
    fn test_frame_cmd_write_message_pads_payload() {
        let mut buffer = [0xEEu8; BUFFER_MIN];
        let len = frame_cmd_write_message(&mut buffer, &[1, 2, 3]).unwrap();

        assert_eq!(len, 6); // header + 4 payload + checksum
        assert_eq!(buffer[0], 0x54); // WRITE, length code 2
        assert_eq!(&buffer[1..5], &[1, 2, 3, 0]);
        assert_eq!(buffer[5], checksum(&buffer[..5]));
    }

    #[test]
    fn test_frame_cmd_write_message_max_payload() {
        let payload = [0x5Au8; MAX_PAYLOAD_SIZE];
        let mut buffer = [0u8; BUFFER_MIN];
        let len = frame_cmd_write_message(&mut buffer, &payload).unwrap();

        assert_eq!(len, BUFFER_MIN);
        assert_eq!(buffer[0], 0x6C);
    }

    #[test]
    fn test_frame_cmd_write_message_errors() {
        let mut buffer = [0u8; BUFFER_MIN];
        assert_eq!(
            frame_cmd_write_message(&mut buffer, &[]),
            Err(FrameError::EmptyPayload)
        );
        assert_eq!(
            frame_cmd_write_message(&mut buffer, &[0u8; MAX_PAYLOAD_SIZE + 1]),
            Err(FrameError::PayloadTooLarge)
        );
        let mut small = [0u8; 5];
        assert_eq!(
            frame_cmd_write_message(&mut small, &[1, 2, 3, 4]),
            Err(FrameError::BufferTooSmall)
        );
    }
}
