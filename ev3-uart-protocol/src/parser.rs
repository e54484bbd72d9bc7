//! Streaming parser for messages sent by the EV3 to a sensor
//!
//! Bytes are fed one at a time with [`Parser::update`]. Every call returns a
//! [`ParserReturn`] describing what the byte completed, if anything. The
//! parser holds at most one frame in a fixed 34-byte buffer and never
//! allocates.
//!
//! ```text
//!                   invalid / SYS
//!                  ┌─────────┐
//!                  ▼         │
//!        ┌──────────────────────┐   CMD header   ┌──────────────────────┐
//!  ────► │  WaitingForHeader    │ ─────────────► │  WaitingForPayload   │ ◄─┐
//!        └──────────────────────┘                └──────────────────────┘   │
//!                  ▲                                 │   remaining > 0      │
//!                  │           checksum byte         │ ─────────────────────┘
//!                  └─────────────────────────────────┘
//! ```

use heapless::Vec;

use crate::framing::{checksum, BUFFER_MIN};
use crate::header::{analyze_header, HeaderKind};
use crate::magics::{Command, SysMessage};

/// Size of the parser's frame buffer (header + 32-byte payload + checksum)
pub const BUFFER_LEN: usize = BUFFER_MIN;

/// Outcome of feeding one byte to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseResult {
    /// The frame is not complete yet; feed the next byte
    InsufficientData,
    /// The byte is not a header the EV3 sends to sensors
    ///
    /// Either the type is not SYS/CMD, the subtype is not ACK/NACK or
    /// SELECT/WRITE, or the length code does not fit the subtype.
    ReceivedInvalidHeader,
    /// SYS ACK
    ReceivedSysAck,
    /// SYS NACK
    ReceivedSysNack,
    /// CMD SELECT with a good checksum
    ReceivedCmdSelect,
    /// CMD WRITE with a good checksum
    ReceivedCmdWrite,
    /// CMD message whose checksum did not match
    ReceivedCmdInvalidFcs,
}

impl ParseResult {
    /// Whether a message (good or bad) ended with this byte
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ParseResult::InsufficientData)
    }

    /// Whether the payload view holds a CMD payload
    pub fn has_payload(&self) -> bool {
        matches!(
            self,
            ParseResult::ReceivedCmdSelect
                | ParseResult::ReceivedCmdWrite
                | ParseResult::ReceivedCmdInvalidFcs
        )
    }
}

/// Value returned by [`Parser::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParserReturn {
    /// What the byte completed
    pub result: ParseResult,
    /// Most recently received header byte (valid or not)
    pub header: u8,
    /// Payload length; only meaningful for `ReceivedCmd*` results, 0 otherwise
    pub len: u8,
}

impl ParserReturn {
    fn new(result: ParseResult, header: u8) -> Self {
        Self {
            result,
            header,
            len: 0,
        }
    }

    /// Payload length, if the result carries one
    pub fn payload_length(&self) -> Option<u8> {
        self.result.has_payload().then_some(self.len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Next byte is a header candidate
    WaitingForHeader,
    /// Header accepted; collecting payload then checksum
    WaitingForPayload {
        command: Command,
        payload_length: u8,
        remaining: u8,
    },
}

/// Sensor-side parser for EV3 messages
///
/// # Example
///
/// ```
/// use ev3_uart_protocol::{ParseResult, Parser};
///
/// let mut parser = Parser::new();
/// let frame = [0x43, 0x02, 0xFF ^ 0x43 ^ 0x02]; // CMD SELECT mode 2
///
/// assert_eq!(parser.update(frame[0]).result, ParseResult::InsufficientData);
/// assert_eq!(parser.update(frame[1]).result, ParseResult::InsufficientData);
///
/// let rtn = parser.update(frame[2]);
/// assert_eq!(rtn.result, ParseResult::ReceivedCmdSelect);
/// assert_eq!(parser.payload(), &[0x02]);
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    state: ParseState,
    /// `[0]` header, `[1..=len]` payload, `[len + 1]` checksum
    buffer: Vec<u8, BUFFER_LEN>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser waiting for a header byte
    pub const fn new() -> Self {
        Self {
            state: ParseState::WaitingForHeader,
            buffer: Vec::new(),
        }
    }

    /// Feed a single byte received from the EV3
    pub fn update(&mut self, byte: u8) -> ParserReturn {
        match self.state {
            ParseState::WaitingForHeader => self.accept_header(byte),
            ParseState::WaitingForPayload {
                command,
                payload_length,
                remaining,
            } => self.accept_body(byte, command, payload_length, remaining),
        }
    }

    fn accept_header(&mut self, byte: u8) -> ParserReturn {
        self.buffer.clear();
        // Cannot fail: the buffer was just cleared
        let _ = self.buffer.push(byte);

        let result = match analyze_header(byte).kind {
            None => ParseResult::ReceivedInvalidHeader,
            Some(HeaderKind::Sys(SysMessage::Ack)) => ParseResult::ReceivedSysAck,
            Some(HeaderKind::Sys(SysMessage::Nack)) => ParseResult::ReceivedSysNack,
            Some(HeaderKind::Cmd {
                command,
                payload_length,
            }) => {
                self.state = ParseState::WaitingForPayload {
                    command,
                    payload_length,
                    remaining: payload_length + 1,
                };
                ParseResult::InsufficientData
            }
        };

        ParserReturn::new(result, byte)
    }

    fn accept_body(
        &mut self,
        byte: u8,
        command: Command,
        payload_length: u8,
        remaining: u8,
    ) -> ParserReturn {
        // Cannot fail: payload_length <= 32 bounds the frame to BUFFER_LEN
        let _ = self.buffer.push(byte);
        let remaining = remaining - 1;
        let header = self.header();

        if remaining > 0 {
            self.state = ParseState::WaitingForPayload {
                command,
                payload_length,
                remaining,
            };
            return ParserReturn::new(ParseResult::InsufficientData, header);
        }

        self.state = ParseState::WaitingForHeader;

        let fcs_index = payload_length as usize + 1;
        let result = if checksum(&self.buffer[..fcs_index]) != self.buffer[fcs_index] {
            ParseResult::ReceivedCmdInvalidFcs
        } else {
            match command {
                Command::Select => ParseResult::ReceivedCmdSelect,
                Command::Write => ParseResult::ReceivedCmdWrite,
            }
        };

        ParserReturn {
            result,
            header,
            len: payload_length,
        }
    }

    /// Most recently received header byte (0 before the first byte)
    pub fn header(&self) -> u8 {
        self.buffer.first().copied().unwrap_or(0)
    }

    /// Payload of the current or just-completed CMD message
    ///
    /// After a `ReceivedCmd*` result this is exactly the payload. After SYS
    /// or invalid-header results it is empty. While a frame is in progress
    /// it holds the payload bytes received so far.
    ///
    /// The contents are overwritten by the next call to [`Parser::update`];
    /// copy them out if they are needed afterwards.
    pub fn payload(&self) -> &[u8] {
        let end = self.payload_end();
        &self.buffer[end.min(1)..end]
    }

    /// Mutable view of the same bytes as [`Parser::payload`]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let end = self.payload_end();
        &mut self.buffer[end.min(1)..end]
    }

    /// Raw bytes of the current frame as received (header, payload, checksum)
    pub fn frame(&self) -> &[u8] {
        &self.buffer
    }

    /// Whether the next byte will be treated as a header candidate
    pub fn is_waiting_for_header(&self) -> bool {
        self.state == ParseState::WaitingForHeader
    }

    /// Discard any partial frame; the next byte is treated as a header
    ///
    /// Call this when the transport reports a discontinuity (line break,
    /// baud rate change, reconnect). Buffer contents are left in place and
    /// are meaningless until overwritten.
    pub fn reset_state(&mut self) {
        self.state = ParseState::WaitingForHeader;
    }

    fn payload_end(&self) -> usize {
        let announced = analyze_header(self.header()).payload_length() as usize;
        (announced + 1).min(self.buffer.len())
    }
}
