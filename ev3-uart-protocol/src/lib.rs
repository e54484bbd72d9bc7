//! EV3 UART Sensor Protocol, sensor side
//!
//! This crate decodes the messages an EV3 brick sends to a UART sensor. It is
//! written for microcontrollers: bytes are parsed one at a time into a fixed
//! 34-byte buffer, with no allocation and no recursion.
//!
//! # Protocol Overview
//!
//! Every message starts with a header byte. SYS messages are the header
//! alone; CMD messages carry a power-of-two payload and a checksum:
//! ```text
//! ┌────────┬──────────────────┬──────────┐
//! │ HEADER │ PAYLOAD          │ CHECKSUM │
//! │ 1B     │ 1/2/4/8/16/32B   │ 1B       │
//! └────────┴──────────────────┴──────────┘
//! ```
//!
//! The messages understood here are SYS ACK/NACK and CMD SELECT/WRITE. The
//! sensor never answers through this crate; replies are the caller's job.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

pub mod framing;
pub mod header;
pub mod magics;
pub mod messages;
pub mod parser;
pub mod receiver;

pub use framing::{checksum, FrameError, BUFFER_MIN, MAX_PAYLOAD_SIZE};
pub use header::{analyze_header, HeaderInfo, HeaderKind};
pub use magics::{Command, SysMessage};
pub use messages::{HostMessage, MessageError};
pub use parser::{ParseResult, Parser, ParserReturn, BUFFER_LEN};
pub use receiver::{LinkStats, ReceiveError, SensorReceiver};
