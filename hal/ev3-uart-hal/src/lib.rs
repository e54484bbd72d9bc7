//! EV3 UART Hardware Abstraction Layer
//!
//! This crate defines the serial-port receive trait and line configuration a
//! sensor-side receiver needs. Chip-specific HALs implement the trait so the
//! same protocol code runs on any microcontroller wired to an EV3 input port.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Sensor firmware                        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ev3-uart-protocol (parser, receiver)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ev3-uart-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Contents
//!
//! - [`uart::UartRx`] - Serial reception
//! - [`uart::UartConfig`] - Line settings (baud rate, framing)

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{DataBits, Parity, StopBits, UartConfig, UartRx};
