//! UART serial communication abstractions
//!
//! Provides the byte-level receive trait a sensor needs to listen to the EV3
//! brick. Chip-specific HALs implement it; the protocol crate only consumes it.

/// Baud rate used by the EV3 while it probes for a sensor
pub const EV3_HANDSHAKE_BAUDRATE: u32 = 2400;

/// Highest speed the EV3 brick accepts after the handshake
pub const EV3_MAX_BAUDRATE: u32 = 460_800;

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Read data from the UART
    ///
    /// Blocks until at least one byte is available or an error occurs.
    /// Returns the number of bytes written into `buf`.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Read a single byte from the UART
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read_blocking(&mut buf)?;
        Ok(buf[0])
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    /// The EV3 link always starts at 2400 baud, 8N1
    fn default() -> Self {
        Self {
            baudrate: EV3_HANDSHAKE_BAUDRATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Same framing, different speed (used after the EV3 acknowledges the
    /// sensor and both ends switch to the negotiated rate)
    ///
    /// The rate is clamped to what the EV3 supports.
    pub fn with_baudrate(self, baudrate: u32) -> Self {
        Self {
            baudrate: baudrate.clamp(EV3_HANDSHAKE_BAUDRATE, EV3_MAX_BAUDRATE),
            ..self
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
