//! Blocking sensor-side receive loop
//!
//! Pulls bytes from a [`UartRx`] one at a time and feeds them to a
//! [`Parser`], handing completed messages to the caller. The receiver also
//! tracks the line settings the UART is expected to run at, so a baud rate
//! switch and the matching parser reset happen together.

use ev3_uart_hal::{UartConfig, UartRx};

use crate::messages::{HostMessage, MessageError};
use crate::parser::{Parser, ParserReturn};

/// Errors surfaced by [`SensorReceiver::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveError<E> {
    /// The UART reported an error; the parser has been reset
    Uart(E),
}

/// Counters for bytes and frames the receiver threw away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Complete messages handed to the caller
    pub messages: u32,
    /// Bytes rejected as header candidates
    pub invalid_headers: u32,
    /// CMD frames dropped for a bad checksum
    pub checksum_errors: u32,
    /// Parser resets caused by UART errors, baud rate changes or the caller
    pub resets: u32,
    /// CMD frames whose payload view was shorter than the announced length
    pub payload_errors: u32,
}

/// Owns the UART receiver and the parser for one EV3 port
pub struct SensorReceiver<R> {
    rx: R,
    config: UartConfig,
    parser: Parser,
    stats: LinkStats,
}

impl<R: UartRx> SensorReceiver<R> {
    /// Wrap a UART already configured with `config`
    pub fn new(rx: R, config: UartConfig) -> Self {
        Self {
            rx,
            config,
            parser: Parser::new(),
            stats: LinkStats::default(),
        }
    }

    /// Read and parse one byte
    ///
    /// Returns `Ok(Some(msg))` when the byte completed a message, `Ok(None)`
    /// when more bytes are needed or the byte was discarded.
    pub fn poll(&mut self) -> Result<Option<HostMessage>, ReceiveError<R::Error>> {
        let byte = match self.rx.read_byte() {
            Ok(byte) => byte,
            Err(e) => {
                // Whatever was in flight is lost
                self.reset();
                return Err(ReceiveError::Uart(e));
            }
        };

        let rtn = self.parser.update(byte);
        let outcome = HostMessage::from_parse(&rtn, self.parser.payload());
        Ok(self.dispatch(&rtn, outcome))
    }

    #[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
    fn dispatch(
        &mut self,
        rtn: &ParserReturn,
        outcome: Result<Option<HostMessage>, MessageError>,
    ) -> Option<HostMessage> {
        match outcome {
            Ok(Some(msg)) => {
                self.stats.messages = self.stats.messages.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::debug!("EV3 message: {:?}", msg);
                Some(msg)
            }
            Ok(None) => None,
            Err(MessageError::InvalidHeader(_header)) => {
                self.stats.invalid_headers = self.stats.invalid_headers.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::trace!("Discarding non-header byte {=u8:#x}", _header);
                None
            }
            Err(MessageError::InvalidChecksum { header: _header }) => {
                self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Checksum mismatch on CMD {=u8:#x} ({} byte payload)",
                    _header,
                    rtn.len
                );
                None
            }
            Err(MessageError::PayloadTruncated) => {
                self.stats.payload_errors = self.stats.payload_errors.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "Payload of CMD {=u8:#x} shorter than {} bytes",
                    rtn.header,
                    rtn.len
                );
                None
            }
        }
    }

    /// Poll until a message arrives
    ///
    /// UART errors are returned immediately.
    pub fn receive(&mut self) -> Result<HostMessage, ReceiveError<R::Error>> {
        loop {
            if let Some(msg) = self.poll()? {
                return Ok(msg);
            }
        }
    }

    /// Drop any partial frame, e.g. after a baud rate change
    pub fn reset(&mut self) {
        self.stats.resets = self.stats.resets.wrapping_add(1);
        #[cfg(feature = "defmt")]
        defmt::debug!("Resetting EV3 parser");
        self.parser.reset_state();
    }

    /// Switch to a new line speed, dropping any partial frame
    ///
    /// The rate is clamped to what the EV3 supports. Returns the settings the
    /// caller must apply to the UART hardware.
    pub fn set_baudrate(&mut self, baudrate: u32) -> UartConfig {
        self.config = self.config.with_baudrate(baudrate);
        #[cfg(feature = "defmt")]
        defmt::info!("EV3 link now at {} baud", self.config.baudrate);
        self.reset();
        self.config
    }

    /// Line settings the UART is expected to run at
    pub fn config(&self) -> UartConfig {
        self.config
    }

    /// Counters accumulated since construction
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// The underlying parser, for inspecting its state or payload
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Give the UART and its line settings back, e.g. to reconfigure it
    pub fn into_parts(self) -> (R, UartConfig) {
        (self.rx, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{frame_cmd_select_message, frame_cmd_write_message, BUFFER_MIN};
    use crate::parser::ParseResult;
    use heapless::Vec;

    /// UART fed from a fixed script of bytes and errors
    struct ScriptedRx {
        script: Vec<Result<u8, ()>, 64>,
        pos: usize,
    }

    impl ScriptedRx {
        fn new(script: &[Result<u8, ()>]) -> Self {
            let mut v = Vec::new();
            v.extend_from_slice(script).unwrap();
            Self { script: v, pos: 0 }
        }

        fn from_bytes(bytes: &[u8]) -> Self {
            let mut v = Vec::new();
            for &b in bytes {
                v.push(Ok(b)).unwrap();
            }
            Self { script: v, pos: 0 }
        }
    }

    impl UartRx for ScriptedRx {
        type Error = ();

        fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let next = *self.script.get(self.pos).ok_or(())?;
            self.pos += 1;
            buf[0] = next?;
            Ok(1)
        }
    }

    #[test]
    fn test_receive_select() {
        let mut frame = [0u8; BUFFER_MIN];
        let len = frame_cmd_select_message(&mut frame, 4).unwrap();

        let uart = ScriptedRx::from_bytes(&frame[..len]);
        let mut rx = SensorReceiver::new(uart, UartConfig::default());
        assert_eq!(rx.receive(), Ok(HostMessage::Select { mode: 4 }));
        assert_eq!(rx.stats().messages, 1);
    }

    #[test]
    fn test_skips_garbage_and_bad_checksum() {
        let mut bytes: Vec<u8, 64> = Vec::new();
        bytes.extend_from_slice(&[0xC0, 0xC0, 0xFF]).unwrap();
        bytes.extend_from_slice(&[0x43, 0x01, 0x00]).unwrap(); // bad checksum
        bytes.push(0x04).unwrap(); // ACK

        let mut rx = SensorReceiver::new(ScriptedRx::from_bytes(&bytes), UartConfig::default());
        assert_eq!(rx.receive(), Ok(HostMessage::Ack));

        let stats = rx.stats();
        assert_eq!(stats.invalid_headers, 3);
        assert_eq!(stats.checksum_errors, 1);
        assert_eq!(stats.messages, 1);
    }

    #[test]
    fn test_uart_error_resets_parser() {
        let mut frame = [0u8; BUFFER_MIN];
        let len = frame_cmd_write_message(&mut frame, &[1, 2, 3, 4]).unwrap();

        let mut script: Vec<Result<u8, ()>, 64> = Vec::new();
        script.push(Ok(frame[0])).unwrap();
        script.push(Ok(frame[1])).unwrap();
        script.push(Err(())).unwrap();
        for &b in &frame[..len] {
            script.push(Ok(b)).unwrap();
        }

        let mut rx = SensorReceiver::new(ScriptedRx::new(&script), UartConfig::default());
        assert_eq!(rx.poll(), Ok(None));
        assert_eq!(rx.poll(), Ok(None));
        assert!(!rx.parser().is_waiting_for_header());

        assert_eq!(rx.poll(), Err(ReceiveError::Uart(())));
        assert!(rx.parser().is_waiting_for_header());
        assert_eq!(rx.stats().resets, 1);

        let mut expected = Vec::new();
        expected.extend_from_slice(&[1, 2, 3, 4]).unwrap();
        assert_eq!(rx.receive(), Ok(HostMessage::Write { payload: expected }));
    }

    #[test]
    fn test_end_of_script_is_uart_error() {
        let mut rx = SensorReceiver::new(ScriptedRx::from_bytes(&[0x43]), UartConfig::default());
        assert_eq!(rx.receive(), Err(ReceiveError::Uart(())));

        let (uart, config) = rx.into_parts();
        assert_eq!(uart.pos, 1);
        assert_eq!(config, UartConfig::default());
    }

    #[test]
    fn test_set_baudrate_resets_parser() {
        let mut frame = [0u8; BUFFER_MIN];
        let len = frame_cmd_select_message(&mut frame, 2).unwrap();

        let mut script: Vec<u8, 64> = Vec::new();
        script.extend_from_slice(&[0x5C, 0x11, 0x22]).unwrap(); // 8-byte WRITE, cut short
        script.extend_from_slice(&frame[..len]).unwrap();

        let mut rx = SensorReceiver::new(ScriptedRx::from_bytes(&script), UartConfig::default());
        for _ in 0..3 {
            assert_eq!(rx.poll(), Ok(None));
        }
        assert!(!rx.parser().is_waiting_for_header());

        let config = rx.set_baudrate(57_600);
        assert_eq!(config.baudrate, 57_600);
        assert_eq!(rx.config(), config);
        assert!(rx.parser().is_waiting_for_header());
        assert_eq!(rx.stats().resets, 1);

        assert_eq!(rx.receive(), Ok(HostMessage::Select { mode: 2 }));
    }

    #[test]
    fn test_set_baudrate_clamps_to_ev3_range() {
        let mut rx = SensorReceiver::new(ScriptedRx::from_bytes(&[]), UartConfig::default());
        assert_eq!(rx.set_baudrate(2_000_000).baudrate, 460_800);
        assert_eq!(rx.set_baudrate(1200).baudrate, 2400);
    }

    #[test]
    fn test_truncated_payload_is_counted() {
        let mut rx = SensorReceiver::new(ScriptedRx::from_bytes(&[]), UartConfig::default());
        let rtn = ParserReturn {
            result: ParseResult::ReceivedCmdWrite,
            header: 0x5C,
            len: 8,
        };
        let outcome = HostMessage::from_parse(&rtn, &[1, 2, 3]);
        assert_eq!(outcome, Err(MessageError::PayloadTruncated));

        assert_eq!(rx.dispatch(&rtn, outcome), None);
        let stats = rx.stats();
        assert_eq!(stats.payload_errors, 1);
        assert_eq!(stats.messages, 0);
    }
}
