//! RP2350 UART output adapter
//!
//! Implements `SerialPort` on a transmit-only UART. Writes block until the
//! bytes are in the hardware FIFO so a line is never interleaved with the
//! next one.

use embassy_rp::uart::{Blocking, UartTx};

use crate::ports::serial::{SerialError, SerialPort, LINE_ENDING};

/// Text stream over UART TX
pub struct Rp2350Uart<'a> {
    tx: UartTx<'a, Blocking>,
}

impl<'a> Rp2350Uart<'a> {
    /// Wrap a configured transmitter
    pub fn new(tx: UartTx<'a, Blocking>) -> Self {
        Self { tx }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        self.tx
            .blocking_write(bytes)
            .map_err(|_| SerialError::SendFailed)
    }
}

impl SerialPort for Rp2350Uart<'_> {
    async fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
        self.send(line.as_bytes())?;
        self.send(LINE_ENDING.as_bytes())?;
        self.tx
            .blocking_flush()
            .map_err(|_| SerialError::SendFailed)
    }
}
