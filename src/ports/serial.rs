//! Serial port - abstraction for the outgoing text stream
//!
//! This trait allows the acquisition loop to emit lines without knowing
//! the specific transport (UART, USB CDC, test sink).

use core::fmt;
use core::future::Future;

/// Line terminator appended by every adapter
pub const LINE_ENDING: &str = "\r\n";

/// Error type for serial output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// Transport rejected the write
    SendFailed,
    /// No host connected
    Disconnected,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed => write!(f, "serial write failed"),
            Self::Disconnected => write!(f, "serial link disconnected"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SerialError {}

/// Port for the append-only, single-writer output stream
///
/// # Example Implementation
///
/// ```ignore
/// impl SerialPort for Rp2350Uart<'_> {
///     async fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
///         self.tx.blocking_write(line.as_bytes()).map_err(|_| SerialError::SendFailed)?;
///         self.tx.blocking_write(LINE_ENDING.as_bytes()).map_err(|_| SerialError::SendFailed)
///     }
/// }
/// ```
pub trait SerialPort {
    /// Write `line` followed by [`LINE_ENDING`]
    fn write_line(&mut self, line: &str) -> impl Future<Output = Result<(), SerialError>>;
}
