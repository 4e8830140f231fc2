//! Acquisition loop - configure once, sample forever
//!
//! ```text
//!            start()
//!   INIT ──────────────► RUNNING ──┐ cycle(): acquire → format → emit → pace
//!     │                     ▲      │
//!     │ sensor absent       └──────┘
//!     ▼
//!   FATAL (one diagnostic line, caller halts)
//! ```
//!
//! [`AcquisitionLoop`] is the configured but not yet started loop;
//! [`AcquisitionLoop::start`] turns it into [`Running`] or a
//! [`FatalInitError`]. A `Running` loop has no sub-states: every cycle is
//! structurally identical regardless of history.

mod ecg;
mod optical;
mod runner;

use core::fmt;
use core::future::Future;

use crate::domain::{FormatError, Gates, Sample, SampleKind};
use crate::ports::{SensorError, SerialError};

pub use crate::config::ConfigError;
pub use ecg::{EcgFrontEnd, NoLeadOff};
pub use optical::OpticalFrontEnd;
pub use runner::{AcquisitionLoop, Running};

/// Something that yields one sample per cycle
pub trait SampleSource {
    /// Shape of every sample this source yields
    const KIND: SampleKind;

    /// Part name used in diagnostics
    fn part_name(&self) -> &'static str;

    /// One-time bring-up before the first cycle
    ///
    /// `Err(SensorError::NotDetected)` is fatal for the loop.
    fn start(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Acquire one sample, substituting sentinels as the gates dictate
    fn acquire(&mut self, gates: &Gates) -> impl Future<Output = Result<Sample, SensorError>>;
}

/// Unrecoverable startup failure
///
/// The diagnostic line has already been emitted when this is returned; the
/// caller decides between exiting and a visible halt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalInitError {
    /// Device-present check failed
    SensorNotFound {
        /// Part that did not answer
        part: &'static str,
    },
    /// Device answered but could not be configured
    Configuration {
        /// Part being configured
        part: &'static str,
        /// Underlying failure
        error: SensorError,
    },
}

impl fmt::Display for FatalInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorNotFound { part } => write!(f, "{part} not found"),
            Self::Configuration { part, error } => {
                write!(f, "{part} configuration failed: {error}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FatalInitError {}

/// A single cycle that did not emit its line
///
/// Never stops the loop; the next cycle runs at the same pace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleError {
    /// Sensor read failed
    Sensor(SensorError),
    /// Sample could not be rendered
    Format(FormatError),
    /// Line could not be written
    Serial(SerialError),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "acquire: {e}"),
            Self::Format(e) => write!(f, "format: {e}"),
            Self::Serial(e) => write!(f, "emit: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CycleError {}
