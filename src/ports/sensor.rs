//! Sensor ports - abstractions over the sensing hardware
//!
//! These traits let the acquisition loop sample an ECG front-end or an
//! optical sensor without knowing the specific hardware (ADC peripheral,
//! GPIO bank, I2C driver, test fake).

use core::fmt;
use core::future::Future;

use crate::config::OpticalConfig;
use crate::domain::{LeadState, OpticalSample};

/// Error type for sensor operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Failed to read from sensor
    ReadFailed,
    /// Sensor used before `begin()` succeeded
    NotInitialized,
    /// Sensor not responding or reporting the wrong identity
    NotDetected,
    /// Bus transfer failed
    BusError,
    /// Sensor did not finish an operation in time
    Timeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "sensor read failed"),
            Self::NotInitialized => write!(f, "sensor not initialized"),
            Self::NotDetected => write!(f, "sensor not detected"),
            Self::BusError => write!(f, "bus error"),
            Self::Timeout => write!(f, "sensor timeout"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SensorError {}

/// Port for an analog input channel
///
/// # Example Implementation
///
/// ```ignore
/// struct Rp2350Adc {
///     adc: Adc<'static, Blocking>,
///     channel: AdcChannel<'static>,
/// }
///
/// impl AnalogInputPort for Rp2350Adc {
///     async fn read(&mut self) -> Result<u16, SensorError> {
///         self.adc.blocking_read(&mut self.channel).map_err(|_| SensorError::ReadFailed)
///     }
/// }
/// ```
pub trait AnalogInputPort {
    /// Instantaneous reading in ADC counts
    fn read(&mut self) -> impl Future<Output = Result<u16, SensorError>>;
}

/// Port for the two lead-off detector inputs of an ECG front-end
pub trait LeadOffPort {
    /// Current electrode attachment
    fn lead_state(&mut self) -> Result<LeadState, SensorError>;
}

/// Port for an I2C optical pulse sensor
///
/// `begin` and `configure` run once before the loop; `read` runs every cycle.
pub trait OpticalSensorPort {
    /// Human-readable part name for diagnostics
    fn part_name(&self) -> &'static str;

    /// Check that the device is present on the bus
    ///
    /// Returns `Err(SensorError::NotDetected)` if it does not answer or
    /// identifies as something else.
    fn begin(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Apply all tuning parameters in one call
    ///
    /// Calling this again with the same configuration must leave the
    /// device in the same state.
    fn configure(&mut self, config: &OpticalConfig)
        -> impl Future<Output = Result<(), SensorError>>;

    /// Newest red/infrared pair
    fn read(&mut self) -> impl Future<Output = Result<OpticalSample, SensorError>>;
}
