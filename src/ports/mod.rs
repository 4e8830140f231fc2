//! Ports (interfaces) defining the boundaries of the application
//!
//! Ports are traits that define how the acquisition loop interacts with
//! hardware. They keep the loop independent of a specific board and let
//! tests substitute fakes without touching process state.
//!
//! # Hexagonal Architecture
//!
//! - **AnalogInputPort**: ECG output sampled by an ADC
//! - **LeadOffPort**: electrode detachment from two digital inputs
//! - **OpticalSensorPort**: I2C pulse oximetry sensor
//! - **SerialPort**: the text stream to the host
//! - **ClockPort**: milliseconds since boot
//!
//! Pacing uses `embedded_hal_async::delay::DelayNs` directly.

pub mod clock;
pub mod sensor;
pub mod serial;

pub use clock::ClockPort;
pub use sensor::{AnalogInputPort, LeadOffPort, OpticalSensorPort, SensorError};
pub use serial::{SerialError, SerialPort, LINE_ENDING};
