//! Biosignal acquisition library
//!
//! Samples an ECG front-end (AD8232-style analog output with lead-off
//! detection) or an optical pulse sensor (MAX30102) at a fixed interval and
//! streams each sample as a text line over a serial link for external plotting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - Sample / OpticalSample / LeadState                           │
//! │  - Gates: lead-off validity, optical presence                   │
//! │  - LineFormat: render + parse of the text stream                │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Acquisition                                  │
//! │  - SampleSource: EcgFrontEnd, OpticalFrontEnd                    │
//! │  - AcquisitionLoop -> Running (INIT -> FATAL | RUNNING)         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - AnalogInputPort / LeadOffPort / OpticalSensorPort            │
//! │  - SerialPort: line sink                                        │
//! │  - ClockPort: milliseconds since boot                           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - Max30102: I2C pulse oximetry sensor                          │
//! │  - LeadOffPins: two digital inputs                              │
//! │  - Rp2350Adc / Rp2350Uart / EmbassyClock (rp2350 feature)       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant runs the same loop body; what differs is a [`VariantConfig`]
//! preset (interval, line format, gates, sensor tuning).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

#[macro_use]
mod fmt;

pub mod acquisition;
pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(feature = "rp2350")]
pub mod board;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key domain types
pub use domain::{
    ChannelOrder, Gates, LeadState, LineFormat, OpticalSample, Sample, SampleKind, StreamRecord,
};

// Re-export configuration
pub use config::{EcgConfig, OpticalConfig, SampleConfig, SensorConfig, VariantConfig};

// Re-export the acquisition loop
pub use acquisition::{
    AcquisitionLoop, ConfigError, CycleError, EcgFrontEnd, FatalInitError, NoLeadOff,
    OpticalFrontEnd, Running, SampleSource,
};

// Re-export key port traits
pub use ports::{AnalogInputPort, ClockPort, LeadOffPort, OpticalSensorPort, SerialPort};

// Re-export adapters
pub use adapters::{LeadOffPins, Max30102};
