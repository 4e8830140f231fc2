//! Adapters - concrete implementations of ports
//!
//! Adapters connect the acquisition loop to the outside world by
//! implementing the port traits. Each adapter knows how to work with a
//! specific technology or hardware.
//!
//! # Available Adapters
//!
//! - **max30102**: MAX30102 pulse oximetry sensor via I2C
//! - **lead_off_pins**: AD8232 LO+/LO- comparator outputs on GPIO
//! - **rp2350_adc**: ECG output on an RP2350 ADC channel
//! - **rp2350_uart**: text stream over RP2350 UART
//! - **embassy_clock**: milliseconds since boot from embassy-time

pub mod lead_off_pins;
pub mod max30102;

#[cfg(feature = "rp2350")]
pub mod embassy_clock;
#[cfg(feature = "rp2350")]
pub mod rp2350_adc;
#[cfg(feature = "rp2350")]
pub mod rp2350_uart;

pub use lead_off_pins::LeadOffPins;
pub use max30102::Max30102;

#[cfg(feature = "rp2350")]
pub use embassy_clock::EmbassyClock;
#[cfg(feature = "rp2350")]
pub use rp2350_adc::Rp2350Adc;
#[cfg(feature = "rp2350")]
pub use rp2350_uart::Rp2350Uart;
