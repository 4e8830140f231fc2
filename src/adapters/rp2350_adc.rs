//! RP2350 ADC input adapter
//!
//! Implements `AnalogInputPort` for one ADC-capable GPIO (26..=29). The
//! RP2350 converter is fixed at 12 bits over 0..3.3 V; a 10-bit setting is
//! produced by dropping the two low bits.

use embassy_rp::adc::{Adc, Blocking, Channel as AdcChannel};

use crate::config::AdcResolution;
use crate::ports::sensor::{AnalogInputPort, SensorError};

/// Native converter width
const NATIVE_BITS: u8 = 12;

/// ECG output sampled on an RP2350 ADC channel
pub struct Rp2350Adc<'a> {
    /// ADC peripheral (blocking mode, one conversion per cycle)
    adc: Adc<'a, Blocking>,
    channel: AdcChannel<'a>,
    resolution: AdcResolution,
}

impl<'a> Rp2350Adc<'a> {
    /// Create a new ADC adapter
    ///
    /// # Arguments
    ///
    /// * `adc` - ADC peripheral in blocking mode
    /// * `channel` - channel bound to the ECG output pin
    /// * `resolution` - width reported to the stream
    pub fn new(adc: Adc<'a, Blocking>, channel: AdcChannel<'a>, resolution: AdcResolution) -> Self {
        Self {
            adc,
            channel,
            resolution,
        }
    }
}

impl AnalogInputPort for Rp2350Adc<'_> {
    async fn read(&mut self) -> Result<u16, SensorError> {
        let raw = self
            .adc
            .blocking_read(&mut self.channel)
            .map_err(|_| SensorError::ReadFailed)?;

        Ok(raw >> (NATIVE_BITS - self.resolution.bits()))
    }
}
