//! ECG front-end source (AD8232-style analog output)

use crate::acquisition::SampleSource;
use crate::config::EcgConfig;
use crate::domain::{Gates, LeadState, Sample, SampleKind};
use crate::ports::{AnalogInputPort, LeadOffPort, SensorError};

/// Stand-in detector for boards without lead-off wiring; always attached
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLeadOff;

impl LeadOffPort for NoLeadOff {
    fn lead_state(&mut self) -> Result<LeadState, SensorError> {
        Ok(LeadState::Attached)
    }
}

/// Analog ECG channel plus its lead-off detector
pub struct EcgFrontEnd<A, L> {
    adc: A,
    leads: L,
    config: EcgConfig,
}

impl<A: AnalogInputPort, L: LeadOffPort> EcgFrontEnd<A, L> {
    /// Create a new ECG source
    pub fn new(adc: A, leads: L, config: EcgConfig) -> Self {
        Self { adc, leads, config }
    }

    /// Wiring and ADC setup
    pub fn config(&self) -> &EcgConfig {
        &self.config
    }

    /// Give the peripherals back
    pub fn release(self) -> (A, L) {
        (self.adc, self.leads)
    }
}

impl<A: AnalogInputPort, L: LeadOffPort> SampleSource for EcgFrontEnd<A, L> {
    const KIND: SampleKind = SampleKind::Single;

    fn part_name(&self) -> &'static str {
        "AD8232"
    }

    async fn start(&mut self) -> Result<(), SensorError> {
        info!(
            "ECG on GPIO{}: {} bit, ~{} mV full scale",
            self.config.adc_pin,
            self.config.resolution.bits(),
            self.config.attenuation.full_scale_mv()
        );
        if let Some(pins) = self.config.lead_off {
            info!("Lead-off inputs: LO+ GPIO{}, LO- GPIO{}", pins.plus, pins.minus);
        }
        Ok(())
    }

    async fn acquire(&mut self, gates: &Gates) -> Result<Sample, SensorError> {
        if gates.lead_off {
            let leads = self.leads.lead_state()?;
            if leads.is_off() {
                // Skip the conversion entirely; the value would be rail noise
                return Ok(gates.ecg(leads, None));
            }
        }

        let raw = self.adc.read().await?;
        Ok(gates.ecg(LeadState::Attached, Some(self.config.resolution.clamp(raw))))
    }
}
