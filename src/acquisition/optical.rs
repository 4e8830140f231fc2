//! Optical pulse sensor source

use crate::acquisition::SampleSource;
use crate::config::OpticalConfig;
use crate::domain::{Gates, Sample, SampleKind};
use crate::ports::{OpticalSensorPort, SensorError};

/// Optical sensor plus the tuning applied at startup
pub struct OpticalFrontEnd<S> {
    sensor: S,
    config: OpticalConfig,
}

impl<S: OpticalSensorPort> OpticalFrontEnd<S> {
    /// Create a new optical source
    pub fn new(sensor: S, config: OpticalConfig) -> Self {
        Self { sensor, config }
    }

    /// Tuning applied by `start()`
    pub fn config(&self) -> &OpticalConfig {
        &self.config
    }

    /// Give the sensor back
    pub fn release(self) -> S {
        self.sensor
    }
}

impl<S: OpticalSensorPort> SampleSource for OpticalFrontEnd<S> {
    const KIND: SampleKind = SampleKind::Pair;

    fn part_name(&self) -> &'static str {
        self.sensor.part_name()
    }

    async fn start(&mut self) -> Result<(), SensorError> {
        self.sensor.begin().await?;
        self.sensor.configure(&self.config).await?;
        info!(
            "{} configured: LED red={} ir={}, {:?}, {:?}, {:?}",
            self.sensor.part_name(),
            self.config.led.red,
            self.config.led.ir,
            self.config.led_mode,
            self.config.sample_rate,
            self.config.pulse_width
        );
        Ok(())
    }

    async fn acquire(&mut self, gates: &Gates) -> Result<Sample, SensorError> {
        let reading = self.sensor.read().await?;
        Ok(gates.optical(reading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PRESENCE_THRESHOLD;
    use crate::domain::OpticalSample;
    use crate::testing::FakeOptical;
    use embassy_futures::block_on;

    #[test]
    fn test_start_checks_presence_then_configures_once() {
        let sensor = FakeOptical::present(&[]);
        let configured = sensor.configured();
        let mut source = OpticalFrontEnd::new(sensor, OpticalConfig::GATED);

        assert_eq!(block_on(source.start()), Ok(()));
        assert_eq!(configured.borrow().as_slice(), &[OpticalConfig::GATED]);
    }

    #[test]
    fn test_start_absent_sensor_skips_configuration() {
        let sensor = FakeOptical::absent();
        let configured = sensor.configured();
        let mut source = OpticalFrontEnd::new(sensor, OpticalConfig::DEFAULT);

        assert_eq!(block_on(source.start()), Err(SensorError::NotDetected));
        assert!(configured.borrow().is_empty());
    }

    #[test]
    fn test_presence_gate() {
        let sensor = FakeOptical::present(&[
            OpticalSample::new(9_000, 12_000),
            OpticalSample::new(30_000, 80_000),
        ]);
        let mut source = OpticalFrontEnd::new(sensor, OpticalConfig::GATED);
        let gates = Gates::presence(PRESENCE_THRESHOLD);

        assert_eq!(block_on(source.acquire(&gates)), Ok(Sample::NOT_PRESENT));
        assert_eq!(
            block_on(source.acquire(&gates)),
            Ok(Sample::Pair(OpticalSample::new(30_000, 80_000)))
        );
    }

    #[test]
    fn test_always_on_passes_floor_noise() {
        let sensor = FakeOptical::present(&[OpticalSample::new(900, 1_200)]);
        let mut source = OpticalFrontEnd::new(sensor, OpticalConfig::DEFAULT);

        assert_eq!(
            block_on(source.acquire(&Gates::NONE)),
            Ok(Sample::Pair(OpticalSample::new(900, 1_200)))
        );
    }
}
