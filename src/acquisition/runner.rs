//! The acquisition loop and its running state

use core::fmt::Write;

use embedded_hal_async::delay::DelayNs;

use crate::acquisition::{CycleError, FatalInitError, SampleSource};
use crate::config::{ConfigError, SampleConfig};
use crate::domain::Sample;
use crate::ports::{ClockPort, SensorError, SerialPort};

/// Capacity of the one-time diagnostic line
const DIAGNOSTIC_CAPACITY: usize = 64;

/// A configured loop that has not touched the sensor yet
///
/// Owns the sensor source, the output stream, the clock and the pacing
/// delay. Nothing is global: tests hand in fakes.
pub struct AcquisitionLoop<S, W, C, D> {
    source: S,
    serial: W,
    clock: C,
    delay: D,
    config: SampleConfig,
}

impl<S, W, C, D> AcquisitionLoop<S, W, C, D>
where
    S: SampleSource,
    W: SerialPort,
    C: ClockPort,
    D: DelayNs,
{
    /// Assemble a loop, rejecting a configuration the source cannot satisfy
    pub fn new(
        source: S,
        serial: W,
        clock: C,
        delay: D,
        config: SampleConfig,
    ) -> Result<Self, ConfigError> {
        config.validate_for(S::KIND)?;
        Ok(Self {
            source,
            serial,
            clock,
            delay,
            config,
        })
    }

    /// Loop parameters
    pub fn config(&self) -> &SampleConfig {
        &self.config
    }

    /// Bring the sensor up: settle delay, banner, device check, tuning
    ///
    /// On failure exactly one diagnostic line is emitted and the loop is
    /// consumed; there is no retry path.
    pub async fn start(mut self) -> Result<Running<S, W, C, D>, FatalInitError> {
        if self.config.boot_delay_ms > 0 {
            self.delay.delay_ms(self.config.boot_delay_ms).await;
        }

        if let Some(banner) = self.config.banner {
            if let Err(e) = self.serial.write_line(banner).await {
                warn!("Banner not sent: {:?}", e);
            }
        }

        let part = self.source.part_name();
        match self.source.start().await {
            Ok(()) => {}
            Err(SensorError::NotDetected) => {
                error!("{} not found - halting", part);
                self.emit_diagnostic(part, "not found. Check wiring/power.").await;
                return Err(FatalInitError::SensorNotFound { part });
            }
            Err(e) => {
                error!("{} configuration failed: {:?} - halting", part, e);
                self.emit_diagnostic(part, "configuration failed.").await;
                return Err(FatalInitError::Configuration { part, error: e });
            }
        }

        info!(
            "Acquisition running: {} every {} ms",
            part, self.config.interval_ms
        );
        Ok(Running {
            inner: self,
            emitted: 0,
        })
    }

    async fn emit_diagnostic(&mut self, part: &str, message: &str) {
        let mut line: heapless::String<DIAGNOSTIC_CAPACITY> = heapless::String::new();
        if write!(line, "{part} {message}").is_err() {
            warn!("Diagnostic line truncated");
        }
        if let Err(e) = self.serial.write_line(line.as_str()).await {
            warn!("Diagnostic not sent: {:?}", e);
        }
    }
}

/// A started loop
///
/// Every call to [`Running::cycle`] acquires, formats, emits and then sleeps
/// for the configured interval, whatever happened before.
pub struct Running<S, W, C, D> {
    inner: AcquisitionLoop<S, W, C, D>,
    emitted: u32,
}

impl<S, W, C, D> Running<S, W, C, D>
where
    S: SampleSource,
    W: SerialPort,
    C: ClockPort,
    D: DelayNs,
{
    /// One cycle. The pacing sleep happens even when the cycle failed.
    pub async fn cycle(&mut self) -> Result<Sample, CycleError> {
        let result = self.sample_and_emit().await;
        self.inner.delay.delay_ms(self.inner.config.interval_ms).await;
        result
    }

    /// Cycle until power-off
    pub async fn run(mut self) -> ! {
        loop {
            if let Err(e) = self.cycle().await {
                warn!("Cycle failed: {:?}", e);
            }
        }
    }

    /// Data lines written since start
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    /// Loop parameters
    pub fn config(&self) -> &SampleConfig {
        &self.inner.config
    }

    async fn sample_and_emit(&mut self) -> Result<Sample, CycleError> {
        let AcquisitionLoop {
            source,
            serial,
            clock,
            config,
            ..
        } = &mut self.inner;

        let sample = source
            .acquire(&config.gates)
            .await
            .map_err(CycleError::Sensor)?;
        let line = config
            .format
            .render(&sample, clock.now_ms())
            .map_err(CycleError::Format)?;
        serial
            .write_line(line.as_str())
            .await
            .map_err(CycleError::Serial)?;

        self.emitted = self.emitted.wrapping_add(1);
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{EcgFrontEnd, NoLeadOff, OpticalFrontEnd};
    use crate::config::{EcgConfig, OpticalConfig, SensorConfig, VariantConfig, ECG_BANNER};
    use crate::domain::{ChannelOrder, Gates, LineFormat, OpticalSample};
    use crate::ports::SerialError;
    use crate::testing::{
        FakeOptical, ManualClock, RecordingSerial, ScriptedAnalog, ScriptedLeads, SteppingDelay,
    };
    use embassy_futures::block_on;

    fn ecg(variant: &VariantConfig) -> EcgConfig {
        match variant.sensor {
            SensorConfig::Ecg(config) => config,
            SensorConfig::Optical(_) => unreachable!(),
        }
    }

    #[test]
    fn test_new_rejects_format_for_wrong_source() {
        let source = OpticalFrontEnd::new(FakeOptical::present(&[]), OpticalConfig::DEFAULT);
        let clock = ManualClock::new();
        let mut config = VariantConfig::PPG_RAW.sampling;
        config.format = LineFormat::TimestampValue;

        let result = AcquisitionLoop::new(
            source,
            RecordingSerial::new(),
            clock.clone(),
            SteppingDelay::new(clock),
            config,
        );
        assert!(matches!(result, Err(ConfigError::FormatMismatch { .. })));
    }

    #[test]
    fn test_lead_off_variant_scenarios() {
        let variant = VariantConfig::ECG_LEAD_OFF;
        let adc = ScriptedAnalog::new(&[Ok(512), Ok(3000)]);
        let leads = ScriptedLeads::new(&[(false, false), (true, false)]);
        let serial = RecordingSerial::new();
        let lines = serial.lines();
        let clock = ManualClock::new();

        let acq = AcquisitionLoop::new(
            EcgFrontEnd::new(adc, leads, ecg(&variant)),
            serial,
            clock.clone(),
            SteppingDelay::new(clock),
            variant.sampling,
        )
        .unwrap();

        let mut running = block_on(acq.start()).unwrap();
        assert_eq!(block_on(running.cycle()), Ok(Sample::Single(512)));
        assert_eq!(block_on(running.cycle()), Ok(Sample::Single(0)));

        assert_eq!(*lines.borrow(), [ECG_BANNER, "512", "0"]);
        assert_eq!(running.emitted(), 2);
    }

    #[test]
    fn test_timestamped_variant_paces_each_cycle() {
        let variant = VariantConfig::ECG_TIMESTAMPED;
        let adc = ScriptedAnalog::new(&[Ok(100), Ok(200), Ok(300), Ok(400)]);
        let serial = RecordingSerial::new();
        let lines = serial.lines();
        let clock = ManualClock::new();
        let delay = SteppingDelay::new(clock.clone());
        let sleeps = delay.sleeps();

        let acq = AcquisitionLoop::new(
            EcgFrontEnd::new(adc, NoLeadOff, ecg(&variant)),
            serial,
            clock,
            delay,
            variant.sampling,
        )
        .unwrap();

        let mut running = block_on(acq.start()).unwrap();
        for _ in 0..4 {
            block_on(running.cycle()).unwrap();
        }

        // Boot settle, then one interval per cycle
        assert_eq!(*sleeps.borrow(), [2000, 4, 4, 4, 4]);
        assert_eq!(*lines.borrow(), ["2000,100", "2004,200", "2008,300", "2012,400"]);

        let stamps: std::vec::Vec<u64> = lines
            .borrow()
            .iter()
            .map(|l| LineFormat::TimestampValue.parse(l).unwrap().timestamp_ms.unwrap())
            .collect();
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= u64::from(variant.sampling.interval_ms));
        }
    }

    #[test]
    fn test_gated_optical_scenarios() {
        let variant = VariantConfig::PPG_GATED;
        let sensor = FakeOptical::present(&[
            OpticalSample::new(9_000, 12_000),
            OpticalSample::new(30_000, 80_000),
        ]);
        let serial = RecordingSerial::new();
        let lines = serial.lines();
        let clock = ManualClock::new();

        let acq = AcquisitionLoop::new(
            OpticalFrontEnd::new(sensor, OpticalConfig::GATED),
            serial,
            clock.clone(),
            SteppingDelay::new(clock),
            variant.sampling,
        )
        .unwrap();

        let mut running = block_on(acq.start()).unwrap();
        block_on(running.cycle()).unwrap();
        block_on(running.cycle()).unwrap();

        assert_eq!(*lines.borrow(), ["0,0", "30000,80000"]);
    }

    #[test]
    fn test_ir_red_order_preserved() {
        let sensor = FakeOptical::present(&[OpticalSample::new(30_000, 80_000)]);
        let serial = RecordingSerial::new();
        let lines = serial.lines();
        let clock = ManualClock::new();
        let mut config = VariantConfig::PPG_RAW.sampling;
        config.format = LineFormat::Pair(ChannelOrder::IrRed);

        let acq = AcquisitionLoop::new(
            OpticalFrontEnd::new(sensor, OpticalConfig::DEFAULT),
            serial,
            clock.clone(),
            SteppingDelay::new(clock),
            config,
        )
        .unwrap();

        let mut running = block_on(acq.start()).unwrap();
        block_on(running.cycle()).unwrap();
        assert_eq!(*lines.borrow(), ["80000,30000"]);
    }

    #[test]
    fn test_absent_sensor_emits_one_diagnostic() {
        let serial = RecordingSerial::new();
        let lines = serial.lines();
        let clock = ManualClock::new();
        let delay = SteppingDelay::new(clock.clone());
        let sleeps = delay.sleeps();

        let acq = AcquisitionLoop::new(
            OpticalFrontEnd::new(FakeOptical::absent(), OpticalConfig::DEFAULT),
            serial,
            clock,
            delay,
            VariantConfig::PPG_RAW.sampling,
        )
        .unwrap();

        let err = block_on(acq.start()).err().unwrap();
        assert_eq!(err, FatalInitError::SensorNotFound { part: "MAX30102" });
        assert_eq!(*lines.borrow(), ["MAX30102 not found. Check wiring/power."]);
        assert!(sleeps.borrow().is_empty());
    }

    #[test]
    fn test_configuration_failure_is_fatal() {
        let sensor = FakeOptical::present(&[]).failing_configure(SensorError::BusError);
        let serial = RecordingSerial::new();
        let lines = serial.lines();
        let clock = ManualClock::new();

        let acq = AcquisitionLoop::new(
            OpticalFrontEnd::new(sensor, OpticalConfig::DEFAULT),
            serial,
            clock.clone(),
            SteppingDelay::new(clock),
            VariantConfig::PPG_RAW.sampling,
        )
        .unwrap();

        let err = block_on(acq.start()).err().unwrap();
        assert_eq!(
            err,
            FatalInitError::Configuration {
                part: "MAX30102",
                error: SensorError::BusError
            }
        );
        assert_eq!(*lines.borrow(), ["MAX30102 configuration failed."]);
    }

    #[test]
    fn test_failed_cycles_keep_pace() {
        let variant = VariantConfig::ECG_LEAD_OFF;
        let adc = ScriptedAnalog::new(&[Err(SensorError::ReadFailed), Ok(1500), Ok(1600)]);
        let serial = RecordingSerial::new();
        let lines = serial.lines();
        let failing = serial.fail_writes();
        let clock = ManualClock::new();
        let delay = SteppingDelay::new(clock.clone());
        let sleeps = delay.sleeps();
        let mut sampling = variant.sampling;
        sampling.banner = None;
        sampling.gates = Gates::NONE;

        let acq = AcquisitionLoop::new(
            EcgFrontEnd::new(adc, NoLeadOff, ecg(&variant)),
            serial,
            clock,
            delay,
            sampling,
        )
        .unwrap();
        let mut running = block_on(acq.start()).unwrap();

        assert_eq!(
            block_on(running.cycle()),
            Err(CycleError::Sensor(SensorError::ReadFailed))
        );
        failing.set(true);
        assert_eq!(
            block_on(running.cycle()),
            Err(CycleError::Serial(SerialError::SendFailed))
        );
        failing.set(false);
        assert_eq!(block_on(running.cycle()), Ok(Sample::Single(1600)));

        assert_eq!(*sleeps.borrow(), [10, 10, 10]);
        assert_eq!(*lines.borrow(), ["1600"]);
        assert_eq!(running.emitted(), 1);
    }

    #[test]
    fn test_identical_configuration_samples_identically() {
        // Two independent loops built from identical configuration must
        // sample identically: no state leaks through the configuration.
        let run = || {
            let sensor = FakeOptical::present(&[
                OpticalSample::new(20_000, 60_000),
                OpticalSample::new(21_000, 40_000),
            ]);
            let serial = RecordingSerial::new();
            let lines = serial.lines();
            let clock = ManualClock::new();
            let acq = AcquisitionLoop::new(
                OpticalFrontEnd::new(sensor, OpticalConfig::GATED),
                serial,
                clock.clone(),
                SteppingDelay::new(clock),
                VariantConfig::PPG_GATED.sampling,
            )
            .unwrap();
            let mut running = block_on(acq.start()).unwrap();
            block_on(running.cycle()).unwrap();
            block_on(running.cycle()).unwrap();
            let out = lines.borrow().clone();
            out
        };

        assert_eq!(run(), run());
        assert_eq!(run(), ["20000,60000", "0,0"]);
    }
}
