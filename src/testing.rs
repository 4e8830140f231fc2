//! Test doubles for the ports
//!
//! Each fake hands out `Rc` handles so a test can inspect what happened
//! after the fake has been moved into the loop.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use crate::config::OpticalConfig;
use crate::domain::{LeadState, OpticalSample};
use crate::ports::{
    AnalogInputPort, ClockPort, LeadOffPort, OpticalSensorPort, SensorError, SerialError,
    SerialPort,
};

/// Serial sink that keeps every line
#[derive(Default)]
pub struct RecordingSerial {
    lines: Rc<RefCell<Vec<String>>>,
    fail: Rc<Cell<bool>>,
}

impl RecordingSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Rc<RefCell<Vec<String>>> {
        self.lines.clone()
    }

    /// While set, writes fail and nothing is recorded
    pub fn fail_writes(&self) -> Rc<Cell<bool>> {
        self.fail.clone()
    }
}

impl SerialPort for RecordingSerial {
    async fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
        if self.fail.get() {
            return Err(SerialError::SendFailed);
        }
        self.lines.borrow_mut().push(line.to_string());
        Ok(())
    }
}

/// Clock advanced only by [`SteppingDelay`]
#[derive(Clone, Default)]
pub struct ManualClock {
    now_ns: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance_ns(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }
}

/// Delay that moves a [`ManualClock`] forward and records millisecond sleeps
pub struct SteppingDelay {
    clock: ManualClock,
    sleeps: Rc<RefCell<Vec<u32>>>,
}

impl SteppingDelay {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            sleeps: Rc::default(),
        }
    }

    pub fn sleeps(&self) -> Rc<RefCell<Vec<u32>>> {
        self.sleeps.clone()
    }
}

impl DelayNs for SteppingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(u64::from(ns));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.sleeps.borrow_mut().push(ms);
        self.clock.advance_ns(u64::from(ms) * 1_000_000);
    }
}

/// ADC returning a fixed script; repeats the last entry when exhausted
pub struct ScriptedAnalog {
    script: VecDeque<Result<u16, SensorError>>,
    last: Result<u16, SensorError>,
    reads: Rc<Cell<usize>>,
}

impl ScriptedAnalog {
    pub fn new(script: &[Result<u16, SensorError>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            last: Err(SensorError::ReadFailed),
            reads: Rc::default(),
        }
    }

    pub fn read_count(&self) -> Rc<Cell<usize>> {
        self.reads.clone()
    }
}

impl AnalogInputPort for ScriptedAnalog {
    async fn read(&mut self) -> Result<u16, SensorError> {
        self.reads.set(self.reads.get() + 1);
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}

/// Lead-off inputs as `(LO+ high, LO- high)`; attached when exhausted
pub struct ScriptedLeads {
    script: VecDeque<(bool, bool)>,
}

impl ScriptedLeads {
    pub fn new(script: &[(bool, bool)]) -> Self {
        Self {
            script: script.iter().copied().collect(),
        }
    }
}

impl LeadOffPort for ScriptedLeads {
    fn lead_state(&mut self) -> Result<LeadState, SensorError> {
        let (plus, minus) = self.script.pop_front().unwrap_or((false, false));
        Ok(LeadState::from_inputs(plus, minus))
    }
}

/// Optical sensor with scripted readings
pub struct FakeOptical {
    present: bool,
    readings: VecDeque<OpticalSample>,
    configure_error: Option<SensorError>,
    configured: Rc<RefCell<Vec<OpticalConfig>>>,
}

impl FakeOptical {
    pub fn present(readings: &[OpticalSample]) -> Self {
        Self {
            present: true,
            readings: readings.iter().copied().collect(),
            configure_error: None,
            configured: Rc::default(),
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::present(&[])
        }
    }

    pub fn failing_configure(mut self, error: SensorError) -> Self {
        self.configure_error = Some(error);
        self
    }

    /// Every configuration applied, in order
    pub fn configured(&self) -> Rc<RefCell<Vec<OpticalConfig>>> {
        self.configured.clone()
    }
}

impl OpticalSensorPort for FakeOptical {
    fn part_name(&self) -> &'static str {
        "MAX30102"
    }

    async fn begin(&mut self) -> Result<(), SensorError> {
        if self.present {
            Ok(())
        } else {
            Err(SensorError::NotDetected)
        }
    }

    async fn configure(&mut self, config: &OpticalConfig) -> Result<(), SensorError> {
        if let Some(error) = self.configure_error {
            return Err(error);
        }
        self.configured.borrow_mut().push(*config);
        Ok(())
    }

    async fn read(&mut self) -> Result<OpticalSample, SensorError> {
        self.readings.pop_front().ok_or(SensorError::ReadFailed)
    }
}
