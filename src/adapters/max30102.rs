//! MAX30102 pulse oximetry sensor adapter
//!
//! Register-level driver implementing `OpticalSensorPort` over any
//! `embedded_hal_async::i2c::I2c` bus. The sensor samples on its own clock
//! into a 32-entry FIFO; each read drains whatever is new and keeps the
//! newest red/infrared pair.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::config::{AdcRange, LedMode, OpticalConfig, PulseWidth, SampleAverage, SampleRate};
use crate::domain::OpticalSample;
use crate::ports::sensor::{OpticalSensorPort, SensorError};

/// Fixed 7-bit I2C address
pub const MAX30102_ADDRESS: u8 = 0x57;

/// Value of PART_ID on a MAX30102 (and MAX30105)
pub const EXPECTED_PART_ID: u8 = 0x15;

/// FIFO depth in samples
const FIFO_DEPTH: u8 = 32;

/// Bytes per channel per FIFO sample
const BYTES_PER_CHANNEL: usize = 3;

/// FIFO samples carry 18 significant bits
const SAMPLE_MASK: u32 = 0x3_FFFF;

/// Polls (1 ms apart) before a read gives up on new data
const FIFO_POLL_ATTEMPTS: u32 = 250;

/// Polls (1 ms apart) waiting for the soft reset bit to clear
const RESET_POLL_ATTEMPTS: u32 = 100;

/// MAX30102 register addresses
pub(crate) mod regs {
    pub const FIFO_WRITE_PTR: u8 = 0x04;
    pub const FIFO_OVERFLOW: u8 = 0x05;
    pub const FIFO_READ_PTR: u8 = 0x06;
    pub const FIFO_DATA: u8 = 0x07;
    pub const FIFO_CONFIG: u8 = 0x08;
    pub const MODE_CONFIG: u8 = 0x09;
    pub const SPO2_CONFIG: u8 = 0x0A;
    pub const LED1_PULSE_AMP: u8 = 0x0C;
    pub const LED2_PULSE_AMP: u8 = 0x0D;
    pub const MULTI_LED_CONFIG1: u8 = 0x11;
    pub const PART_ID: u8 = 0xFF;
}

/// Register bit fields
pub(crate) mod bits {
    pub const FIFO_ROLLOVER_EN: u8 = 0x10;
    pub const MODE_RESET: u8 = 0x40;
    pub const MODE_RED_ONLY: u8 = 0x02;
    pub const MODE_RED_IR: u8 = 0x03;
    pub const SLOT_RED: u8 = 0x01;
    pub const SLOT_IR: u8 = 0x02;
}

fn sample_average_bits(avg: SampleAverage) -> u8 {
    match avg {
        SampleAverage::X1 => 0x00,
        SampleAverage::X2 => 0x20,
        SampleAverage::X4 => 0x40,
        SampleAverage::X8 => 0x60,
        SampleAverage::X16 => 0x80,
        SampleAverage::X32 => 0xA0,
    }
}

fn led_mode_bits(mode: LedMode) -> u8 {
    match mode {
        LedMode::RedOnly => bits::MODE_RED_ONLY,
        LedMode::RedIr => bits::MODE_RED_IR,
    }
}

fn adc_range_bits(range: AdcRange) -> u8 {
    match range {
        AdcRange::Na2048 => 0x00,
        AdcRange::Na4096 => 0x20,
        AdcRange::Na8192 => 0x40,
        AdcRange::Na16384 => 0x60,
    }
}

fn sample_rate_bits(rate: SampleRate) -> u8 {
    match rate {
        SampleRate::Sps50 => 0x00,
        SampleRate::Sps100 => 0x04,
        SampleRate::Sps200 => 0x08,
        SampleRate::Sps400 => 0x0C,
        SampleRate::Sps800 => 0x10,
        SampleRate::Sps1000 => 0x14,
        SampleRate::Sps1600 => 0x18,
        SampleRate::Sps3200 => 0x1C,
    }
}

fn pulse_width_bits(width: PulseWidth) -> u8 {
    match width {
        PulseWidth::Us69 => 0x00,
        PulseWidth::Us118 => 0x01,
        PulseWidth::Us215 => 0x02,
        PulseWidth::Us411 => 0x03,
    }
}

/// MAX30102 adapter implementing OpticalSensorPort
pub struct Max30102<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    active_leds: usize,
    latest: OpticalSample,
    ready: bool,
}

impl<I: I2c, D: DelayNs> Max30102<I, D> {
    /// Create a new MAX30102 adapter
    ///
    /// Nothing is sent on the bus until `begin()` is called.
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: MAX30102_ADDRESS,
            active_leds: LedMode::RedIr.active_leds(),
            latest: OpticalSample::ABSENT,
            ready: false,
        }
    }

    /// Whether `begin()` found the device
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Release the underlying I2C bus
    pub fn release(self) -> I {
        self.i2c
    }

    async fn read_register(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .await
            .map_err(|_| SensorError::BusError)?;
        Ok(buf[0])
    }

    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .await
            .map_err(|_| SensorError::BusError)
    }

    /// Read the part identifier
    pub async fn part_id(&mut self) -> Result<u8, SensorError> {
        self.read_register(regs::PART_ID).await
    }

    /// Reset every register to its power-on value
    pub async fn soft_reset(&mut self) -> Result<(), SensorError> {
        self.write_register(regs::MODE_CONFIG, bits::MODE_RESET).await?;
        for _ in 0..RESET_POLL_ATTEMPTS {
            if self.read_register(regs::MODE_CONFIG).await? & bits::MODE_RESET == 0 {
                return Ok(());
            }
            self.delay.delay_ms(1).await;
        }
        warn!("MAX30102: soft reset did not complete");
        Err(SensorError::Timeout)
    }

    /// Empty the FIFO and clear the overflow counter
    pub async fn clear_fifo(&mut self) -> Result<(), SensorError> {
        self.write_register(regs::FIFO_WRITE_PTR, 0).await?;
        self.write_register(regs::FIFO_OVERFLOW, 0).await?;
        self.write_register(regs::FIFO_READ_PTR, 0).await
    }

    /// Drain new FIFO entries into `latest`; false if the FIFO was empty
    async fn poll_fifo(&mut self) -> Result<bool, SensorError> {
        let read_ptr = self.read_register(regs::FIFO_READ_PTR).await?;
        let write_ptr = self.read_register(regs::FIFO_WRITE_PTR).await?;
        if read_ptr == write_ptr {
            return Ok(false);
        }

        let pending = usize::from(write_ptr.wrapping_sub(read_ptr) % FIFO_DEPTH);
        let stride = self.active_leds * BYTES_PER_CHANNEL;
        let mut buf = [0u8; FIFO_DEPTH as usize * 2 * BYTES_PER_CHANNEL];
        let len = pending * stride;
        self.i2c
            .write_read(self.address, &[regs::FIFO_DATA], &mut buf[..len])
            .await
            .map_err(|_| SensorError::BusError)?;

        if let Some(newest) = buf[..len].chunks_exact(stride).last() {
            let red = decode_channel(&newest[..BYTES_PER_CHANNEL]);
            let ir = if self.active_leds > 1 {
                decode_channel(&newest[BYTES_PER_CHANNEL..2 * BYTES_PER_CHANNEL])
            } else {
                0
            };
            self.latest = OpticalSample::new(red, ir);
        }
        Ok(true)
    }
}

fn decode_channel(bytes: &[u8]) -> u32 {
    let raw = (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
    raw & SAMPLE_MASK
}

impl<I: I2c, D: DelayNs> OpticalSensorPort for Max30102<I, D> {
    fn part_name(&self) -> &'static str {
        "MAX30102"
    }

    async fn begin(&mut self) -> Result<(), SensorError> {
        match self.part_id().await {
            Ok(EXPECTED_PART_ID) => {
                self.ready = true;
                Ok(())
            }
            Ok(other) => {
                warn!("MAX30102: unexpected part id {}", other);
                Err(SensorError::NotDetected)
            }
            Err(_) => Err(SensorError::NotDetected),
        }
    }

    async fn configure(&mut self, config: &OpticalConfig) -> Result<(), SensorError> {
        if !self.ready {
            return Err(SensorError::NotInitialized);
        }

        // Start from power-on defaults so repeated calls cannot accumulate
        self.soft_reset().await?;

        self.write_register(
            regs::FIFO_CONFIG,
            sample_average_bits(config.sample_average) | bits::FIFO_ROLLOVER_EN,
        )
        .await?;
        self.write_register(regs::MODE_CONFIG, led_mode_bits(config.led_mode))
            .await?;
        self.write_register(
            regs::SPO2_CONFIG,
            adc_range_bits(config.adc_range)
                | sample_rate_bits(config.sample_rate)
                | pulse_width_bits(config.pulse_width),
        )
        .await?;
        self.write_register(regs::LED1_PULSE_AMP, config.led.red).await?;
        self.write_register(regs::LED2_PULSE_AMP, config.led.ir).await?;

        let slots = match config.led_mode {
            LedMode::RedOnly => bits::SLOT_RED,
            LedMode::RedIr => bits::SLOT_RED | (bits::SLOT_IR << 4),
        };
        self.write_register(regs::MULTI_LED_CONFIG1, slots).await?;

        self.clear_fifo().await?;
        self.active_leds = config.led_mode.active_leds();
        self.latest = OpticalSample::ABSENT;
        Ok(())
    }

    async fn read(&mut self) -> Result<OpticalSample, SensorError> {
        if !self.ready {
            return Err(SensorError::NotInitialized);
        }

        for _ in 0..FIFO_POLL_ATTEMPTS {
            if self.poll_fifo().await? {
                return Ok(self.latest);
            }
            self.delay.delay_ms(1).await;
        }

        // Matches the vendor library: no new data reads as zero
        debug!("MAX30102: no new FIFO data");
        Ok(OpticalSample::ABSENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, SteppingDelay};
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec::Vec;

    /// Register map of a MAX30102 on a fake bus
    struct Device {
        regs: [u8; 256],
        fifo: VecDeque<u8>,
        writes: Vec<(u8, u8)>,
    }

    struct FakeBus {
        device: Rc<RefCell<Device>>,
        present: bool,
    }

    impl FakeBus {
        fn new(part_id: u8) -> (Self, Rc<RefCell<Device>>) {
            let device = Rc::new(RefCell::new(Device {
                regs: [0; 256],
                fifo: VecDeque::new(),
                writes: Vec::new(),
            }));
            device.borrow_mut().regs[regs::PART_ID as usize] = part_id;
            (
                Self {
                    device: device.clone(),
                    present: true,
                },
                device,
            )
        }

        fn absent() -> Self {
            let (mut bus, _) = Self::new(0);
            bus.present = false;
            bus
        }
    }

    impl Device {
        /// Queue FIFO samples as the sensor would after sampling
        fn push_samples(&mut self, samples: &[(u32, u32)]) {
            for &(red, ir) in samples {
                for value in [red, ir] {
                    self.fifo.push_back((value >> 16) as u8);
                    self.fifo.push_back((value >> 8) as u8);
                    self.fifo.push_back(value as u8);
                }
            }
            let wr = self.regs[regs::FIFO_WRITE_PTR as usize];
            self.regs[regs::FIFO_WRITE_PTR as usize] = (wr + samples.len() as u8) % FIFO_DEPTH;
        }

        fn write(&mut self, reg: u8, value: u8) {
            self.writes.push((reg, value));
            if reg == regs::MODE_CONFIG && value & bits::MODE_RESET != 0 {
                let part_id = self.regs[regs::PART_ID as usize];
                self.regs = [0; 256];
                self.regs[regs::PART_ID as usize] = part_id;
                self.fifo.clear();
                return;
            }
            self.regs[reg as usize] = value;
        }

        fn read(&mut self, reg: u8, buf: &mut [u8]) {
            if reg == regs::FIFO_DATA {
                for byte in buf.iter_mut() {
                    *byte = self.fifo.pop_front().unwrap_or(0);
                }
                self.regs[regs::FIFO_READ_PTR as usize] = self.regs[regs::FIFO_WRITE_PTR as usize];
                return;
            }
            for (offset, byte) in buf.iter_mut().enumerate() {
                *byte = self.regs[reg as usize + offset];
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if !self.present || address != MAX30102_ADDRESS {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            let mut device = self.device.borrow_mut();
            let mut pointer = 0u8;
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) => {
                        pointer = bytes[0];
                        if let Some(&value) = bytes.get(1) {
                            device.write(pointer, value);
                        }
                    }
                    Operation::Read(buf) => device.read(pointer, buf),
                }
            }
            Ok(())
        }
    }

    fn sensor(bus: FakeBus) -> Max30102<FakeBus, SteppingDelay> {
        Max30102::new(bus, SteppingDelay::new(ManualClock::new()))
    }

    #[test]
    fn test_begin_detects_part() {
        let (bus, _) = FakeBus::new(EXPECTED_PART_ID);
        let mut max = sensor(bus);
        assert_eq!(block_on(max.begin()), Ok(()));
        assert!(max.is_ready());
    }

    #[test]
    fn test_begin_without_device() {
        let mut max = sensor(FakeBus::absent());
        assert_eq!(block_on(max.begin()), Err(SensorError::NotDetected));
        assert!(!max.is_ready());
    }

    #[test]
    fn test_begin_wrong_part() {
        let (bus, _) = FakeBus::new(0x11);
        let mut max = sensor(bus);
        assert_eq!(block_on(max.begin()), Err(SensorError::NotDetected));
    }

    #[test]
    fn test_configure_requires_begin() {
        let (bus, _) = FakeBus::new(EXPECTED_PART_ID);
        let mut max = sensor(bus);
        assert_eq!(
            block_on(max.configure(&OpticalConfig::DEFAULT)),
            Err(SensorError::NotInitialized)
        );
    }

    #[test]
    fn test_configure_programs_registers() {
        let (bus, device) = FakeBus::new(EXPECTED_PART_ID);
        let mut max = sensor(bus);
        block_on(max.begin()).unwrap();
        block_on(max.configure(&OpticalConfig::GATED)).unwrap();

        let d = device.borrow();
        // 4x averaging + rollover
        assert_eq!(d.regs[regs::FIFO_CONFIG as usize], 0x50);
        assert_eq!(d.regs[regs::MODE_CONFIG as usize], bits::MODE_RED_IR);
        // 4096 nA | 100 sps | 411 us
        assert_eq!(d.regs[regs::SPO2_CONFIG as usize], 0x27);
        assert_eq!(d.regs[regs::LED1_PULSE_AMP as usize], 60);
        assert_eq!(d.regs[regs::LED2_PULSE_AMP as usize], 60);
        assert_eq!(d.regs[regs::MULTI_LED_CONFIG1 as usize], 0x21);
        assert_eq!(d.regs[regs::FIFO_READ_PTR as usize], 0);
        // Reset first
        assert_eq!(d.writes[0], (regs::MODE_CONFIG, bits::MODE_RESET));
    }

    #[test]
    fn test_configure_twice_is_idempotent() {
        let (bus, device) = FakeBus::new(EXPECTED_PART_ID);
        let mut max = sensor(bus);
        block_on(max.begin()).unwrap();

        block_on(max.configure(&OpticalConfig::DEFAULT)).unwrap();
        let once = device.borrow().regs;
        let writes_once = device.borrow().writes.len();

        block_on(max.configure(&OpticalConfig::DEFAULT)).unwrap();
        let d = device.borrow();
        assert_eq!(d.regs, once);
        assert_eq!(d.writes[writes_once..], d.writes[..writes_once]);
    }

    #[test]
    fn test_read_keeps_newest_sample() {
        let (bus, device) = FakeBus::new(EXPECTED_PART_ID);
        let mut max = sensor(bus);
        block_on(max.begin()).unwrap();
        block_on(max.configure(&OpticalConfig::DEFAULT)).unwrap();

        device
            .borrow_mut()
            .push_samples(&[(1_000, 2_000), (3_000, 4_000), (30_000, 80_000)]);
        assert_eq!(block_on(max.read()), Ok(OpticalSample::new(30_000, 80_000)));
        assert!(device.borrow().fifo.is_empty());
    }

    #[test]
    fn test_read_masks_to_18_bits() {
        let (bus, device) = FakeBus::new(EXPECTED_PART_ID);
        let mut max = sensor(bus);
        block_on(max.begin()).unwrap();
        block_on(max.configure(&OpticalConfig::DEFAULT)).unwrap();

        device.borrow_mut().push_samples(&[(0xFF_FFFF, 0x04_0001)]);
        assert_eq!(block_on(max.read()), Ok(OpticalSample::new(0x3_FFFF, 0x1)));
    }

    #[test]
    fn test_read_without_new_data_returns_zero() {
        let (bus, _) = FakeBus::new(EXPECTED_PART_ID);
        let clock = ManualClock::new();
        let delay = SteppingDelay::new(clock.clone());
        let polls = delay.sleeps();
        let mut max = Max30102::new(bus, delay);
        block_on(max.begin()).unwrap();
        block_on(max.configure(&OpticalConfig::DEFAULT)).unwrap();

        assert_eq!(block_on(max.read()), Ok(OpticalSample::ABSENT));
        assert_eq!(polls.borrow().len(), FIFO_POLL_ATTEMPTS as usize);
    }

    #[test]
    fn test_red_only_mode() {
        let (bus, device) = FakeBus::new(EXPECTED_PART_ID);
        let mut max = sensor(bus);
        block_on(max.begin()).unwrap();
        let config = OpticalConfig {
            led_mode: LedMode::RedOnly,
            ..OpticalConfig::DEFAULT
        };
        block_on(max.configure(&config)).unwrap();
        assert_eq!(
            device.borrow().regs[regs::MULTI_LED_CONFIG1 as usize],
            bits::SLOT_RED
        );

        {
            let mut d = device.borrow_mut();
            // One channel per sample: three bytes
            d.fifo.extend([0x00, 0x10, 0x00]);
            d.regs[regs::FIFO_WRITE_PTR as usize] = 1;
        }
        assert_eq!(block_on(max.read()), Ok(OpticalSample::new(0x1000, 0)));
    }
}
