//! RP2350 board bring-up shared by the firmware binaries
//!
//! Pinout (Raspberry Pi Pico 2):
//!
//! | Signal        | Pin    |
//! |---------------|--------|
//! | UART0 TX      | GPIO0  |
//! | I2C0 SDA      | GPIO4  |
//! | I2C0 SCL      | GPIO5  |
//! | AD8232 LO+    | GPIO14 |
//! | AD8232 LO-    | GPIO15 |
//! | AD8232 OUTPUT | GPIO26 |
//!
//! The pin numbers in [`VariantConfig`] presets are descriptive; the
//! binaries bind the matching `PIN_n` peripherals.

use embassy_rp::adc::{Adc, Channel as AdcChannel};
use embassy_rp::gpio::{Input, Pin, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{ADC, I2C0};
use embassy_rp::uart::{self, UartTx};
use embassy_rp::{bind_interrupts, Peri};
use embassy_time::{Delay, Duration, Timer};

use crate::acquisition::{AcquisitionLoop, EcgFrontEnd, NoLeadOff, OpticalFrontEnd, SampleSource};
use crate::adapters::{EmbassyClock, LeadOffPins, Max30102, Rp2350Adc, Rp2350Uart};
use crate::config::{ConfigError, EcgConfig, OpticalConfig, SensorConfig, VariantConfig};
use crate::domain::SampleKind;
use crate::ports::SerialPort;

bind_interrupts!(pub struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

/// I2C bus type used by the optical variants
pub type I2cBus = I2c<'static, I2C0, i2c::Async>;

/// Park forever after a fatal error; the host sees no further output
pub async fn halt() -> ! {
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}

/// Text stream on UART TX at the variant's baud rate
pub fn serial<T: uart::Instance>(
    uart: Peri<'static, T>,
    tx: Peri<'static, impl uart::TxPin<T>>,
    baud: u32,
) -> Rp2350Uart<'static> {
    let mut config = uart::Config::default();
    config.baudrate = baud;
    Rp2350Uart::new(UartTx::new_blocking(uart, tx, config))
}

/// I2C0 master for the MAX30102 (GPIO5 = SCL, GPIO4 = SDA)
pub fn i2c_bus(
    i2c: Peri<'static, I2C0>,
    scl: Peri<'static, impl i2c::SclPin<I2C0>>,
    sda: Peri<'static, impl i2c::SdaPin<I2C0>>,
    optical: &OpticalConfig,
) -> I2cBus {
    let mut config = i2c::Config::default();
    config.frequency = optical.bus_speed_hz;
    I2c::new_async(i2c, scl, sda, Irqs, config)
}

/// ECG output channel; attenuation is fixed at 0..3.3 V on this chip
pub fn ecg_adc(
    adc: Peri<'static, ADC>,
    pin: Peri<'static, impl embassy_rp::adc::AdcPin>,
    ecg: &EcgConfig,
) -> Rp2350Adc<'static> {
    let adc = Adc::new_blocking(adc, embassy_rp::adc::Config::default());
    let channel = AdcChannel::new_pin(pin, Pull::None);
    Rp2350Adc::new(adc, channel, ecg.resolution)
}

/// LO+ / LO- comparator inputs
pub fn lead_off_pins(
    plus: Peri<'static, impl Pin>,
    minus: Peri<'static, impl Pin>,
) -> LeadOffPins<Input<'static>, Input<'static>> {
    LeadOffPins::new(Input::new(plus, Pull::None), Input::new(minus, Pull::None))
}

/// ECG tuning of a preset
pub fn ecg_config(variant: &VariantConfig) -> Result<EcgConfig, ConfigError> {
    match variant.sensor {
        SensorConfig::Ecg(ecg) => Ok(ecg),
        SensorConfig::Optical(_) => Err(ConfigError::WrongSensor {
            expected: SampleKind::Single,
            found: SampleKind::Pair,
        }),
    }
}

/// Optical tuning of a preset
pub fn optical_config(variant: &VariantConfig) -> Result<OpticalConfig, ConfigError> {
    match variant.sensor {
        SensorConfig::Optical(optical) => Ok(optical),
        SensorConfig::Ecg(_) => Err(ConfigError::WrongSensor {
            expected: SampleKind::Pair,
            found: SampleKind::Single,
        }),
    }
}

/// ECG source for a preset with LO+/LO- wiring
pub fn ecg_source(
    adc: Rp2350Adc<'static>,
    leads: LeadOffPins<Input<'static>, Input<'static>>,
    ecg: EcgConfig,
) -> EcgFrontEnd<Rp2350Adc<'static>, LeadOffPins<Input<'static>, Input<'static>>> {
    EcgFrontEnd::new(adc, leads, ecg)
}

/// ECG source for a preset without lead-off wiring
pub fn ecg_source_unguarded(
    adc: Rp2350Adc<'static>,
    ecg: EcgConfig,
) -> EcgFrontEnd<Rp2350Adc<'static>, NoLeadOff> {
    EcgFrontEnd::new(adc, NoLeadOff, ecg)
}

/// MAX30102 source on I2C0
pub fn optical_source(
    bus: I2cBus,
    optical: OpticalConfig,
) -> OpticalFrontEnd<Max30102<I2cBus, Delay>> {
    OpticalFrontEnd::new(Max30102::new(bus, Delay), optical)
}

/// Validate the preset, start the loop and run it forever
///
/// A configuration error or a failed start parks the core; the start
/// failure has already written its one diagnostic line.
pub async fn run<S, W>(variant: &VariantConfig, source: S, serial: W) -> !
where
    S: SampleSource,
    W: SerialPort,
{
    info!("Variant {} at {} baud", variant.name, variant.baud);

    let acquisition = match variant
        .validate()
        .and_then(|()| AcquisitionLoop::new(source, serial, EmbassyClock, Delay, variant.sampling))
    {
        Ok(acquisition) => acquisition,
        Err(e) => {
            error!("Invalid configuration: {:?}", e);
            halt().await
        }
    };

    match acquisition.start().await {
        Ok(running) => running.run().await,
        Err(e) => {
            error!("Initialization failed: {:?}", e);
            halt().await
        }
    }
}
