//! ECG with lead-off detection
//!
//! Samples the AD8232 output every 10 ms and writes one bare value per
//! line at 115200 baud. While either electrode is detached the line is
//! `0` and the ADC is not read.
//!
//! # Hardware
//!
//! - Raspberry Pi Pico 2 (RP2350)
//! - AD8232 OUTPUT on GPIO26, LO+ on GPIO14, LO- on GPIO15
//! - UART0 TX on GPIO0 to a USB-serial bridge
//!
//! # Usage
//!
//! ```bash
//! cargo flash ecg_lead_off
//! cargo capture --port /dev/ttyUSB0 --variant ecg-lead-off
//! ```

#![no_std]
#![no_main]

use defmt::*;
use {defmt_rtt as _, panic_probe as _};

use biostream::board;
use biostream::VariantConfig;

#[embassy_executor::main]
async fn main(_spawner: embassy_executor::Spawner) {
    let variant = VariantConfig::ECG_LEAD_OFF;
    info!("=== ECG with lead-off detection ===");

    let p = embassy_rp::init(Default::default());
    let serial = board::serial(p.UART0, p.PIN_0, variant.baud);

    let ecg = match board::ecg_config(&variant) {
        Ok(ecg) => ecg,
        Err(e) => {
            error!("Preset mismatch: {:?}", e);
            board::halt().await
        }
    };
    let adc = board::ecg_adc(p.ADC, p.PIN_26, &ecg);
    let leads = board::lead_off_pins(p.PIN_14, p.PIN_15);

    board::run(&variant, board::ecg_source(adc, leads, ecg), serial).await
}
