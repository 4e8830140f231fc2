//! Timestamped ECG
//!
//! Waits 2 s for the front-end to settle, then writes `millis,value`
//! every 4 ms (~250 Hz) at 9600 baud. No lead-off gating.
//!
//! # Hardware
//!
//! - Raspberry Pi Pico 2 (RP2350)
//! - AD8232 OUTPUT on GPIO26
//! - UART0 TX on GPIO0
//!
//! # Usage
//!
//! ```bash
//! cargo flash ecg_timestamped
//! cargo capture --port /dev/ttyUSB0 --variant ecg-timestamped
//! ```
//!
//! 9600 baud moves about 960 bytes per second, under four per 4 ms cycle.
//! A `millis,value` line is longer than that, so the blocking write
//! stretches each cycle and the real rate lands well below 250 Hz.

#![no_std]
#![no_main]

use defmt::*;
use {defmt_rtt as _, panic_probe as _};

use biostream::board;
use biostream::VariantConfig;

#[embassy_executor::main]
async fn main(_spawner: embassy_executor::Spawner) {
    let variant = VariantConfig::ECG_TIMESTAMPED;
    info!("=== Timestamped ECG ===");

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

    board::run(&variant, board::ecg_source_unguarded(adc, ecg), serial).await
}
