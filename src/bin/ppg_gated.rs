//! PPG with finger detection
//!
//! Same sensor as `ppg_raw`, tuned at LED 60 and 100 sps. When the IR
//! reading is below 50000 no finger is on the sensor and the line is
//! `0,0`.
//!
//! # Hardware
//!
//! - Raspberry Pi Pico 2 (RP2350)
//! - MAX30102 breakout on I2C0 (GPIO4 = SDA, GPIO5 = SCL), 400 kHz
//! - UART0 TX on GPIO0
//!
//! # Usage
//!
//! ```bash
//! cargo flash ppg_gated
//! cargo capture --port /dev/ttyUSB0 --variant ppg-gated
//! ```

#![no_std]
#![no_main]

use defmt::*;
use {defmt_rtt as _, panic_probe as _};

use biostream::board;
use biostream::VariantConfig;

#[embassy_executor::main]
async fn main(_spawner: embassy_executor::Spawner) {
    let variant = VariantConfig::PPG_GATED;
    info!("=== PPG with finger detection ===");

    let p = embassy_rp::init(Default::default());
    let serial = board::serial(p.UART0, p.PIN_0, variant.baud);

    let optical = match board::optical_config(&variant) {
        Ok(optical) => optical,
        Err(e) => {
            error!("Preset mismatch: {:?}", e);
            board::halt().await
        }
    };
    let bus = board::i2c_bus(p.I2C0, p.PIN_5, p.PIN_4, &optical);

    board::run(&variant, board::optical_source(bus, optical), serial).await
}
