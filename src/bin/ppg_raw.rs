//! Raw PPG stream
//!
//! Configures the MAX30102 (LED 0x1F, 4x averaging, red+IR, 400 sps,
//! 411 us, 4096 nA) and writes `red,ir` every 20 ms at 115200 baud.
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
//! cargo flash ppg_raw
//! cargo capture --port /dev/ttyUSB0 --variant ppg-raw
//! ```

#![no_std]
#![no_main]

use defmt::*;
use {defmt_rtt as _, panic_probe as _};

use biostream::board;
use biostream::VariantConfig;

#[embassy_executor::main]
async fn main(_spawner: embassy_executor::Spawner) {
    let variant = VariantConfig::PPG_RAW;
    info!("=== Raw PPG ===");

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
