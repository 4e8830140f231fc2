//! Monotonic clock backed by the embassy time driver

use embassy_time::Instant;

use crate::ports::clock::ClockPort;

/// Milliseconds since the time driver started
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

impl ClockPort for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
