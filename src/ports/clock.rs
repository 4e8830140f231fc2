//! Clock port - monotonic milliseconds since boot

/// Port for the monotonic clock stamped on `TimestampValue` lines
pub trait ClockPort {
    /// Milliseconds since boot
    fn now_ms(&self) -> u64;
}
