//! Logging shim
//!
//! Routes to `defmt` on the device and to the `log` facade everywhere else,
//! so the library can be exercised on the host without a defmt logger.
//! Format strings must stay within the common subset (`{}` and `{:?}`).
//! Declared first in `lib.rs` with `#[macro_use]` so every module sees the
//! macros in textual scope.

#![allow(unused_macros)]

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        ::log::debug!($($arg)*);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        ::log::info!($($arg)*);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        ::log::warn!($($arg)*);
    }};
}

macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        ::log::error!($($arg)*);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_expand_with_arguments() {
        debug!("debug {}", 1);
        info!("info {} {:?}", "a", Some(2));
        warn!("warn {}", 3u8);
        error!("error");
    }
}
