//! Compile-time configuration
//!
//! Every parameter is fixed before the loop starts and never mutated while
//! it runs. The four observed variants are available as `const` presets on
//! [`VariantConfig`].

use core::fmt;

use crate::domain::{ChannelOrder, Gates, LineFormat, SampleKind};

// ============================================================================
// Named constants
// ============================================================================

/// Serial rate of the timestamped ECG variant
pub const BAUD_LOW: u32 = 9_600;

/// Serial rate of the lead-off ECG and optical variants
pub const BAUD_HIGH: u32 = 115_200;

/// Infrared counts below which no finger is on the optical sensor.
///
/// With 4096 nA full scale and 411 us pulses a covered sensor reads well
/// above 100k; an uncovered one sits in the low thousands.
pub const PRESENCE_THRESHOLD: u32 = 50_000;

/// LED pulse amplitude of the always-on variant (0x1F, ~6.2 mA at 0.2 mA/step)
pub const LED_AMPLITUDE_DEFAULT: u8 = 0x1F;

/// LED pulse amplitude of the gated variant (60, ~12 mA at 0.2 mA/step)
pub const LED_AMPLITUDE_GATED: u8 = 60;

/// I2C fast mode
pub const I2C_SPEED_FAST_HZ: u32 = 400_000;

/// One-time startup line of the lead-off ECG variant
pub const ECG_BANNER: &str = "System Ready: AD8232 reading...";

// ============================================================================
// ECG front-end
// ============================================================================

/// ADC resolution; bounds the emitted value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcResolution {
    /// 0..=1023
    Bits10,
    /// 0..=4095
    Bits12,
}

impl AdcResolution {
    /// Largest count this resolution can produce
    pub const fn max(&self) -> u16 {
        match self {
            AdcResolution::Bits10 => 1023,
            AdcResolution::Bits12 => 4095,
        }
    }

    /// Number of bits
    pub const fn bits(&self) -> u8 {
        match self {
            AdcResolution::Bits10 => 10,
            AdcResolution::Bits12 => 12,
        }
    }

    /// Clamp a raw reading into range
    pub fn clamp(&self, raw: u16) -> u16 {
        raw.min(self.max())
    }
}

/// Analog input attenuation (input range selection)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attenuation {
    /// ~0-1.1 V
    Db0,
    /// ~0-1.5 V
    Db2_5,
    /// ~0-2.2 V
    Db6,
    /// ~0-3.3 V
    Db11,
}

impl Attenuation {
    /// Approximate full-scale input in millivolts
    pub const fn full_scale_mv(&self) -> u16 {
        match self {
            Attenuation::Db0 => 1100,
            Attenuation::Db2_5 => 1500,
            Attenuation::Db6 => 2200,
            Attenuation::Db11 => 3300,
        }
    }
}

/// GPIO numbers of the two lead-off comparator outputs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LeadOffPinout {
    /// LO+
    pub plus: u8,
    /// LO-
    pub minus: u8,
}

/// Analog ECG front-end wiring and ADC setup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EcgConfig {
    /// GPIO of the AD8232 OUTPUT line
    pub adc_pin: u8,
    /// Input range
    pub attenuation: Attenuation,
    /// ADC resolution
    pub resolution: AdcResolution,
    /// Lead-off detector inputs, if wired
    pub lead_off: Option<LeadOffPinout>,
}

// ============================================================================
// Optical sensor (MAX30102)
// ============================================================================

/// Per-channel LED pulse amplitude (0.2 mA per step)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedAmplitudes {
    /// Red LED
    pub red: u8,
    /// Infrared LED
    pub ir: u8,
}

impl LedAmplitudes {
    /// Same amplitude on both LEDs
    pub const fn uniform(amplitude: u8) -> Self {
        Self {
            red: amplitude,
            ir: amplitude,
        }
    }
}

/// Samples averaged on-chip per FIFO entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleAverage {
    /// No averaging
    X1,
    /// 2 samples
    X2,
    /// 4 samples
    X4,
    /// 8 samples
    X8,
    /// 16 samples
    X16,
    /// 32 samples
    X32,
}

/// Which LEDs are driven
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedMode {
    /// Red only (heart rate)
    RedOnly,
    /// Red and infrared (SpO2)
    RedIr,
}

impl LedMode {
    /// Number of channels stored per FIFO sample
    pub const fn active_leds(&self) -> usize {
        match self {
            LedMode::RedOnly => 1,
            LedMode::RedIr => 2,
        }
    }
}

/// On-chip sample rate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    /// 50 sps
    Sps50,
    /// 100 sps
    Sps100,
    /// 200 sps
    Sps200,
    /// 400 sps
    Sps400,
    /// 800 sps
    Sps800,
    /// 1000 sps
    Sps1000,
    /// 1600 sps
    Sps1600,
    /// 3200 sps
    Sps3200,
}

/// LED pulse width; also fixes the ADC resolution (15-18 bits)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseWidth {
    /// 69 us, 15 bit
    Us69,
    /// 118 us, 16 bit
    Us118,
    /// 215 us, 17 bit
    Us215,
    /// 411 us, 18 bit
    Us411,
}

/// ADC full-scale current
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcRange {
    /// 2048 nA
    Na2048,
    /// 4096 nA
    Na4096,
    /// 8192 nA
    Na8192,
    /// 16384 nA
    Na16384,
}

/// Optical sensor bus wiring and tuning, applied in one configuration call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpticalConfig {
    /// I2C data pin
    pub sda_pin: u8,
    /// I2C clock pin
    pub scl_pin: u8,
    /// Bus clock
    pub bus_speed_hz: u32,
    /// LED drive
    pub led: LedAmplitudes,
    /// On-chip averaging
    pub sample_average: SampleAverage,
    /// Active channels
    pub led_mode: LedMode,
    /// On-chip sample rate
    pub sample_rate: SampleRate,
    /// LED pulse width
    pub pulse_width: PulseWidth,
    /// ADC full scale
    pub adc_range: AdcRange,
}

impl OpticalConfig {
    /// Vendor library defaults, Red+IR mode
    pub const DEFAULT: Self = Self {
        sda_pin: 4,
        scl_pin: 5,
        bus_speed_hz: I2C_SPEED_FAST_HZ,
        led: LedAmplitudes::uniform(LED_AMPLITUDE_DEFAULT),
        sample_average: SampleAverage::X4,
        led_mode: LedMode::RedIr,
        sample_rate: SampleRate::Sps400,
        pulse_width: PulseWidth::Us411,
        adc_range: AdcRange::Na4096,
    };

    /// Brighter LEDs at 100 sps, tuned for finger detection
    pub const GATED: Self = Self {
        led: LedAmplitudes::uniform(LED_AMPLITUDE_GATED),
        sample_rate: SampleRate::Sps100,
        ..Self::DEFAULT
    };
}

impl Default for OpticalConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// Sampling loop
// ============================================================================

/// Loop parameters shared by every variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleConfig {
    /// Sleep at the end of every cycle; the sampling period
    pub interval_ms: u32,
    /// Settle time before the first cycle (power-on)
    pub boot_delay_ms: u32,
    /// Line layout
    pub format: LineFormat,
    /// Sentinel gates
    pub gates: Gates,
    /// Line emitted once at startup
    pub banner: Option<&'static str>,
}

impl SampleConfig {
    /// Check this configuration against the kind of sample the source produces
    pub fn validate_for(&self, kind: SampleKind) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.format.sample_kind() != kind {
            return Err(ConfigError::FormatMismatch {
                format: self.format,
                source: kind,
            });
        }
        if self.gates.lead_off && kind != SampleKind::Single {
            return Err(ConfigError::GateMismatch { source: kind });
        }
        if self.gates.presence_threshold.is_some() && kind != SampleKind::Pair {
            return Err(ConfigError::GateMismatch { source: kind });
        }
        Ok(())
    }
}

/// Sensor family of a variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorConfig {
    /// Analog ECG front-end
    Ecg(EcgConfig),
    /// I2C optical sensor
    Optical(OpticalConfig),
}

impl SensorConfig {
    /// Sample kind this sensor produces
    pub const fn kind(&self) -> SampleKind {
        match self {
            SensorConfig::Ecg(_) => SampleKind::Single,
            SensorConfig::Optical(_) => SampleKind::Pair,
        }
    }
}

/// A complete, named acquisition variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VariantConfig {
    /// Short identifier (`ecg-lead-off`, ...)
    pub name: &'static str,
    /// Serial rate
    pub baud: u32,
    /// Sensor wiring and tuning
    pub sensor: SensorConfig,
    /// Loop parameters
    pub sampling: SampleConfig,
}

impl VariantConfig {
    /// AD8232 with lead-off detection, bare value at ~100 Hz
    pub const ECG_LEAD_OFF: Self = Self {
        name: "ecg-lead-off",
        baud: BAUD_HIGH,
        sensor: SensorConfig::Ecg(EcgConfig {
            adc_pin: 26,
            attenuation: Attenuation::Db11,
            resolution: AdcResolution::Bits12,
            lead_off: Some(LeadOffPinout { plus: 14, minus: 15 }),
        }),
        sampling: SampleConfig {
            interval_ms: 10,
            boot_delay_ms: 0,
            format: LineFormat::Value,
            gates: Gates::lead_off(),
            banner: Some(ECG_BANNER),
        },
    };

    /// AD8232 without lead-off detection, `millis,value` at ~250 Hz
    pub const ECG_TIMESTAMPED: Self = Self {
        name: "ecg-timestamped",
        baud: BAUD_LOW,
        sensor: SensorConfig::Ecg(EcgConfig {
            adc_pin: 26,
            attenuation: Attenuation::Db11,
            resolution: AdcResolution::Bits12,
            lead_off: None,
        }),
        sampling: SampleConfig {
            interval_ms: 4,
            boot_delay_ms: 2000,
            format: LineFormat::TimestampValue,
            gates: Gates::NONE,
            banner: None,
        },
    };

    /// MAX30102 raw `red,ir` at ~50 Hz
    pub const PPG_RAW: Self = Self {
        name: "ppg-raw",
        baud: BAUD_HIGH,
        sensor: SensorConfig::Optical(OpticalConfig::DEFAULT),
        sampling: SampleConfig {
            interval_ms: 20,
            boot_delay_ms: 0,
            format: LineFormat::Pair(ChannelOrder::RedIr),
            gates: Gates::NONE,
            banner: None,
        },
    };

    /// MAX30102 `red,ir` with `0,0` when no finger is present, ~50 Hz
    pub const PPG_GATED: Self = Self {
        name: "ppg-gated",
        baud: BAUD_HIGH,
        sensor: SensorConfig::Optical(OpticalConfig::GATED),
        sampling: SampleConfig {
            interval_ms: 20,
            boot_delay_ms: 0,
            format: LineFormat::Pair(ChannelOrder::RedIr),
            gates: Gates::presence(PRESENCE_THRESHOLD),
            banner: None,
        },
    };

    /// Every preset
    pub const ALL: [Self; 4] = [
        Self::ECG_LEAD_OFF,
        Self::ECG_TIMESTAMPED,
        Self::PPG_RAW,
        Self::PPG_GATED,
    ];

    /// Look a preset up by name
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name == name)
    }

    /// Reject inconsistent combinations before touching hardware
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampling.validate_for(self.sensor.kind())?;
        if let SensorConfig::Ecg(ecg) = &self.sensor {
            if self.sampling.gates.lead_off && ecg.lead_off.is_none() {
                return Err(ConfigError::MissingLeadOffPins);
            }
        }
        Ok(())
    }
}

/// Inconsistent configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A zero sampling interval would spin
    ZeroInterval,
    /// Line format cannot render the source's samples
    FormatMismatch {
        /// Configured format
        format: LineFormat,
        /// Kind the source produces
        source: SampleKind,
    },
    /// Gate does not apply to this source
    GateMismatch {
        /// Kind the source produces
        source: SampleKind,
    },
    /// Lead-off gate enabled without detector inputs
    MissingLeadOffPins,
    /// Preset drives a different sensor family than the board wired up
    WrongSensor {
        /// Kind the board expects
        expected: SampleKind,
        /// Kind the preset describes
        found: SampleKind,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "sampling interval must be non-zero"),
            Self::FormatMismatch { format, source } => {
                write!(f, "format {format:?} cannot render {source:?} samples")
            }
            Self::GateMismatch { source } => {
                write!(f, "gate does not apply to {source:?} samples")
            }
            Self::MissingLeadOffPins => {
                write!(f, "lead-off gate enabled but no lead-off inputs configured")
            }
            Self::WrongSensor { expected, found } => {
                write!(f, "preset is for {found:?} samples, board expects {expected:?}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
