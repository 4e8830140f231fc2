//! Sample domain values
//!
//! A sample is produced, formatted and discarded within a single cycle.
//! Nothing here retains history.

/// Which shape of sample a source produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleKind {
    /// One ADC count per cycle (ECG)
    Single,
    /// A red/infrared intensity pair per cycle (optical)
    Pair,
}

/// One optical reading: red and infrared LED intensities.
///
/// The MAX30102 delivers 18-bit values, so both fit comfortably in `u32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpticalSample {
    /// Red LED intensity
    pub red: u32,
    /// Infrared LED intensity
    pub ir: u32,
}

impl OpticalSample {
    /// Sentinel pair emitted when no finger (object) is on the sensor
    pub const ABSENT: Self = Self { red: 0, ir: 0 };

    /// Create a new optical sample
    pub const fn new(red: u32, ir: u32) -> Self {
        Self { red, ir }
    }
}

/// The value emitted for one acquisition cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sample {
    /// Raw ADC count (or the `0` sentinel when leads are off)
    Single(u16),
    /// Optical intensity pair (or the `0,0` sentinel when nothing is present)
    Pair(OpticalSample),
}

impl Sample {
    /// Sentinel emitted by the ECG path when an electrode is detached
    pub const LEADS_OFF: Self = Sample::Single(0);

    /// Sentinel emitted by the optical path when nothing is on the sensor
    pub const NOT_PRESENT: Self = Sample::Pair(OpticalSample::ABSENT);

    /// Shape of this sample
    pub const fn kind(&self) -> SampleKind {
        match self {
            Sample::Single(_) => SampleKind::Single,
            Sample::Pair(_) => SampleKind::Pair,
        }
    }
}

/// Electrode attachment, derived from the two lead-off comparator outputs.
///
/// Recomputed every cycle, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LeadState {
    /// Both electrodes in contact
    Attached,
    /// At least one electrode detached (LO+ or LO- high)
    Detached,
}

impl LeadState {
    /// Derive the state from the LO+ and LO- input levels
    pub const fn from_inputs(lo_plus_high: bool, lo_minus_high: bool) -> Self {
        if lo_plus_high || lo_minus_high {
            LeadState::Detached
        } else {
            LeadState::Attached
        }
    }

    /// True when the reading must be replaced by the sentinel
    pub const fn is_off(&self) -> bool {
        matches!(self, LeadState::Detached)
    }
}
