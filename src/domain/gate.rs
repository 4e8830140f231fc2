//! Sentinel gates
//!
//! Lead-off and finger-absent are data conditions, not errors: the gate
//! swaps the reading for a fixed sentinel and the loop carries on at full
//! rate. Gates are stateless; every cycle is judged on its own.

use crate::domain::sample::{LeadState, OpticalSample, Sample};

/// Per-variant gate selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gates {
    /// Check the lead-off inputs before sampling the ECG channel
    pub lead_off: bool,
    /// Infrared intensity below which the optical reading is floor noise
    pub presence_threshold: Option<u32>,
}

impl Gates {
    /// No gating at all
    pub const NONE: Self = Self {
        lead_off: false,
        presence_threshold: None,
    };

    /// Lead-off validity gate only
    pub const fn lead_off() -> Self {
        Self {
            lead_off: true,
            presence_threshold: None,
        }
    }

    /// Optical presence gate only
    pub const fn presence(threshold: u32) -> Self {
        Self {
            lead_off: false,
            presence_threshold: Some(threshold),
        }
    }

    /// Sample to emit for an ECG cycle.
    ///
    /// `raw` is `None` when the caller skipped the ADC read because the
    /// leads were off.
    pub fn ecg(&self, leads: LeadState, raw: Option<u16>) -> Sample {
        match raw {
            Some(value) if !(self.lead_off && leads.is_off()) => Sample::Single(value),
            _ => Sample::LEADS_OFF,
        }
    }

    /// Sample to emit for an optical cycle.
    pub fn optical(&self, reading: OpticalSample) -> Sample {
        match self.presence_threshold {
            Some(threshold) if reading.ir < threshold => Sample::NOT_PRESENT,
            _ => Sample::Pair(reading),
        }
    }
}
