//! Lead-off detector on two digital inputs
//!
//! The AD8232 drives LO+ or LO- high when the matching electrode loses
//! contact. Works with any `embedded_hal::digital::InputPin`.

use embedded_hal::digital::InputPin;

use crate::domain::LeadState;
use crate::ports::sensor::{LeadOffPort, SensorError};

/// LO+ / LO- inputs
pub struct LeadOffPins<P, M> {
    plus: P,
    minus: M,
}

impl<P: InputPin, M: InputPin> LeadOffPins<P, M> {
    pub fn new(plus: P, minus: M) -> Self {
        Self { plus, minus }
    }

    /// Release the pins
    pub fn release(self) -> (P, M) {
        (self.plus, self.minus)
    }
}

impl<P: InputPin, M: InputPin> LeadOffPort for LeadOffPins<P, M> {
    fn lead_state(&mut self) -> Result<LeadState, SensorError> {
        let plus = self.plus.is_high().map_err(|_| SensorError::ReadFailed)?;
        let minus = self.minus.is_high().map_err(|_| SensorError::ReadFailed)?;
        Ok(LeadState::from_inputs(plus, minus))
    }
}
