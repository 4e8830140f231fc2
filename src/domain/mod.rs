//! Domain layer - pure acquisition logic independent of hardware
//!
//! This module contains the sample values produced each cycle, the gates
//! that substitute sentinels for invalid data, and the text line format
//! used on the serial stream.

pub mod gate;
pub mod line;
pub mod sample;

pub use gate::Gates;
pub use line::{
    ChannelOrder, FormatError, Line, LineFormat, ParseError, StreamRecord, LINE_CAPACITY,
};
pub use sample::{LeadState, OpticalSample, Sample, SampleKind};
