//! Text line format of the serial stream
//!
//! One newline-terminated line per cycle, integers in decimal, fields
//! separated by a single comma:
//!
//! | Format            | Line                |
//! |-------------------|---------------------|
//! | `Value`           | `512`               |
//! | `TimestampValue`  | `123456,512`        |
//! | `Pair(RedIr)`     | `30000,80000`       |
//! | `Pair(IrRed)`     | `80000,30000`       |
//!
//! Rendering never allocates; the host tool uses [`LineFormat::parse`] to
//! read the stream back.

use core::fmt::{self, Write};

use crate::domain::sample::{OpticalSample, Sample, SampleKind};

/// Longest line we ever render (`u64` timestamp + `,` + `u32` + margin)
pub const LINE_CAPACITY: usize = 48;

/// A rendered line, without terminator
pub type Line = heapless::String<LINE_CAPACITY>;

/// Column order of an optical pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelOrder {
    /// `red,infrared`
    RedIr,
    /// `infrared,red`
    IrRed,
}

/// Line layout of one variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineFormat {
    /// Bare ADC count
    Value,
    /// Milliseconds since boot, then ADC count
    TimestampValue,
    /// Two optical intensities in the given order
    Pair(ChannelOrder),
}

/// Errors while rendering a line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Sample shape does not fit the format
    KindMismatch {
        /// Kind the format renders
        expected: SampleKind,
        /// Kind that was supplied
        found: SampleKind,
    },
    /// Line exceeded `LINE_CAPACITY`
    Overflow,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch { expected, found } => {
                write!(f, "cannot render {found:?} sample as {expected:?} line")
            }
            Self::Overflow => write!(f, "line exceeds {LINE_CAPACITY} bytes"),
        }
    }
}

/// Errors while parsing a received line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Blank line
    Empty,
    /// Human-readable text (banner, diagnostic), not a sample
    NotData,
    /// Wrong number of comma-separated fields
    FieldCount {
        /// Fields the format carries
        expected: usize,
        /// Fields found on the line
        found: usize,
    },
    /// Numeric field too large for its column
    OutOfRange,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::NotData => write!(f, "not a data line"),
            Self::FieldCount { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            Self::OutOfRange => write!(f, "value out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// A sample recovered from the stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamRecord {
    /// Device timestamp, present for `TimestampValue` lines only
    pub timestamp_ms: Option<u64>,
    /// The sample as emitted (sentinels included)
    pub sample: Sample,
}

impl StreamRecord {
    /// True for the lead-off `0` or the not-present `0,0` lines
    pub fn is_sentinel(&self) -> bool {
        matches!(self.sample, Sample::Single(0) | Sample::Pair(OpticalSample::ABSENT))
    }
}

impl LineFormat {
    /// Sample kind this format renders
    pub const fn sample_kind(&self) -> SampleKind {
        match self {
            LineFormat::Value | LineFormat::TimestampValue => SampleKind::Single,
            LineFormat::Pair(_) => SampleKind::Pair,
        }
    }

    /// Number of comma-separated fields per line
    pub const fn field_count(&self) -> usize {
        match self {
            LineFormat::Value => 1,
            LineFormat::TimestampValue | LineFormat::Pair(_) => 2,
        }
    }

    /// Render one sample. `timestamp_ms` is only used by `TimestampValue`.
    pub fn render(&self, sample: &Sample, timestamp_ms: u64) -> Result<Line, FormatError> {
        let mut line = Line::new();
        let written = match (self, sample) {
            (LineFormat::Value, Sample::Single(value)) => write!(line, "{value}"),
            (LineFormat::TimestampValue, Sample::Single(value)) => {
                write!(line, "{timestamp_ms},{value}")
            }
            (LineFormat::Pair(ChannelOrder::RedIr), Sample::Pair(p)) => {
                write!(line, "{},{}", p.red, p.ir)
            }
            (LineFormat::Pair(ChannelOrder::IrRed), Sample::Pair(p)) => {
                write!(line, "{},{}", p.ir, p.red)
            }
            _ => {
                return Err(FormatError::KindMismatch {
                    expected: self.sample_kind(),
                    found: sample.kind(),
                })
            }
        };
        written.map_err(|_| FormatError::Overflow)?;
        Ok(line)
    }

    /// Parse one received line (terminator and surrounding whitespace ignored)
    pub fn parse(&self, line: &str) -> Result<StreamRecord, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut fields: heapless::Vec<&str, 2> = heapless::Vec::new();
        let mut found = 0;
        for field in line.split(',') {
            found += 1;
            let _ = fields.push(field.trim());
        }

        // Banners and diagnostics start with text; let them through as NotData
        // before complaining about the field count.
        if !is_number(fields[0]) {
            return Err(ParseError::NotData);
        }
        if found != self.field_count() {
            return Err(ParseError::FieldCount {
                expected: self.field_count(),
                found,
            });
        }

        match self {
            LineFormat::Value => Ok(StreamRecord {
                timestamp_ms: None,
                sample: Sample::Single(parse_field(fields[0])?),
            }),
            LineFormat::TimestampValue => Ok(StreamRecord {
                timestamp_ms: Some(parse_field(fields[0])?),
                sample: Sample::Single(parse_field(fields[1])?),
            }),
            LineFormat::Pair(order) => {
                let first: u32 = parse_field(fields[0])?;
                let second: u32 = parse_field(fields[1])?;
                let pair = match order {
                    ChannelOrder::RedIr => OpticalSample::new(first, second),
                    ChannelOrder::IrRed => OpticalSample::new(second, first),
                };
                Ok(StreamRecord {
                    timestamp_ms: None,
                    sample: Sample::Pair(pair),
                })
            }
        }
    }
}

fn is_number(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

fn parse_field<T: core::str::FromStr>(field: &str) -> Result<T, ParseError> {
    if !is_number(field) {
        return Err(ParseError::NotData);
    }
    field.parse().map_err(|_| ParseError::OutOfRange)
}
