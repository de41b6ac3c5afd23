//! Grade cell coercion and range checking.

use std::fmt;

use calamine::Data;
use rapor_models::grades::{MAX_GRADE, MIN_GRADE};
use thiserror::Error;

/// Raw value of one worksheet cell as read from the upload.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Blank,
    Number(f64),
    Text(String),
    /// Booleans, dates, durations and error values; never coerced.
    Other(String),
}

impl From<&Data> for RawCell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => RawCell::Blank,
            Data::String(s) if s.trim().is_empty() => RawCell::Blank,
            Data::String(s) => RawCell::Text(s.trim().to_string()),
            Data::Float(f) => RawCell::Number(*f),
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Bool(b) => RawCell::Other(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Data::Error(e) => RawCell::Other(e.to_string()),
            Data::DateTime(dt) => RawCell::Other(format!("date {}", dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Other(s.clone()),
        }
    }
}

impl From<Option<&Data>> for RawCell {
    fn from(data: Option<&Data>) -> Self {
        data.map(RawCell::from).unwrap_or(RawCell::Blank)
    }
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCell::Blank => Ok(()),
            RawCell::Number(n) => write!(f, "{}", format_number(*n)),
            RawCell::Text(s) | RawCell::Other(s) => f.write_str(s),
        }
    }
}

/// Formats whole numbers without a trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("is not a number")]
    NotNumeric,
    #[error("must be between 0 and 100")]
    OutOfRange(f64),
}

/// Result of validating one grade cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellVerdict {
    /// Nothing to persist
    Skip,
    Valid(f64),
    Invalid(ValidationError),
}

/// Coerces a cell to a grade in `[0, 100]`.
///
/// Text is accepted when it parses as a number; a decimal comma (`85,5`) is
/// read as a decimal point.
pub fn validate_cell(raw: &RawCell) -> CellVerdict {
    let value = match raw {
        RawCell::Blank => return CellVerdict::Skip,
        RawCell::Number(n) => *n,
        RawCell::Text(s) => match s.replace(',', ".").parse::<f64>() {
            Ok(n) => n,
            Err(_) => return CellVerdict::Invalid(ValidationError::NotNumeric),
        },
        RawCell::Other(_) => return CellVerdict::Invalid(ValidationError::NotNumeric),
    };

    if !value.is_finite() {
        return CellVerdict::Invalid(ValidationError::NotNumeric);
    }

    if !(MIN_GRADE..=MAX_GRADE).contains(&value) {
        return CellVerdict::Invalid(ValidationError::OutOfRange(value));
    }

    CellVerdict::Valid(value)
}
