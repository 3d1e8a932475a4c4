//! Chapter and page number parsing.
//!
//! Chapter numbers arrive embedded in archive file names ("Chapter_7.zip",
//! "Capitulo 12.5.zip") and page numbers in entry names ("page10.jpg").
//! Both are recovered from the first numeric substring; chapter numbers may
//! carry a decimal part, page numbers are integral.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A decimal chapter number parsed from a file name.
///
/// Displays without a trailing `.0` so cache keys match the number as it
/// appeared upstream (`7`, not `7.0`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterNumber(f64);

impl ChapterNumber {
    /// Create a chapter number, rejecting non-finite and negative values.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidChapterNumber(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Extract a chapter number from a file name.
    ///
    /// Returns the first numeric substring, with an optional fractional
    /// part. `None` when the name contains no digits at all.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let digits = first_numeric_substring(name)?;
        digits.parse::<f64>().ok().and_then(|v| Self::new(v).ok())
    }

    /// The raw decimal value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for ChapterNumber {
    type Err = Error;

    /// Strict parse for path parameters: digits with at most one decimal
    /// point. Exponents, signs, and stray characters are rejected so a
    /// request path can never name a chapter the ingestion path could not
    /// have produced.
    fn from_str(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && s.chars().all(|c| c.is_ascii_digit() || c == '.')
            && s.chars().filter(|c| *c == '.').count() <= 1
            && s.chars().any(|c| c.is_ascii_digit());
        if !valid {
            return Err(Error::InvalidChapterNumber(s.to_string()));
        }
        let value = s
            .parse::<f64>()
            .map_err(|_| Error::InvalidChapterNumber(s.to_string()))?;
        Self::new(value)
    }
}

/// Extract an integral page number from an archive entry name.
///
/// Entries without a numeric substring have no position and are skipped by
/// the materializer.
pub fn page_number(entry_name: &str) -> Option<u32> {
    let mut digits = String::new();
    for c in entry_name.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            break;
        }
    }
    if digits.is_empty() {
        return None;
    }
    // Leading zeros are common ("001.jpg"); parse ignores them.
    digits.parse().ok()
}

/// First run of digits in `name`, extended by `.digits` when present.
fn first_numeric_substring(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    // A fractional part only counts when a digit follows the dot, so
    // "Chapter_7.zip" parses as 7, not an error.
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    Some(name[start..end].to_string())
}
