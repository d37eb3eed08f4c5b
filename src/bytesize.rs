//! Byte-size option parsing.
//!
//! Cache budgets are given on the command line either as a plain number of
//! bytes (`1048576`) or as a number followed by a binary unit (`1MB`,
//! `3.5GB`). Units are case-sensitive and use IEC multipliers, so `1KB` is
//! 1024 bytes.
//!
//! `ZB` and `YB` are recognised but only small fractions of them fit in a
//! 64-bit byte count; larger values are rejected with
//! [`ByteSizeError::Overflow`].

use std::fmt;
use std::str::FromStr;

use crate::error::ByteSizeError;

pub const KB: u64 = 1 << 10;
pub const MB: u64 = 1 << 20;
pub const GB: u64 = 1 << 30;
pub const TB: u64 = 1 << 40;
pub const PB: u64 = 1 << 50;
pub const EB: u64 = 1 << 60;

/// Multipliers for every accepted suffix, as `u128` so `ZB`/`YB` are representable.
const SUFFIXES: [(&str, u128); 8] = [
    ("KB", 1 << 10),
    ("MB", 1 << 20),
    ("GB", 1 << 30),
    ("TB", 1 << 40),
    ("PB", 1 << 50),
    ("EB", 1 << 60),
    ("ZB", 1 << 70),
    ("YB", 1 << 80),
];

/// Units used when rendering, largest first.
const DISPLAY_UNITS: [(&str, u64); 6] = [
    ("EB", EB),
    ("PB", PB),
    ("TB", TB),
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
];

/// A number of bytes parsed from a human-readable option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The value as a `usize`, saturating on 32-bit targets.
    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl FromStr for ByteSize {
    type Err = ByteSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ByteSizeError::Empty);
        }

        // Plain byte count
        if let Ok(bytes) = s.parse::<u64>() {
            return Ok(Self(bytes));
        }
        if let Ok(value) = s.parse::<f64>() {
            return scale_float(value, 1, s);
        }

        if s.len() < 3 || !s.is_char_boundary(s.len() - 2) {
            return Err(ByteSizeError::InvalidNumber(s.to_string()));
        }

        let (number, suffix) = s.split_at(s.len() - 2);
        let multiplier = SUFFIXES
            .iter()
            .find(|(name, _)| *name == suffix)
            .map(|(_, multiplier)| *multiplier)
            .ok_or_else(|| ByteSizeError::UnknownSuffix(suffix.to_string()))?;

        if let Ok(count) = number.parse::<u64>() {
            let bytes = u128::from(count) * multiplier;
            return u64::try_from(bytes)
                .map(Self)
                .map_err(|_| ByteSizeError::Overflow(s.to_string()));
        }

        let value = number
            .parse::<f64>()
            .map_err(|_| ByteSizeError::InvalidNumber(s.to_string()))?;
        scale_float(value, multiplier, s)
    }
}

fn scale_float(value: f64, multiplier: u128, original: &str) -> Result<ByteSize, ByteSizeError> {
    if !value.is_finite() {
        return Err(ByteSizeError::InvalidNumber(original.to_string()));
    }
    if value < 0.0 {
        return Err(ByteSizeError::Negative(original.to_string()));
    }

    let bytes = value * multiplier as f64;
    // u64::MAX as f64 rounds up to 2^64
    if bytes >= u64::MAX as f64 {
        return Err(ByteSizeError::Overflow(original.to_string()));
    }

    Ok(ByteSize(bytes.trunc() as u64))
}

impl fmt::Display for ByteSize {
    /// Renders the largest unit that represents the value exactly to two
    /// decimals, falling back to a plain byte count.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = u128::from(self.0);

        for (name, unit) in DISPLAY_UNITS {
            let unit = u128::from(unit);
            if bytes < unit || (bytes * 100) % unit != 0 {
                continue;
            }

            let hundredths = bytes * 100 / unit;
            let (whole, frac) = (hundredths / 100, hundredths % 100);
            return if frac == 0 {
                write!(f, "{}{}", whole, name)
            } else if frac % 10 == 0 {
                write!(f, "{}.{}{}", whole, frac / 10, name)
            } else {
                write!(f, "{}.{:02}{}", whole, frac, name)
            };
        }

        write!(f, "{}", self.0)
    }
}
