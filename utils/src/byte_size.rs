use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const UNITS: &[(&str, u64)] = &[
    ("tib", 1 << 40),
    ("gib", 1 << 30),
    ("mib", 1 << 20),
    ("kib", 1 << 10),
    ("tb", 1_000_000_000_000),
    ("gb", 1_000_000_000),
    ("mb", 1_000_000),
    ("kb", 1_000),
    ("t", 1_000_000_000_000),
    ("g", 1_000_000_000),
    ("m", 1_000_000),
    ("k", 1_000),
    ("b", 1),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot parse \"{0}\" as a byte size")]
pub struct ByteSizeParseError(String);

/// A number of bytes that can be written in configuration as a human readable string,
/// e.g. "10mb", "4 MiB" or "1048576".
///
/// Decimal suffixes (kb, mb, gb, tb) are powers of 1000, binary suffixes (kib, mib, gib, tib)
/// are powers of 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn new(n_bytes: u64) -> Self {
        Self(n_bytes)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = ByteSizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ByteSizeParseError(s.to_owned()));
        }

        let (number, multiplier) = UNITS
            .iter()
            .find_map(|(suffix, mult)| normalized.strip_suffix(suffix).map(|n| (n.trim(), *mult)))
            .unwrap_or((normalized.as_str(), 1));

        let value: u64 = number.parse().map_err(|_| ByteSizeParseError(s.to_owned()))?;
        value
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| ByteSizeParseError(s.to_owned()))
    }
}

/// Intended for literal defaults in configuration groups; panics on a malformed literal.
impl From<&str> for ByteSize {
    fn from(value: &str) -> Self {
        value
            .parse()
            .unwrap_or_else(|e| panic!("invalid byte size literal: {e}"))
    }
}

impl From<u64> for ByteSize {
    fn from(value: u64) -> Self {
        ByteSize(value)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (suffix, mult) in UNITS.iter().take(4) {
            if self.0 >= *mult && self.0 % mult == 0 {
                return write!(f, "{}{suffix}", self.0 / mult);
            }
        }
        write!(f, "{}b", self.0)
    }
}
