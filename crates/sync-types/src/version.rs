//! Server version parsing and ordering.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a server version string has no numeric major part.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid server version: {0:?}")]
pub struct InvalidVersion(pub String);

/// A comparable server version.
///
/// Accepts strings like `2.1.0`, `3.2-rc1`, or `4.0-dev-2825-gabc1234`.
/// Ordering only considers the numeric `major.minor.patch` triple; a
/// pre-release or dev suffix compares equal to its release.
#[derive(Debug, Clone)]
pub struct ServerVersion {
    major: u32,
    minor: u32,
    patch: u32,
    raw: String,
}

impl ServerVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            raw: format!("{major}.{minor}.{patch}"),
        }
    }

    /// The lowest representable version, used when the server reports
    /// something unparseable.
    pub fn lowest() -> Self {
        Self {
            major: 0,
            minor: 0,
            patch: 0,
            raw: "0.0.0".to_string(),
        }
    }

    pub fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }

    /// The string as reported by the server.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

impl FromStr for ServerVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let release = trimmed.split('-').next().unwrap_or_default();
        let mut parts = release.split('.');

        let major = parts
            .next()
            .and_then(leading_number)
            .ok_or_else(|| InvalidVersion(s.to_string()))?;
        let minor = parts.next().and_then(leading_number).unwrap_or(0);
        let patch = parts.next().and_then(leading_number).unwrap_or(0);

        Ok(Self {
            major,
            minor,
            patch,
            raw: trimmed.to_string(),
        })
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for ServerVersion {}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ServerVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
