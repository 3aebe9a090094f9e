//! `rgb(r, g, b)` colours.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An sRGB colour written as `rgb(r,g,b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PassColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for PassColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl FromStr for PassColor {
    type Err = String;

    /// Accepts `rgb(r,g,b)` with at most one space after each comma and
    /// 1-3 digit components.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unhandled =
            || format!("Unhandled rgb format: `{s}`. Should be `rgb(r,g,b)` or `rgb(r, g, b)`");
        let inner = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(unhandled)?;

        let mut parts = [0u8; 3];
        let mut count = 0;
        for (i, raw) in inner.split(',').enumerate() {
            let part = if i == 0 {
                raw
            } else {
                raw.strip_prefix(' ').unwrap_or(raw)
            };
            let digits = !part.is_empty()
                && part.len() <= 3
                && part.bytes().all(|b| b.is_ascii_digit());
            if i >= 3 || !digits {
                return Err(unhandled());
            }
            parts[i] = part
                .parse::<u8>()
                .map_err(|_| format!("rgb component `{part}` is out of range 0-255"))?;
            count += 1;
        }
        if count != 3 {
            return Err(unhandled());
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl Serialize for PassColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PassColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
