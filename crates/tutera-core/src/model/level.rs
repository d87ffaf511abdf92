// ── Level and temperature encodings ──
//
// The processor speaks 16-bit levels (0..=65535) for brightness and
// volume and tenths of a degree for temperatures. The model speaks
// percentages and `Temperature`.

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;

const LEVEL_MAX: u32 = 65_535;

// ── Percent ─────────────────────────────────────────────────────────

/// A whole percentage, 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Percent(pub(crate) u8);

impl Percent {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(100);

    pub fn new(value: u8) -> Result<Self, CoreError> {
        if value > 100 {
            return Err(CoreError::validation(format!(
                "{value}% is out of range (0-100)"
            )));
        }
        Ok(Self(value))
    }

    /// Saturating constructor for arithmetic results.
    pub fn clamped(value: i64) -> Self {
        Self(u8::try_from(value.clamp(0, 100)).unwrap_or(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Encode as a processor level, rounding to nearest.
    pub fn to_level(self) -> u16 {
        let level = (u32::from(self.0) * LEVEL_MAX + 50) / 100;
        u16::try_from(level).unwrap_or(u16::MAX)
    }

    /// Decode a processor level, rounding to nearest.
    pub fn from_level(level: u16) -> Self {
        let pct = (u32::from(level) * 100 + LEVEL_MAX / 2) / LEVEL_MAX;
        Self(u8::try_from(pct).unwrap_or(100))
    }
}

impl TryFrom<u8> for Percent {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// ── Temperature ─────────────────────────────────────────────────────

/// Temperature in tenths of a degree, in the processor's configured unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Temperature(i32);

impl Temperature {
    pub const fn from_tenths(tenths: i32) -> Self {
        Self(tenths)
    }

    pub fn tenths(self) -> i32 {
        self.0
    }

    /// Parse user input in degrees (`21`, `21.5`).
    pub fn parse_degrees(raw: &str) -> Result<Self, CoreError> {
        let degrees: f64 = raw
            .trim()
            .parse()
            .map_err(|_| CoreError::validation(format!("`{raw}` is not a temperature")))?;
        if !degrees.is_finite() || !(-100.0..=200.0).contains(&degrees) {
            return Err(CoreError::validation(format!(
                "{raw} is outside any thermostat's range"
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let tenths = (degrees * 10.0).round() as i32;
        Ok(Self(tenths))
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", f64::from(self.0) / 10.0)
    }
}
