//! Fixed-point math utilities for deterministic simulation.
//!
//! Building levels, radar ranges, alien interest and geoscape positions use
//! fixed-point arithmetic so that two campaigns fed the same orders end in
//! bit-identical states on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Position on the geoscape, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GeoPos {
    /// Longitude.
    #[serde(with = "fixed_serde")]
    pub lon: Fixed,
    /// Latitude.
    #[serde(with = "fixed_serde")]
    pub lat: Fixed,
}

impl GeoPos {
    /// Create a new position.
    #[must_use]
    pub const fn new(lon: Fixed, lat: Fixed) -> Self {
        Self { lon, lat }
    }

    /// Create a position from whole degrees.
    #[must_use]
    pub fn from_degrees(lon: i32, lat: i32) -> Self {
        Self::new(Fixed::from_num(lon), Fixed::from_num(lat))
    }
}

/// Scale `value` by `percent`/100 without leaving fixed-point.
#[must_use]
pub fn percent_of(value: Fixed, percent: u32) -> Fixed {
    value * Fixed::from_num(percent) / Fixed::from_num(100)
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for fixed-point numbers written as whole numbers in data files.
///
/// Data authors write `level: 2`; the value is stored as fixed-point.
pub mod whole_fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize the integer part of a fixed-point number.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<i32>().serialize(serializer)
    }

    /// Deserialize a whole number into fixed-point.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let whole = i32::deserialize(deserializer)?;
        Ok(Fixed::from_num(whole))
    }
}
