//! # Unit Types
//!
//! Newtype wrappers for the quantities the pricing pipeline mixes: print time
//! arrives in seconds, is billed in minutes and priced per hour, while
//! material is priced per gram. Wrapping them keeps the conversions in one
//! place and stops a seconds figure from leaking into a per-minute fee.
//!
//! All wrappers serialize as bare numbers.
//!
//! ## Example
//!
//! ```rust
//! use pricer_core::units::{Hours, Minutes, Seconds};
//!
//! let print = Seconds(5400.0);
//! let minutes: Minutes = print.into();
//! assert_eq!(minutes.0, 90.0);
//!
//! let hours: Hours = minutes.into();
//! assert_eq!(hours.0, 1.5);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

// ============================================================================
// Time Units
// ============================================================================

/// Duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seconds(pub f64);

/// Duration in minutes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Minutes(pub f64);

/// Duration in hours
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hours(pub f64);

impl From<Seconds> for Minutes {
    fn from(s: Seconds) -> Self {
        Minutes(s.0 / 60.0)
    }
}

impl From<Minutes> for Seconds {
    fn from(m: Minutes) -> Self {
        Seconds(m.0 * 60.0)
    }
}

impl From<Minutes> for Hours {
    fn from(m: Minutes) -> Self {
        Hours(m.0 / 60.0)
    }
}

impl From<Hours> for Minutes {
    fn from(h: Hours) -> Self {
        Minutes(h.0 * 60.0)
    }
}

impl Minutes {
    /// Raise to `floor` if below it
    pub fn at_least(self, floor: Minutes) -> Minutes {
        Minutes(self.0.max(floor.0))
    }
}

// ============================================================================
// Mass Units
// ============================================================================

/// Material mass in grams
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grams(pub f64);

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Seconds);
impl_arithmetic!(Minutes);
impl_arithmetic!(Hours);
impl_arithmetic!(Grams);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_minutes() {
        let m: Minutes = Seconds(3600.0).into();
        assert_eq!(m.0, 60.0);
        let back: Seconds = m.into();
        assert_eq!(back.0, 3600.0);
    }

    #[test]
    fn test_minutes_to_hours() {
        let h: Hours = Minutes(45.0).into();
        assert_eq!(h.0, 0.75);
    }

    #[test]
    fn test_at_least() {
        assert_eq!(Minutes(10.0).at_least(Minutes(30.0)), Minutes(30.0));
        assert_eq!(Minutes(90.0).at_least(Minutes(30.0)), Minutes(90.0));
    }

    #[test]
    fn test_arithmetic() {
        let a = Grams(10.0);
        let b = Grams(4.0);
        assert_eq!((a + b).0, 14.0);
        assert_eq!((a - b).0, 6.0);
        assert_eq!((a * 2.5).0, 25.0);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Minutes(12.5)).unwrap();
        assert_eq!(json, "12.5");
        let roundtrip: Minutes = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, Minutes(12.5));
    }
}
