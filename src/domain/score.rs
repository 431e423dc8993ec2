//! Risk-adjusted score with explicit unbounded/undefined states.
//!
//! Sortino-style ratios can be infinite (no downside at all) or undefined
//! (not enough downside observations to measure deviation). Keeping those
//! states as variants makes ranking and blending exhaustive instead of
//! relying on NaN comparisons.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// A finite ratio.
    Ordinary(f64),
    /// Positive return with no measurable downside.
    Unbounded,
    /// Not computable from the available observations.
    Undefined,
}

impl Score {
    /// Classifies a raw float: NaN is undefined, +inf unbounded. Negative
    /// infinity is treated as undefined since no ratio here can reach it.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() || value == f64::NEG_INFINITY {
            Score::Undefined
        } else if value.is_infinite() {
            Score::Unbounded
        } else {
            Score::Ordinary(value)
        }
    }

    pub fn ordinary(self) -> Option<f64> {
        match self {
            Score::Ordinary(v) => Some(v),
            _ => None,
        }
    }

    /// Total order used for ranking: undefined < every ordinary value < unbounded.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Score::Undefined, Score::Undefined) => Ordering::Equal,
            (Score::Undefined, _) => Ordering::Less,
            (_, Score::Undefined) => Ordering::Greater,
            (Score::Unbounded, Score::Unbounded) => Ordering::Equal,
            (Score::Unbounded, _) => Ordering::Greater,
            (_, Score::Unbounded) => Ordering::Less,
            (Score::Ordinary(a), Score::Ordinary(b)) => a.total_cmp(b),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Ordinary(v) => write!(f, "{:.2}", v),
            Score::Unbounded => write!(f, "inf"),
            Score::Undefined => write!(f, "N/A"),
        }
    }
}

/// JSON has no infinity or NaN: unbounded is written as the string
/// `"Infinity"`, undefined as `null`.
impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Ordinary(v) => serializer.serialize_f64(*v),
            Score::Unbounded => serializer.serialize_str("Infinity"),
            Score::Undefined => serializer.serialize_none(),
        }
    }
}
