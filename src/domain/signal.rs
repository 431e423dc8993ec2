//! User-facing trend signal.
//!
//! The current signal compares the latest value with its moving average on the
//! same day. It is unlagged, unlike the position used by the simulation.

use super::indicator::last_sma;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    SellHoldCash,
    InsufficientData,
}

impl Signal {
    pub fn label(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::SellHoldCash => "sell/hold-cash",
            Signal::InsufficientData => "insufficient data",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Signal::Buy => "#28a745",
            Signal::SellHoldCash => "#dc3545",
            Signal::InsufficientData => "gray",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Signal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Latest value against its `window` moving average, unlagged.
///
/// Needs at least `window + 1` observations.
pub fn current_signal(values: &[f64], window: usize) -> Signal {
    if window == 0 || values.len() < window + 1 {
        return Signal::InsufficientData;
    }
    match (values.last(), last_sma(values, window)) {
        (Some(&current), Some(ma)) if current > ma => Signal::Buy,
        (Some(_), Some(_)) => Signal::SellHoldCash,
        _ => Signal::InsufficientData,
    }
}
