//! Trend indicators over closing-price (or portfolio value) series.
//!
//! Indicator outputs are aligned index-for-index with their input; warmup
//! positions where the indicator is not yet defined hold `None`.

pub mod sma;

pub use sma::{calculate_sma, first_valid_index, last_sma};
