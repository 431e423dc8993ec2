//! Core domain types and logic.

pub mod combined_score;
pub mod config_validation;
pub mod error;
pub mod evaluation;
pub mod indicator;
pub mod market_data;
pub mod metrics;
pub mod optimizer;
pub mod price_series;
pub mod rebalance;
pub mod score;
pub mod signal;
pub mod simulation;
pub mod strategy;
