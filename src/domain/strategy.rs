//! Strategy families evaluated by the optimizer.
//!
//! A family is a named trading setup (one asset, or a rebalanced pair) whose
//! only free parameter is the moving-average window.

use crate::domain::error::TrendscopeError;
use crate::domain::evaluation::{evaluate, EvaluationRecord, EvaluationSettings};
use crate::domain::price_series::PriceSeries;
use crate::domain::rebalance::{evaluate_rebalanced, RebalanceFrequency, RebalancePolicy};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    SingleAsset {
        asset: String,
    },
    Rebalanced {
        asset_a: String,
        asset_b: String,
        policy: RebalancePolicy,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyFamily {
    pub key: String,
    pub kind: StrategyKind,
}

impl StrategyFamily {
    pub fn single(key: impl Into<String>, asset: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: StrategyKind::SingleAsset {
                asset: asset.into(),
            },
        }
    }

    pub fn rebalanced(
        key: impl Into<String>,
        asset_a: impl Into<String>,
        asset_b: impl Into<String>,
        target_weight_a: f64,
        frequency: RebalanceFrequency,
    ) -> Self {
        Self {
            key: key.into(),
            kind: StrategyKind::Rebalanced {
                asset_a: asset_a.into(),
                asset_b: asset_b.into(),
                policy: RebalancePolicy {
                    target_weight_a,
                    frequency,
                },
            },
        }
    }

    /// BTC, ETH and the 50/50 and 60/40 monthly-rebalanced pairs.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::single("BTC", "BTC"),
            Self::single("ETH", "ETH"),
            Self::rebalanced("Rebal_50_50", "BTC", "ETH", 0.5, RebalanceFrequency::Monthly),
            Self::rebalanced("Rebal_60_40", "BTC", "ETH", 0.6, RebalanceFrequency::Monthly),
        ]
    }

    /// Built-in family with this key, matched case-insensitively.
    pub fn builtin(key: &str) -> Option<Self> {
        Self::defaults()
            .into_iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
    }

    pub fn assets(&self) -> Vec<&str> {
        match &self.kind {
            StrategyKind::SingleAsset { asset } => vec![asset.as_str()],
            StrategyKind::Rebalanced {
                asset_a, asset_b, ..
            } => vec![asset_a.as_str(), asset_b.as_str()],
        }
    }

    /// Binds the family to loaded price series. Fails with `NoData` when a
    /// required asset is missing or empty.
    pub fn resolve<'a>(
        &'a self,
        series: &'a BTreeMap<String, PriceSeries>,
    ) -> Result<ResolvedStrategy<'a>, TrendscopeError> {
        let lookup = |asset: &str| -> Result<&'a PriceSeries, TrendscopeError> {
            series
                .get(asset)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| TrendscopeError::NoData {
                    asset: asset.to_string(),
                })
        };

        match &self.kind {
            StrategyKind::SingleAsset { asset } => Ok(ResolvedStrategy::Single(lookup(asset)?)),
            StrategyKind::Rebalanced {
                asset_a,
                asset_b,
                policy,
            } => Ok(ResolvedStrategy::Rebalanced {
                a: lookup(asset_a)?,
                b: lookup(asset_b)?,
                policy: *policy,
            }),
        }
    }
}

/// A family with its price data attached, ready to evaluate any window.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedStrategy<'a> {
    Single(&'a PriceSeries),
    Rebalanced {
        a: &'a PriceSeries,
        b: &'a PriceSeries,
        policy: RebalancePolicy,
    },
}

impl ResolvedStrategy<'_> {
    pub fn evaluate(&self, window: usize, settings: &EvaluationSettings) -> EvaluationRecord {
        match self {
            ResolvedStrategy::Single(series) => evaluate(series, window, settings),
            ResolvedStrategy::Rebalanced { a, b, policy } => {
                evaluate_rebalanced(a, b, window, policy, settings)
            }
        }
    }
}
