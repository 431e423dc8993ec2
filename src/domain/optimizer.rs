//! Exhaustive moving-average window search.
//!
//! For each strategy family every candidate window is evaluated on the worker
//! pool, collected into an ordered `window -> record` map and ranked by combined
//! Sortino. Ties go to the smallest window.

use crate::domain::error::TrendscopeError;
use crate::domain::evaluation::{EvaluationRecord, EvaluationSettings};
use crate::domain::market_data::MarketData;
use crate::domain::strategy::StrategyFamily;
use chrono::{DateTime, Local, NaiveDate};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Candidate windows `start, start + step, ..., <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGrid {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl Default for WindowGrid {
    fn default() -> Self {
        Self {
            start: 10,
            end: 200,
            step: 10,
        }
    }
}

impl WindowGrid {
    pub fn windows(&self) -> Vec<usize> {
        (self.start..=self.end).step_by(self.step.max(1)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptimizerConfig {
    pub grid: WindowGrid,
    pub settings: EvaluationSettings,
    /// Worker threads; 0 lets the pool pick one per core.
    pub threads: usize,
}

/// Evaluates every window concurrently.
pub fn evaluate_grid<F>(windows: &[usize], evaluate: F) -> BTreeMap<usize, EvaluationRecord>
where
    F: Fn(usize) -> EvaluationRecord + Sync,
{
    windows
        .par_iter()
        .map(|&window| (window, evaluate(window)))
        .collect()
}

/// Record with the highest combined Sortino; the first in ascending window
/// order wins ties.
pub fn select_best(records: &BTreeMap<usize, EvaluationRecord>) -> Option<&EvaluationRecord> {
    let mut best: Option<&EvaluationRecord> = None;
    for record in records.values() {
        match best {
            Some(current)
                if !record
                    .combined_sortino
                    .rank_cmp(&current.combined_sortino)
                    .is_gt() => {}
            _ => best = Some(record),
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq)]
pub struct FamilyResult {
    pub key: String,
    pub best: EvaluationRecord,
    pub windows_evaluated: usize,
}

#[derive(Debug, Clone)]
pub struct SkippedFamily {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Winning record per family, in configuration order.
    pub strategies: Vec<FamilyResult>,
    pub skipped: Vec<SkippedFamily>,
    pub last_updated: DateTime<Local>,
    pub data_period: Option<(NaiveDate, NaiveDate)>,
}

impl OptimizationResult {
    pub fn get(&self, key: &str) -> Option<&FamilyResult> {
        self.strategies.iter().find(|s| s.key == key)
    }
}

pub struct Optimizer {
    config: OptimizerConfig,
    pool: rayon::ThreadPool,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self, TrendscopeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("trendscope-worker-{i}"))
            .build()
            .map_err(|e| TrendscopeError::WorkerPool {
                reason: e.to_string(),
            })?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimizes one family over the configured grid.
    pub fn optimize_family(
        &self,
        family: &StrategyFamily,
        data: &MarketData,
    ) -> Result<FamilyResult, TrendscopeError> {
        let resolved = family.resolve(&data.series)?;
        let windows = self.config.grid.windows();
        let settings = self.config.settings;

        let records = self
            .pool
            .install(|| evaluate_grid(&windows, |w| resolved.evaluate(w, &settings)));
        for record in records.values() {
            debug!(
                family = %family.key,
                window = record.window,
                combined_sortino = %record.combined_sortino,
                cagr = record.cagr,
                "evaluated window"
            );
        }

        let best = select_best(&records)
            .cloned()
            .ok_or(TrendscopeError::NothingEvaluated)?;
        info!(
            family = %family.key,
            window = best.window,
            combined_sortino = %best.combined_sortino,
            signal = %best.signal,
            "selected window"
        );

        Ok(FamilyResult {
            key: family.key.clone(),
            best,
            windows_evaluated: records.len(),
        })
    }

    /// Optimizes every family. Families whose data cannot be resolved are
    /// skipped; the run fails only if none succeed.
    pub fn run(
        &self,
        families: &[StrategyFamily],
        data: &MarketData,
    ) -> Result<OptimizationResult, TrendscopeError> {
        let outcomes: Vec<Result<FamilyResult, TrendscopeError>> = self.pool.install(|| {
            families
                .par_iter()
                .map(|family| self.optimize_family(family, data))
                .collect()
        });

        let mut strategies = Vec::new();
        let mut skipped = Vec::new();
        for (family, outcome) in families.iter().zip(outcomes) {
            match outcome {
                Ok(result) => strategies.push(result),
                Err(e) => {
                    warn!(family = %family.key, error = %e, "skipping strategy family");
                    skipped.push(SkippedFamily {
                        key: family.key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if strategies.is_empty() {
            return Err(TrendscopeError::NothingEvaluated);
        }

        Ok(OptimizationResult {
            strategies,
            skipped,
            last_updated: Local::now(),
            data_period: data.data_period(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::{epoch, PriceSeries};
    use crate::domain::score::Score;

    fn record(window: usize, score: Score) -> EvaluationRecord {
        EvaluationRecord {
            combined_sortino: score,
            ..EvaluationRecord::insufficient(window, epoch())
        }
    }

    #[test]
    fn default_grid_is_ten_to_two_hundred() {
        let windows = WindowGrid::default().windows();
        assert_eq!(windows.len(), 20);
        assert_eq!(windows.first(), Some(&10));
        assert_eq!(windows.last(), Some(&200));
    }

    #[test]
    fn grid_stops_at_end() {
        let grid = WindowGrid {
            start: 5,
            end: 22,
            step: 5,
        };
        assert_eq!(grid.windows(), vec![5, 10, 15, 20]);
    }

    #[test]
    fn evaluate_grid_keys_by_window() {
        let records = evaluate_grid(&[30, 10, 20], |w| record(w, Score::Ordinary(w as f64)));
        assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![10, 20, 30]);
        assert!(records.iter().all(|(w, r)| *w == r.window));
    }

    #[test]
    fn dominant_window_is_selected() {
        let windows = WindowGrid::default().windows();
        let records = evaluate_grid(&windows, |w| {
            let score = if w == 50 { 3.0 } else { 1.0 / w as f64 };
            record(w, Score::Ordinary(score))
        });
        assert_eq!(select_best(&records).map(|r| r.window), Some(50));
    }

    #[test]
    fn ties_go_to_smallest_window() {
        let records = evaluate_grid(&[10, 20, 30], |w| record(w, Score::Ordinary(1.0)));
        assert_eq!(select_best(&records).map(|r| r.window), Some(10));
    }

    #[test]
    fn unbounded_beats_ordinary() {
        let records = evaluate_grid(&[10, 20, 30], |w| {
            let score = if w == 30 { Score::Unbounded } else { Score::Ordinary(100.0) };
            record(w, score)
        });
        assert_eq!(select_best(&records).map(|r| r.window), Some(30));
    }

    #[test]
    fn undefined_only_when_nothing_else() {
        let records = evaluate_grid(&[10, 20, 30], |w| {
            let score = if w == 10 { Score::Undefined } else { Score::Ordinary(-5.0) };
            record(w, score)
        });
        assert_eq!(select_best(&records).map(|r| r.window), Some(20));

        let records = evaluate_grid(&[10, 20], |w| record(w, Score::Undefined));
        assert_eq!(select_best(&records).map(|r| r.window), Some(10));
    }

    #[test]
    fn empty_grid_has_no_best() {
        assert!(select_best(&BTreeMap::new()).is_none());
    }

    fn market(assets: &[&str], days: usize) -> MarketData {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let closes: Vec<f64> = (0..days)
            .map(|i| 100.0 + 20.0 * ((i as f64) / 17.0).sin() + 0.05 * i as f64)
            .collect();
        MarketData {
            series: assets
                .iter()
                .map(|a| (a.to_string(), PriceSeries::from_closes(*a, start, &closes)))
                .collect(),
            skipped: vec![],
        }
    }

    fn small_config() -> OptimizerConfig {
        OptimizerConfig {
            grid: WindowGrid {
                start: 10,
                end: 40,
                step: 10,
            },
            settings: EvaluationSettings::default(),
            threads: 2,
        }
    }

    #[test]
    fn run_keeps_family_order() {
        let optimizer = Optimizer::new(small_config()).unwrap();
        let result = optimizer
            .run(&StrategyFamily::defaults(), &market(&["BTC", "ETH"], 300))
            .unwrap();
        let keys: Vec<&str> = result.strategies.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["BTC", "ETH", "Rebal_50_50", "Rebal_60_40"]);
        assert!(result.skipped.is_empty());
        assert!(result.strategies.iter().all(|s| s.windows_evaluated == 4));
        assert_eq!(
            result.data_period,
            Some((
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(299)
            ))
        );
    }

    #[test]
    fn run_matches_sequential_selection() {
        let data = market(&["BTC"], 300);
        let config = small_config();
        let optimizer = Optimizer::new(config.clone()).unwrap();
        let result = optimizer
            .run(&[StrategyFamily::single("BTC", "BTC")], &data)
            .unwrap();

        let mut expected: Option<EvaluationRecord> = None;
        for w in config.grid.windows() {
            let r = crate::domain::evaluation::evaluate(&data.series["BTC"], w, &config.settings);
            let better = match &expected {
                Some(e) => r.combined_sortino.rank_cmp(&e.combined_sortino).is_gt(),
                None => true,
            };
            if better {
                expected = Some(r);
            }
        }
        assert_eq!(result.get("BTC").map(|s| &s.best), expected.as_ref());
    }

    #[test]
    fn run_skips_families_without_data() {
        let optimizer = Optimizer::new(small_config()).unwrap();
        let result = optimizer
            .run(&StrategyFamily::defaults(), &market(&["BTC"], 200))
            .unwrap();
        let keys: Vec<&str> = result.strategies.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["BTC"]);
        let skipped: Vec<&str> = result.skipped.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(skipped, vec!["ETH", "Rebal_50_50", "Rebal_60_40"]);
        assert!(result.get("ETH").is_none());
    }

    #[test]
    fn run_without_any_data_fails() {
        let optimizer = Optimizer::new(small_config()).unwrap();
        let err = optimizer
            .run(&StrategyFamily::defaults(), &MarketData::default())
            .unwrap_err();
        assert!(matches!(err, TrendscopeError::NothingEvaluated));
    }
}
