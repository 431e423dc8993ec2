//! JSON result file adapter.
//!
//! Layout: one object per strategy key in run order, then `last_updated` and
//! `data_period`. Unbounded scores are written as `"Infinity"`, undefined
//! scores and non-finite numbers as `null`.

use crate::domain::error::TrendscopeError;
use crate::domain::optimizer::{FamilyResult, OptimizationResult};
use crate::domain::score::Score;
use crate::domain::signal::Signal;
use crate::ports::result_port::ResultPort;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize)]
struct StrategyEntry<'a> {
    optimal_ma: usize,
    combined_sortino: Score,
    cagr: f64,
    sharpe: f64,
    sortino: Score,
    drawdown: f64,
    volatility: f64,
    final_value: f64,
    signal: Signal,
    signal_color: &'static str,
    cumulative_series: CumulativeSeries<'a>,
}

struct CumulativeSeries<'a>(&'a [(NaiveDate, f64)]);

impl Serialize for CumulativeSeries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .map(|(date, value)| (date.format(DATE_FORMAT).to_string(), value)),
        )
    }
}

impl<'a> From<&'a FamilyResult> for StrategyEntry<'a> {
    fn from(result: &'a FamilyResult) -> Self {
        let best = &result.best;
        Self {
            optimal_ma: best.window,
            combined_sortino: best.combined_sortino,
            cagr: best.cagr,
            sharpe: best.sharpe,
            sortino: best.sortino,
            drawdown: best.drawdown,
            volatility: best.volatility,
            final_value: best.final_value,
            signal: best.signal,
            signal_color: best.signal_color(),
            cumulative_series: CumulativeSeries(&best.cumulative_series),
        }
    }
}

/// Builds the result document.
pub fn to_json_value(result: &OptimizationResult) -> Result<Value, TrendscopeError> {
    let mut root = Map::new();
    for strategy in &result.strategies {
        root.insert(
            strategy.key.clone(),
            serde_json::to_value(StrategyEntry::from(strategy))?,
        );
    }

    root.insert(
        "last_updated".into(),
        Value::String(
            result
                .last_updated
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        ),
    );

    let period = match result.data_period {
        Some((start, end)) => serde_json::json!({
            "start": start.format(DATE_FORMAT).to_string(),
            "end": end.format(DATE_FORMAT).to_string(),
        }),
        None => Value::Null,
    };
    root.insert("data_period".into(), period);

    Ok(Value::Object(root))
}

pub struct JsonResultAdapter {
    pretty: bool,
}

impl JsonResultAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Default for JsonResultAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResultPort for JsonResultAdapter {
    fn write(
        &self,
        result: &OptimizationResult,
        output_path: &Path,
    ) -> Result<(), TrendscopeError> {
        let document = to_json_value(result)?;
        let content = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, content)?;
        Ok(())
    }
}
