#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use trendscope::domain::error::TrendscopeError;
use trendscope::domain::optimizer::OptimizationResult;
pub use trendscope::domain::price_series::{PricePoint, PriceSeries};
use trendscope::ports::data_port::PriceDataPort;
use trendscope::ports::result_port::ResultPort;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.asset.clone(), series);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_closes(&self, asset: &str) -> Result<PriceSeries, TrendscopeError> {
        if let Some(reason) = self.errors.get(asset) {
            return Err(TrendscopeError::DataSource {
                reason: reason.clone(),
            });
        }
        self.data
            .get(asset)
            .cloned()
            .ok_or_else(|| TrendscopeError::DataSource {
                reason: format!("no data file for {asset}"),
            })
    }

    fn list_assets(&self) -> Result<Vec<String>, TrendscopeError> {
        let mut assets: Vec<String> = self.data.keys().cloned().collect();
        assets.sort();
        Ok(assets)
    }
}

/// Records every write instead of touching the filesystem.
pub struct CapturingResultPort {
    pub calls: RefCell<Vec<(OptimizationResult, PathBuf)>>,
}

impl CapturingResultPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ResultPort for CapturingResultPort {
    fn write(
        &self,
        result: &OptimizationResult,
        output_path: &Path,
    ) -> Result<(), TrendscopeError> {
        self.calls
            .borrow_mut()
            .push((result.clone(), output_path.to_path_buf()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn series_from(asset: &str, start: NaiveDate, closes: &[f64]) -> PriceSeries {
    PriceSeries::from_closes(asset, start, closes)
}

/// Strictly increasing prices, `start_price * growth^i`.
pub fn rising_closes(count: usize, start_price: f64, growth: f64) -> Vec<f64> {
    (0..count)
        .map(|i| start_price * growth.powi(i as i32))
        .collect()
}

/// Oscillating prices with drift, so trend windows trade repeatedly.
pub fn wavy_closes(count: usize, period: f64, amplitude: f64, drift: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            100.0 + amplitude * (t / period).sin() + drift * t
        })
        .collect()
}

/// Writes `<ASSET>.csv` with `date,close` rows.
pub fn write_csv(dir: &Path, series: &PriceSeries) {
    let mut content = String::from("date,close\n");
    for point in series.points() {
        content.push_str(&format!("{},{}\n", point.date.format("%Y-%m-%d"), point.close));
    }
    std::fs::write(dir.join(format!("{}.csv", series.asset)), content).unwrap();
}
