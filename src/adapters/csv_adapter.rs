//! CSV file price data adapter.
//!
//! One file per asset, `<ASSET>.csv`, with a header row naming at least a
//! `date` (YYYY-MM-DD) and a `close` column. Other columns are ignored.

use crate::domain::error::TrendscopeError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Prefers `<ASSET>.csv`, falling back to the lower-case file name.
    fn csv_path(&self, asset: &str) -> PathBuf {
        let upper = self.base_path.join(format!("{}.csv", asset.to_uppercase()));
        if upper.exists() {
            return upper;
        }
        let lower = self.base_path.join(format!("{}.csv", asset.to_lowercase()));
        if lower.exists() { lower } else { upper }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("null")
}

impl PriceDataPort for CsvAdapter {
    fn fetch_closes(&self, asset: &str) -> Result<PriceSeries, TrendscopeError> {
        let path = self.csv_path(asset);
        let content = fs::read_to_string(&path).map_err(|e| TrendscopeError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| TrendscopeError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let date_col = column_index(&headers, "date").ok_or_else(|| TrendscopeError::DataSource {
            reason: format!("missing date column in {}", path.display()),
        })?;
        let close_col =
            column_index(&headers, "close").ok_or_else(|| TrendscopeError::DataSource {
                reason: format!("missing close column in {}", path.display()),
            })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TrendscopeError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(date_col).unwrap_or("");
            let close_str = record.get(close_col).unwrap_or("");
            if is_missing(close_str) {
                continue;
            }

            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                TrendscopeError::DataSource {
                    reason: format!("invalid date '{}' in {}: {}", date_str, path.display(), e),
                }
            })?;
            let close: f64 = close_str
                .trim()
                .parse()
                .map_err(|e| TrendscopeError::DataSource {
                    reason: format!("invalid close value '{}' on {}: {}", close_str, date, e),
                })?;
            if !close.is_finite() || close <= 0.0 {
                return Err(TrendscopeError::DataSource {
                    reason: format!("non-positive close {} on {} for {}", close, date, asset),
                });
            }

            points.push(PricePoint { date, close });
        }

        Ok(PriceSeries::new(asset.to_uppercase(), points))
    }

    fn list_assets(&self) -> Result<Vec<String>, TrendscopeError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendscopeError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut assets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TrendscopeError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                assets.push(stem.to_string_lossy().to_uppercase());
            }
        }

        assets.sort();
        assets.dedup();
        Ok(assets)
    }
}
