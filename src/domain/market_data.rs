//! Loading and aligning the price histories a run needs.
//!
//! Every requested asset is fetched through the data port. Assets that fail
//! to load are skipped with a warning; the remaining ones are inner-joined on
//! date so every series covers exactly the same days.

use crate::domain::error::TrendscopeError;
use crate::domain::price_series::{align, PriceSeries};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetListError {
    #[error("empty token in asset list")]
    EmptyToken,

    #[error("duplicate asset: {0}")]
    DuplicateAsset(String),
}

/// Parses a comma-separated asset list, upper-casing symbols.
pub fn parse_assets(input: &str) -> Result<Vec<String>, AssetListError> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(AssetListError::EmptyToken);
        }
        let asset = trimmed.to_uppercase();
        if !seen.insert(asset.clone()) {
            return Err(AssetListError::DuplicateAsset(asset));
        }
        assets.push(asset);
    }

    Ok(assets)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAsset {
    pub asset: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    Unreadable(String),
}

#[derive(Debug, Clone, Default)]
pub struct MarketData {
    /// Date-aligned series keyed by asset symbol.
    pub series: BTreeMap<String, PriceSeries>,
    pub skipped: Vec<SkippedAsset>,
}

impl MarketData {
    /// First and last shared date, if any asset loaded with data.
    pub fn data_period(&self) -> Option<(NaiveDate, NaiveDate)> {
        let series = self.series.values().find(|s| !s.is_empty())?;
        Some((series.first_date()?, series.last_date()?))
    }

    /// Number of shared trading days.
    pub fn days(&self) -> usize {
        self.series.values().map(PriceSeries::len).next().unwrap_or(0)
    }
}

pub fn load_market_data(
    data_port: &dyn PriceDataPort,
    assets: &[String],
) -> Result<MarketData, TrendscopeError> {
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for asset in assets {
        match data_port.fetch_closes(asset) {
            Ok(series) if series.is_empty() => {
                warn!(asset = %asset, "skipping asset: no price data");
                skipped.push(SkippedAsset {
                    asset: asset.clone(),
                    reason: SkipReason::NoData,
                });
            }
            Ok(series) => {
                info!(asset = %asset, days = series.len(), "loaded price history");
                loaded.push(series);
            }
            Err(e) => {
                warn!(asset = %asset, error = %e, "skipping asset");
                skipped.push(SkippedAsset {
                    asset: asset.clone(),
                    reason: SkipReason::Unreadable(e.to_string()),
                });
            }
        }
    }

    let market = MarketData {
        series: align(loaded),
        skipped,
    };

    if let Some((start, end)) = market.data_period() {
        info!(%start, %end, days = market.days(), "aligned price histories");
    } else if !market.series.is_empty() {
        warn!("loaded assets share no common dates");
    }

    Ok(market)
}
