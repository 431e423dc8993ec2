//! Price data access port trait.

use crate::domain::error::TrendscopeError;
use crate::domain::price_series::PriceSeries;

pub trait PriceDataPort {
    /// Full daily close history of one asset, sorted by date.
    fn fetch_closes(&self, asset: &str) -> Result<PriceSeries, TrendscopeError>;

    fn list_assets(&self) -> Result<Vec<String>, TrendscopeError>;
}
