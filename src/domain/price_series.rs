//! Daily closing-price series and cross-asset date alignment.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Anchor for degenerate results when a series has no dates at all (1970-01-01).
pub fn epoch() -> NaiveDate {
    NaiveDate::default()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices for one asset, strictly increasing by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub asset: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, sorting by date and keeping the last price seen for a
    /// duplicated date.
    pub fn new(asset: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            asset: asset.into(),
            points: deduped,
        }
    }

    pub fn from_closes(asset: impl Into<String>, start: NaiveDate, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close,
            })
            .collect();
        Self::new(asset, points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Keeps only the points whose date is in `dates`.
    pub fn restrict_to(&self, dates: &BTreeSet<NaiveDate>) -> Self {
        Self {
            asset: self.asset.clone(),
            points: self
                .points
                .iter()
                .filter(|p| dates.contains(&p.date))
                .copied()
                .collect(),
        }
    }
}

/// Dates present in every series.
pub fn common_dates(series: &[&PriceSeries]) -> BTreeSet<NaiveDate> {
    let mut iter = series.iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };
    let mut dates: BTreeSet<NaiveDate> = first.points.iter().map(|p| p.date).collect();
    for s in iter {
        let other: BTreeSet<NaiveDate> = s.points.iter().map(|p| p.date).collect();
        dates = dates.intersection(&other).copied().collect();
    }
    dates
}

/// Inner-joins all series on date: every returned series covers exactly the
/// same dates.
pub fn align(series: Vec<PriceSeries>) -> BTreeMap<String, PriceSeries> {
    let refs: Vec<&PriceSeries> = series.iter().collect();
    let dates = common_dates(&refs);
    series
        .iter()
        .map(|s| (s.asset.clone(), s.restrict_to(&dates)))
        .collect()
}
