//! Composite "combined Sortino" ranking score.
//!
//! Blends the whole-period, trailing three-year and trailing one-year Sortino
//! ratios (weights 0.3 / 0.4 / 0.3). Components that are unbounded or
//! undefined are dropped and the remaining weights renormalized to sum to 1.

use super::metrics::sortino;
use super::score::Score;

/// Below this many observations no blending is done.
pub const MIN_BLEND_OBSERVATIONS: usize = 100;
pub const THREE_YEAR_OBSERVATIONS: usize = 1095;
pub const ONE_YEAR_OBSERVATIONS: usize = 365;
pub const MIN_THREE_YEAR_OBSERVATIONS: usize = 100;
pub const MIN_ONE_YEAR_OBSERVATIONS: usize = 50;

pub const WHOLE_WEIGHT: f64 = 0.3;
pub const THREE_YEAR_WEIGHT: f64 = 0.4;
pub const ONE_YEAR_WEIGHT: f64 = 0.3;

fn trailing(returns: &[f64], n: usize) -> &[f64] {
    &returns[returns.len().saturating_sub(n)..]
}

pub fn combined_sortino(returns: &[f64], risk_free_rate: f64) -> Score {
    let whole = sortino(returns, risk_free_rate);
    if returns.len() < MIN_BLEND_OBSERVATIONS {
        return whole;
    }

    let three_year = trailing(returns, THREE_YEAR_OBSERVATIONS);
    let three_year = if three_year.len() >= MIN_THREE_YEAR_OBSERVATIONS {
        sortino(three_year, risk_free_rate)
    } else {
        whole
    };

    let one_year = trailing(returns, ONE_YEAR_OBSERVATIONS);
    let one_year = if one_year.len() >= MIN_ONE_YEAR_OBSERVATIONS {
        sortino(one_year, risk_free_rate)
    } else {
        whole
    };

    blend(&[
        (whole, WHOLE_WEIGHT),
        (three_year, THREE_YEAR_WEIGHT),
        (one_year, ONE_YEAR_WEIGHT),
    ])
}

/// Weights after dropping non-ordinary components: `None` for a dropped
/// component, otherwise its weight rescaled so the kept weights sum to 1.
pub fn normalized_weights(components: &[(Score, f64)]) -> Vec<Option<f64>> {
    let total: f64 = components
        .iter()
        .filter(|(score, _)| score.ordinary().is_some())
        .map(|(_, w)| w)
        .sum();
    components
        .iter()
        .map(|(score, w)| score.ordinary().map(|_| w / total))
        .collect()
}

/// Weighted sum of the ordinary components; undefined if none are ordinary.
pub fn blend(components: &[(Score, f64)]) -> Score {
    let weights = normalized_weights(components);
    let mut kept = components
        .iter()
        .zip(&weights)
        .filter_map(|((score, _), w)| Some(score.ordinary()? * (*w)?))
        .peekable();
    if kept.peek().is_none() {
        return Score::Undefined;
    }
    Score::Ordinary(kept.sum())
}
