//! Performance metrics over daily return and wealth series.
//!
//! Series are daily calendar-day observations (crypto markets trade every day),
//! so annualization uses 365 periods. Elapsed years for CAGR use 365.25 days.
//! Standard deviations are sample (n - 1) deviations.

use super::score::Score;
use chrono::{Months, NaiveDate};

pub const PERIODS_PER_YEAR: f64 = 365.0;
pub const DAYS_PER_YEAR: f64 = 365.25;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; `None` for fewer than two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Compound annual growth rate of a terminal wealth factor.
///
/// A factor of exactly zero is a total loss (-1.0). Zero years or a negative
/// factor yield 0.0.
pub fn cagr(final_factor: f64, years: f64) -> f64 {
    if final_factor == 0.0 {
        return -1.0;
    }
    if years == 0.0 || final_factor < 0.0 {
        return 0.0;
    }
    final_factor.powf(1.0 / years) - 1.0
}

/// Calendar years between two dates, floored at one day.
pub fn elapsed_years(start: NaiveDate, end: NaiveDate) -> f64 {
    let days = (end - start).num_days() as f64;
    (days / DAYS_PER_YEAR).max(1.0 / DAYS_PER_YEAR)
}

/// Annualized Sortino ratio against `risk_free_rate` (annual).
pub fn sortino(returns: &[f64], risk_free_rate: f64) -> Score {
    let annual_mean = mean(returns).map(|m| m * PERIODS_PER_YEAR);
    let without_downside = match annual_mean {
        Some(m) if m > risk_free_rate => Score::Unbounded,
        _ => Score::Ordinary(0.0),
    };

    let downside: Vec<f64> = returns
        .iter()
        .copied()
        .filter(|&r| r < risk_free_rate)
        .collect();
    if downside.is_empty() {
        return without_downside;
    }

    // A lone downside observation has no sample deviation.
    let Some(deviation) = sample_std(&downside) else {
        return Score::Undefined;
    };
    let annual_deviation = deviation * PERIODS_PER_YEAR.sqrt();
    if annual_deviation == 0.0 {
        return without_downside;
    }

    match annual_mean {
        Some(m) => Score::from_f64((m - risk_free_rate) / annual_deviation),
        None => Score::Undefined,
    }
}

/// Annualized Sharpe ratio with a zero risk-free rate; 0.0 without dispersion.
pub fn sharpe(returns: &[f64]) -> f64 {
    match (mean(returns), sample_std(returns)) {
        (Some(m), Some(s)) if s > 0.0 => (m * PERIODS_PER_YEAR) / (s * PERIODS_PER_YEAR.sqrt()),
        _ => 0.0,
    }
}

pub fn annualized_volatility(returns: &[f64]) -> f64 {
    match sample_std(returns) {
        Some(s) if s > 0.0 => s * PERIODS_PER_YEAR.sqrt(),
        _ => 0.0,
    }
}

/// Deepest fall from a running peak, as a non-positive fraction.
pub fn max_drawdown(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mut peak = values[0];
    let mut worst = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        }
        let dd = v / peak - 1.0;
        if dd < worst {
            worst = dd;
        }
    }
    worst
}

/// Performance over a trailing span of a wealth series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodPerformance {
    pub years: u32,
    pub total_return: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
}

/// Return, CAGR and drawdown over the last `years` calendar years of `series`.
///
/// `None` when fewer than two points fall in the span or the span starts at a
/// non-positive value.
pub fn trailing_performance(series: &[(NaiveDate, f64)], years: u32) -> Option<PeriodPerformance> {
    let &(last_date, last_value) = series.last()?;
    let start = last_date.checked_sub_months(Months::new(12 * years))?;
    let window: Vec<(NaiveDate, f64)> = series
        .iter()
        .copied()
        .filter(|(date, _)| *date >= start)
        .collect();
    if window.len() < 2 {
        return None;
    }

    let (first_date, first_value) = window[0];
    if first_value <= 0.0 {
        return None;
    }
    let factor = last_value / first_value;
    let values: Vec<f64> = window.iter().map(|(_, v)| *v).collect();

    Some(PeriodPerformance {
        years,
        total_return: factor - 1.0,
        cagr: cagr(factor, elapsed_years(first_date, last_date)),
        max_drawdown: max_drawdown(&values),
    })
}
