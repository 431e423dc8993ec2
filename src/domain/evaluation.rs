//! Single-asset strategy evaluation and the per-window evaluation record.

use super::combined_score::combined_sortino;
use super::indicator::first_valid_index;
use super::metrics::{self, DAYS_PER_YEAR};
use super::price_series::{epoch, PriceSeries};
use super::score::Score;
use super::signal::{current_signal, Signal};
use super::simulation::{cumulative_wealth, simulate_trend};
use chrono::NaiveDate;

pub const DEFAULT_FEE: f64 = 0.0025;

/// Cost and benchmark assumptions shared by every evaluation in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationSettings {
    /// Proportional cost per unit of position change.
    pub fee: f64,
    /// Annual threshold for the Sortino ratio.
    pub risk_free_rate: f64,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            fee: DEFAULT_FEE,
            risk_free_rate: 0.0,
        }
    }
}

/// Outcome of simulating one strategy with one moving-average window.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub window: usize,
    pub sharpe: f64,
    pub sortino: Score,
    pub combined_sortino: Score,
    pub cagr: f64,
    pub final_value: f64,
    pub drawdown: f64,
    pub volatility: f64,
    /// Wealth factor per day, chronological.
    pub cumulative_series: Vec<(NaiveDate, f64)>,
    pub signal: Signal,
}

impl EvaluationRecord {
    /// Neutral record for a window the history cannot support.
    pub fn insufficient(window: usize, anchor: NaiveDate) -> Self {
        Self {
            window,
            sharpe: 0.0,
            sortino: Score::Undefined,
            combined_sortino: Score::Undefined,
            cagr: 0.0,
            final_value: 1.0,
            drawdown: 0.0,
            volatility: 0.0,
            cumulative_series: vec![(anchor, 1.0)],
            signal: Signal::InsufficientData,
        }
    }

    pub fn signal_color(&self) -> &'static str {
        self.signal.color()
    }

    pub fn is_wiped_out(&self) -> bool {
        self.final_value <= 0.0
    }
}

/// Builds the record from a simulated wealth path and its daily returns.
///
/// `dates`, `wealth` and `returns` must have equal, non-zero length.
pub(crate) fn summarize(
    window: usize,
    dates: &[NaiveDate],
    wealth: &[f64],
    returns: &[f64],
    signal: Signal,
    settings: &EvaluationSettings,
) -> EvaluationRecord {
    let final_value = wealth.last().copied().unwrap_or(1.0);
    let cumulative_series: Vec<(NaiveDate, f64)> =
        dates.iter().copied().zip(wealth.iter().copied()).collect();
    let drawdown = metrics::max_drawdown(wealth);
    let volatility = metrics::annualized_volatility(returns);

    if final_value <= 0.0 {
        return EvaluationRecord {
            window,
            sharpe: 0.0,
            sortino: Score::Undefined,
            combined_sortino: Score::Undefined,
            cagr: metrics::cagr(final_value, 1.0 / DAYS_PER_YEAR),
            final_value,
            drawdown,
            volatility,
            cumulative_series,
            signal,
        };
    }

    let years = match (dates.first(), dates.last()) {
        (Some(&first), Some(&last)) => metrics::elapsed_years(first, last),
        _ => 1.0 / DAYS_PER_YEAR,
    };

    EvaluationRecord {
        window,
        sharpe: metrics::sharpe(returns),
        sortino: metrics::sortino(returns, settings.risk_free_rate),
        combined_sortino: combined_sortino(returns, settings.risk_free_rate),
        cagr: metrics::cagr(final_value, years),
        final_value,
        drawdown,
        volatility,
        cumulative_series,
        signal,
    }
}

/// Evaluates the lagged trend rule on one asset with the given window.
pub fn evaluate(
    series: &PriceSeries,
    window: usize,
    settings: &EvaluationSettings,
) -> EvaluationRecord {
    let anchor = series.first_date().unwrap_or_else(epoch);
    let closes = series.closes();

    let start = match first_valid_index(closes.len(), window) {
        Some(start) if closes.len() - start >= 2 => start,
        _ => return EvaluationRecord::insufficient(window, anchor),
    };

    let sim = simulate_trend(&closes, window, start, settings.fee);
    let wealth = cumulative_wealth(&sim.net_returns);
    let dates = series.dates();
    let signal = current_signal(&closes, window);

    summarize(
        window,
        &dates[start..],
        &wealth,
        &sim.net_returns,
        signal,
        settings,
    )
}
