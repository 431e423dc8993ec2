//! Lagged moving-average trend simulation for a single asset.
//!
//! Over the range where the moving average is defined:
//! - signal[t]   = price[t] > SMA[t]
//! - position[0] = flat, position[t] = signal[t-1]
//! - net[t]      = position[t] * (price[t]/price[t-1] - 1) - |position[t] - position[t-1]| * fee
//!
//! Position at day t only ever depends on prices up to day t-1.

use super::indicator::calculate_sma;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSimulation {
    /// Index into the input series where the simulation starts.
    pub start: usize,
    pub signals: Vec<bool>,
    pub positions: Vec<bool>,
    pub price_returns: Vec<f64>,
    pub net_returns: Vec<f64>,
}

impl TrendSimulation {
    pub fn len(&self) -> usize {
        self.net_returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.net_returns.is_empty()
    }

    /// Number of position changes (entries plus exits).
    pub fn trade_count(&self) -> usize {
        self.positions.windows(2).filter(|w| w[0] != w[1]).count()
    }
}

fn exposure(invested: bool) -> f64 {
    if invested { 1.0 } else { 0.0 }
}

/// Simulates the trend rule on `prices[start..]`, with the SMA computed over the
/// full series so that `start` may sit right after the warmup.
///
/// `start` must be at or past the SMA warmup (`window - 1`); days before it are
/// ignored.
pub fn simulate_trend(prices: &[f64], window: usize, start: usize, fee: f64) -> TrendSimulation {
    let sma = calculate_sma(prices, window);
    let eval_prices = &prices[start.min(prices.len())..];
    let eval_sma = &sma[start.min(sma.len())..];

    let signals: Vec<bool> = eval_prices
        .iter()
        .zip(eval_sma)
        .map(|(&p, ma)| ma.is_some_and(|m| p > m))
        .collect();

    let n = signals.len();
    let mut positions = Vec::with_capacity(n);
    let mut price_returns = Vec::with_capacity(n);
    let mut net_returns = Vec::with_capacity(n);

    for t in 0..n {
        if t == 0 {
            positions.push(false);
            price_returns.push(0.0);
            net_returns.push(0.0);
            continue;
        }
        let position = signals[t - 1];
        let price_return = eval_prices[t] / eval_prices[t - 1] - 1.0;
        let traded = (exposure(position) - exposure(positions[t - 1])).abs();

        positions.push(position);
        price_returns.push(price_return);
        net_returns.push(exposure(position) * price_return - traded * fee);
    }

    TrendSimulation {
        start,
        signals,
        positions,
        price_returns,
        net_returns,
    }
}

/// Compounds net returns into a wealth factor starting at 1.0.
///
/// Once wealth reaches zero or below it is carried unchanged to the end.
pub fn cumulative_wealth(net_returns: &[f64]) -> Vec<f64> {
    let mut wealth = Vec::with_capacity(net_returns.len());
    let mut current = 1.0_f64;
    for (t, r) in net_returns.iter().enumerate() {
        if t > 0 && current > 0.0 {
            current *= 1.0 + r;
        }
        wealth.push(current);
    }
    wealth
}

/// Day-over-day change of a value series; 0.0 on the first day and wherever the
/// previous value is zero.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut changes = Vec::with_capacity(values.len());
    for (t, &v) in values.iter().enumerate() {
        if t == 0 || values[t - 1] == 0.0 {
            changes.push(0.0);
        } else {
            changes.push(v / values[t - 1] - 1.0);
        }
    }
    changes
}
