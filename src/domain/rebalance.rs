//! Two-asset trend portfolio with periodic rebalancing.
//!
//! Each asset runs its own lagged trend rule. The sleeves are held at target
//! weights, drift with their own strategy returns between rebalance dates, and
//! are reset to target on the first day of each new period. Resetting costs
//! `(|drift_a - target_a| + |drift_b - target_b|) * fee` of the pre-rebalance value.

use super::evaluation::{summarize, EvaluationRecord, EvaluationSettings};
use super::indicator::first_valid_index;
use super::price_series::{common_dates, epoch, PriceSeries};
use super::signal::current_signal;
use super::simulation::{pct_change, simulate_trend};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebalanceFrequency {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl RebalanceFrequency {
    /// Calendar period a date belongs to. A change of label between two
    /// consecutive days marks a rebalance.
    pub fn period_label(&self, date: NaiveDate) -> (i32, u32) {
        match self {
            RebalanceFrequency::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            RebalanceFrequency::Monthly => (date.year(), date.month()),
            RebalanceFrequency::Quarterly => (date.year(), (date.month() - 1) / 3 + 1),
            RebalanceFrequency::Yearly => (date.year(), 0),
        }
    }

    /// Marks days that open a new period; the first day never does.
    pub fn rebalance_days(&self, dates: &[NaiveDate]) -> Vec<bool> {
        let mut flags = Vec::with_capacity(dates.len());
        for (i, &date) in dates.iter().enumerate() {
            flags.push(i > 0 && self.period_label(date) != self.period_label(dates[i - 1]));
        }
        flags
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebalanceFrequency::Weekly => "weekly",
            RebalanceFrequency::Monthly => "monthly",
            RebalanceFrequency::Quarterly => "quarterly",
            RebalanceFrequency::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

impl FromStr for RebalanceFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "w" | "weekly" => Ok(RebalanceFrequency::Weekly),
            "m" | "monthly" => Ok(RebalanceFrequency::Monthly),
            "q" | "quarterly" => Ok(RebalanceFrequency::Quarterly),
            "y" | "a" | "yearly" | "annual" => Ok(RebalanceFrequency::Yearly),
            other => Err(format!("unknown rebalance frequency: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalancePolicy {
    pub target_weight_a: f64,
    pub frequency: RebalanceFrequency,
}

impl RebalancePolicy {
    pub fn targets(&self) -> (f64, f64) {
        (self.target_weight_a, 1.0 - self.target_weight_a)
    }
}

/// Day-by-day state of the rebalanced portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSimulation {
    /// Portfolio value, starting at 1.0.
    pub values: Vec<f64>,
    /// Sleeve weights at the close of each day.
    pub weights: Vec<(f64, f64)>,
    /// Indices of days on which a rebalance happened.
    pub rebalance_days: Vec<usize>,
    pub rebalance_cost: f64,
}

impl PortfolioSimulation {
    pub fn is_wiped_out(&self) -> bool {
        self.values.last().is_some_and(|v| *v <= 0.0)
    }
}

/// Runs the weight state machine over per-day strategy returns of both sleeves.
///
/// All three slices must have equal length. Day 0 returns are ignored.
pub fn simulate_portfolio(
    dates: &[NaiveDate],
    returns_a: &[f64],
    returns_b: &[f64],
    policy: &RebalancePolicy,
    fee: f64,
) -> PortfolioSimulation {
    let n = dates.len();
    let targets = policy.targets();
    let rebalance_flags = policy.frequency.rebalance_days(dates);

    let mut values = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    let mut rebalance_days = Vec::new();
    let mut rebalance_cost = 0.0;

    if n == 0 {
        return PortfolioSimulation {
            values,
            weights,
            rebalance_days,
            rebalance_cost,
        };
    }

    values.push(1.0);
    weights.push(targets);
    let mut current = targets;

    for i in 1..n {
        let prev_total = values[i - 1];
        if prev_total <= 0.0 {
            values.resize(n, prev_total);
            weights.resize(n, current);
            break;
        }

        let value_a = prev_total * current.0 * (1.0 + returns_a[i]);
        let value_b = prev_total * current.1 * (1.0 + returns_b[i]);
        let total = value_a + value_b;

        if total <= 0.0 {
            values.resize(n, total);
            weights.resize(n, current);
            break;
        }

        let drifted = (value_a / total, value_b / total);
        if rebalance_flags[i] {
            let cost =
                ((drifted.0 - targets.0).abs() + (drifted.1 - targets.1).abs()) * fee * total;
            values.push(total - cost);
            rebalance_days.push(i);
            rebalance_cost += cost;
            current = targets;
        } else {
            values.push(total);
            current = drifted;
        }
        weights.push(current);
    }

    PortfolioSimulation {
        values,
        weights,
        rebalance_days,
        rebalance_cost,
    }
}

/// Evaluates the rebalanced two-asset trend portfolio with the given window.
///
/// Both series are inner-joined on date before simulating.
pub fn evaluate_rebalanced(
    series_a: &PriceSeries,
    series_b: &PriceSeries,
    window: usize,
    policy: &RebalancePolicy,
    settings: &EvaluationSettings,
) -> EvaluationRecord {
    let dates = common_dates(&[series_a, series_b]);
    let a = series_a.restrict_to(&dates);
    let b = series_b.restrict_to(&dates);
    let anchor = a.first_date().unwrap_or_else(epoch);

    let closes_a = a.closes();
    let closes_b = b.closes();
    let start = match first_valid_index(closes_a.len(), window) {
        Some(start) if closes_a.len() - start >= 2 => start,
        _ => return EvaluationRecord::insufficient(window, anchor),
    };

    let sim_a = simulate_trend(&closes_a, window, start, settings.fee);
    let sim_b = simulate_trend(&closes_b, window, start, settings.fee);
    let all_dates = a.dates();
    let eval_dates = &all_dates[start..];

    let portfolio = simulate_portfolio(
        eval_dates,
        &sim_a.net_returns,
        &sim_b.net_returns,
        policy,
        settings.fee,
    );
    let returns = pct_change(&portfolio.values);
    let signal = current_signal(&portfolio.values, window);

    summarize(
        window,
        eval_dates,
        &portfolio.values,
        &returns,
        signal,
        settings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::score::Score;
    use crate::domain::signal::Signal;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    fn half_half() -> RebalancePolicy {
        RebalancePolicy {
            target_weight_a: 0.5,
            frequency: RebalanceFrequency::Monthly,
        }
    }

    #[test]
    fn period_labels() {
        let date = d(2024, 5, 17);
        assert_eq!(RebalanceFrequency::Monthly.period_label(date), (2024, 5));
        assert_eq!(RebalanceFrequency::Quarterly.period_label(date), (2024, 2));
        assert_eq!(RebalanceFrequency::Yearly.period_label(date), (2024, 0));
        assert_eq!(RebalanceFrequency::Weekly.period_label(date), (2024, 20));
    }

    #[test]
    fn weekly_label_uses_iso_year() {
        // 2024-12-30 belongs to ISO week 1 of 2025
        assert_eq!(RebalanceFrequency::Weekly.period_label(d(2024, 12, 30)), (2025, 1));
    }

    #[test]
    fn rebalance_days_mark_period_starts() {
        let dates = vec![d(2024, 1, 30), d(2024, 1, 31), d(2024, 2, 1), d(2024, 2, 2)];
        assert_eq!(
            RebalanceFrequency::Monthly.rebalance_days(&dates),
            vec![false, false, true, false]
        );
    }

    #[test]
    fn first_day_never_rebalances() {
        let dates = vec![d(2024, 3, 1)];
        assert_eq!(RebalanceFrequency::Monthly.rebalance_days(&dates), vec![false]);
    }

    #[test]
    fn parse_frequency() {
        assert_eq!("M".parse::<RebalanceFrequency>(), Ok(RebalanceFrequency::Monthly));
        assert_eq!(
            "quarterly".parse::<RebalanceFrequency>(),
            Ok(RebalanceFrequency::Quarterly)
        );
        assert_eq!("weekly".parse::<RebalanceFrequency>(), Ok(RebalanceFrequency::Weekly));
        assert_eq!("annual".parse::<RebalanceFrequency>(), Ok(RebalanceFrequency::Yearly));
        assert!("hourly".parse::<RebalanceFrequency>().is_err());
        assert_eq!(RebalanceFrequency::Quarterly.to_string(), "quarterly");
    }

    #[test]
    fn drift_without_rebalance_costs_nothing() {
        let dates = days(d(2024, 1, 1), 3);
        let sim = simulate_portfolio(
            &dates,
            &[0.0, 0.1, 0.0],
            &[0.0, -0.1, 0.0],
            &half_half(),
            0.01,
        );
        assert_relative_eq!(sim.values[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sim.weights[1].0, 0.55, epsilon = 1e-12);
        assert_relative_eq!(sim.weights[1].1, 0.45, epsilon = 1e-12);
        assert!(sim.rebalance_days.is_empty());
        assert_eq!(sim.rebalance_cost, 0.0);
    }

    #[test]
    fn rebalance_charges_drift_cost_and_resets() {
        let dates = vec![d(2024, 1, 30), d(2024, 1, 31), d(2024, 2, 1)];
        let fee = 0.01;
        let sim = simulate_portfolio(
            &dates,
            &[0.0, 0.1, 0.0],
            &[0.0, -0.1, 0.0],
            &half_half(),
            fee,
        );

        // day 2 opens February: weights 0.55/0.45 drift 0.05 each side
        let expected_cost = (0.05 + 0.05) * fee * 1.0;
        assert_eq!(sim.rebalance_days, vec![2]);
        assert_relative_eq!(sim.rebalance_cost, expected_cost, epsilon = 1e-12);
        assert_relative_eq!(sim.values[2], 1.0 - expected_cost, epsilon = 1e-12);
        assert_eq!(sim.weights[2], (0.5, 0.5));
    }

    #[test]
    fn wipeout_freezes_remaining_days() {
        let dates = days(d(2024, 1, 1), 5);
        let sim = simulate_portfolio(
            &dates,
            &[0.0, -1.0, 0.5, 0.5, 0.5],
            &[0.0, -1.0, 0.5, 0.5, 0.5],
            &half_half(),
            0.0,
        );
        assert_eq!(sim.values, vec![1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sim.weights.len(), 5);
        assert!(sim.is_wiped_out());
    }

    #[test]
    fn empty_dates() {
        let sim = simulate_portfolio(&[], &[], &[], &half_half(), 0.01);
        assert!(sim.values.is_empty());
        assert!(!sim.is_wiped_out());
    }

    #[test]
    fn identical_assets_never_pay_rebalance_cost() {
        let closes: Vec<f64> = (0..400)
            .map(|i| 100.0 + 15.0 * ((i as f64) / 11.0).sin() + 0.1 * i as f64)
            .collect();
        let a = PriceSeries::from_closes("BTC", d(2021, 1, 1), &closes);
        let b = PriceSeries::from_closes("ETH", d(2021, 1, 1), &closes);

        for frequency in [
            RebalanceFrequency::Weekly,
            RebalanceFrequency::Monthly,
            RebalanceFrequency::Quarterly,
        ] {
            let policy = RebalancePolicy {
                target_weight_a: 0.5,
                frequency,
            };
            let settings = EvaluationSettings::default();
            let sim_a = simulate_trend(&a.closes(), 20, 19, settings.fee);
            let sim_b = simulate_trend(&b.closes(), 20, 19, settings.fee);
            let sim = simulate_portfolio(
                &a.dates()[19..],
                &sim_a.net_returns,
                &sim_b.net_returns,
                &policy,
                settings.fee,
            );
            assert!(!sim.rebalance_days.is_empty());
            assert_eq!(sim.rebalance_cost, 0.0);
            assert!(sim.weights.iter().all(|w| *w == (0.5, 0.5)));
        }
    }

    #[test]
    fn evaluate_rebalanced_insufficient_overlap() {
        let a = PriceSeries::from_closes("BTC", d(2024, 1, 1), &[1.0; 30]);
        let b = PriceSeries::from_closes("ETH", d(2024, 1, 25), &[1.0; 30]);
        // only 6 shared dates
        let record = evaluate_rebalanced(&a, &b, 10, &half_half(), &EvaluationSettings::default());
        assert_eq!(record.signal, Signal::InsufficientData);
        assert_eq!(record.cumulative_series, vec![(d(2024, 1, 25), 1.0)]);
    }

    #[test]
    fn evaluate_rebalanced_disjoint_series_anchor_at_epoch() {
        let a = PriceSeries::from_closes("BTC", d(2024, 1, 1), &[1.0; 5]);
        let b = PriceSeries::from_closes("ETH", d(2025, 1, 1), &[1.0; 5]);
        let record = evaluate_rebalanced(&a, &b, 2, &half_half(), &EvaluationSettings::default());
        assert_eq!(record.cumulative_series, vec![(epoch(), 1.0)]);
    }

    #[test]
    fn evaluate_rebalanced_flat_prices() {
        let a = PriceSeries::from_closes("BTC", d(2022, 1, 1), &[10.0; 200]);
        let b = PriceSeries::from_closes("ETH", d(2022, 1, 1), &[3.0; 200]);
        let record = evaluate_rebalanced(&a, &b, 20, &half_half(), &EvaluationSettings::default());
        assert_eq!(record.final_value, 1.0);
        assert_eq!(record.cagr, 0.0);
        assert_eq!(record.drawdown, 0.0);
        assert_eq!(record.sortino, Score::Ordinary(0.0));
        assert_eq!(record.cumulative_series.len(), 181);
        // the portfolio value equals its own average
        assert_eq!(record.signal, Signal::SellHoldCash);
    }

    #[test]
    fn evaluate_rebalanced_uses_portfolio_trend_for_signal() {
        let closes: Vec<f64> = (1..=120).map(f64::from).collect();
        let a = PriceSeries::from_closes("BTC", d(2022, 1, 1), &closes);
        let b = PriceSeries::from_closes("ETH", d(2022, 1, 1), &closes);
        let record = evaluate_rebalanced(&a, &b, 10, &half_half(), &EvaluationSettings::default());
        assert!(record.final_value > 1.0);
        assert_eq!(record.signal, Signal::Buy);
    }
}
