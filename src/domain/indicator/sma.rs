//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(v[i-j] for j in 0..n) / n
//! O(n) sliding window: each step adds the newest value and drops the oldest.
//! Warmup: first (n-1) values are undefined. A zero period is never defined.

pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut sma = Vec::with_capacity(values.len());
    let mut window_sum: f64 = 0.0;

    for (i, &value) in values.iter().enumerate() {
        window_sum += value;
        if i >= period {
            window_sum -= values[i - period];
        }
        let valid = i + 1 >= period;
        sma.push(valid.then(|| window_sum / period as f64));
    }

    sma
}

/// Mean of the trailing `period` values, if there are that many.
pub fn last_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Index of the first defined SMA point, if the series is long enough.
pub fn first_valid_index(len: usize, period: usize) -> Option<usize> {
    if period == 0 || len < period {
        None
    } else {
        Some(period - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let sma = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_eq!(sma[0], None);
        assert_eq!(sma[1], None);
        assert!(sma[2].is_some());
        assert!(sma[4].is_some());
    }

    #[test]
    fn sma_values() {
        let sma = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_eq!(sma[2], Some(20.0));
        assert_eq!(sma[3], Some(30.0));
        assert_eq!(sma[4], Some(40.0));
    }

    #[test]
    fn sma_constant_values_are_exact() {
        let sma = calculate_sma(&[100.0; 10], 4);
        assert!(sma.iter().skip(3).all(|v| *v == Some(100.0)));
    }

    #[test]
    fn sma_period_one_is_identity() {
        let values = [1.0, 5.0, 3.0];
        let sma = calculate_sma(&values, 1);
        assert_eq!(sma, vec![Some(1.0), Some(5.0), Some(3.0)]);
    }

    #[test]
    fn sma_period_longer_than_series() {
        let sma = calculate_sma(&[1.0, 2.0], 5);
        assert_eq!(sma, vec![None, None]);
        assert_eq!(first_valid_index(2, 5), None);
    }

    #[test]
    fn sma_zero_period() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 0), vec![None, None]);
        assert_eq!(first_valid_index(2, 0), None);
    }

    #[test]
    fn sma_sliding_sum_matches_direct_mean() {
        let values: Vec<f64> = (0..500).map(|i| 100.0 + (i as f64 / 7.0).sin() * 20.0).collect();
        let sma = calculate_sma(&values, 50);
        for i in 49..values.len() {
            let direct = values[i - 49..=i].iter().sum::<f64>() / 50.0;
            assert!((sma[i].unwrap() - direct).abs() < 1e-9);
        }
    }

    #[test]
    fn last_sma_uses_trailing_window() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(last_sma(&values, 3), Some(40.0));
        assert_eq!(last_sma(&values, 3), calculate_sma(&values, 3)[4]);
        assert_eq!(last_sma(&values, 6), None);
        assert_eq!(last_sma(&values, 0), None);
    }

    #[test]
    fn first_valid_index_after_warmup() {
        assert_eq!(first_valid_index(10, 3), Some(2));
        assert_eq!(first_valid_index(3, 3), Some(2));
    }
}
