//! Data-driven ARIMA order selection.

use super::diff::difference;
use super::model::ArimaParams;
use crate::detection::detect_period;
use crate::utils::stats::{acf, mean};

/// Choose ARIMA orders from simple properties of the series.
///
/// Fewer than 20 points always give `(1,0,1)`. Otherwise `d` is 1 when the
/// series drifts: first third against last third with a 20% threshold for
/// short series, first half against second half with 10% for longer ones.
/// `p` is 1 unless the ACF decays slowly (`|r2| > 0.2`), `q` is always 1,
/// and a detected weekly/monthly/quarterly period adds a `(1,1,1)[s]`
/// seasonal part when the differenced series covers more than two cycles.
pub fn select_order(values: &[f64]) -> ArimaParams {
    let n = values.len();
    if n < 20 {
        return ArimaParams::new(1, 0, 1);
    }

    let d = usize::from(needs_differencing(values));
    let differenced = difference(values, d);
    let period = detect_period(values);
    let p = ar_order(&differenced);
    let q = 1;

    if period > 0 && differenced.len() > 2 * period {
        ArimaParams::seasonal(p, d, q, 1, 1, 1, period)
    } else {
        ArimaParams::new(p, d, q)
    }
}

fn needs_differencing(values: &[f64]) -> bool {
    let n = values.len();
    let (head, tail, threshold) = if n < 30 {
        (&values[..n / 3], &values[2 * n / 3..], 0.2)
    } else {
        (&values[..n / 2], &values[n / 2..], 0.1)
    };
    if head.is_empty() || tail.is_empty() {
        return false;
    }
    let a = mean(head);
    let b = mean(tail);
    (b - a).abs() / (a.abs() + 1e-10) > threshold
}

fn ar_order(values: &[f64]) -> usize {
    let n = values.len();
    if n < 10 {
        return 1;
    }
    let max_lag = if n < 30 { 3 } else { 5 };
    let r = acf(values, max_lag);
    let fast_decay = r[1].abs() > 0.3 && r[2].abs() < r[1].abs() * 0.7;
    if !fast_decay && n >= 20 && r[2].abs() > 0.2 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_series_defaults() {
        let values: Vec<f64> = (0..19).map(|i| i as f64).collect();
        assert_eq!(select_order(&values), ArimaParams::new(1, 0, 1));
    }

    #[test]
    fn trending_series_is_differenced() {
        let values: Vec<f64> = (0..40).map(|i| 10.0 + i as f64).collect();
        let params = select_order(&values);
        assert_eq!(params.d, 1);
        assert_eq!(params.q, 1);
        assert!((1..=2).contains(&params.p));
    }

    #[test]
    fn level_series_is_not_differenced() {
        let values: Vec<f64> = (0..40)
            .map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        assert_eq!(select_order(&values).d, 0);
    }

    #[test]
    fn weekly_pattern_is_seasonal() {
        let cycle = [10.0, 12.0, 15.0, 11.0, 9.0, 8.0, 14.0];
        let values: Vec<f64> = (0..56).map(|i| cycle[i % 7]).collect();
        let params = select_order(&values);
        assert!(params.is_seasonal());
        assert_eq!(params.period, 7);
        assert_eq!(params.seasonal_d, 1);
    }
}
