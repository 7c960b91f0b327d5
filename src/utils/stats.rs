//! Statistical utility functions.

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (n denominator).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation (n denominator).
pub fn population_std_dev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Calculate the median of a slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Autocorrelation function for lags `0..=max_lag`.
///
/// Variance uses the `n` denominator and each lag covariance uses
/// `n - lag`. A series with variance below `1e-10` yields all zeros.
pub fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![0.0; max_lag + 1];
    if n == 0 {
        return out;
    }
    let m = mean(values);
    let variance = population_variance(values);
    if variance < 1e-10 {
        return out;
    }
    out[0] = 1.0;
    for lag in 1..=max_lag.min(n - 1) {
        let cov: f64 = (lag..n)
            .map(|i| (values[i] - m) * (values[i - lag] - m))
            .sum::<f64>()
            / (n - lag) as f64;
        out[lag] = cov / variance;
    }
    out
}

/// Correlation of a series with itself shifted by `lag`, centred on the
/// overall mean. Returns 0 when either side has no variation.
pub fn lagged_correlation(values: &[f64], lag: usize) -> f64 {
    let n = values.len();
    if lag == 0 || lag >= n {
        return 0.0;
    }
    let m = mean(values);
    let mut num = 0.0;
    let mut left = 0.0;
    let mut right = 0.0;
    for i in 0..n - lag {
        let a = values[i] - m;
        let b = values[i + lag] - m;
        num += a * b;
        left += a * a;
        right += b * b;
    }
    let denom = (left * right).sqrt();
    if denom < 1e-10 {
        0.0
    } else {
        num / denom
    }
}

/// Average slope `Δy/Δx` over the last `intervals` consecutive pairs.
///
/// Pairs with a non-positive `Δx` are skipped. Returns `None` when no usable
/// pair exists.
pub fn average_slope(x: &[f64], y: &[f64], intervals: usize) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let start = n.saturating_sub(intervals + 1);
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in start..n - 1 {
        let dx = x[i + 1] - x[i];
        if dx > 0.0 {
            sum += (y[i + 1] - y[i]) / dx;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
