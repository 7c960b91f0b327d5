//! Historical-pattern forecasting used when ARIMA output is unusable.

/// Recency weight applied per cycle when averaging offsets.
const CYCLE_DECAY: f64 = 0.85;

/// Complete cycles contributing to the template.
const MAX_CYCLES: usize = 5;

/// Forecast `steps_ahead` days past the end of `values` from its seasonal
/// shape.
///
/// Cycles are aligned to the start of the series. The most recent complete
/// cycles (up to five) give a per-position offset template, weighted by
/// `0.85^i` from the newest, and a cycle-mean trend that is projected over
/// the whole cycles ahead. A target inside the current, incomplete cycle
/// blends 70% of its partial mean with 30% of the latest full cycle mean.
///
/// Without a period or two complete cycles, the last value is extended
/// along the mean of the recent first differences.
pub fn historical_pattern(values: &[f64], period: usize, steps_ahead: usize) -> f64 {
    let n = values.len();
    let Some(&last) = values.last() else {
        return 0.0;
    };
    if period == 0 || n < 2 * period {
        return recent_trend(values, steps_ahead);
    }

    let cycles = n / period;
    let position = (n - 1) % period;
    let target = (position + steps_ahead) % period;
    let cycles_ahead = (position + steps_ahead) / period;

    let used = cycles.min(MAX_CYCLES);
    let mut cycle_means = Vec::with_capacity(used);
    let mut weighted = vec![0.0; period];
    let mut weights = vec![0.0; period];
    for i in 0..used {
        let start = (cycles - 1 - i) * period;
        let cycle = &values[start..start + period];
        let cycle_mean = cycle.iter().sum::<f64>() / period as f64;
        let w = CYCLE_DECAY.powi(i as i32);
        for (pos, &y) in cycle.iter().enumerate() {
            weighted[pos] += w * (y - cycle_mean);
            weights[pos] += w;
        }
        cycle_means.push(cycle_mean);
    }
    let offset = if weights[target] > 0.0 {
        weighted[target] / weights[target]
    } else {
        0.0
    };

    let latest = cycle_means[0];
    let mut level = if cycle_means.len() >= 2 {
        let trend = cycle_means
            .windows(2)
            .map(|w| w[0] - w[1])
            .sum::<f64>()
            / (cycle_means.len() - 1) as f64;
        latest + trend * cycles_ahead as f64
    } else {
        latest
    };

    if cycles_ahead == 0 {
        let current_start = (n - 1) / period * period;
        let partial = &values[current_start..];
        if !partial.is_empty() && partial.len() < period {
            let partial_mean = partial.iter().sum::<f64>() / partial.len() as f64;
            level = 0.7 * partial_mean + 0.3 * latest;
        }
    }

    let result = level + offset;
    if result.is_finite() && result >= 0.0 {
        return result;
    }
    let idx = n.saturating_sub(period) + target;
    values.get(idx).copied().unwrap_or(last)
}

/// Last value plus the mean of the last `min(5, n-1)` differences per step.
fn recent_trend(values: &[f64], steps_ahead: usize) -> f64 {
    let n = values.len();
    let last = values[n - 1];
    if n < 2 {
        return last;
    }
    let lookback = (n - 1).min(5);
    let slope = (n - 1 - lookback..n - 1)
        .map(|i| values[i + 1] - values[i])
        .sum::<f64>()
        / lookback as f64;
    last + slope * steps_ahead as f64
}
