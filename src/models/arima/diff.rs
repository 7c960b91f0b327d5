//! Differencing utilities for ARIMA models.

/// Apply differencing to a series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing at lag `period`.
///
/// Each round only runs while the series is longer than `period`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    if period == 0 {
        return result;
    }
    for _ in 0..d {
        if result.len() <= period {
            break;
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Lag of a single differencing round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lag {
    Regular,
    Seasonal(usize),
}

impl Lag {
    fn value(self) -> usize {
        match self {
            Lag::Regular => 1,
            Lag::Seasonal(s) => s,
        }
    }
}

/// Record of the differencing rounds applied to a series, keeping each
/// round's input so forecasts can be integrated back exactly.
#[derive(Debug, Clone, Default)]
pub struct DifferencingStack {
    rounds: Vec<(Lag, Vec<f64>)>,
}

impl DifferencingStack {
    /// Apply `d` regular rounds, then `seasonal_d` rounds at `period`.
    ///
    /// Rounds that would consume the whole series are skipped. Returns the
    /// differenced series together with the stack.
    pub fn apply(series: &[f64], d: usize, seasonal_d: usize, period: usize) -> (Vec<f64>, Self) {
        let mut stack = Self::default();
        let mut current = series.to_vec();
        for _ in 0..d {
            if current.len() <= 1 {
                break;
            }
            let next = difference(&current, 1);
            stack.rounds.push((Lag::Regular, current));
            current = next;
        }
        if period > 0 {
            for _ in 0..seasonal_d {
                if current.len() <= period {
                    break;
                }
                let next = seasonal_difference(&current, 1, period);
                stack.rounds.push((Lag::Seasonal(period), current));
                current = next;
            }
        }
        (current, stack)
    }

    /// Number of observations consumed by differencing.
    pub fn lost(&self) -> usize {
        self.rounds.iter().map(|(lag, _)| lag.value()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Turn forecasts of the differenced series into forecasts of the
    /// original series.
    pub fn integrate(&self, forecast: &[f64]) -> Vec<f64> {
        let mut current = forecast.to_vec();
        for (lag, history) in self.rounds.iter().rev() {
            let lag = lag.value();
            let mut extended = history.clone();
            for &w in &current {
                let base = extended[extended.len() - lag];
                extended.push(base + w);
            }
            current = extended.split_off(history.len());
        }
        current
    }
}
