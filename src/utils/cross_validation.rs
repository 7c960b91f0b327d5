//! Rolling-origin backtesting for model selection.

use log::debug;

use crate::core::TrainingSeries;
use crate::models::BoxedForecaster;
use crate::utils::metrics::{calculate_metrics, FitMetrics};

/// Holdout layout for a backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktestConfig {
    /// Steps forecast in each fold.
    pub horizon: usize,
    /// Number of folds, the most recent first.
    pub folds: usize,
}

impl BacktestConfig {
    pub fn new(horizon: usize, folds: usize) -> Self {
        Self {
            horizon: horizon.max(1),
            folds: folds.max(1),
        }
    }

    /// Derive the holdout for a series of length `n` and a requested
    /// horizon.
    ///
    /// The holdout is the request clamped into `[7, 45]`, shortened to
    /// `max(7, n / 4)` for short series. Longer series get more folds:
    /// 4, 3 or 2 when `n` covers 5, 4 or 3 holdouts, else 1.
    pub fn for_series(n: usize, requested: usize, max_folds: usize) -> Self {
        let requested = if requested == 0 { 30 } else { requested };
        let horizon = requested.clamp(7, 45).min((n / 4).max(7));
        let folds = if n >= horizon * 5 {
            4
        } else if n >= horizon * 4 {
            3
        } else if n >= horizon * 3 {
            2
        } else {
            1
        };
        Self::new(horizon, folds.min(max_folds.max(1)))
    }
}

/// Fold-averaged out-of-sample accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestResult {
    pub folds_used: usize,
    pub metrics: FitMetrics,
}

impl BacktestResult {
    /// `rmse · (1 - min(r², 0.99))`; `None` unless the candidate beats the
    /// holdout mean (`r² > 0`) with a finite positive RMSE.
    pub fn score(&self) -> Option<f64> {
        let m = &self.metrics;
        if m.r_squared > 0.0 && m.rmse.is_finite() && m.rmse > 0.0 {
            Some(m.rmse * (1.0 - m.r_squared.min(0.99)))
        } else {
            None
        }
    }
}

/// Backtest a model over the most recent `config.folds` holdouts.
///
/// Fold `f` trains on everything before `n - horizon·(f+1)` and forecasts
/// the next `horizon` points. Folds whose training prefix would be 5 points
/// or fewer are not run, and folds whose model fails to fit are skipped.
/// Non-finite or negative forecasts are replaced by the last training value.
/// Returns `None` when the series is shorter than `horizon + 10` or no fold
/// succeeded.
pub fn backtest<Factory>(
    series: &TrainingSeries,
    config: &BacktestConfig,
    model_factory: Factory,
) -> Option<BacktestResult>
where
    Factory: Fn() -> BoxedForecaster,
{
    let n = series.len();
    let h = config.horizon;
    if n < h + 10 {
        return None;
    }
    let values = series.values();

    let mut sums = FitMetrics::zero();
    let mut used = 0usize;
    for f in 0..config.folds {
        let Some(test_start) = n.checked_sub(h * (f + 1)) else {
            break;
        };
        if test_start <= 5 {
            break;
        }
        let train = series.head(test_start);
        let last = values[test_start - 1];

        let mut model = model_factory();
        if let Err(err) = model.fit(&train) {
            debug!("backtest fold {} skipped for {}: {}", f, model.name(), err);
            continue;
        }
        let Ok(forecast) = model.predict(h) else {
            continue;
        };
        let predicted: Vec<f64> = forecast
            .primary()
            .iter()
            .map(|&p| if p.is_finite() && p >= 0.0 { p } else { last })
            .collect();
        let actual = &values[test_start..test_start + h];
        let Ok(m) = calculate_metrics(actual, &predicted) else {
            continue;
        };
        sums.r_squared += m.r_squared;
        sums.mae += m.mae;
        sums.rmse += m.rmse;
        sums.mape += m.mape;
        used += 1;
    }

    if used == 0 {
        return None;
    }
    let k = used as f64;
    Some(BacktestResult {
        folds_used: used,
        metrics: FitMetrics {
            r_squared: sums.r_squared / k,
            mae: sums.mae / k,
            rmse: sums.rmse / k,
            mape: sums.mape / k,
            aic: None,
        },
    })
}
