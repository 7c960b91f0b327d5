//! Backtest-driven model selection.

use std::fmt;

use log::{debug, warn};

use super::arima::{Arima, ArimaParams};
use super::exponential::{ForecastStrategy, HoltWinters, SimpleExponentialSmoothing};
use super::BoxedForecaster;
use crate::core::TrainingSeries;
use crate::detection::detect_period;
use crate::utils::cross_validation::{backtest, BacktestConfig, BacktestResult};

/// Damping applied to the Holt-Winters trend by the service.
pub const SERVICE_DAMPING: f64 = 0.98;

/// Best non-seasonal R² below which seasonal ARIMA is tried.
const SEASONAL_RETRY_R2: f64 = 0.3;
/// Minimum R² a seasonal candidate needs to be adopted.
const SEASONAL_MIN_R2: f64 = 0.1;
/// Periods tried by the seasonal retry.
const SEASONAL_RETRY_PERIODS: [usize; 2] = [7, 30];

/// A model configuration that can be backtested and rebuilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate {
    /// Simple exponential smoothing with grid-searched α.
    Ses,
    /// Optimised damped Holt-Winters with the given season length.
    HoltWinters { season_length: usize },
    /// ARIMA / SARIMA with fixed orders.
    Arima(ArimaParams),
}

impl Candidate {
    pub fn build(&self) -> BoxedForecaster {
        match *self {
            Candidate::Ses => Box::new(SimpleExponentialSmoothing::auto()),
            Candidate::HoltWinters { season_length } => Box::new(
                HoltWinters::auto(season_length)
                    .with_damping(SERVICE_DAMPING)
                    .with_strategy(ForecastStrategy::Recursive),
            ),
            Candidate::Arima(params) => Box::new(Arima::new(params)),
        }
    }

    /// Rough parameter count used to break near-ties.
    pub fn complexity(&self) -> usize {
        match self {
            Candidate::Ses => 1,
            Candidate::HoltWinters { .. } => 3,
            Candidate::Arima(params) => params.complexity(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Ses => write!(f, "exponential_smoothing"),
            Candidate::HoltWinters { season_length } => write!(f, "holt_winters[{}]", season_length),
            Candidate::Arima(params) => write!(f, "{}", params),
        }
    }
}

/// Winning candidate and its backtest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub candidate: Candidate,
    /// Holdout layout the candidates were scored on.
    pub config: BacktestConfig,
    pub result: BacktestResult,
    pub score: f64,
}

/// ARIMA orders searched by [`select_by_backtest`].
///
/// `p, q ∈ {0,1,2}`, `d ∈ {0,1}` with `p + d + q ≤ 4`, or `≤ 3` below 100
/// points.
pub fn arima_grid(n: usize) -> Vec<ArimaParams> {
    let limit = if n < 100 { 3 } else { 4 };
    let mut grid = Vec::new();
    for p in 0..=2 {
        for d in 0..=1 {
            for q in 0..=2 {
                if p + d + q <= limit {
                    grid.push(ArimaParams::new(p, d, q));
                }
            }
        }
    }
    grid
}

/// Pick the candidate with the lowest backtest score.
///
/// Scores within 0.01 of the best go to the simpler candidate. When no
/// non-seasonal candidate explains 30% of the holdout variance,
/// `SARIMA(1,d,1)(0,1,0)[s]` for weekly and monthly periods is tried on
/// series with three full cycles, and kept only with R² above 0.1.
/// Returns `None` when nothing beats the holdout mean.
pub fn select_by_backtest(
    series: &TrainingSeries,
    requested_horizon: usize,
    max_folds: usize,
) -> Option<Selection> {
    let n = series.len();
    let config = BacktestConfig::for_series(n, requested_horizon, max_folds);
    debug!(
        "backtest selection on {} points: horizon {}, folds {}",
        n, config.horizon, config.folds
    );

    let mut candidates = vec![
        Candidate::Ses,
        Candidate::HoltWinters {
            season_length: detect_period(series.values()),
        },
    ];
    candidates.extend(arima_grid(n).into_iter().map(Candidate::Arima));

    let mut best: Option<Selection> = None;
    for candidate in candidates {
        let Some(selection) = evaluate(series, &config, candidate) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some(b) => {
                selection.score < b.score
                    || ((selection.score - b.score).abs() < 0.01
                        && candidate.complexity() < b.candidate.complexity())
            }
        };
        if better {
            best = Some(selection);
        }
    }

    let weak = best
        .as_ref()
        .map_or(true, |b| b.result.metrics.r_squared < SEASONAL_RETRY_R2);
    if weak {
        for period in SEASONAL_RETRY_PERIODS {
            if n < period * 3 {
                continue;
            }
            for d in 0..=1 {
                let candidate = Candidate::Arima(ArimaParams::seasonal(1, d, 1, 0, 1, 0, period));
                let Some(selection) = evaluate(series, &config, candidate) else {
                    continue;
                };
                let r2 = selection.result.metrics.r_squared;
                if r2 <= SEASONAL_MIN_R2 {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some(b) => {
                        selection.score < b.score
                            || ((selection.score - b.score).abs() < 0.05
                                && r2 > b.result.metrics.r_squared)
                    }
                };
                if better {
                    best = Some(selection);
                }
            }
        }
    }

    match &best {
        Some(b) => debug!(
            "selected {} (score {:.4}, r2 {:.4})",
            b.candidate, b.score, b.result.metrics.r_squared
        ),
        None => warn!("no candidate beat the holdout mean on {} points", n),
    }
    best
}

fn evaluate(series: &TrainingSeries, config: &BacktestConfig, candidate: Candidate) -> Option<Selection> {
    let result = backtest(series, config, || candidate.build())?;
    let score = result.score();
    debug!("candidate {}: score {:?}", candidate, score);
    Some(Selection {
        candidate,
        config: *config,
        result,
        score: score?,
    })
}
