//! Simple Exponential Smoothing (SES) with linear trend extrapolation.

use log::debug;

use crate::core::{Forecast, TrainingSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::metrics::{calculate_metrics, r_squared, FitMetrics};
use crate::utils::stats::average_slope;

/// Candidate smoothing constants for automatic selection.
pub const ALPHA_GRID: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// Alpha used when no candidate scores.
pub const DEFAULT_ALPHA: f64 = 0.3;

/// Intervals averaged for the trend estimate.
const TREND_INTERVALS: usize = 4;

/// Simple Exponential Smoothing forecaster.
///
/// The smoothed series is
/// `s_0 = y_0`, `s_t = α × y_t + (1-α) × s_{t-1}`.
///
/// Forecasts extend the last smoothed level along the average day-over-day
/// slope of the final five observations:
/// `ŷ(x) = s_last + trend × (x - x_last)`.
///
/// # Example
/// ```
/// use harvest_forecast::core::TrainingSeries;
/// use harvest_forecast::models::exponential::SimpleExponentialSmoothing;
/// use harvest_forecast::models::Forecaster;
/// use chrono::NaiveDate;
///
/// let origin = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let series = TrainingSeries::from_values(origin, vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0]);
///
/// let mut model = SimpleExponentialSmoothing::auto();
/// model.fit(&series).unwrap();
/// assert_eq!(model.predict(3).unwrap().horizon(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleExponentialSmoothing {
    /// Smoothing parameter (0 < alpha < 1).
    alpha: Option<f64>,
    /// Whether to choose alpha from the grid.
    optimize: bool,
    /// Smoothed values, one per observation.
    smoothed: Option<Vec<f64>>,
    actual: Vec<f64>,
    /// Slope per day used for extrapolation.
    trend: f64,
    last_x: f64,
}

impl SimpleExponentialSmoothing {
    /// Create a new SES model with a fixed smoothing parameter.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: Some(alpha.clamp(0.0001, 0.9999)),
            optimize: false,
            smoothed: None,
            actual: Vec::new(),
            trend: 0.0,
            last_x: 0.0,
        }
    }

    /// Create a new SES model that picks alpha by grid search.
    pub fn auto() -> Self {
        Self {
            alpha: None,
            optimize: true,
            ..Self::new(DEFAULT_ALPHA)
        }
    }

    /// Get the smoothing parameter.
    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    /// Get the final smoothed level.
    pub fn level(&self) -> Option<f64> {
        self.smoothed.as_ref().and_then(|s| s.last().copied())
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    fn smooth(values: &[f64], alpha: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(values.len());
        let mut level = values[0];
        out.push(level);
        for &y in &values[1..] {
            level = alpha * y + (1.0 - alpha) * level;
            out.push(level);
        }
        out
    }

    /// Alpha from [`ALPHA_GRID`] with the highest in-sample R²; the first
    /// strictly better candidate wins ties.
    pub fn best_alpha(values: &[f64]) -> f64 {
        if values.is_empty() {
            return DEFAULT_ALPHA;
        }
        let mut best = DEFAULT_ALPHA;
        let mut best_r2 = f64::NEG_INFINITY;
        for &alpha in ALPHA_GRID.iter() {
            let r2 = r_squared(values, &Self::smooth(values, alpha));
            if r2 > best_r2 {
                best_r2 = r2;
                best = alpha;
            }
        }
        best
    }
}

impl Default for SimpleExponentialSmoothing {
    fn default() -> Self {
        Self::auto()
    }
}

impl Forecaster for SimpleExponentialSmoothing {
    fn fit(&mut self, series: &TrainingSeries) -> Result<()> {
        series.require(2)?;
        let values = series.values();

        if self.optimize {
            let alpha = Self::best_alpha(values);
            debug!("ses selected alpha {}", alpha);
            self.alpha = Some(alpha);
        }
        let alpha = self.alpha.ok_or(ForecastError::FitRequired)?;

        self.trend = if values.len() >= TREND_INTERVALS + 1 {
            average_slope(series.x(), values, TREND_INTERVALS).unwrap_or(0.0)
        } else {
            0.0
        };
        self.smoothed = Some(Self::smooth(values, alpha));
        self.actual = values.to_vec();
        self.last_x = series.last_x();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level().ok_or(ForecastError::FitRequired)?;
        let values = (1..=horizon)
            .map(|h| level + self.trend * h as f64)
            .collect();
        Ok(Forecast::from_values(values))
    }

    fn evaluate(&self) -> Result<FitMetrics> {
        let smoothed = self.smoothed.as_ref().ok_or(ForecastError::FitRequired)?;
        calculate_metrics(&self.actual, smoothed)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.smoothed.as_deref()
    }

    fn name(&self) -> &str {
        "exponential_smoothing"
    }
}
