//! Naive forecasting model.
//!
//! Repeats the last observed price. Used for series too short for any
//! other model.

use crate::core::{Forecast, TrainingSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::metrics::{calculate_metrics, FitMetrics};

/// Naive forecaster that repeats the last value.
#[derive(Debug, Clone, Default)]
pub struct Naive {
    last_value: Option<f64>,
    fitted: Option<Vec<f64>>,
    actual: Vec<f64>,
}

impl Naive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Forecaster for Naive {
    fn fit(&mut self, series: &TrainingSeries) -> Result<()> {
        let values = series.values();
        let (&first, &last) = match (values.first(), values.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ForecastError::EmptyData),
        };

        // y_hat[t] = y[t-1], seeded with the first value
        let mut fitted = Vec::with_capacity(values.len());
        fitted.push(first);
        fitted.extend_from_slice(&values[..values.len() - 1]);

        self.last_value = Some(last);
        self.fitted = Some(fitted);
        self.actual = values.to_vec();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let last = self.last_value.ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::from_values(vec![last; horizon]))
    }

    fn evaluate(&self) -> Result<FitMetrics> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;
        calculate_metrics(&self.actual, fitted)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        "naive"
    }
}
