//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TrainingSeries};
use crate::error::Result;
use crate::utils::FitMetrics;

/// Common interface for all forecasting models.
///
/// A model is fitted once on a [`TrainingSeries`] and then forecasts
/// consecutive days after the series' last observation. This trait is
/// object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the training series.
    fn fit(&mut self, series: &TrainingSeries) -> Result<()>;

    /// Forecast the next `horizon` days.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// In-sample accuracy on the original price scale.
    fn evaluate(&self) -> Result<FitMetrics>;

    /// In-sample values aligned one-to-one with the training series.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;
