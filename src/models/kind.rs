//! Model-type strings accepted by the service.

use std::fmt;
use std::str::FromStr;

use log::warn;

use super::arima::Arima;
use super::exponential::{ForecastStrategy, HoltWinters, SimpleExponentialSmoothing};
use super::regression::RegressionModel;
use super::selection::{select_by_backtest, Selection, SERVICE_DAMPING};
use super::BoxedForecaster;
use crate::core::TrainingSeries;
use crate::detection::detect_period;
use crate::error::ForecastError;

/// Forecasting model requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    /// Simple exponential smoothing with grid-searched α.
    #[default]
    ExponentialSmoothing,
    Linear,
    WeightedLinear,
    /// Polynomial regression of degree 2 or 3.
    Polynomial(usize),
    /// Damped seasonal smoothing on the detected period.
    HoltWinters(ForecastStrategy),
    /// ARIMA / SARIMA with heuristic order selection.
    Arima,
    /// Lowest backtest score among SES, Holt-Winters and an ARIMA grid.
    Auto,
}

impl ModelKind {
    /// Instantiate an unfitted model for `series`.
    ///
    /// `horizon` and `max_folds` only matter for [`ModelKind::Auto`], which
    /// backtests candidates and falls back to exponential smoothing when
    /// none beats the holdout mean.
    pub fn build(&self, series: &TrainingSeries, horizon: usize, max_folds: usize) -> BoxedForecaster {
        self.build_with_selection(series, horizon, max_folds).0
    }

    /// [`ModelKind::build`], also returning the backtest that picked the
    /// model. Only [`ModelKind::Auto`] with a qualifying candidate yields a
    /// [`Selection`].
    pub fn build_with_selection(
        &self,
        series: &TrainingSeries,
        horizon: usize,
        max_folds: usize,
    ) -> (BoxedForecaster, Option<Selection>) {
        let model: BoxedForecaster = match *self {
            ModelKind::ExponentialSmoothing => Box::new(SimpleExponentialSmoothing::auto()),
            ModelKind::Linear => Box::new(RegressionModel::linear()),
            ModelKind::WeightedLinear => Box::new(RegressionModel::weighted()),
            ModelKind::Polynomial(degree) => Box::new(RegressionModel::polynomial(degree)),
            ModelKind::HoltWinters(strategy) => Box::new(
                HoltWinters::auto(detect_period(series.values()))
                    .with_damping(SERVICE_DAMPING)
                    .with_seasonal_decay(1.0)
                    .with_strategy(strategy),
            ),
            ModelKind::Arima => Box::new(Arima::auto()),
            ModelKind::Auto => {
                return match select_by_backtest(series, horizon, max_folds) {
                    Some(selection) => (selection.candidate.build(), Some(selection)),
                    None => {
                        warn!("auto selection found no candidate; using exponential smoothing");
                        (Box::new(SimpleExponentialSmoothing::auto()), None)
                    }
                }
            }
        };
        (model, None)
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "" | "timeseries" | "ses" | "exponential_smoothing" => ModelKind::ExponentialSmoothing,
            "linear" => ModelKind::Linear,
            "weighted_linear" => ModelKind::WeightedLinear,
            "polynomial2" => ModelKind::Polynomial(2),
            "polynomial3" => ModelKind::Polynomial(3),
            "holt_winters" | "seasonal" => ModelKind::HoltWinters(ForecastStrategy::Recursive),
            "holt_winters_closed" => ModelKind::HoltWinters(ForecastStrategy::ClosedForm),
            "arima" | "sarima" => ModelKind::Arima,
            "auto" => ModelKind::Auto,
            _ => return Err(ForecastError::UnsupportedModel(s.to_string())),
        };
        Ok(kind)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::ExponentialSmoothing => write!(f, "exponential_smoothing"),
            ModelKind::Linear => write!(f, "linear"),
            ModelKind::WeightedLinear => write!(f, "weighted_linear"),
            ModelKind::Polynomial(d) => write!(f, "polynomial{}", d),
            ModelKind::HoltWinters(ForecastStrategy::Recursive) => write!(f, "holt_winters"),
            ModelKind::HoltWinters(ForecastStrategy::ClosedForm) => write!(f, "holt_winters_closed"),
            ModelKind::Arima => write!(f, "arima"),
            ModelKind::Auto => write!(f, "auto"),
        }
    }
}
