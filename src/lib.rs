//! # harvest-forecast
//!
//! Commodity price forecasting engine.
//!
//! Turns uploaded price files (CSV or Excel) into labelled daily series,
//! removes outliers and forecasts each series with one of several models:
//! linear or polynomial regression, simple exponential smoothing, damped
//! seasonal Holt-Winters, ARIMA/SARIMA with heuristic order selection, or a
//! backtest-driven choice among them.
//!
//! ```no_run
//! use harvest_forecast::prelude::*;
//!
//! let service = ForecastService::default();
//! let csv = "日期,价格\n2024-01-01,10\n2024-01-02,11\n2024-01-03,12\n";
//! let summary = service.upload(csv.as_bytes(), "prices.csv")?;
//! let result = service.predict(&PredictRequest::new(summary.upload_id, 7))?;
//! println!("{:?} {:?}", result.trend, result.predicted_data);
//! # Ok::<(), ForecastError>(())
//! ```

#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod detection;
pub mod error;
pub mod ingest;
pub mod models;
pub mod service;
pub mod utils;

pub use error::{ErrorKind, ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, Observation, SeriesSet, TrainingSeries};
    pub use crate::error::{ErrorKind, ForecastError, Result};
    pub use crate::models::{Forecaster, ModelKind};
    pub use crate::service::{
        ForecastService, PredictRequest, PredictionResult, ServiceConfig, Trend, UploadSummary,
    };
    pub use crate::utils::{calculate_metrics, FitMetrics};
}
