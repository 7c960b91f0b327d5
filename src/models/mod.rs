//! Forecasting models.

mod kind;
mod selection;
mod traits;

pub mod arima;
pub mod exponential;
pub mod naive;
pub mod regression;

pub use kind::ModelKind;
pub use selection::{arima_grid, select_by_backtest, Candidate, Selection, SERVICE_DAMPING};
pub use traits::{BoxedForecaster, Forecaster};
