//! Numerical utilities shared by the forecasting models.

pub mod cross_validation;
pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use cross_validation::{backtest, BacktestConfig, BacktestResult};
pub use metrics::{calculate_metrics, round_to, FitMetrics};
pub use ols::{ols_fit, solve_linear_system};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{acf, average_slope, mean, median, population_std_dev};
