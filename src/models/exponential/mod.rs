//! Exponential smoothing models.
//!
//! - Simple Exponential Smoothing with grid-searched α and a linear drift
//! - Damped-trend additive Holt-Winters with closed-form or recursive
//!   multi-step forecasts

mod holt_winters;
mod ses;

pub use holt_winters::{estimate_max_step_delta, ForecastStrategy, HoltWinters};
pub use ses::{SimpleExponentialSmoothing, ALPHA_GRID, DEFAULT_ALPHA};
