//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with fixed (p, d, q) orders
//! - SARIMA models with seasonal components (P, D, Q)\[s\]
//! - Heuristic order selection from trend, ACF and detected period
//! - A historical-pattern forecast used when the recurrence misbehaves

mod auto;
mod diff;
mod model;
mod pattern;

pub use auto::select_order;
pub use diff::{difference, seasonal_difference, DifferencingStack};
pub use model::{Arima, ArimaParams};
pub use pattern::historical_pattern;
