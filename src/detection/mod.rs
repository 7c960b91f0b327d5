//! Detection utilities for price series.
//!
//! - Outlier filtering
//! - Seasonal period detection

mod outlier;
mod seasonality;

pub use outlier::{
    detect_outliers, filter_outliers, filter_outliers_with_result, OutlierBand, OutlierConfig,
    OutlierResult,
};
pub use seasonality::{detect_period, detect_seasonality, SeasonalityResult, CANDIDATE_PERIODS};
