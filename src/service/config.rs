//! Service configuration.

use serde::{Deserialize, Serialize};

use crate::detection::OutlierConfig;

/// Tunables for [`ForecastService`](super::ForecastService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Leading observations echoed back by an upload.
    pub preview_limit: usize,
    /// Horizon used when a request does not name one.
    pub default_horizon: usize,
    pub min_horizon: usize,
    pub max_horizon: usize,
    /// Seconds an upload stays retrievable; `None` keeps it until evicted.
    pub cache_ttl_secs: Option<u64>,
    /// Uploads held at once; the oldest is evicted beyond this.
    pub max_cached_uploads: usize,
    pub outlier: OutlierConfig,
    /// Average same-day observations and interpolate missing days before
    /// fitting.
    pub resample_daily: bool,
    /// Upper bound on backtest folds for `auto` model selection.
    pub backtest_folds_max: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            preview_limit: 10,
            default_horizon: 30,
            min_horizon: 1,
            max_horizon: 90,
            cache_ttl_secs: Some(3600),
            max_cached_uploads: 256,
            outlier: OutlierConfig::default(),
            resample_daily: false,
            backtest_folds_max: 4,
        }
    }
}

impl ServiceConfig {
    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    /// Accepted horizon range, inclusive. Bounds are reordered if needed.
    pub fn with_horizon_range(mut self, min: usize, max: usize) -> Self {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.min_horizon = lo.max(1);
        self.max_horizon = hi.max(self.min_horizon);
        self
    }

    pub fn with_cache_ttl_secs(mut self, ttl: Option<u64>) -> Self {
        self.cache_ttl_secs = ttl;
        self
    }

    pub fn with_max_cached_uploads(mut self, max: usize) -> Self {
        self.max_cached_uploads = max.max(1);
        self
    }

    pub fn with_outlier(mut self, outlier: OutlierConfig) -> Self {
        self.outlier = outlier;
        self
    }

    pub fn with_resample_daily(mut self, resample: bool) -> Self {
        self.resample_daily = resample;
        self
    }

    pub fn with_backtest_folds_max(mut self, folds: usize) -> Self {
        self.backtest_folds_max = folds.max(1);
        self
    }

    /// Whether `horizon` lies in the accepted range.
    pub fn accepts_horizon(&self, horizon: usize) -> bool {
        (self.min_horizon..=self.max_horizon).contains(&horizon)
    }
}
