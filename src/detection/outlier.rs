//! Z-score outlier filtering with a retention floor.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::Observation;
use crate::utils::stats::{mean, population_std_dev};

/// Configuration for outlier filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Points further than `sigma` population standard deviations from the
    /// mean are dropped.
    pub sigma: f64,
    /// Filtering is abandoned if fewer than this fraction of points remain.
    pub min_retained_fraction: f64,
    /// Series shorter than this are never filtered.
    pub min_len: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            min_retained_fraction: 0.7,
            min_len: 10,
        }
    }
}

impl OutlierConfig {
    /// Z-score filter with the given threshold.
    pub fn z_score(sigma: f64) -> Self {
        Self {
            sigma,
            ..Self::default()
        }
    }

    pub fn with_min_retained_fraction(mut self, fraction: f64) -> Self {
        self.min_retained_fraction = fraction.clamp(0.0, 1.0);
        self
    }
}

/// Acceptance band `mean ± sigma·std` of a filtered series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBand {
    pub mean: f64,
    pub std_dev: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBand {
    fn new(mean: f64, std_dev: f64, sigma: f64) -> Self {
        Self {
            mean,
            std_dev,
            lower: mean - sigma * std_dev,
            upper: mean + sigma * std_dev,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}

/// Outcome of a filtering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierResult {
    /// Indices (into the input) of points outside the band.
    pub outlier_indices: Vec<usize>,
    /// Whether the detected outliers were actually removed.
    pub applied: bool,
    /// `None` when the series was too short to test.
    pub band: Option<OutlierBand>,
}

impl OutlierResult {
    pub fn outlier_count(&self) -> usize {
        self.outlier_indices.len()
    }
}

/// Find indices of prices outside `mean ± sigma·std` (population std).
pub fn detect_outliers(prices: &[f64], config: &OutlierConfig) -> OutlierResult {
    if prices.len() < config.min_len.max(1) {
        return OutlierResult {
            outlier_indices: Vec::new(),
            applied: false,
            band: None,
        };
    }
    let band = OutlierBand::new(mean(prices), population_std_dev(prices), config.sigma);
    let outlier_indices: Vec<usize> = prices
        .iter()
        .enumerate()
        .filter(|(_, &p)| !band.contains(p))
        .map(|(i, _)| i)
        .collect();

    let retained = prices.len() - outlier_indices.len();
    let applied = !outlier_indices.is_empty()
        && retained as f64 >= config.min_retained_fraction * prices.len() as f64;
    OutlierResult {
        outlier_indices,
        applied,
        band: Some(band),
    }
}

/// Drop outlying observations, or return the input unchanged when the
/// series is short or filtering would discard too much.
pub fn filter_outliers(observations: &[Observation], config: &OutlierConfig) -> Vec<Observation> {
    filter_outliers_with_result(observations, config).0
}

/// [`filter_outliers`], also returning the detection result that decided
/// it.
pub fn filter_outliers_with_result(
    observations: &[Observation],
    config: &OutlierConfig,
) -> (Vec<Observation>, OutlierResult) {
    let prices: Vec<f64> = observations.iter().map(|o| o.price).collect();
    let result = detect_outliers(&prices, config);
    if !result.applied {
        if result.outlier_count() > 0 {
            warn!(
                "outlier filter skipped: removing {} of {} points breaks the retention floor",
                result.outlier_count(),
                observations.len()
            );
        }
        return (observations.to_vec(), result);
    }
    debug!(
        "outlier filter removed {} of {} points",
        result.outlier_count(),
        observations.len()
    );
    let kept = observations
        .iter()
        .enumerate()
        .filter(|(i, _)| !result.outlier_indices.contains(i))
        .map(|(_, o)| *o)
        .collect();
    (kept, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn observations(prices: &[f64]) -> Vec<Observation> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Observation::new(base + Duration::days(i as i64), p))
            .collect()
    }

    #[test]
    fn spike_is_removed() {
        let mut prices = vec![10.0; 20];
        prices[7] = 500.0;
        let filtered = filter_outliers(&observations(&prices), &OutlierConfig::default());
        assert_eq!(filtered.len(), 19);
        assert!(filtered.iter().all(|o| o.price == 10.0));
    }

    #[test]
    fn short_series_are_untouched() {
        let mut prices = vec![10.0; 9];
        prices[3] = 10_000.0;
        let obs = observations(&prices);
        let (kept, result) = filter_outliers_with_result(&obs, &OutlierConfig::default());
        assert_eq!(kept, obs);
        assert!(result.band.is_none());
    }

    #[test]
    fn band_is_reported_with_the_filtered_series() {
        let mut prices = vec![10.0; 20];
        prices[7] = 500.0;
        let (kept, result) = filter_outliers_with_result(&observations(&prices), &OutlierConfig::default());
        assert_eq!(kept.len(), 19);
        assert_eq!(result.outlier_indices, vec![7]);
        let band = result.band.unwrap();
        assert_relative_eq!(band.mean, 34.5, epsilon = 1e-10);
        assert_relative_eq!(band.upper - band.mean, 3.0 * band.std_dev, epsilon = 1e-10);
        assert_relative_eq!(band.mean - band.lower, 3.0 * band.std_dev, epsilon = 1e-10);
        assert!(!band.contains(500.0));
    }

    #[test]
    fn retention_floor_disables_filtering() {
        // Tight sigma flags most of a bimodal series
        let prices: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { 100.0 }).collect();
        let obs = observations(&prices);
        let config = OutlierConfig::z_score(0.5);
        let result = detect_outliers(&prices, &config);
        assert_eq!(result.outlier_count(), 20);
        assert!(!result.applied);
        assert_eq!(filter_outliers(&obs, &config), obs);
    }

    #[test]
    fn constant_series_has_no_outliers() {
        let result = detect_outliers(&[4.0; 15], &OutlierConfig::default());
        assert_eq!(result.outlier_count(), 0);
        assert!(!result.applied);
    }
}
