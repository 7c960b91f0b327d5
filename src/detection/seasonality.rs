//! Seasonal period detection over fixed calendar candidates.

use crate::utils::stats::lagged_correlation;

/// Candidate periods in days, tried shortest first.
pub const CANDIDATE_PERIODS: [usize; 3] = [7, 30, 90];

/// Length below which the lenient thresholds apply.
const SHORT_SERIES: usize = 30;

/// Result of seasonality detection.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalityResult {
    /// The detected seasonal period (if any).
    pub period: Option<usize>,
    /// Candidate periods that had enough data, with their lag correlation.
    pub candidates: Vec<(usize, f64)>,
}

/// Detect the shortest candidate period whose lag correlation clears the
/// threshold.
///
/// Series under 30 points need one full cycle and correlation above 0.25;
/// longer series need two cycles and correlation above 0.3.
pub fn detect_seasonality(values: &[f64]) -> SeasonalityResult {
    let n = values.len();
    let (threshold, cycles) = if n < SHORT_SERIES { (0.25, 1) } else { (0.3, 2) };

    let mut candidates = Vec::new();
    let mut period = None;
    for &p in CANDIDATE_PERIODS.iter() {
        if n < p * cycles {
            continue;
        }
        let r = lagged_correlation(values, p);
        candidates.push((p, r));
        if r > threshold {
            period = Some(p);
            break;
        }
    }
    SeasonalityResult { period, candidates }
}

/// Detected period, or 0 for none.
pub fn detect_period(values: &[f64]) -> usize {
    detect_seasonality(values).period.unwrap_or(0)
}
