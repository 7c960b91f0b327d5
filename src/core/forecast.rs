//! Forecast result structure for holding predictions.

/// Point predictions for consecutive future steps.
///
/// Step `i` (zero based) is the forecast for the day `i + 1` days after the
/// last observation of the training series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { point: values }
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    /// Mutable access to the point predictions.
    pub fn primary_mut(&mut self) -> &mut Vec<f64> {
        &mut self.point
    }

    /// Replace non-finite values with zero and floor negatives at zero.
    pub fn clamp_non_negative(mut self) -> Self {
        for v in self.point.iter_mut() {
            if !v.is_finite() || *v < 0.0 {
                *v = 0.0;
            }
        }
        self
    }

    /// Consume the forecast, returning the predictions.
    pub fn into_values(self) -> Vec<f64> {
        self.point
    }
}
