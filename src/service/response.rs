//! Request and response records exchanged with callers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::Observation;
use crate::detection::OutlierResult;
use crate::models::Selection;
use crate::utils::metrics::{round_to, FitMetrics};

/// Slope magnitude (price per day) below which a series counts as flat.
pub const FLAT_SLOPE: f64 = 0.01;

/// In-sample accuracy reported with a prediction, rounded for display.
pub type ModelMetrics = FitMetrics;

/// A dated price on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl From<&Observation> for PricePoint {
    fn from(o: &Observation) -> Self {
        Self {
            date: o.date,
            price: o.price,
        }
    }
}

/// Direction of recent movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
    /// Too few points to tell.
    Fluctuating,
}

impl Trend {
    pub fn from_slope(slope: Option<f64>) -> Self {
        match slope {
            Some(s) if s > FLAT_SLOPE => Trend::Rising,
            Some(s) if s < -FLAT_SLOPE => Trend::Falling,
            Some(s) if s.is_finite() => Trend::Flat,
            _ => Trend::Fluctuating,
        }
    }
}

/// Result of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub upload_id: String,
    /// Leading observations of the primary series.
    pub preview_data: Vec<PricePoint>,
    /// Observations across every label.
    pub total_records: usize,
    pub labels: Vec<String>,
}

fn default_horizon() -> usize {
    30
}

/// A forecast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub upload_id: String,
    #[serde(default = "default_horizon")]
    pub horizon_days: usize,
    /// Model type string; empty selects exponential smoothing.
    #[serde(default)]
    pub model_type: String,
}

impl PredictRequest {
    pub fn new(upload_id: impl Into<String>, horizon_days: usize) -> Self {
        Self {
            upload_id: upload_id.into(),
            horizon_days,
            model_type: String::new(),
        }
    }

    pub fn with_model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = model_type.into();
        self
    }
}

/// Counts and outlier band of the series a model was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingDetails {
    /// Observations in the upload for this label.
    pub original_count: usize,
    /// After daily resampling; equal to `original_count` when it is off.
    pub resampled_count: usize,
    pub cleaned_count: usize,
    pub removed_count: usize,
    pub outlier_filter_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
}

impl PreprocessingDetails {
    /// Band statistics are rounded to cents and omitted for series too
    /// short to filter.
    pub fn new(
        original_count: usize,
        resampled_count: usize,
        cleaned_count: usize,
        outliers: &OutlierResult,
    ) -> Self {
        let band = outliers.band;
        Self {
            original_count,
            resampled_count,
            cleaned_count,
            removed_count: resampled_count.saturating_sub(cleaned_count),
            outlier_filter_applied: outliers.applied,
            mean: band.map(|b| round_to(b.mean, 2)),
            std_dev: band.map(|b| round_to(b.std_dev, 2)),
            lower_bound: band.map(|b| round_to(b.lower, 2)),
            upper_bound: band.map(|b| round_to(b.upper, 2)),
        }
    }
}

/// Backtest that picked the model for `model_type = "auto"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionDetails {
    pub candidate: String,
    pub cv_folds: usize,
    pub holdout_size: usize,
    /// Fold-averaged out-of-sample accuracy.
    pub holdout_metrics: ModelMetrics,
    pub score: f64,
}

impl From<&Selection> for SelectionDetails {
    fn from(selection: &Selection) -> Self {
        Self {
            candidate: selection.candidate.to_string(),
            cv_folds: selection.result.folds_used,
            holdout_size: selection.config.horizon,
            holdout_metrics: selection.result.metrics.rounded(),
            score: round_to(selection.score, 4),
        }
    }
}

/// One dated forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionStep {
    /// 1-based distance from the last observation.
    pub step: usize,
    pub date: NaiveDate,
    pub predicted_price: f64,
}

/// How a series forecast was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDetails {
    pub preprocessing: PreprocessingDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_selection: Option<SelectionDetails>,
    pub prediction_steps: Vec<PredictionStep>,
}

impl CalculationDetails {
    pub fn new(
        preprocessing: PreprocessingDetails,
        selection: Option<&Selection>,
        predicted: &[PricePoint],
    ) -> Self {
        Self {
            preprocessing,
            model_selection: selection.map(SelectionDetails::from),
            prediction_steps: predicted
                .iter()
                .enumerate()
                .map(|(i, p)| PredictionStep {
                    step: i + 1,
                    date: p.date,
                    predicted_price: p.price,
                })
                .collect(),
        }
    }
}

/// Forecast for one labelled series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPrediction {
    pub label: String,
    /// Model that produced the forecast, e.g. `ARIMA(1,1,1)`.
    pub model: String,
    pub historical_data: Vec<PricePoint>,
    pub predicted_data: Vec<PricePoint>,
    pub model_metrics: ModelMetrics,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_details: Option<CalculationDetails>,
}

/// Forecast for an upload.
///
/// The top-level fields repeat the primary series; `series` holds every
/// label in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
    pub model: String,
    pub historical_data: Vec<PricePoint>,
    pub predicted_data: Vec<PricePoint>,
    pub model_metrics: ModelMetrics,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_details: Option<CalculationDetails>,
    pub series: Vec<SeriesPrediction>,
}

impl PredictionResult {
    pub fn new(primary: SeriesPrediction, series: Vec<SeriesPrediction>) -> Self {
        Self {
            label: primary.label,
            model: primary.model,
            historical_data: primary.historical_data,
            predicted_data: primary.predicted_data,
            model_metrics: primary.model_metrics,
            trend: primary.trend,
            calculation_details: primary.calculation_details,
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trend_thresholds() {
        assert_eq!(Trend::from_slope(Some(0.5)), Trend::Rising);
        assert_eq!(Trend::from_slope(Some(-0.02)), Trend::Falling);
        assert_eq!(Trend::from_slope(Some(0.01)), Trend::Flat);
        assert_eq!(Trend::from_slope(Some(f64::NAN)), Trend::Fluctuating);
        assert_eq!(Trend::from_slope(None), Trend::Fluctuating);
    }

    #[test]
    fn request_defaults() {
        let request: PredictRequest = serde_json::from_str(r#"{"upload_id": "abc"}"#).unwrap();
        assert_eq!(request.horizon_days, 30);
        assert_eq!(request.model_type, "");
    }

    #[test]
    fn wire_shape() {
        let point = PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            price: 3.5,
        };
        assert_eq!(
            serde_json::to_value(point).unwrap(),
            json!({"date": "2024-02-29", "price": 3.5})
        );
        assert_eq!(serde_json::to_value(Trend::Fluctuating).unwrap(), json!("fluctuating"));

        let details = CalculationDetails::new(
            PreprocessingDetails::new(
                5,
                5,
                5,
                &OutlierResult {
                    outlier_indices: Vec::new(),
                    applied: false,
                    band: None,
                },
            ),
            None,
            &[point],
        );
        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            json!({
                "preprocessing": {
                    "original_count": 5,
                    "resampled_count": 5,
                    "cleaned_count": 5,
                    "removed_count": 0,
                    "outlier_filter_applied": false
                },
                "prediction_steps": [
                    {"step": 1, "date": "2024-02-29", "predicted_price": 3.5}
                ]
            })
        );

        let metrics = FitMetrics {
            r_squared: 0.9,
            mae: 1.0,
            rmse: 2.0,
            mape: 0.05,
            aic: None,
        };
        assert_eq!(
            serde_json::to_value(metrics).unwrap(),
            json!({"r_squared": 0.9, "mae": 1.0, "rmse": 2.0, "mape": 0.05})
        );
    }
}
