//! Upload and predict operations.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use log::{debug, info, warn};

use super::cache::{InMemoryUploadCache, UploadCache};
use super::config::ServiceConfig;
use super::response::{
    CalculationDetails, PredictRequest, PredictionResult, PreprocessingDetails, PricePoint,
    SeriesPrediction, Trend, UploadSummary,
};
use crate::core::{aggregate_daily, fill_missing_days, Observation, SeriesSet, TrainingSeries};
use crate::detection::filter_outliers_with_result;
use crate::error::{ForecastError, Result};
use crate::ingest::parse_upload;
use crate::models::naive::Naive;
use crate::models::{BoxedForecaster, ModelKind};
use crate::utils::metrics::round_to;
use crate::utils::stats::average_slope;

/// Intervals of the fitted path used to label the trend.
const TREND_INTERVALS: usize = 5;

/// Ties ingestion, the upload cache and the models together.
pub struct ForecastService<C: UploadCache = InMemoryUploadCache> {
    config: ServiceConfig,
    cache: C,
}

impl ForecastService<InMemoryUploadCache> {
    /// Service with an in-memory cache sized from `config`.
    pub fn new(config: ServiceConfig) -> Self {
        let cache = InMemoryUploadCache::new(
            config.cache_ttl_secs.map(Duration::from_secs),
            config.max_cached_uploads,
        );
        Self { config, cache }
    }
}

impl Default for ForecastService<InMemoryUploadCache> {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl<C: UploadCache> ForecastService<C> {
    pub fn with_cache(config: ServiceConfig, cache: C) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Parse an uploaded file and keep it for later predictions.
    pub fn upload(&self, bytes: &[u8], filename: &str) -> Result<UploadSummary> {
        let set = parse_upload(bytes, filename)?;
        let labels = set.labels();
        let total_records = set.total_records();
        let preview_data = set
            .primary()
            .map(|(_, observations)| {
                observations
                    .iter()
                    .take(self.config.preview_limit)
                    .map(PricePoint::from)
                    .collect()
            })
            .unwrap_or_default();

        let upload_id = self.cache.insert(set);
        info!(
            "upload {} accepted: {} records across {} labels from {}",
            upload_id,
            total_records,
            labels.len(),
            filename
        );
        Ok(UploadSummary {
            upload_id,
            preview_data,
            total_records,
            labels,
        })
    }

    /// Forecast every series of a stored upload.
    pub fn predict(&self, request: &PredictRequest) -> Result<PredictionResult> {
        let set = self
            .cache
            .get(&request.upload_id)
            .ok_or_else(|| ForecastError::UploadNotFound(request.upload_id.clone()))?;
        let horizon = request.horizon_days;
        if !self.config.accepts_horizon(horizon) {
            return Err(ForecastError::HorizonOutOfRange {
                got: horizon,
                min: self.config.min_horizon,
                max: self.config.max_horizon,
            });
        }
        let kind: ModelKind = request.model_type.parse()?;
        info!(
            "predict {}: model {}, horizon {} days",
            request.upload_id, kind, horizon
        );

        self.predict_set(&set, kind, horizon)
    }

    fn predict_set(&self, set: &SeriesSet, kind: ModelKind, horizon: usize) -> Result<PredictionResult> {
        let (primary_label, _) = set.primary().ok_or(ForecastError::NoValidRows)?;
        let primary_label = primary_label.to_string();

        let mut primary = None;
        let mut series = Vec::with_capacity(set.len());
        for (label, observations) in set.iter() {
            match self.predict_series(label, observations, kind, horizon) {
                Ok(prediction) => {
                    if label == primary_label {
                        primary = Some(prediction.clone());
                    }
                    series.push(prediction);
                }
                Err(err) if label == primary_label => return Err(err),
                Err(err) => warn!("series {} skipped: {}", label, err),
            }
        }

        let primary = primary.ok_or(ForecastError::NoValidRows)?;
        Ok(PredictionResult::new(primary, series))
    }

    fn predict_series(
        &self,
        label: &str,
        observations: &[Observation],
        kind: ModelKind,
        horizon: usize,
    ) -> Result<SeriesPrediction> {
        let prepared = if self.config.resample_daily {
            fill_missing_days(&aggregate_daily(observations))
        } else {
            observations.to_vec()
        };
        let (cleaned, outliers) = filter_outliers_with_result(&prepared, &self.config.outlier);
        let preprocessing =
            PreprocessingDetails::new(observations.len(), prepared.len(), cleaned.len(), &outliers);
        let training = TrainingSeries::from_observations(&cleaned)?;

        let (mut model, selection) = if training.len() < 2 {
            debug!("series {} has {} point(s); using naive forecast", label, training.len());
            let naive: BoxedForecaster = Box::new(Naive::new());
            (naive, None)
        } else {
            kind.build_with_selection(&training, horizon, self.config.backtest_folds_max)
        };
        model.fit(&training)?;
        let forecast = model.predict(horizon)?.clamp_non_negative();
        let metrics = model.evaluate()?.rounded();
        let slope = model
            .fitted_values()
            .and_then(|fitted| average_slope(training.x(), fitted, TREND_INTERVALS));
        let trend = Trend::from_slope(slope);
        debug!(
            "series {}: {} fitted on {} points, r2 {}, trend {:?}",
            label,
            model.name(),
            training.len(),
            metrics.r_squared,
            trend
        );

        let last_date = cleaned
            .last()
            .map(|o| o.date)
            .ok_or(ForecastError::EmptyData)?;
        let predicted_data = forecast_points(last_date, forecast.primary())?;
        let details = CalculationDetails::new(preprocessing, selection.as_ref(), &predicted_data);

        Ok(SeriesPrediction {
            label: label.to_string(),
            model: model.name().to_string(),
            historical_data: cleaned.iter().map(PricePoint::from).collect(),
            predicted_data,
            model_metrics: metrics,
            trend,
            calculation_details: Some(details),
        })
    }
}

/// Date consecutive forecasts from the day after `last_date`, rounding
/// prices to cents.
fn forecast_points(last_date: NaiveDate, values: &[f64]) -> Result<Vec<PricePoint>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let date = last_date
                .checked_add_days(Days::new(i as u64 + 1))
                .ok_or_else(|| ForecastError::ComputationError("forecast date out of range".to_string()))?;
            Ok(PricePoint {
                date,
                price: round_to(v, 2).max(0.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(rows: &[(&str, f64)]) -> Vec<u8> {
        let mut text = String::from("日期,价格\n");
        for (date, price) in rows {
            text.push_str(&format!("{},{}\n", date, price));
        }
        text.into_bytes()
    }

    #[test]
    fn forecast_dates_follow_last_observation() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let points = forecast_points(last, &[1.234, -0.001]).unwrap();
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(points[0].price, 1.23);
        assert_eq!(points[1].price, 0.0);
    }

    #[test]
    fn single_observation_uses_naive_forecast() {
        let service = ForecastService::default();
        let summary = service.upload(&csv(&[("2024-01-01", 8.0)]), "one.csv").unwrap();
        let result = service
            .predict(&PredictRequest::new(summary.upload_id, 3))
            .unwrap();
        assert_eq!(result.model, "naive");
        assert!(result.predicted_data.iter().all(|p| p.price == 8.0));
        assert_eq!(result.trend, Trend::Fluctuating);
    }

    #[test]
    fn unknown_model_type_is_rejected() {
        let service = ForecastService::default();
        let summary = service
            .upload(&csv(&[("2024-01-01", 1.0), ("2024-01-02", 2.0)]), "a.csv")
            .unwrap();
        let err = service
            .predict(&PredictRequest::new(summary.upload_id, 3).with_model_type("ai"))
            .unwrap_err();
        assert_eq!(err, ForecastError::UnsupportedModel("ai".to_string()));
    }

    #[test]
    fn resampling_fills_gaps_before_fitting() {
        let config = ServiceConfig::default().with_resample_daily(true);
        let service = ForecastService::new(config);
        let summary = service
            .upload(
                &csv(&[("2024-01-01", 10.0), ("2024-01-01", 12.0), ("2024-01-04", 14.0)]),
                "gaps.csv",
            )
            .unwrap();
        let result = service
            .predict(&PredictRequest::new(summary.upload_id, 1).with_model_type("linear"))
            .unwrap();
        let prices: Vec<f64> = result.historical_data.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![11.0, 12.0, 13.0, 14.0]);
        assert_eq!(result.predicted_data[0].price, 15.0);

        let details = result.calculation_details.unwrap();
        assert_eq!(details.preprocessing.original_count, 3);
        assert_eq!(details.preprocessing.resampled_count, 4);
        assert_eq!(details.preprocessing.cleaned_count, 4);
        assert!(details.model_selection.is_none());
    }

    #[test]
    fn outlier_removal_is_reported() {
        let service = ForecastService::default();
        let mut rows: Vec<(String, f64)> = (1..=20).map(|d| (format!("2024-01-{:02}", d), 10.0)).collect();
        rows[7].1 = 500.0;
        let rows: Vec<(&str, f64)> = rows.iter().map(|(d, p)| (d.as_str(), *p)).collect();
        let summary = service.upload(&csv(&rows), "spike.csv").unwrap();
        let result = service
            .predict(&PredictRequest::new(summary.upload_id, 3).with_model_type("linear"))
            .unwrap();

        let details = result.calculation_details.unwrap();
        let pre = details.preprocessing;
        assert_eq!((pre.original_count, pre.cleaned_count, pre.removed_count), (20, 19, 1));
        assert!(pre.outlier_filter_applied);
        assert_eq!(pre.mean, Some(34.5));
        assert!(pre.upper_bound.unwrap() < 500.0);
        assert_eq!(details.prediction_steps.len(), 3);
        assert_eq!(details.prediction_steps[0].step, 1);
        assert_eq!(details.prediction_steps[0].date, result.predicted_data[0].date);
    }
}
