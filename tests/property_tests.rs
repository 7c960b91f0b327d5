//! Property-based tests for the forecasting models and the service.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated price series.

use chrono::{Days, NaiveDate};
use harvest_forecast::core::{Observation, TrainingSeries};
use harvest_forecast::detection::{filter_outliers, OutlierConfig};
use harvest_forecast::models::arima::{Arima, ArimaParams};
use harvest_forecast::models::exponential::{HoltWinters, SimpleExponentialSmoothing};
use harvest_forecast::models::regression::RegressionModel;
use harvest_forecast::models::{BoxedForecaster, Forecaster};
use harvest_forecast::service::{ForecastService, PredictRequest};
use proptest::prelude::*;

fn origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn make_series(values: &[f64]) -> TrainingSeries {
    TrainingSeries::from_values(origin(), values.to_vec())
}

fn make_observations(values: &[f64]) -> Vec<Observation> {
    values
        .iter()
        .enumerate()
        .map(|(i, &p)| Observation::new(origin() + Days::new(i as u64), p))
        .collect()
}

fn make_csv(values: &[f64]) -> Vec<u8> {
    let mut text = String::from("日期,价格\n");
    for obs in make_observations(values) {
        text.push_str(&format!("{},{}\n", obs.date, obs.price));
    }
    text.into_bytes()
}

/// Strategy for generating positive price series.
fn price_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| prop::collection::vec(1.0..1000.0_f64, len))
}

/// Strategy for generating falling price series that head towards zero.
fn falling_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (10.0..50.0_f64, 0.5..3.0_f64).prop_map(move |(start, slope)| {
            (0..len)
                .map(|i| (start - slope * i as f64).max(0.0))
                .collect()
        })
    })
}

fn models() -> Vec<BoxedForecaster> {
    let models: [BoxedForecaster; 6] = [
        Box::new(RegressionModel::linear()),
        Box::new(RegressionModel::weighted()),
        Box::new(RegressionModel::polynomial(2)),
        Box::new(SimpleExponentialSmoothing::auto()),
        Box::new(HoltWinters::auto(7).with_damping(0.98)),
        Box::new(Arima::auto()),
    ];
    models.into()
}

// =============================================================================
// Property: forecasts have the requested length and are finite
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn forecasts_match_horizon_and_are_finite(
        values in price_strategy(12, 80),
        horizon in 1usize..30
    ) {
        let series = make_series(&values);
        for mut model in models() {
            model.fit(&series).unwrap();
            let forecast = model.predict(horizon).unwrap();
            prop_assert_eq!(forecast.horizon(), horizon);
            prop_assert!(forecast.primary().iter().all(|v| v.is_finite()), "{}", model.name());
            prop_assert_eq!(model.fitted_values().unwrap().len(), values.len());
        }
    }

    #[test]
    fn r_squared_is_at_most_one(values in price_strategy(12, 80)) {
        let series = make_series(&values);
        for mut model in models() {
            model.fit(&series).unwrap();
            let metrics = model.evaluate().unwrap();
            prop_assert!(metrics.r_squared <= 1.0 + 1e-9);
            prop_assert!(metrics.mae >= 0.0);
            prop_assert!(metrics.rmse >= metrics.mae - 1e-9);
        }
    }
}

// =============================================================================
// Property: outlier filtering keeps at least 70% of the series
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn outlier_filter_respects_retention_floor(
        values in price_strategy(1, 60),
        spikes in prop::collection::vec(5_000.0..50_000.0_f64, 0..20)
    ) {
        let mut all = values.clone();
        all.extend(spikes);
        let observations = make_observations(&all);
        let filtered = filter_outliers(&observations, &OutlierConfig::default());
        prop_assert!(filtered.len() * 10 >= observations.len() * 7 || filtered == observations);
        prop_assert!(filtered.len() <= observations.len());
    }
}

// =============================================================================
// Property: degenerate series
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn constant_series_forecasts_constant(level in 1.0..500.0_f64, len in 5usize..60) {
        let series = make_series(&vec![level; len]);
        let mut model = SimpleExponentialSmoothing::auto();
        model.fit(&series).unwrap();
        for v in model.predict(10).unwrap().primary() {
            prop_assert!((v - level).abs() < 1e-9);
        }
    }

    #[test]
    fn white_noise_arima_forecasts_mean(values in price_strategy(20, 60)) {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let mut model = Arima::new(ArimaParams::new(0, 0, 0));
        model.fit(&make_series(&values)).unwrap();
        for v in model.predict(5).unwrap().primary() {
            prop_assert!((v - mean).abs() < 1e-6 * mean.max(1.0));
        }
    }
}

// =============================================================================
// Property: the service never returns negative prices
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn service_forecasts_are_non_negative(
        values in falling_strategy(6, 50),
        horizon in 1usize..60,
        model_type in prop::sample::select(vec!["", "linear", "polynomial3", "holt_winters", "arima"])
    ) {
        let service = ForecastService::default();
        let summary = service.upload(&make_csv(&values), "falling.csv").unwrap();
        let request = PredictRequest::new(summary.upload_id, horizon).with_model_type(model_type);
        let result = service.predict(&request).unwrap();
        prop_assert_eq!(result.predicted_data.len(), horizon);
        prop_assert!(result.predicted_data.iter().all(|p| p.price >= 0.0));
    }
}
