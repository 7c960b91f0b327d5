//! Linear and polynomial regression on day offsets.

use log::warn;

use crate::core::{Forecast, TrainingSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::metrics::{calculate_metrics, FitMetrics};
use crate::utils::ols::ols_fit;
use crate::utils::stats::mean;

/// Points needed before recency weighting is applied.
const MIN_WEIGHTED_POINTS: usize = 6;

/// Regression variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegressionKind {
    /// Ordinary least squares line.
    Linear,
    /// Least squares line with weights rising from 0.3 (oldest) to 1.0.
    WeightedLinear,
    /// Polynomial of degree 2 or 3 on x normalised to `[-1, 1]`.
    Polynomial(usize),
}

/// Regression forecaster over `(day offset, price)` pairs.
#[derive(Debug, Clone)]
pub struct RegressionModel {
    kind: RegressionKind,
    name: String,
    /// Intercept first, then ascending powers.
    coefficients: Option<Vec<f64>>,
    x_min: f64,
    x_range: f64,
    last_x: f64,
    fitted: Option<Vec<f64>>,
    actual: Vec<f64>,
}

impl RegressionModel {
    fn with_kind(kind: RegressionKind) -> Self {
        let name = match kind {
            RegressionKind::Linear => "linear".to_string(),
            RegressionKind::WeightedLinear => "weighted_linear".to_string(),
            RegressionKind::Polynomial(d) => format!("polynomial{}", d),
        };
        Self {
            kind,
            name,
            coefficients: None,
            x_min: 0.0,
            x_range: 1.0,
            last_x: 0.0,
            fitted: None,
            actual: Vec::new(),
        }
    }

    pub fn linear() -> Self {
        Self::with_kind(RegressionKind::Linear)
    }

    pub fn weighted() -> Self {
        Self::with_kind(RegressionKind::WeightedLinear)
    }

    /// Polynomial regression; the degree is clamped into `2..=3`.
    pub fn polynomial(degree: usize) -> Self {
        Self::with_kind(RegressionKind::Polynomial(degree.clamp(2, 3)))
    }

    pub fn kind(&self) -> RegressionKind {
        self.kind
    }

    /// Fitted coefficients, intercept first.
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.coefficients.as_deref()
    }

    /// Slope per day for the linear variants.
    pub fn slope(&self) -> Option<f64> {
        match self.kind {
            RegressionKind::Polynomial(_) => None,
            _ => self.coefficients.as_ref().map(|c| c[1]),
        }
    }

    fn normalize(&self, x: f64) -> f64 {
        2.0 * (x - self.x_min) / self.x_range - 1.0
    }

    fn evaluate_at(&self, coefficients: &[f64], x: f64) -> f64 {
        match self.kind {
            RegressionKind::Polynomial(_) => {
                let xn = self.normalize(x);
                coefficients.iter().rev().fold(0.0, |acc, c| acc * xn + c)
            }
            _ => coefficients[0] + coefficients[1] * x,
        }
    }

    fn fit_line(x: &[f64], y: &[f64], weights: Option<&[f64]>) -> Vec<f64> {
        let ones;
        let w = match weights {
            Some(w) => w,
            None => {
                ones = vec![1.0; x.len()];
                &ones
            }
        };
        let w_sum: f64 = w.iter().sum();
        let x_bar = x.iter().zip(w).map(|(a, b)| a * b).sum::<f64>() / w_sum;
        let y_bar = y.iter().zip(w).map(|(a, b)| a * b).sum::<f64>() / w_sum;
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for i in 0..x.len() {
            sxy += w[i] * (x[i] - x_bar) * (y[i] - y_bar);
            sxx += w[i] * (x[i] - x_bar).powi(2);
        }
        if sxx < 1e-10 {
            return vec![y_bar, 0.0];
        }
        let slope = sxy / sxx;
        vec![y_bar - slope * x_bar, slope]
    }
}

/// Weights rising linearly from 0.3 to 1.0 across `n` points.
fn recency_weights(n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.3 + 0.7 * i as f64 / (n - 1) as f64)
        .collect()
}

impl Forecaster for RegressionModel {
    fn fit(&mut self, series: &TrainingSeries) -> Result<()> {
        series.require(2)?;
        let x = series.x();
        let y = series.values();

        let coefficients = match self.kind {
            RegressionKind::Linear => Self::fit_line(x, y, None),
            RegressionKind::WeightedLinear => {
                if y.len() >= MIN_WEIGHTED_POINTS {
                    Self::fit_line(x, y, Some(&recency_weights(y.len())))
                } else {
                    Self::fit_line(x, y, None)
                }
            }
            RegressionKind::Polynomial(degree) => {
                let x_min = x.iter().copied().fold(f64::INFINITY, f64::min);
                let x_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = x_max - x_min;
                self.x_min = x_min;
                self.x_range = if range < 1e-10 { 1.0 } else { range };

                let design: Vec<Vec<f64>> = x
                    .iter()
                    .map(|&xi| {
                        let xn = self.normalize(xi);
                        (0..=degree).map(|p| xn.powi(p as i32)).collect()
                    })
                    .collect();
                match ols_fit(&design, y) {
                    Some(c) => c,
                    None => {
                        warn!("singular normal equations for {}; using mean", self.name);
                        let mut c = vec![0.0; degree + 1];
                        c[0] = mean(y);
                        c
                    }
                }
            }
        };

        let fitted: Vec<f64> = x.iter().map(|&xi| self.evaluate_at(&coefficients, xi)).collect();
        self.coefficients = Some(coefficients);
        self.fitted = Some(fitted);
        self.actual = y.to_vec();
        self.last_x = series.last_x();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let coefficients = self.coefficients.as_ref().ok_or(ForecastError::FitRequired)?;
        let values = (1..=horizon)
            .map(|h| self.evaluate_at(coefficients, self.last_x + h as f64))
            .collect();
        Ok(Forecast::from_values(values))
    }

    fn evaluate(&self) -> Result<FitMetrics> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;
        calculate_metrics(&self.actual, fitted)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Observation;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn daily(values: &[f64]) -> TrainingSeries {
        TrainingSeries::from_values(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values.to_vec())
    }

    #[test]
    fn linear_recovers_line_and_extrapolates() {
        let values: Vec<f64> = (0..10).map(|i| 5.0 + 2.0 * i as f64).collect();
        let mut model = RegressionModel::linear();
        model.fit(&daily(&values)).unwrap();

        let c = model.coefficients().unwrap();
        assert_relative_eq!(c[0], 5.0, epsilon = 1e-10);
        assert_relative_eq!(c[1], 2.0, epsilon = 1e-10);

        let forecast = model.predict(2).unwrap();
        assert_relative_eq!(forecast.primary()[0], 25.0, epsilon = 1e-10);
        assert_relative_eq!(forecast.primary()[1], 27.0, epsilon = 1e-10);

        let metrics = model.evaluate().unwrap();
        assert_relative_eq!(metrics.r_squared, 1.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.rmse, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn linear_uses_calendar_gaps() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let obs: Vec<Observation> = [0i64, 2, 4, 10]
            .iter()
            .map(|&d| Observation::new(base + Duration::days(d), 1.0 + d as f64))
            .collect();
        let mut model = RegressionModel::linear();
        model.fit(&TrainingSeries::from_observations(&obs).unwrap()).unwrap();
        assert_relative_eq!(model.slope().unwrap(), 1.0, epsilon = 1e-10);
        // Day 11 after the origin
        assert_relative_eq!(model.predict(1).unwrap().primary()[0], 12.0, epsilon = 1e-10);
    }

    #[test]
    fn zero_x_variance_falls_back_to_mean() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let obs = vec![Observation::new(base, 4.0), Observation::new(base, 8.0)];
        let mut model = RegressionModel::linear();
        model.fit(&TrainingSeries::from_observations(&obs).unwrap()).unwrap();
        assert_relative_eq!(model.slope().unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(model.predict(3).unwrap().primary()[2], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn weighted_favours_recent_points() {
        // Flat then rising: recency weights steepen the line
        let values = [10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 13.0, 14.0];
        let mut plain = RegressionModel::linear();
        let mut weighted = RegressionModel::weighted();
        plain.fit(&daily(&values)).unwrap();
        weighted.fit(&daily(&values)).unwrap();
        assert!(weighted.slope().unwrap() > plain.slope().unwrap());
    }

    #[test]
    fn weighted_needs_six_points() {
        let values = [1.0, 3.0, 2.0, 5.0, 4.0];
        let mut plain = RegressionModel::linear();
        let mut weighted = RegressionModel::weighted();
        plain.fit(&daily(&values)).unwrap();
        weighted.fit(&daily(&values)).unwrap();
        assert_relative_eq!(
            weighted.slope().unwrap(),
            plain.slope().unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn polynomial_fits_quadratic_exactly() {
        let values: Vec<f64> = (0..12).map(|i| 3.0 + 0.5 * (i as f64).powi(2)).collect();
        let mut model = RegressionModel::polynomial(2);
        model.fit(&daily(&values)).unwrap();
        assert_eq!(model.name(), "polynomial2");

        let next = model.predict(1).unwrap().primary()[0];
        assert_relative_eq!(next, 3.0 + 0.5 * 144.0, epsilon = 1e-6);
        assert_relative_eq!(model.evaluate().unwrap().r_squared, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn polynomial_cubic_and_degree_clamp() {
        let values: Vec<f64> = (0..15).map(|i| (i as f64 - 7.0).powi(3)).collect();
        let mut model = RegressionModel::polynomial(7);
        assert_eq!(model.kind(), RegressionKind::Polynomial(3));
        model.fit(&daily(&values)).unwrap();
        assert_relative_eq!(model.predict(1).unwrap().primary()[0], 512.0, epsilon = 1e-5);
    }

    #[test]
    fn rejects_single_point_and_unfitted_use() {
        let mut model = RegressionModel::linear();
        assert!(matches!(
            model.fit(&daily(&[1.0])),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        ));
        assert_eq!(model.predict(3), Err(ForecastError::FitRequired));
        assert!(!model.is_fitted());
    }
}
