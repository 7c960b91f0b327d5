//! Accuracy metrics for forecast evaluation.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// In-sample fit quality of a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    /// Coefficient of determination, 0 when total variance vanishes.
    pub r_squared: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean absolute percentage error as a fraction; zero actuals are left
    /// out.
    #[serde(default)]
    pub mape: f64,
    /// Akaike-style score, reported by ARIMA only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aic: Option<f64>,
}

impl FitMetrics {
    /// Metrics for a model with nothing to compare against.
    pub fn zero() -> Self {
        Self {
            r_squared: 0.0,
            mae: 0.0,
            rmse: 0.0,
            mape: 0.0,
            aic: None,
        }
    }

    pub fn with_aic(mut self, aic: f64) -> Self {
        self.aic = Some(aic);
        self
    }

    /// Round for presentation: R² and MAPE to 4 places, errors to 2.
    pub fn rounded(&self) -> Self {
        Self {
            r_squared: round_to(self.r_squared, 4),
            mae: round_to(self.mae, 2),
            rmse: round_to(self.rmse, 2),
            mape: round_to(self.mape, 4),
            aic: self.aic.map(|a| round_to(a, 2)),
        }
    }
}

/// Calculate R², MAE, RMSE and MAPE between actual and fitted values.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<FitMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::ComputationError(format!(
            "length mismatch: {} actual vs {} predicted",
            actual.len(),
            predicted.len()
        )));
    }

    Ok(FitMetrics {
        r_squared: r_squared(actual, predicted),
        mae: mae(actual, predicted),
        rmse: rmse(actual, predicted),
        mape: mape(actual, predicted),
        aic: None,
    })
}

/// Coefficient of determination. Returns 0 when the total sum of squares is
/// below `1e-10` or the result is not finite.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return 0.0;
    }
    let m = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - m).powi(2)).sum();
    if ss_tot < 1e-10 {
        return 0.0;
    }
    let ss_res: f64 = sum_squared_error(actual, predicted);
    let r2 = 1.0 - ss_res / ss_tot;
    if r2.is_finite() {
        r2
    } else {
        0.0
    }
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    (sum_squared_error(actual, predicted) / actual.len() as f64).sqrt()
}

/// Mean of `|a - p| / |a|` over actuals with `|a| > 1e-9`; 0 when there
/// are none.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    let (sum, count) = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, _)| a.abs() > 1e-9)
        .fold((0.0, 0usize), |(sum, count), (a, p)| {
            (sum + ((a - p) / a).abs(), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn sum_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum()
}

/// `m·ln(SSR/m) + 2k`, with `SSR/m` floored at `1e-10`.
pub fn aic(ssr: f64, m: usize, k: usize) -> f64 {
    if m == 0 {
        return f64::INFINITY;
    }
    let m = m as f64;
    m * (ssr / m).max(1e-10).ln() + 2.0 * k as f64
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_fit_metrics() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let m = calculate_metrics(&actual, &actual).unwrap();
        assert_relative_eq!(m.mae, 0.0, epsilon = 1e-10);
        assert_relative_eq!(m.rmse, 0.0, epsilon = 1e-10);
        assert_relative_eq!(m.r_squared, 1.0, epsilon = 1e-10);
        assert!(m.aic.is_none());
    }

    #[test]
    fn known_errors() {
        let actual = vec![1.0, 2.0, 3.0, 4.0];
        let predicted = vec![2.0, 2.0, 2.0, 2.0];
        let m = calculate_metrics(&actual, &predicted).unwrap();
        // errors 1,0,1,2
        assert_relative_eq!(m.mae, 1.0, epsilon = 1e-10);
        assert_relative_eq!(m.rmse, (6.0_f64 / 4.0).sqrt(), epsilon = 1e-10);
        // ss_tot = 5, ss_res = 6
        assert_relative_eq!(m.r_squared, 1.0 - 6.0 / 5.0, epsilon = 1e-10);
    }

    #[test]
    fn constant_actuals_give_zero_r_squared() {
        let m = calculate_metrics(&[3.0; 5], &[2.0; 5]).unwrap();
        assert_eq!(m.r_squared, 0.0);
        let m = calculate_metrics(&[3.0; 5], &[3.0; 5]).unwrap();
        assert_eq!(m.r_squared, 0.0);
    }

    #[test]
    fn mape_skips_zero_actuals() {
        let m = calculate_metrics(&[0.0, 10.0, 20.0], &[5.0, 11.0, 15.0]).unwrap();
        // (0.1 + 0.25) / 2; the zero actual is left out
        assert_relative_eq!(m.mape, 0.175, epsilon = 1e-12);
        assert_eq!(mape(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(matches!(
            calculate_metrics(&[1.0, 2.0], &[1.0]),
            Err(ForecastError::ComputationError(_))
        ));
        assert_eq!(
            calculate_metrics(&[], &[]),
            Err(ForecastError::EmptyData)
        );
    }

    #[test]
    fn aic_penalises_parameters() {
        let a = aic(10.0, 10, 1);
        let b = aic(10.0, 10, 3);
        assert_relative_eq!(b - a, 4.0, epsilon = 1e-12);
        // Perfect fit is floored rather than -inf
        assert!(aic(0.0, 10, 1).is_finite());
    }

    #[test]
    fn rounding_for_presentation() {
        let m = FitMetrics {
            r_squared: 0.987_654,
            mae: 1.234_5,
            rmse: 2.005,
            mape: 0.123_456,
            aic: None,
        }
        .rounded();
        assert_relative_eq!(m.mape, 0.1235, epsilon = 1e-12);
        assert_relative_eq!(m.r_squared, 0.9877, epsilon = 1e-12);
        assert_relative_eq!(m.mae, 1.23, epsilon = 1e-12);
        assert_relative_eq!(round_to(12.345_6, 2), 12.35, epsilon = 1e-12);
    }
}
