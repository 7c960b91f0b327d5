//! ARIMA / SARIMA with autocorrelation-based coefficient estimates.

use std::fmt;

use log::{debug, warn};

use super::auto::select_order;
use super::diff::DifferencingStack;
use super::pattern::historical_pattern;
use crate::core::{Forecast, TrainingSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::metrics::{aic, calculate_metrics, FitMetrics};
use crate::utils::stats::{acf, mean};

/// Bound on non-seasonal AR/MA coefficients.
const COEF_LIMIT: f64 = 0.99;
/// Bound on seasonal AR/MA coefficients.
const SEASONAL_COEF_LIMIT: f64 = 0.9;

/// ARIMA(p, d, q)(P, D, Q)\[s\] orders. `period == 0` means non-seasonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArimaParams {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl ArimaParams {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            ..Self::default()
        }
    }

    pub fn seasonal(
        p: usize,
        d: usize,
        q: usize,
        seasonal_p: usize,
        seasonal_d: usize,
        seasonal_q: usize,
        period: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p,
            seasonal_d,
            seasonal_q,
            period,
        }
    }

    pub fn is_seasonal(&self) -> bool {
        self.period > 0
    }

    /// Parameter count used by the AIC penalty: AR + MA + constant.
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Total order `p + d + q`, used to prefer simpler models.
    pub fn complexity(&self) -> usize {
        self.p + self.d + self.q
    }
}

impl fmt::Display for ArimaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_seasonal() {
            write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
            )
        } else {
            write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
        }
    }
}

#[derive(Debug, Clone)]
struct State {
    params: ArimaParams,
    mean: f64,
    stack: DifferencingStack,
    /// Centred, differenced series.
    w: Vec<f64>,
    w_mean: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
    residuals: Vec<f64>,
    actual: Vec<f64>,
    fitted: Vec<f64>,
    eval_start: usize,
}

/// ARIMA forecaster.
///
/// Coefficients are approximated from the autocorrelation of the centred,
/// differenced series: Yule-Walker for `p ≤ 2`, scaled ACF beyond that,
/// and `0.7 × ACF` for MA terms. Forecasts that come out negative or
/// non-finite, and every forecast of a seasonal model with two full cycles
/// of history, use [`historical_pattern`] instead.
#[derive(Debug, Clone)]
pub struct Arima {
    params: Option<ArimaParams>,
    name: String,
    state: Option<State>,
}

impl Arima {
    /// Create a model with fixed orders.
    pub fn new(params: ArimaParams) -> Self {
        Self {
            params: Some(params),
            name: params.to_string(),
            state: None,
        }
    }

    /// Create a model whose orders are chosen from the data at fit time.
    pub fn auto() -> Self {
        Self {
            params: None,
            name: "ARIMA".to_string(),
            state: None,
        }
    }

    /// Orders in use, available after fitting for auto models.
    pub fn params(&self) -> Option<ArimaParams> {
        self.state.as_ref().map(|s| s.params).or(self.params)
    }

    pub fn ar_coefficients(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.ar.as_slice())
    }

    pub fn ma_coefficients(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.ma.as_slice())
    }

    fn estimate_ar(w: &[f64], p: usize) -> Vec<f64> {
        let mut coef = vec![0.0; p];
        if p == 0 || w.len() < p + 5 {
            return coef;
        }
        let r = acf(w, p.max(2));
        match p {
            1 => coef[0] = r[1],
            2 => {
                let denom = 1.0 - r[1] * r[1];
                if denom.abs() > 1e-10 {
                    coef[0] = r[1] * (1.0 - r[2]) / denom;
                    coef[1] = (r[2] - r[1] * r[1]) / denom;
                } else {
                    coef[0] = r[1] * 0.9;
                }
            }
            _ => {
                for i in 0..p {
                    coef[i] = r[i + 1] * 0.8;
                }
            }
        }
        coef.iter().map(|c| c.clamp(-COEF_LIMIT, COEF_LIMIT)).collect()
    }

    fn estimate_ma(w: &[f64], q: usize) -> Vec<f64> {
        if q == 0 || w.len() < q + 5 {
            return vec![0.0; q];
        }
        let r = acf(w, q);
        (0..q)
            .map(|i| (r[i + 1] * 0.7).clamp(-COEF_LIMIT, COEF_LIMIT))
            .collect()
    }

    fn estimate_seasonal(w: &[f64], order: usize, period: usize, scale: f64) -> Vec<f64> {
        let mut coef = vec![0.0; order];
        if order == 0 || period == 0 || w.len() < 2 * period {
            return coef;
        }
        let max_lag = (period * order).min(w.len() - 1);
        let r = acf(w, max_lag);
        for (i, c) in coef.iter_mut().enumerate() {
            let lag = period * (i + 1);
            if lag < w.len() {
                *c = (r[lag] * scale).clamp(-SEASONAL_COEF_LIMIT, SEASONAL_COEF_LIMIT);
            }
        }
        coef
    }

    /// One-step prediction of `w[t]` from the values and residuals before `t`.
    fn one_step(state: &State, w: &[f64], residuals: &[f64], t: usize) -> f64 {
        let mu = state.w_mean;
        let mut pred = mu;
        let lagged = |series: &[f64], lag: usize, centre: f64| -> f64 {
            if lag <= t && t - lag < series.len() {
                series[t - lag] - centre
            } else {
                0.0
            }
        };
        for (i, phi) in state.ar.iter().enumerate() {
            pred += phi * lagged(w, i + 1, mu);
        }
        for (j, theta) in state.ma.iter().enumerate() {
            pred += theta * lagged(residuals, j + 1, 0.0);
        }
        let s = state.params.period;
        for (k, phi) in state.seasonal_ar.iter().enumerate() {
            pred += phi * lagged(w, s * (k + 1), mu);
        }
        for (k, theta) in state.seasonal_ma.iter().enumerate() {
            pred += theta * lagged(residuals, s * (k + 1), 0.0);
        }
        pred
    }

    fn forecast_differenced(state: &State, horizon: usize) -> Vec<f64> {
        let n = state.w.len();
        let mut w = state.w.clone();
        let mut e = state.residuals.clone();
        for t in n..n + horizon {
            let next = Self::one_step(state, &w, &e, t);
            w.push(next);
            e.push(0.0);
        }
        w.split_off(n)
    }
}

impl Default for Arima {
    fn default() -> Self {
        Self::auto()
    }
}

impl Forecaster for Arima {
    fn fit(&mut self, series: &TrainingSeries) -> Result<()> {
        series.require(2)?;
        let values = series.values();
        let params = match self.params {
            Some(p) => p,
            None => {
                let p = select_order(values);
                debug!("arima auto-selected {}", p);
                p
            }
        };

        let m = mean(values);
        let centred: Vec<f64> = values.iter().map(|y| y - m).collect();
        let (seasonal_d, period) = if params.is_seasonal() {
            (params.seasonal_d, params.period)
        } else {
            (0, 0)
        };
        let (w, stack) = DifferencingStack::apply(&centred, params.d, seasonal_d, period);

        let n_w = w.len();
        let (ar, ma) = if n_w < params.p.max(params.q) + 10 {
            (vec![0.0; params.p], vec![0.0; params.q])
        } else {
            (Self::estimate_ar(&w, params.p), Self::estimate_ma(&w, params.q))
        };
        let (seasonal_ar, seasonal_ma) = if params.is_seasonal() {
            (
                Self::estimate_seasonal(&w, params.seasonal_p, params.period, 0.6),
                Self::estimate_seasonal(&w, params.seasonal_q, params.period, 0.5),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let mut state = State {
            params,
            mean: m,
            stack,
            w_mean: if w.is_empty() { 0.0 } else { mean(&w) },
            w,
            ar,
            ma,
            seasonal_ar,
            seasonal_ma,
            residuals: Vec::new(),
            actual: values.to_vec(),
            fitted: Vec::new(),
            eval_start: 0,
        };

        let mut residuals = Vec::with_capacity(n_w);
        for t in 0..n_w {
            let pred = Self::one_step(&state, &state.w, &residuals, t);
            residuals.push(state.w[t] - pred);
        }

        // The one-step error on the differenced scale is the one-step error
        // on the original scale.
        let offset = values.len() - n_w;
        let mut fitted = values.to_vec();
        for (t, e) in residuals.iter().enumerate() {
            fitted[offset + t] = values[offset + t] - e;
        }
        state.eval_start = (offset + params.p.max(params.q)).min(values.len());
        state.residuals = residuals;
        state.fitted = fitted;

        self.name = params.to_string();
        self.state = Some(state);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let values = &state.actual;
        let n = values.len();
        let last = values[n - 1];
        let period = state.params.period;

        if state.params.is_seasonal() && n >= 2 * period {
            let out = (1..=horizon)
                .map(|h| historical_pattern(values, period, h).max(0.0))
                .collect();
            return Ok(Forecast::from_values(out));
        }

        let w_forecast = Self::forecast_differenced(state, horizon);
        let integrated = state.stack.integrate(&w_forecast);
        let mut fallbacks = 0usize;
        let out = integrated
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let v = c + state.mean;
                if v.is_finite() && v >= 0.0 {
                    return v;
                }
                fallbacks += 1;
                let p = historical_pattern(values, period, i + 1);
                if p.is_finite() && p >= 0.0 {
                    p
                } else {
                    (last * 0.9).max(0.0)
                }
            })
            .collect();
        if fallbacks > 0 {
            warn!(
                "{}: {} of {} forecast steps used the historical pattern",
                self.name, fallbacks, horizon
            );
        }
        Ok(Forecast::from_values(out))
    }

    fn evaluate(&self) -> Result<FitMetrics> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let actual = &state.actual[state.eval_start..];
        let fitted = &state.fitted[state.eval_start..];
        if actual.is_empty() {
            return Ok(FitMetrics::zero());
        }
        let ssr: f64 = actual.iter().zip(fitted).map(|(a, f)| (a - f).powi(2)).sum();
        let metrics = calculate_metrics(actual, fitted)?;
        Ok(metrics.with_aic(aic(ssr, actual.len(), state.params.num_params())))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
