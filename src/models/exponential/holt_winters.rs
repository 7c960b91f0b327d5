//! Damped-trend additive Holt-Winters forecasting model.
//!
//! Handles level, damped trend and an additive seasonal cycle, with two
//! multi-step strategies and a per-step change clamp derived from recent
//! volatility.

use log::debug;

use crate::core::{Forecast, TrainingSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::metrics::{calculate_metrics, FitMetrics};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::mean;

/// How multi-step forecasts are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastStrategy {
    /// `l + Σφⁱ·b + s` from the final state.
    #[default]
    ClosedForm,
    /// Each forecast is fed back through the update equations.
    Recursive,
}

/// Holt-Winters forecaster.
///
/// The model equations (additive seasonality, damping φ):
/// - Forecast: `ŷ_t = l_{t-1} + φb_{t-1} + s_{t-m}`
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + φb_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)φb_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}` once `t ≥ m`
///
/// With fewer than two full cycles, or `m ≤ 1`, the model runs without a
/// seasonal component.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    alpha: f64,
    beta: f64,
    gamma: f64,
    /// Trend damping in `(0, 1]`.
    phi: f64,
    /// Per-step decay of forecast seasonal offsets in `(0, 1]`.
    psi: f64,
    season_length: usize,
    strategy: ForecastStrategy,
    optimize: bool,
    state: Option<State>,
}

#[derive(Debug, Clone)]
struct State {
    level: f64,
    trend: f64,
    /// Seasonal offset per observation.
    seasonals: Vec<f64>,
    /// Effective season length after degradation.
    m: usize,
    /// Effective seasonal weight.
    gamma: f64,
    fitted: Vec<f64>,
    actual: Vec<f64>,
    max_step_delta: f64,
}

impl HoltWinters {
    /// Create a model with α = 0.3, β = 0.1, γ = 0.1 and no damping.
    pub fn new(season_length: usize) -> Self {
        Self {
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.1,
            phi: 1.0,
            psi: 1.0,
            season_length,
            strategy: ForecastStrategy::default(),
            optimize: false,
            state: None,
        }
    }

    /// Create a model whose α, β and γ are chosen by minimising one-step
    /// in-sample squared error.
    pub fn auto(season_length: usize) -> Self {
        Self {
            optimize: true,
            ..Self::new(season_length)
        }
    }

    pub fn with_params(mut self, alpha: f64, beta: f64, gamma: f64) -> Self {
        self.alpha = clamp_unit(alpha);
        self.beta = clamp_unit(beta);
        self.gamma = clamp_unit(gamma);
        self.optimize = false;
        self
    }

    pub fn with_damping(mut self, phi: f64) -> Self {
        self.phi = clamp_decay(phi);
        self
    }

    pub fn with_seasonal_decay(mut self, psi: f64) -> Self {
        self.psi = clamp_decay(psi);
        self
    }

    pub fn with_strategy(mut self, strategy: ForecastStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// `(α, β, γ)` in use; γ reads 0 after seasonal degradation.
    pub fn params(&self) -> (f64, f64, f64) {
        let gamma = self.state.as_ref().map(|s| s.gamma).unwrap_or(self.gamma);
        (self.alpha, self.beta, gamma)
    }

    /// Season length in effect after fitting.
    pub fn effective_season_length(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.m)
    }

    pub fn max_step_delta(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.max_step_delta)
    }

    fn run(values: &[f64], season_length: usize, alpha: f64, beta: f64, gamma: f64, phi: f64) -> State {
        let n = values.len();
        let (m, gamma) = if season_length <= 1 || n < 2 * season_length {
            (1, 0.0)
        } else {
            (season_length, gamma)
        };

        let mut seasonals = vec![0.0; n];
        let (mut level, mut trend) = if m == 1 {
            (values[0], if n >= 2 { values[1] - values[0] } else { 0.0 })
        } else {
            let first = mean(&values[..m]);
            let second = mean(&values[m..2 * m]);
            for i in 0..m {
                seasonals[i] = values[i] - first;
            }
            (first, (second - first) / m as f64)
        };

        let mut fitted = vec![0.0; n];
        fitted[0] = values[0];
        for t in 1..n {
            let s_prev = if m == 1 || t < m { 0.0 } else { seasonals[t - m] };
            fitted[t] = level + phi * trend + s_prev;

            let y = values[t];
            let new_level = alpha * (y - s_prev) + (1.0 - alpha) * (level + phi * trend);
            let new_trend = beta * (new_level - level) + (1.0 - beta) * phi * trend;
            if m > 1 && t >= m {
                seasonals[t] = gamma * (y - new_level) + (1.0 - gamma) * s_prev;
            }
            level = new_level;
            trend = new_trend;
        }

        State {
            level,
            trend,
            seasonals,
            m,
            gamma,
            fitted,
            actual: values.to_vec(),
            max_step_delta: estimate_max_step_delta(values),
        }
    }

    fn one_step_sse(values: &[f64], season_length: usize, params: &[f64], phi: f64) -> f64 {
        let state = Self::run(values, season_length, params[0], params[1], params[2], phi);
        values
            .iter()
            .zip(&state.fitted)
            .skip(1)
            .map(|(y, f)| (y - f).powi(2))
            .sum()
    }

    fn optimize_params(values: &[f64], season_length: usize, phi: f64) -> (f64, f64, f64) {
        let config = NelderMeadConfig {
            max_iter: 300,
            ..Default::default()
        };
        let result = nelder_mead(
            |p| Self::one_step_sse(values, season_length, p, phi),
            &[0.3, 0.1, 0.1],
            &[(0.01, 0.99), (0.001, 0.5), (0.001, 0.99)],
            config,
        );
        let p = result.optimal_point;
        (p[0], p[1], p[2])
    }

    fn step_clamp(yhat: f64, prev: f64, delta: f64) -> f64 {
        let mut v = if yhat.is_finite() { yhat.max(0.0) } else { 0.0 };
        if delta > 0.0 {
            v = v.clamp(prev - delta, prev + delta).max(0.0);
        }
        v
    }

    fn forecast_closed_form(&self, state: &State, horizon: usize) -> Vec<f64> {
        let n = state.actual.len();
        let mut prev = state.actual[n - 1];
        let mut out = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            let seasonal = if state.m > 1 {
                state.seasonals[n - state.m + (h - 1) % state.m] * self.psi.powi(h as i32)
            } else {
                0.0
            };
            let trend_term = if (self.phi - 1.0).abs() < 1e-12 {
                h as f64 * state.trend
            } else {
                state.trend * self.phi * (1.0 - self.phi.powi(h as i32)) / (1.0 - self.phi)
            };
            let yhat = Self::step_clamp(state.level + trend_term + seasonal, prev, state.max_step_delta);
            out.push(yhat);
            prev = yhat;
        }
        out
    }

    fn forecast_recursive(&self, state: &State, horizon: usize) -> Vec<f64> {
        let n = state.actual.len();
        let m = state.m;
        let mut base: Vec<f64> = if m > 1 {
            state.seasonals[n - m..].to_vec()
        } else {
            vec![0.0]
        };
        let mut level = state.level;
        let mut trend = state.trend;
        let mut prev = state.actual[n - 1];
        let mut out = Vec::with_capacity(horizon);

        for h in 1..=horizon {
            let slot = (h - 1) % m;
            let s_base = base[slot];
            let s_used = if m > 1 { s_base * self.psi.powi(h as i32) } else { 0.0 };
            let yhat = Self::step_clamp(level + self.phi * trend + s_used, prev, state.max_step_delta);

            let new_level = self.alpha * (yhat - s_used) + (1.0 - self.alpha) * (level + self.phi * trend);
            let new_trend = self.beta * (new_level - level) + (1.0 - self.beta) * self.phi * trend;
            if m > 1 {
                base[slot] = state.gamma * (yhat - new_level) + (1.0 - state.gamma) * s_base;
            }
            level = new_level;
            trend = new_trend;
            prev = yhat;
            out.push(yhat);
        }
        out
    }
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self::auto(7)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn clamp_decay(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Largest plausible one-day move: eight times the median absolute
/// first difference over the trailing 30 observations, floored at 2% of the
/// last value (and at 0.02).
pub fn estimate_max_step_delta(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let window = (n - 1).min(30);
    let mut diffs: Vec<f64> = (n - window..n)
        .map(|i| (values[i] - values[i - 1]).abs())
        .collect();
    diffs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = diffs[diffs.len() / 2];
    let last = values[n - 1];
    (0.02f64).max(last.abs() * 0.02).max(median * 8.0)
}

impl Forecaster for HoltWinters {
    fn fit(&mut self, series: &TrainingSeries) -> Result<()> {
        series.require(2)?;
        let values = series.values();

        if self.optimize {
            let (alpha, beta, gamma) = Self::optimize_params(values, self.season_length, self.phi);
            debug!(
                "holt-winters parameters alpha={:.3} beta={:.3} gamma={:.3}",
                alpha, beta, gamma
            );
            self.alpha = alpha;
            self.beta = beta;
            self.gamma = gamma;
        }

        self.state = Some(Self::run(
            values,
            self.season_length,
            self.alpha,
            self.beta,
            self.gamma,
            self.phi,
        ));
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let values = match self.strategy {
            ForecastStrategy::ClosedForm => self.forecast_closed_form(state, horizon),
            ForecastStrategy::Recursive => self.forecast_recursive(state, horizon),
        };
        Ok(Forecast::from_values(values))
    }

    fn evaluate(&self) -> Result<FitMetrics> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        calculate_metrics(&state.actual, &state.fitted)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn name(&self) -> &str {
        "holt_winters"
    }
}
