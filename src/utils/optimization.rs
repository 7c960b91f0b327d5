//! Bounded Nelder-Mead simplex search used for smoothing parameters.

/// Result of a simplex search.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub optimal_point: Vec<f64>,
    pub optimal_value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Stop once the spread of objective values falls below this.
    pub tolerance: f64,
    /// Initial simplex edge as a fraction of each coordinate's bound width.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

/// Minimise `objective` within the box `bounds`, starting from `initial`.
///
/// Uses the standard coefficients (reflection 1, expansion 2, contraction
/// 0.5, shrink 0.5). Every trial point is clamped into `bounds`.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let clamp = |p: Vec<f64>| -> Vec<f64> {
        p.into_iter()
            .enumerate()
            .map(|(i, x)| match bounds.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect()
    };
    let eval = |p: &[f64]| {
        let v = objective(p);
        if v.is_finite() {
            v
        } else {
            f64::MAX
        }
    };

    let mut vertices = vec![clamp(initial.to_vec())];
    for i in 0..n {
        let width = bounds.get(i).map(|(lo, hi)| hi - lo).unwrap_or(1.0);
        let mut v = initial.to_vec();
        let step = config.initial_step * width;
        // Step inward when the start sits on the upper bound.
        v[i] = match bounds.get(i) {
            Some(&(_, hi)) if v[i] + step > hi => v[i] - step,
            _ => v[i] + step,
        };
        vertices.push(clamp(v));
    }
    let mut values: Vec<f64> = vertices.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = n == 0;
    while !converged && iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let (best, worst, second) = (order[0], order[n], order[n - 1]);
        if (values[worst] - values[best]).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| {
                vertices
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != worst)
                    .map(|(_, v)| v[j])
                    .sum::<f64>()
                    / n as f64
            })
            .collect();
        let toward = |from: &[f64], coef: f64| -> Vec<f64> {
            clamp(
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, p)| c + coef * (p - c))
                    .collect(),
            )
        };

        let reflected = toward(&vertices[worst], -1.0);
        let fr = eval(&reflected);
        if fr < values[best] {
            let expanded = toward(&vertices[worst], -2.0);
            let fe = eval(&expanded);
            let (p, f) = if fe < fr { (expanded, fe) } else { (reflected, fr) };
            vertices[worst] = p;
            values[worst] = f;
            continue;
        }
        if fr < values[second] {
            vertices[worst] = reflected;
            values[worst] = fr;
            continue;
        }

        let contracted = if fr < values[worst] {
            toward(&reflected, 0.5)
        } else {
            toward(&vertices[worst], 0.5)
        };
        let fc = eval(&contracted);
        if fc < values[worst].min(fr) {
            vertices[worst] = contracted;
            values[worst] = fc;
            continue;
        }

        let anchor = vertices[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk = anchor
                .iter()
                .zip(&vertices[i])
                .map(|(a, v)| a + 0.5 * (v - a))
                .collect();
            vertices[i] = clamp(shrunk);
            values[i] = eval(&vertices[i]);
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: vertices[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}
