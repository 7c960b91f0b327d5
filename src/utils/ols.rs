//! Least-squares helpers: normal equations solved by Gaussian elimination.

/// Pivot magnitude below which a system is treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// Solve `A·x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when the matrix is singular or a result is not finite.
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < SINGULAR_EPS {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Least-squares coefficients for `design · c ≈ y` via `AᵀA·c = Aᵀy`.
///
/// Each row of `design` is one observation.
pub fn ols_fit(design: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let k = design.first()?.len();
    if k == 0 || design.len() != y.len() {
        return None;
    }
    let mut ata = vec![vec![0.0; k]; k];
    let mut aty = vec![0.0; k];
    for (row, &target) in design.iter().zip(y) {
        for i in 0..k {
            aty[i] += row[i] * target;
            for j in 0..k {
                ata[i][j] += row[i] * row[j];
            }
        }
    }
    solve_linear_system(ata, aty)
}
