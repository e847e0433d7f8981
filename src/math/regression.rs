use crate::math::cholesky::cholesky;
use crate::utils::errors::{PathwiseError, Result};

/// Least squares estimate of `E[target | factors]`, evaluated at each
/// observation. The basis is a constant plus, for every factor, its first
/// three powers, plus all pairwise factor products. Degenerate covariates
/// (no variation across observations) are dropped, so with no factors at
/// all the fit collapses to the sample mean.
///
/// Used to estimate the forward value of remaining cashflows from the
/// simulated model state at a horizon date, in the manner of
/// Longstaff-Schwartz.
pub fn fitted_values(factors: &[Vec<f64>], targets: &[f64]) -> Result<Vec<f64>> {
    let n = targets.len();
    if factors.len() != n {
        return Err(PathwiseError::SizeMismatchErr(format!(
            "regression has {} factor rows for {} targets",
            factors.len(),
            n
        )));
    }
    if n == 0 {
        return Ok(Vec::new());
    }
    let n_factors = factors[0].len();
    if factors.iter().any(|row| row.len() != n_factors) {
        return Err(PathwiseError::SizeMismatchErr(
            "regression factor rows have unequal lengths".to_string(),
        ));
    }

    let mut columns: Vec<Vec<f64>> = Vec::new();
    for f in 0..n_factors {
        for power in 1..=3 {
            columns.push(factors.iter().map(|row| row[f].powi(power)).collect());
        }
        for g in f + 1..n_factors {
            columns.push(factors.iter().map(|row| row[f] * row[g]).collect());
        }
    }
    // standardize and drop covariates with no cross-sectional variation
    let mut kept: Vec<Vec<f64>> = Vec::new();
    for column in columns {
        let mean = column.iter().sum::<f64>() / n as f64;
        let var = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        let sd = var.sqrt();
        if sd > 1e-12 * (1.0 + mean.abs()) {
            kept.push(column.iter().map(|x| (x - mean) / sd).collect());
        }
    }

    let target_mean = targets.iter().sum::<f64>() / n as f64;
    if kept.is_empty() {
        return Ok(vec![target_mean; n]);
    }

    // normal equations on centered data, with a small ridge so nearly
    // collinear powers cannot make the system indefinite
    let k = kept.len();
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        for j in 0..=i {
            let dot: f64 = kept[i].iter().zip(&kept[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = dot;
            xtx[j][i] = dot;
        }
        xty[i] = kept[i]
            .iter()
            .zip(targets)
            .map(|(x, y)| x * (y - target_mean))
            .sum();
        xtx[i][i] += 1e-8 * n as f64;
    }
    let beta = solve_spd(&xtx, &xty)?;

    let mut fitted = vec![target_mean; n];
    for (column, b) in kept.iter().zip(&beta) {
        for (value, x) in fitted.iter_mut().zip(column) {
            *value += b * x;
        }
    }
    Ok(fitted)
}

/// Solves `a x = b` for symmetric positive definite `a` via the Cholesky
/// factor and two triangular substitutions.
fn solve_spd(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let l = cholesky(a)?;
    let n = b.len();
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in i + 1..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }
    Ok(x)
}
