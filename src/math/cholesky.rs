use crate::utils::errors::{PathwiseError, Result};

/// Lower-triangular Cholesky factor of a symmetric positive definite
/// matrix given in row-major order. Used to correlate Gaussian draws
/// during simulator preparation.
pub fn cholesky(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();
    if matrix.iter().any(|row| row.len() != n) {
        return Err(PathwiseError::SizeMismatchErr(
            "correlation matrix must be square".to_string(),
        ));
    }
    for i in 0..n {
        for j in 0..i {
            if (matrix[i][j] - matrix[j][i]).abs() > 1e-12 {
                return Err(PathwiseError::InvalidValueErr(format!(
                    "correlation matrix is not symmetric at ({}, {})",
                    i, j
                )));
            }
        }
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = matrix[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(PathwiseError::InvalidValueErr(
                        "correlation matrix is not positive definite".to_string(),
                    ));
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Ok(l)
}
