use std::cmp::Ordering;

use crate::utils::errors::{PathwiseError, Result};

/// # LinearInterpolator
/// Basic linear interpolator over a strictly increasing abscissa grid.
/// Extrapolation beyond either end is flat unless disabled, in which case
/// out-of-range queries are an error.
#[derive(Clone, Debug)]
pub struct LinearInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    enable_extrapolation: bool,
}

impl LinearInterpolator {
    pub fn new(x: Vec<f64>, y: Vec<f64>, enable_extrapolation: bool) -> Result<LinearInterpolator> {
        if x.len() != y.len() {
            return Err(PathwiseError::SizeMismatchErr(format!(
                "interpolation grid has {} abscissae but {} ordinates",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(PathwiseError::InvalidValueErr(
                "empty interpolation grid".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PathwiseError::InvalidValueErr(
                "interpolation abscissae must be strictly increasing".to_string(),
            ));
        }
        Ok(LinearInterpolator {
            x,
            y,
            enable_extrapolation,
        })
    }

    pub fn interpolate(&self, x: f64) -> Result<f64> {
        let first = self.x[0];
        let last = self.x[self.x.len() - 1];
        if x < first || x > last {
            if !self.enable_extrapolation {
                return Err(PathwiseError::InvalidValueErr(format!(
                    "{} is outside the interpolation range [{}, {}]",
                    x, first, last
                )));
            }
            // flat extrapolation
            return Ok(if x < first {
                self.y[0]
            } else {
                self.y[self.y.len() - 1]
            });
        }

        let index = match self
            .x
            .binary_search_by(|knot| knot.partial_cmp(&x).unwrap_or(Ordering::Equal))
        {
            Ok(index) => return Ok(self.y[index]),
            Err(index) => index,
        };
        if index == 0 {
            return Ok(self.y[0]);
        }
        let (x0, x1) = (self.x[index - 1], self.x[index]);
        let (y0, y1) = (self.y[index - 1], self.y[index]);
        Ok(y0 + (x - x0) * (y1 - y0) / (x1 - x0))
    }
}
