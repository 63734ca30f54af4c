//! Parameter uncertainties of a least-squares fit
//!
//! The covariance is estimated from the Jacobian of the residuals at the
//! solution as `(JᵀJ)⁺ · SSE / (n - p)`, with the pseudo-inverse computed from a
//! singular value decomposition. With no residual degrees of freedom every entry
//! is infinite.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::error::OptimizeError;

/// Two-sided confidence level of the reported intervals
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Confidence interval of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Covariance-derived statistics at the best parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStatistics {
    /// Residual degrees of freedom `n - p`
    pub dof: usize,
    pub covariance: Array2<f64>,
    /// One-sigma standard errors
    pub standard_errors: Array1<f64>,
    pub correlation: Array2<f64>,
    pub confidence_intervals: Vec<ConfidenceInterval>,
}

impl ParameterStatistics {
    /// Computes covariance, standard errors, correlations and confidence intervals
    ///
    /// # Arguments
    /// * `params` - Best-fit parameter vector
    /// * `residuals` - Residuals at the best fit
    /// * `jacobian` - Jacobian of the residuals at the best fit, shape `(n, p)`
    pub fn new(
        params: &Array1<f64>,
        residuals: &Array1<f64>,
        jacobian: &Array2<f64>,
    ) -> Result<Self, OptimizeError> {
        let (n, p) = jacobian.dim();
        let dof = n.saturating_sub(p);
        let sse = residuals.dot(residuals);

        let covariance = if dof == 0 {
            log::warn!("No residual degrees of freedom ({} points, {} parameters)", n, p);
            Array2::from_elem((p, p), f64::INFINITY)
        } else {
            covariance(jacobian, sse / dof as f64)?
        };

        let standard_errors = covariance.diag().mapv(f64::sqrt);
        if standard_errors.iter().any(|se| !se.is_finite()) {
            log::warn!("Covariance of the parameters could not be estimated");
        }

        let correlation = Array2::from_shape_fn((p, p), |(i, j)| {
            covariance[[i, j]] / (standard_errors[i] * standard_errors[j])
        });

        let quantile = t_quantile(dof)?;
        let confidence_intervals = params
            .iter()
            .zip(standard_errors.iter())
            .map(|(value, se)| ConfidenceInterval {
                lower: value - quantile * se,
                upper: value + quantile * se,
            })
            .collect();

        Ok(Self {
            dof,
            covariance,
            standard_errors,
            correlation,
            confidence_intervals,
        })
    }
}

/// Scaled pseudo-inverse of `JᵀJ`
fn covariance(jacobian: &Array2<f64>, residual_variance: f64) -> Result<Array2<f64>, OptimizeError> {
    let jtj = jacobian.t().dot(jacobian);
    let p = jtj.nrows();
    let matrix = DMatrix::from_fn(p, p, |i, j| jtj[[i, j]]);

    let svd = matrix.svd(true, true);
    let threshold = f64::EPSILON * p as f64 * svd.singular_values.max();
    let inverse = svd
        .pseudo_inverse(threshold)
        .map_err(|e| OptimizeError::CovarianceError(e.to_string()))?;

    Ok(Array2::from_shape_fn((p, p), |(i, j)| {
        inverse[(i, j)] * residual_variance
    }))
}

/// Two-sided Student-t quantile for [`CONFIDENCE_LEVEL`]
fn t_quantile(dof: usize) -> Result<f64, OptimizeError> {
    if dof == 0 {
        return Ok(f64::INFINITY);
    }

    let distribution = StudentsT::new(0.0, 1.0, dof as f64)
        .map_err(|e| OptimizeError::StatisticsError(e.to_string()))?;
    Ok(distribution.inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0))
}
