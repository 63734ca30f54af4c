//! argmin trait implementations for [`Problem`]
//!
//! The residual vector `observed - predicted` is exposed as an [`Operator`] with its
//! [`Jacobian`] taken from the forward sensitivities, so least-squares solvers can
//! work on it directly. Scalar solvers use the sum of squared residuals as the
//! [`CostFunction`] and `2 Jᵀ r` as its [`Gradient`].

use argmin::core::{CostFunction, Gradient, Jacobian, Operator};
use ndarray::{Array1, Array2};
use peroxide::fuga::ODEIntegrator;

use super::problem::Problem;

impl<S: ODEIntegrator + Copy> Operator for Problem<S> {
    type Param = Array1<f64>;
    type Output = Array1<f64>;

    /// Residuals between observed and predicted concentrations
    fn apply(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.residuals(params)?)
    }
}

impl<S: ODEIntegrator + Copy> Jacobian for Problem<S> {
    type Param = Array1<f64>;
    type Jacobian = Array2<f64>;

    /// Jacobian of the residuals, the negated sensitivity matrix
    fn jacobian(&self, params: &Self::Param) -> Result<Self::Jacobian, argmin::core::Error> {
        let (_, jacobian) = self.residuals_and_jacobian(params)?;
        Ok(jacobian)
    }
}

impl<S: ODEIntegrator + Copy> CostFunction for Problem<S> {
    type Param = Array1<f64>;
    type Output = f64;

    /// Sum of squared residuals
    fn cost(&self, params: &Self::Param) -> Result<f64, argmin::core::Error> {
        Ok(self.sse(params)?)
    }
}

impl<S: ODEIntegrator + Copy> Gradient for Problem<S> {
    type Param = Array1<f64>;
    type Gradient = Array1<f64>;

    /// Gradient of the sum of squared residuals, `2 Jᵀ r`
    fn gradient(&self, params: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        let (residuals, jacobian) = self.residuals_and_jacobian(params)?;
        Ok(jacobian.t().dot(&residuals) * 2.0)
    }
}
