//! Traits and conversion logic for optimization.
//!
//! This module provides:
//!
//! - The `Optimizer` trait defining the interface for fitting algorithms
//! - Initial guess handling via `InitialGuesses`

use ndarray::Array1;
use peroxide::fuga::ODEIntegrator;

use crate::optim::error::OptimizeError;
use crate::optim::problem::Problem;
use crate::optim::report::FitReport;
use crate::parameters::{ParameterSet, N_PARAMS};

/// Trait defining the interface for optimization algorithms.
pub trait Optimizer<S: ODEIntegrator + Copy> {
    /// Fits the parameters of the given problem.
    ///
    /// # Arguments
    /// * `problem` - The estimation problem to solve
    /// * `initial_guess` - Starting parameters, the default guess if `None`
    ///
    /// # Returns
    /// * `Result<FitReport, OptimizeError>` - Best-fit parameters with their statistics
    fn optimize<T>(
        &self,
        problem: &Problem<S>,
        initial_guess: Option<T>,
    ) -> Result<FitReport, OptimizeError>
    where
        T: Into<InitialGuesses>;
}

/// Wrapper type for initial parameter guesses used in optimization.
#[derive(Debug, Clone)]
pub struct InitialGuesses(pub Array1<f64>);

impl InitialGuesses {
    /// Get the values of the initial guesses.
    pub fn get_values(self) -> Array1<f64> {
        self.0
    }

    /// Get the values of the initial guesses.
    pub fn get_values_ref(&self) -> &Array1<f64> {
        &self.0
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Resolves an optional guess into a checked parameter vector
    ///
    /// # Errors
    /// Returns `OptimizeError::InitialGuessLengthError` if the guess does not hold
    /// exactly four values.
    pub(crate) fn resolve<T: Into<InitialGuesses>>(
        initial_guess: Option<T>,
    ) -> Result<Array1<f64>, OptimizeError> {
        let values = initial_guess
            .map(Into::into)
            .unwrap_or_else(|| ParameterSet::default().into())
            .get_values();

        if values.len() != N_PARAMS {
            return Err(OptimizeError::InitialGuessLengthError {
                expected: N_PARAMS,
                found: values.len(),
            });
        }

        Ok(values)
    }
}

impl From<Array1<f64>> for InitialGuesses {
    fn from(value: Array1<f64>) -> Self {
        InitialGuesses(value)
    }
}

impl From<ParameterSet> for InitialGuesses {
    fn from(value: ParameterSet) -> Self {
        InitialGuesses(value.into())
    }
}

impl From<&ParameterSet> for InitialGuesses {
    fn from(value: &ParameterSet) -> Self {
        InitialGuesses(value.into())
    }
}
