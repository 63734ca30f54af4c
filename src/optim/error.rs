use thiserror::Error;

use crate::{data::DataError, simulation::error::SimulationError};

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Error optimizing: {0}")]
    ArgMinError(argmin::core::Error),
    #[error("Failed to simulate with given parameters")]
    SimulationError(#[from] SimulationError),
    #[error("Invalid dataset: {0}")]
    DataError(#[from] DataError),
    #[error("Invalid simulation setup: {0}")]
    SetupError(String),
    #[error("No solution found")]
    NoSolution,
    #[error("Initial guess array has wrong length")]
    InitialGuessLengthError { expected: usize, found: usize },
    #[error("Failed to parse parameters '{0}'. Expected format: 'logA,Ea,dH,dS'.")]
    ParameterParseError(String),
    #[error("Cost is NaN")]
    CostNaN,
    #[error("Sensitivities not found")]
    SensitivitiesNotFound,
    #[error("Failed to compute covariance: {0}")]
    CovarianceError(String),
    #[error("Failed to compute statistics: {0}")]
    StatisticsError(String),
}

impl From<argmin::core::Error> for OptimizeError {
    fn from(error: argmin::core::Error) -> Self {
        OptimizeError::ArgMinError(error)
    }
}
