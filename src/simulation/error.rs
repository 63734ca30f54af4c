//! Simulation Error Module
//!
//! The [`SimulationError`] enum covers the failure points of integrating the
//! rate equation:
//! - Invalid integration intervals
//! - Failures reported by the stepping integrator
//! - Mismatched input shapes

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Integration time must be finite and non-negative, got {0}")]
    InvalidTime(f64),
    #[error("Error during ODE integration: {0}")]
    IntegrationError(String),
    #[error("Expected state vector of length 1 or 5, found {0}")]
    InvalidStateLength(usize),
    #[error("Invalid total concentration {0}")]
    InvalidConcentration(f64),
}
