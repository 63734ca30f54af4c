//! Simulation Result Module
//!
//! - [`StatePoint`]: The state of one experiment at a single time
//! - [`SimulationResult`]: Predictions for a whole observation table, optionally
//!   with the sensitivity matrix used by the fitters

use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::parameters::N_PARAMS;

/// Concentration of A at a single time point
///
/// # Fields
///
/// * `time` - Time the state was integrated to [s]
/// * `concentration` - Concentration of A
/// * `sensitivities` - `dCa/dθ` for θ = (logA, Ea, dH, dS), if integrated
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatePoint {
    pub time: f64,
    pub concentration: f64,
    pub sensitivities: Option<[f64; N_PARAMS]>,
}

/// Predicted concentrations for a sequence of (temperature, time) pairs
///
/// # Fields
///
/// * `predictions` - One predicted concentration per observation
/// * `sensitivities` - Matrix of shape `(n_observations, 4)` holding `dCa/dθ`
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub predictions: Array1<f64>,
    pub sensitivities: Option<Array2<f64>>,
}

impl SimulationResult {
    /// Collects state points in observation order
    pub(crate) fn from_states(states: &[StatePoint]) -> Self {
        let predictions = states.iter().map(|s| s.concentration).collect::<Array1<f64>>();

        let sensitivities = if states.iter().all(|s| s.sensitivities.is_some()) && !states.is_empty() {
            let mut matrix = Array2::zeros((states.len(), N_PARAMS));
            for (mut row, state) in matrix.rows_mut().into_iter().zip(states) {
                if let Some(s) = state.sensitivities {
                    row.assign(&Array1::from_vec(s.to_vec()));
                }
            }
            Some(matrix)
        } else {
            None
        };

        Self {
            predictions,
            sensitivities,
        }
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}
