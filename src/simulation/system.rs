//! Rate equation of the reversible reaction A ⇌ B
//!
//! The system integrates `dCa/dt = kr (C_total - Ca) - kf Ca` from `Ca(0) = C_total`.
//! In [`Mode::Sensitivity`] the state vector is extended by the four forward
//! sensitivities `dCa/dθ` for θ = (logA, Ea, dH, dS), which obey
//!
//! ```text
//! ds/dt = -(kf + kr) s + dkr/dθ (C_total - Ca) - dkf/dθ Ca,   s(0) = 0
//! ```
//!
//! Integration uses equally sized steps of any peroxide [`ODEIntegrator`], so the
//! final state lands exactly on the requested time. Intervals longer than
//! [`RELAXATION_HORIZON`](super::setup::RELAXATION_HORIZON) relaxation times are
//! cut to that horizon, where the state is already stationary.

use peroxide::fuga::{ODEIntegrator, ODEProblem};

use crate::kinetics::RateConstants;
use crate::parameters::{ParameterSet, N_PARAMS};

use super::{error::SimulationError, result::StatePoint, setup::SimulationSetup};

/// Whether parameter sensitivities are integrated alongside the concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Regular,
    Sensitivity,
}

impl Mode {
    /// Length of the state vector integrated in this mode
    pub fn state_len(&self) -> usize {
        match self {
            Mode::Regular => 1,
            Mode::Sensitivity => 1 + N_PARAMS,
        }
    }
}

/// One experiment's rate equation at a fixed temperature
#[derive(Debug, Clone, Copy)]
pub struct ReversibleSystem {
    rates: RateConstants,
    total_concentration: f64,
}

impl ReversibleSystem {
    /// Creates the system for a parameter set, temperature and total concentration
    ///
    /// # Arguments
    /// * `params` - Kinetic and thermodynamic parameters
    /// * `temperature` - Temperature [K]
    /// * `total_concentration` - Initial concentration of A, conserved as `Ca + Cb`
    pub fn new(params: &ParameterSet, temperature: f64, total_concentration: f64) -> Self {
        Self {
            rates: RateConstants::new(params, temperature),
            total_concentration,
        }
    }

    pub fn rates(&self) -> &RateConstants {
        &self.rates
    }

    pub fn total_concentration(&self) -> f64 {
        self.total_concentration
    }

    /// Initial state for the given mode
    pub fn initial_state(&self, mode: Mode) -> Vec<f64> {
        let mut y0 = vec![0.0; mode.state_len()];
        y0[0] = self.total_concentration;
        y0
    }

    /// Integrates from 0 to `time` and returns the final state
    ///
    /// # Arguments
    /// * `integrator` - Fixed-step integrator such as `RK4`
    /// * `setup` - Step size configuration
    /// * `time` - End of the integration interval [s]
    /// * `mode` - Whether to integrate sensitivities
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidTime` for negative or non-finite `time`.
    /// Non-finite states are returned as they are.
    pub fn integrate<S: ODEIntegrator + Copy>(
        &self,
        integrator: S,
        setup: &SimulationSetup,
        time: f64,
        mode: Mode,
    ) -> Result<StatePoint, SimulationError> {
        if !time.is_finite() || time < 0.0 {
            return Err(SimulationError::InvalidTime(time));
        }

        let mut y = self.initial_state(mode);
        let rate = self.rates.relaxation_rate();
        let span = setup.integration_span(time, rate);
        let n_steps = setup.n_steps(span, rate);

        if n_steps > 0 {
            let h = span / n_steps as f64;
            for i in 0..n_steps {
                integrator
                    .step(self, i as f64 * h, &mut y, h)
                    .map_err(|e| SimulationError::IntegrationError(e.to_string()))?;
            }
        }

        Ok(self.to_state_point(time, y, mode))
    }

    /// Concentration of A at each of the given times
    ///
    /// Every time is integrated from 0 independently, so the order of `times`
    /// does not matter.
    pub fn trajectory<S: ODEIntegrator + Copy>(
        &self,
        integrator: S,
        setup: &SimulationSetup,
        times: &[f64],
    ) -> Result<Vec<f64>, SimulationError> {
        times
            .iter()
            .map(|&t| {
                self.integrate(integrator, setup, t, Mode::Regular)
                    .map(|state| state.concentration)
            })
            .collect()
    }

    fn to_state_point(&self, time: f64, y: Vec<f64>, mode: Mode) -> StatePoint {
        let sensitivities = match mode {
            Mode::Regular => None,
            Mode::Sensitivity => {
                let mut s = [0.0; N_PARAMS];
                s.copy_from_slice(&y[1..]);
                Some(s)
            }
        };

        StatePoint {
            time,
            concentration: y[0],
            sensitivities,
        }
    }
}

impl ODEProblem for ReversibleSystem {
    fn rhs(&self, _t: f64, y: &[f64], dy: &mut [f64]) -> Result<(), argmin_math::Error> {
        let RateConstants {
            kf, kr, dkf, dkr, ..
        } = self.rates;
        let ca = y[0];
        let cb = self.total_concentration - ca;

        dy[0] = kr * cb - kf * ca;

        // Forward sensitivities, only present in sensitivity mode
        if y.len() == 1 + N_PARAMS {
            for j in 0..N_PARAMS {
                dy[1 + j] = -(kf + kr) * y[1 + j] + dkr[j] * cb - dkf[j] * ca;
            }
        } else if y.len() != 1 {
            return Err(SimulationError::InvalidStateLength(y.len()).into());
        }

        Ok(())
    }
}
