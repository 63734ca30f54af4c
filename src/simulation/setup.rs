//! Setup module for configuring ODE simulations.
//!
//! This module provides the [`SimulationSetup`] struct and its builder for configuring
//! the fixed-step integration of the rate equation. It handles:
//!
//! - Maximum integration step size
//! - Step size limit relative to the relaxation rate `kf + kr`
//! - Upper bound on the number of steps per integration
//! - Cutting long intervals to the part where the state still changes
//!
//! The integrated interval is always split into equally sized steps, and the step
//! never exceeds `stiffness_factor / (kf + kr)` so explicit integrators stay stable.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for numerical integration of the rate equation
///
/// # Fields
///
/// * `dt` - Maximum step size [s] (default: 0.1)
/// * `stiffness_factor` - Upper bound on `h * (kf + kr)` (default: 0.2)
/// * `max_steps` - Upper bound on the number of steps per integration, yielding to the
///   stiffness limit (default: 100000)
///
/// # Examples
///
/// ```
/// use arrhenius_fit::prelude::SimulationSetupBuilder;
///
/// let setup = SimulationSetupBuilder::default()
///     .dt(0.05)
///     .stiffness_factor(0.1)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SimulationSetup {
    #[builder(default = "0.1")]
    pub dt: f64,
    #[builder(default = "0.2")]
    pub stiffness_factor: f64,
    #[builder(default = "100_000")]
    pub max_steps: usize,
}

impl SimulationSetupBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(dt) = self.dt {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(format!("dt must be positive, got {}", dt));
            }
        }

        if let Some(factor) = self.stiffness_factor {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(format!("stiffness_factor must be positive, got {}", factor));
            }
        }

        if self.max_steps == Some(0) {
            return Err("max_steps must be at least 1".to_string());
        }

        Ok(())
    }
}

impl Default for SimulationSetup {
    fn default() -> Self {
        Self {
            dt: 0.1,
            stiffness_factor: 0.2,
            max_steps: 100_000,
        }
    }
}

/// Relaxation times `1 / (kf + kr)` after which the state is stationary in double precision
pub const RELAXATION_HORIZON: f64 = 60.0;

impl SimulationSetup {
    /// Length of the interval that has to be integrated to reach `time`
    ///
    /// Beyond [`RELAXATION_HORIZON`] relaxation times the deviation from
    /// equilibrium is below double precision, so longer intervals are cut to
    /// that horizon. A non-finite or non-positive rate leaves `time` unchanged.
    ///
    /// # Arguments
    /// * `time` - End of the integration interval [s]
    /// * `rate` - Relaxation rate `kf + kr` [1/s]
    pub fn integration_span(&self, time: f64, rate: f64) -> f64 {
        let horizon = RELAXATION_HORIZON / rate;
        if horizon.is_finite() && horizon > 0.0 {
            time.min(horizon)
        } else {
            time
        }
    }

    /// Number of equal steps used to integrate over `span`
    ///
    /// The step size is `dt`, reduced to `stiffness_factor / rate` for fast
    /// reactions. A non-finite or non-positive rate leaves `dt` unchanged. The
    /// count is capped at `max_steps`, but never below the number of steps the
    /// stiffness limit requires.
    ///
    /// # Arguments
    /// * `span` - Length of the integration interval [s]
    /// * `rate` - Relaxation rate `kf + kr` [1/s]
    pub fn n_steps(&self, span: f64, rate: f64) -> usize {
        if span <= 0.0 {
            return 0;
        }

        let limit = self.stiffness_factor / rate;
        let (h, min_steps) = if limit.is_finite() && limit > 0.0 {
            (self.dt.min(limit), (span / limit).ceil())
        } else {
            (self.dt, 1.0)
        };

        let n = (span / h).ceil();
        if n.is_finite() {
            (n as usize).min(self.max_steps).max(min_steps as usize)
        } else {
            self.max_steps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let setup = SimulationSetupBuilder::default().build().unwrap();
        assert_eq!(setup, SimulationSetup::default());
    }

    #[test]
    fn test_builder_rejects_negative_dt() {
        let result = SimulationSetupBuilder::default().dt(-1.0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_n_steps() {
        let setup = SimulationSetup::default();

        // Slow reaction: limited by dt
        assert_eq!(setup.n_steps(10.0, 0.01), 100);
        // Fast reaction: limited by the stiffness factor
        assert_eq!(setup.n_steps(10.0, 20.0), 1000);
        // No time elapsed
        assert_eq!(setup.n_steps(0.0, 1.0), 0);
        // Degenerate rates fall back to dt
        assert_eq!(setup.n_steps(1.0, f64::NAN), 10);
        assert_eq!(setup.n_steps(1.0, 0.0), 10);
    }

    #[test]
    fn test_n_steps_capped() {
        let setup = SimulationSetupBuilder::default()
            .max_steps(50)
            .build()
            .unwrap();
        assert_eq!(setup.n_steps(1000.0, 0.003), 50);
    }

    #[test]
    fn test_cap_keeps_stiffness_limit() {
        let setup = SimulationSetupBuilder::default()
            .max_steps(50)
            .build()
            .unwrap();

        for rate in [1.0, 20.0, 1e3] {
            let span = setup.integration_span(1e7, rate);
            let n = setup.n_steps(span, rate);
            assert!(n > 50);
            assert!(span / n as f64 * rate <= setup.stiffness_factor * (1.0 + 1e-12));
        }
    }

    #[test]
    fn test_integration_span() {
        let setup = SimulationSetup::default();

        assert_eq!(setup.integration_span(100.0, 0.1), 100.0);
        assert_eq!(setup.integration_span(1e7, 0.5), RELAXATION_HORIZON / 0.5);
        assert_eq!(setup.integration_span(1e7, 0.0), 1e7);
        assert_eq!(setup.integration_span(1e7, f64::NAN), 1e7);
    }
}
