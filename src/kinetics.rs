//! Rate constants of the reversible reaction A ⇌ B
//!
//! The forward rate constant follows the Arrhenius form
//! `kf = 10^logA * exp(-Ea / (R T))`. The equilibrium constant is derived from
//! the reaction enthalpy and entropy via `ΔG = ΔH - T ΔS` and
//! `K = exp(-ΔG / (R T))`, treating the activity-based constant as the
//! concentration-based one (ideal solution). The reverse rate constant is
//! `kr = kf / K`.

use serde::Serialize;

use crate::parameters::{ParameterSet, N_PARAMS};

/// Gas constant [J/mol/K]
pub const GAS_CONSTANT: f64 = 8.314;

/// Conversion factor from kJ/mol to J/mol
pub const KJ_TO_J: f64 = 1000.0;

/// Rate constants and their derivatives at a single temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateConstants {
    /// Temperature [K]
    pub temperature: f64,
    /// Forward rate constant [1/s]
    pub kf: f64,
    /// Reverse rate constant [1/s]
    pub kr: f64,
    /// Equilibrium constant Kc [-]
    pub kc: f64,
    /// Gibbs free energy of reaction [J/mol]
    pub dg: f64,
    /// Partial derivatives of `kf` with respect to (logA, Ea, dH, dS)
    #[serde(skip)]
    pub dkf: [f64; N_PARAMS],
    /// Partial derivatives of `kr` with respect to (logA, Ea, dH, dS)
    #[serde(skip)]
    pub dkr: [f64; N_PARAMS],
}

impl RateConstants {
    /// Evaluates the rate constants for a parameter set at a temperature
    ///
    /// # Arguments
    /// * `params` - Kinetic and thermodynamic parameters
    /// * `temperature` - Temperature [K]
    pub fn new(params: &ParameterSet, temperature: f64) -> Self {
        let rt = GAS_CONSTANT * temperature;
        let ea = params.ea * KJ_TO_J;
        let dh = params.dh * KJ_TO_J;

        let dg = gibbs_free_energy(dh, params.ds, temperature);
        let kc = equilibrium_constant(dg, temperature);
        let kf = 10f64.powf(params.log10_a) * (-ea / rt).exp();
        let kr = kf / kc;

        let ln10 = std::f64::consts::LN_10;
        let dkf = [kf * ln10, -kf * KJ_TO_J / rt, 0.0, 0.0];
        let dkr = [
            kr * ln10,
            -kr * KJ_TO_J / rt,
            kr * KJ_TO_J / rt,
            -kr / GAS_CONSTANT,
        ];

        Self {
            temperature,
            kf,
            kr,
            kc,
            dg,
            dkf,
            dkr,
        }
    }

    /// Sum of forward and reverse rate constants, the relaxation rate [1/s]
    pub fn relaxation_rate(&self) -> f64 {
        self.kf + self.kr
    }

    /// Equilibrium concentration of A for a given total concentration
    ///
    /// `Ca_eq = C_total * kr / (kf + kr)`
    pub fn equilibrium_concentration(&self, total_concentration: f64) -> f64 {
        total_concentration * self.kr / (self.kf + self.kr)
    }

    /// Closed-form concentration of A at time `t` starting from pure A
    ///
    /// `Ca(t) = Ca_eq + (C_total - Ca_eq) * exp(-(kf + kr) t)`
    pub fn analytic_concentration(&self, total_concentration: f64, t: f64) -> f64 {
        let ca_eq = self.equilibrium_concentration(total_concentration);
        ca_eq + (total_concentration - ca_eq) * (-self.relaxation_rate() * t).exp()
    }
}

/// Gibbs free energy of reaction `ΔG = ΔH - T ΔS`
///
/// # Arguments
/// * `dh` - Reaction enthalpy [J/mol]
/// * `ds` - Reaction entropy [J/mol/K]
/// * `temperature` - Temperature [K]
pub fn gibbs_free_energy(dh: f64, ds: f64, temperature: f64) -> f64 {
    dh - temperature * ds
}

/// Equilibrium constant `K = exp(-ΔG / (R T))`
///
/// # Arguments
/// * `dg` - Gibbs free energy of reaction [J/mol]
/// * `temperature` - Temperature [K]
pub fn equilibrium_constant(dg: f64, temperature: f64) -> f64 {
    (-dg / (GAS_CONSTANT * temperature)).exp()
}
