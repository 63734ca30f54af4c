//! The four fitted quantities of the reversible reaction model
//!
//! A [`ParameterSet`] is used for the initial guess, for the fitted result and,
//! with the same fields, for the one-sigma standard errors of a fit.

use std::fmt::{self, Display};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::optim::error::OptimizeError;

/// Number of fitted parameters
pub const N_PARAMS: usize = 4;

/// Display names in fixed field order
pub const PARAM_NAMES: [&str; N_PARAMS] = ["logA", "Ea", "dH", "dS"];

/// Units in fixed field order
pub const PARAM_UNITS: [&str; N_PARAMS] = ["log10(1/s)", "kJ/mol", "kJ/mol", "J/mol/K"];

/// Kinetic and thermodynamic parameters of A ⇌ B
///
/// # Fields
/// * `log10_a` - log10 of the Arrhenius pre-exponential factor A [A in 1/s]
/// * `ea` - Activation energy of the forward reaction [kJ/mol]
/// * `dh` - Reaction enthalpy [kJ/mol]
/// * `ds` - Reaction entropy [J/mol/K]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub log10_a: f64,
    pub ea: f64,
    pub dh: f64,
    pub ds: f64,
}

impl ParameterSet {
    pub fn new(log10_a: f64, ea: f64, dh: f64, ds: f64) -> Self {
        Self {
            log10_a,
            ea,
            dh,
            ds,
        }
    }

    /// Values in fixed field order (logA, Ea, dH, dS)
    pub fn to_array(&self) -> [f64; N_PARAMS] {
        [self.log10_a, self.ea, self.dh, self.ds]
    }

    /// Builds a parameter set from a slice in fixed field order
    ///
    /// # Errors
    /// Returns `OptimizeError::InitialGuessLengthError` if the slice does not hold
    /// exactly four values.
    pub fn from_slice(values: &[f64]) -> Result<Self, OptimizeError> {
        match values {
            [log10_a, ea, dh, ds] => Ok(Self::new(*log10_a, *ea, *dh, *ds)),
            _ => Err(OptimizeError::InitialGuessLengthError {
                expected: N_PARAMS,
                found: values.len(),
            }),
        }
    }

    /// Pairs each display name with its value
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        PARAM_NAMES.iter().copied().zip(self.to_array()).collect()
    }
}

impl Default for ParameterSet {
    /// The starting guess used for the built-in dataset
    fn default() -> Self {
        Self::new(6.0, 45.0, -10.0, -50.0)
    }
}

impl From<ParameterSet> for Array1<f64> {
    fn from(params: ParameterSet) -> Self {
        Array1::from_vec(params.to_array().to_vec())
    }
}

impl From<&ParameterSet> for Array1<f64> {
    fn from(params: &ParameterSet) -> Self {
        Array1::from_vec(params.to_array().to_vec())
    }
}

impl TryFrom<&Array1<f64>> for ParameterSet {
    type Error = OptimizeError;

    fn try_from(values: &Array1<f64>) -> Result<Self, Self::Error> {
        ParameterSet::from_slice(&values.to_vec())
    }
}

impl std::str::FromStr for ParameterSet {
    type Err = OptimizeError;

    /// Parses a comma separated list such as `6,45,-10,-50`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| OptimizeError::ParameterParseError(s.to_string()))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        ParameterSet::from_slice(&values)
    }
}

impl Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parameters(logA={}, Ea={}, dH={}, dS={})",
            self.log10_a, self.ea, self.dh, self.ds
        )
    }
}
