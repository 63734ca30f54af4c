//! Forward model mapping parameters to predicted concentrations
//!
//! [`ForwardModel`] evaluates the rate equation independently for every
//! (temperature, time) pair. [`ForwardModel::predict`] uses one total
//! concentration for all pairs, while [`ForwardModel::predict_table`] uses the
//! initial concentration recorded with each observation.

use ndarray::Array1;
use peroxide::fuga::{ODEIntegrator, RK4};

use crate::data::ObservationTable;
use crate::parameters::ParameterSet;

use super::{
    error::SimulationError,
    result::{SimulationResult, StatePoint},
    setup::SimulationSetup,
    system::{Mode, ReversibleSystem},
};

/// Total concentration used by [`ForwardModel::predict`] unless configured otherwise
pub const DEFAULT_TOTAL_CONCENTRATION: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct ForwardModel<S: ODEIntegrator + Copy> {
    integrator: S,
    setup: SimulationSetup,
    total_concentration: f64,
}

impl Default for ForwardModel<RK4> {
    fn default() -> Self {
        Self::new(RK4, SimulationSetup::default())
    }
}

impl<S: ODEIntegrator + Copy> ForwardModel<S> {
    pub fn new(integrator: S, setup: SimulationSetup) -> Self {
        Self {
            integrator,
            setup,
            total_concentration: DEFAULT_TOTAL_CONCENTRATION,
        }
    }

    /// Sets the total concentration used by [`ForwardModel::predict`]
    pub fn total_concentration(mut self, total_concentration: f64) -> Self {
        self.total_concentration = total_concentration;
        self
    }

    pub fn setup(&self) -> &SimulationSetup {
        &self.setup
    }

    pub fn integrator(&self) -> S {
        self.integrator
    }

    /// Predicted concentration of A for each (temperature, time) pair
    ///
    /// # Arguments
    /// * `params` - Kinetic and thermodynamic parameters
    /// * `pairs` - (temperature [K], time [s]) pairs
    ///
    /// # Returns
    /// One prediction per pair, in input order
    pub fn predict(
        &self,
        params: &ParameterSet,
        pairs: &[(f64, f64)],
    ) -> Result<Array1<f64>, SimulationError> {
        if !self.total_concentration.is_finite() {
            return Err(SimulationError::InvalidConcentration(
                self.total_concentration,
            ));
        }

        pairs
            .iter()
            .map(|&(temperature, time)| {
                ReversibleSystem::new(params, temperature, self.total_concentration)
                    .integrate(self.integrator, &self.setup, time, Mode::Regular)
                    .map(|state| state.concentration)
            })
            .collect::<Result<Vec<f64>, _>>()
            .map(Array1::from_vec)
    }

    /// Predictions for every row of an observation table
    ///
    /// In [`Mode::Sensitivity`] the result also carries the `(n, 4)` matrix of
    /// `dCa/dθ` for each row.
    pub fn predict_table(
        &self,
        params: &ParameterSet,
        table: &ObservationTable,
        mode: Mode,
    ) -> Result<SimulationResult, SimulationError> {
        let states = table
            .rows()
            .map(|row| {
                ReversibleSystem::new(params, row.temperature, row.initial_concentration)
                    .integrate(self.integrator, &self.setup, row.time, mode)
            })
            .collect::<Result<Vec<StatePoint>, _>>()?;

        Ok(SimulationResult::from_states(&states))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::data::default_dataset;
    use crate::kinetics::RateConstants;

    use super::*;

    #[test]
    fn test_predict_preserves_order() {
        let model = ForwardModel::default();
        let params = ParameterSet::new(7.54, 52.79, -11.53, -37.35);
        let pairs = [(323.15, 50.0), (298.15, 0.0), (298.15, 50.0)];

        let predictions = model.predict(&params, &pairs).unwrap();

        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[1], 10.0);
        for (i, (temperature, time)) in pairs.iter().enumerate() {
            let rates = RateConstants::new(&params, *temperature);
            assert_relative_eq!(
                predictions[i],
                rates.analytic_concentration(10.0, *time),
                max_relative = 1e-8
            );
        }
    }

    #[test]
    fn test_predict_uses_configured_concentration() {
        let model = ForwardModel::default().total_concentration(25.0);
        let predictions = model
            .predict(&ParameterSet::default(), &[(300.0, 0.0)])
            .unwrap();
        assert_eq!(predictions[0], 25.0);
    }

    #[test]
    fn test_predict_table_sensitivity_shape() {
        let model = ForwardModel::default();
        let table = ObservationTable::try_from(&default_dataset()).unwrap();

        let result = model
            .predict_table(&ParameterSet::default(), &table, Mode::Sensitivity)
            .unwrap();
        let sensitivities = result.sensitivities.as_ref().unwrap();

        assert_eq!(result.len(), 30);
        assert_eq!(sensitivities.dim(), (30, 4));

        let regular = model
            .predict_table(&ParameterSet::default(), &table, Mode::Regular)
            .unwrap();
        assert!(regular.sensitivities.is_none());
        for (a, b) in regular.predictions.iter().zip(result.predictions.iter()) {
            assert_relative_eq!(a, b, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_predict_rejects_negative_time() {
        let model = ForwardModel::default();
        let result = model.predict(&ParameterSet::default(), &[(300.0, -5.0)]);
        assert!(matches!(result, Err(SimulationError::InvalidTime(_))));
    }
}
