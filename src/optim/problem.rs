use ndarray::{Array1, Array2};
use peroxide::fuga::ODEIntegrator;

use crate::data::{Dataset, ObservationTable};
use crate::parameters::{ParameterSet, N_PARAMS};
use crate::simulation::{
    model::ForwardModel, setup::SimulationSetup, setup::SimulationSetupBuilder, system::Mode,
};

use super::error::OptimizeError;

/// Represents a parameter estimation problem for the reversible reaction A ⇌ B
///
/// Contains the experimental data, its flattened observation table and the forward
/// model used to predict every observation.
///
/// # Fields
/// * `dataset` - Experiments fitted together
/// * `table` - Observations flattened in experiment then time order
/// * `model` - Forward model carrying the integrator and its setup
/// * `observed` - Observed concentrations as an array, in table order
#[derive(Debug, Clone)]
pub struct Problem<S: ODEIntegrator + Copy> {
    dataset: Dataset,
    table: ObservationTable,
    model: ForwardModel<S>,
    observed: Array1<f64>,
}

impl<S: ODEIntegrator + Copy> Problem<S> {
    /// Creates a new estimation problem from a dataset
    ///
    /// # Arguments
    /// * `dataset` - Experiments to fit
    /// * `integrator` - Fixed-step integrator used by the forward model
    /// * `setup` - Integration settings
    ///
    /// # Errors
    /// Returns `OptimizeError::DataError` if the dataset holds no observations
    pub fn new(
        dataset: &Dataset,
        integrator: S,
        setup: SimulationSetup,
    ) -> Result<Self, OptimizeError> {
        let table = ObservationTable::try_from(dataset)?;
        let observed = Array1::from_vec(table.concentration.clone());

        Ok(Self {
            dataset: dataset.clone(),
            table,
            model: ForwardModel::new(integrator, setup),
            observed,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    pub fn model(&self) -> &ForwardModel<S> {
        &self.model
    }

    pub fn observed(&self) -> &Array1<f64> {
        &self.observed
    }

    /// Number of observations
    pub fn n_points(&self) -> usize {
        self.table.len()
    }

    /// Number of fitted parameters
    pub fn n_params(&self) -> usize {
        N_PARAMS
    }

    /// Residuals `observed - predicted` for a parameter vector
    pub fn residuals(&self, params: &Array1<f64>) -> Result<Array1<f64>, OptimizeError> {
        let params = ParameterSet::try_from(params)?;
        let result = self.model.predict_table(&params, &self.table, Mode::Regular)?;
        Ok(&self.observed - &result.predictions)
    }

    /// Residuals and their Jacobian with respect to the parameters
    ///
    /// The Jacobian of the residuals is the negated sensitivity matrix, of shape
    /// `(n_points, 4)`.
    pub fn residuals_and_jacobian(
        &self,
        params: &Array1<f64>,
    ) -> Result<(Array1<f64>, Array2<f64>), OptimizeError> {
        let params = ParameterSet::try_from(params)?;
        let result = self
            .model
            .predict_table(&params, &self.table, Mode::Sensitivity)?;
        let sensitivities = result
            .sensitivities
            .ok_or(OptimizeError::SensitivitiesNotFound)?;

        Ok((&self.observed - &result.predictions, -sensitivities))
    }

    /// Sum of squared residuals for a parameter vector
    pub fn sse(&self, params: &Array1<f64>) -> Result<f64, OptimizeError> {
        let residuals = self.residuals(params)?;
        Ok(residuals.dot(&residuals))
    }
}

/// Builder for [`Problem`]
pub struct ProblemBuilder<S: ODEIntegrator + Copy> {
    dataset: Dataset,
    integrator: S,
    setup: SimulationSetup,
    dt: Option<f64>,
}

impl<S: ODEIntegrator + Copy> ProblemBuilder<S> {
    /// Creates a new ProblemBuilder with default settings
    ///
    /// # Arguments
    /// * `dataset` - Experiments to fit
    /// * `integrator` - Fixed-step integrator such as `RK4`
    ///
    /// # Returns
    /// A new ProblemBuilder instance using the default [`SimulationSetup`]
    pub fn new(dataset: &Dataset, integrator: S) -> Self {
        Self {
            dataset: dataset.clone(),
            integrator,
            setup: SimulationSetup::default(),
            dt: None,
        }
    }

    /// Sets the complete integration setup
    pub fn setup(mut self, setup: SimulationSetup) -> Self {
        self.setup = setup;
        self
    }

    /// Sets the maximum step size for numerical integration
    ///
    /// # Arguments
    /// * `dt` - Time step size
    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Builds the Problem instance with the configured settings
    ///
    /// # Returns
    /// Result containing either the constructed Problem or an OptimizeError
    pub fn build(self) -> Result<Problem<S>, OptimizeError> {
        let setup = match self.dt {
            Some(dt) => SimulationSetupBuilder::default()
                .dt(dt)
                .stiffness_factor(self.setup.stiffness_factor)
                .max_steps(self.setup.max_steps)
                .build()
                .map_err(|e| OptimizeError::SetupError(e.to_string()))?,
            None => self.setup,
        };

        Problem::new(&self.dataset, self.integrator, setup)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use peroxide::fuga::RK4;

    use crate::data::default_dataset;

    use super::*;

    #[test]
    fn test_build_problem() {
        let problem = ProblemBuilder::new(&default_dataset(), RK4)
            .dt(0.05)
            .build()
            .unwrap();

        assert_eq!(problem.n_points(), 30);
        assert_eq!(problem.n_params(), 4);
        assert_eq!(problem.model().setup().dt, 0.05);
        assert_eq!(problem.observed()[0], 8.3949);
    }

    #[test]
    fn test_invalid_dt_is_rejected() {
        let result = ProblemBuilder::new(&default_dataset(), RK4).dt(0.0).build();
        assert!(matches!(result, Err(OptimizeError::SetupError(_))));
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let result = ProblemBuilder::new(&Dataset::default(), RK4).build();
        assert!(matches!(result, Err(OptimizeError::DataError(_))));
    }

    #[test]
    fn test_jacobian_residuals_agree() {
        let problem = ProblemBuilder::new(&default_dataset(), RK4).build().unwrap();
        let params: Array1<f64> = ParameterSet::default().into();

        let residuals = problem.residuals(&params).unwrap();
        let (with_jacobian, jacobian) = problem.residuals_and_jacobian(&params).unwrap();

        assert_eq!(jacobian.dim(), (30, 4));
        for (a, b) in residuals.iter().zip(with_jacobian.iter()) {
            assert_relative_eq!(a, b, max_relative = 1e-12);
        }
    }
}
