use ndarray::{Array1, Array2};
use peroxide::fuga::ODEIntegrator;
use serde::Serialize;

use crate::kinetics::RateConstants;
use crate::parameters::ParameterSet;

use super::{
    error::OptimizeError,
    metrics::Metrics,
    problem::Problem,
    uncertainty::{ConfidenceInterval, ParameterStatistics},
};

/// A report containing fit results and evaluation metrics
///
/// The report includes:
/// - The starting guess and the best-fit parameters
/// - One-sigma standard errors, covariance, correlations and 95 % confidence intervals
/// - Statistical metrics evaluating the fit quality
/// - Rate constants and equilibrium data at every experiment temperature
/// - Observed and predicted concentrations of every experiment
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    /// Name of the solver that produced the fit
    pub solver: String,
    /// Reason the solver stopped
    pub termination: String,
    pub iterations: u64,
    pub n_points: usize,
    /// Residual degrees of freedom
    pub dof: usize,
    pub initial_guess: ParameterSet,
    pub parameters: ParameterSet,
    pub standard_errors: ParameterSet,
    pub confidence_intervals: Vec<ConfidenceInterval>,
    pub covariance: Vec<Vec<f64>>,
    pub correlation: Vec<Vec<f64>>,
    pub metrics: Metrics,
    pub temperatures: Vec<TemperatureSummary>,
    pub fits: Vec<ExperimentFit>,
}

/// Rate and equilibrium data at one temperature for the best-fit parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureSummary {
    pub temperature: f64,
    pub kf: f64,
    pub kr: f64,
    pub kc: f64,
    /// Gibbs free energy of reaction [J/mol]
    pub dg: f64,
    /// Equilibrium concentration of A for the experiment's initial concentration
    pub equilibrium_concentration: f64,
}

/// Observed and predicted concentrations of one experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentFit {
    pub temperature: f64,
    pub time: Vec<f64>,
    pub observed: Vec<f64>,
    pub predicted: Vec<f64>,
}

impl FitReport {
    /// Creates a new FitReport with calculated metrics and uncertainty analysis
    ///
    /// # Arguments
    /// * `problem` - The estimation problem that was solved
    /// * `solver` - Name of the solver
    /// * `initial_guess` - Parameters the solver started from
    /// * `best` - Best-fit parameter vector
    /// * `iterations` - Number of solver iterations
    /// * `termination` - Reason the solver stopped
    pub(crate) fn new<S: ODEIntegrator + Copy>(
        problem: &Problem<S>,
        solver: &str,
        initial_guess: &Array1<f64>,
        best: &Array1<f64>,
        iterations: u64,
        termination: String,
    ) -> Result<Self, OptimizeError> {
        let parameters = ParameterSet::try_from(best)?;
        let (residuals, jacobian) = problem.residuals_and_jacobian(best)?;

        let metrics = Metrics::new(&residuals, problem.n_params());
        if !metrics.sse.is_finite() {
            return Err(OptimizeError::CostNaN);
        }

        let statistics = ParameterStatistics::new(best, &residuals, &jacobian)?;
        let standard_errors = ParameterSet::try_from(&statistics.standard_errors)?;

        let predicted = problem.observed() - &residuals;
        let mut offset = 0;
        let mut fits = Vec::with_capacity(problem.dataset().experiments.len());
        let mut temperatures: Vec<TemperatureSummary> = Vec::new();

        for experiment in problem.dataset().experiments.iter() {
            let n = experiment.len();
            fits.push(ExperimentFit {
                temperature: experiment.temperature(),
                time: experiment.time().to_vec(),
                observed: experiment.concentration().to_vec(),
                predicted: predicted.slice(ndarray::s![offset..offset + n]).to_vec(),
            });
            offset += n;

            if temperatures
                .iter()
                .all(|t| t.temperature != experiment.temperature())
            {
                let rates = RateConstants::new(&parameters, experiment.temperature());
                temperatures.push(TemperatureSummary {
                    temperature: experiment.temperature(),
                    kf: rates.kf,
                    kr: rates.kr,
                    kc: rates.kc,
                    dg: rates.dg,
                    equilibrium_concentration: rates
                        .equilibrium_concentration(experiment.initial_concentration()),
                });
            }
        }

        Ok(Self {
            solver: solver.to_string(),
            termination,
            iterations,
            n_points: problem.n_points(),
            dof: statistics.dof,
            initial_guess: ParameterSet::try_from(initial_guess)?,
            parameters,
            standard_errors,
            confidence_intervals: statistics.confidence_intervals,
            covariance: to_nested(&statistics.covariance),
            correlation: to_nested(&statistics.correlation),
            metrics,
            temperatures,
            fits,
        })
    }
}

fn to_nested(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}
