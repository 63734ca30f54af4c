//! Experimental data for batch-reactor runs of A ⇌ B
//!
//! This module provides the [`Experiment`] and [`Dataset`] records, the flattened
//! [`ObservationTable`] the fitter operates on, and the built-in dataset of three
//! isothermal runs at 298.15 K, 308.15 K and 323.15 K.

use itertools::izip;
use rand::{distributions::Distribution, rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use thiserror::Error;

use crate::parameters::ParameterSet;
use crate::simulation::{setup::SimulationSetup, system::ReversibleSystem};

/// Initial concentration of A shared by all built-in experiments [mol/L]
pub const DEFAULT_INITIAL_CONCENTRATION: f64 = 10.0;

/// Sampling times shared by all built-in experiments [s]
pub const DEFAULT_TIMES: [f64; 10] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];

/// Temperatures of the built-in experiments [K]
pub const DEFAULT_TEMPERATURES: [f64; 3] = [298.15, 308.15, 323.15];

const DEFAULT_CONCENTRATIONS: [[f64; 10]; 3] = [
    [8.3949, 7.2405, 6.3087, 5.6914, 5.2996, 5.1745, 4.9033, 4.7510, 4.8464, 4.7900],
    [7.2059, 5.8341, 5.4062, 5.1752, 4.9305, 5.1006, 5.0607, 5.2669, 5.0378, 5.0005],
    [5.9979, 5.5382, 5.5815, 5.4472, 5.5073, 5.5906, 5.5567, 5.4980, 5.3729, 5.5308],
];

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Experiment has {times} time points but {concentrations} concentrations")]
    LengthMismatch { times: usize, concentrations: usize },
    #[error("Invalid temperature {0} K: must be positive and finite")]
    InvalidTemperature(f64),
    #[error("Invalid time point {0} s: must be non-negative and finite")]
    InvalidTime(f64),
    #[error("Invalid initial concentration {0} mol/L")]
    InvalidConcentration(f64),
    #[error("Dataset contains no observations")]
    Empty,
    #[error("Invalid noise level {0}")]
    InvalidNoise(f64),
    #[error("Failed to synthesize data: {0}")]
    Synthesis(String),
}

/// A single isothermal batch-reactor run
///
/// Holds the temperature, the initial concentration of A and the sampled
/// concentration of A at each time point. Fields are private so that the
/// length and range checks done in [`Experiment::new`] hold for every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExperiment")]
pub struct Experiment {
    temperature: f64,
    initial_concentration: f64,
    time: Vec<f64>,
    concentration: Vec<f64>,
}

#[derive(Deserialize)]
struct RawExperiment {
    temperature: f64,
    initial_concentration: f64,
    time: Vec<f64>,
    concentration: Vec<f64>,
}

impl TryFrom<RawExperiment> for Experiment {
    type Error = DataError;

    fn try_from(raw: RawExperiment) -> Result<Self, Self::Error> {
        Experiment::new(
            raw.temperature,
            raw.initial_concentration,
            raw.time,
            raw.concentration,
        )
    }
}

impl Experiment {
    /// Creates a new experiment
    ///
    /// # Arguments
    /// * `temperature` - Reactor temperature [K]
    /// * `initial_concentration` - Concentration of A at t = 0 [mol/L]
    /// * `time` - Sampling times [s]
    /// * `concentration` - Observed concentration of A at each sampling time [mol/L]
    ///
    /// # Errors
    /// Returns a [`DataError`] if the series lengths differ, the temperature is not
    /// positive, the initial concentration is not finite or any time is negative.
    pub fn new(
        temperature: f64,
        initial_concentration: f64,
        time: Vec<f64>,
        concentration: Vec<f64>,
    ) -> Result<Self, DataError> {
        if time.len() != concentration.len() {
            return Err(DataError::LengthMismatch {
                times: time.len(),
                concentrations: concentration.len(),
            });
        }

        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(DataError::InvalidTemperature(temperature));
        }

        if !initial_concentration.is_finite() {
            return Err(DataError::InvalidConcentration(initial_concentration));
        }

        if let Some(t) = time.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(DataError::InvalidTime(*t));
        }

        Ok(Self {
            temperature,
            initial_concentration,
            time,
            concentration,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn initial_concentration(&self) -> f64 {
        self.initial_concentration
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn concentration(&self) -> &[f64] {
        &self.concentration
    }

    /// Number of sampled points
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Returns a copy with all concentrations (initial and observed) multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            temperature: self.temperature,
            initial_concentration: self.initial_concentration * factor,
            time: self.time.clone(),
            concentration: self.concentration.iter().map(|c| c * factor).collect(),
        }
    }
}

/// Ordered collection of experiments fitted together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dataset {
    pub experiments: Vec<Experiment>,
}

impl Dataset {
    pub fn new(experiments: Vec<Experiment>) -> Self {
        Self { experiments }
    }

    /// Total number of observations across all experiments
    pub fn n_points(&self) -> usize {
        self.experiments.iter().map(Experiment::len).sum()
    }

    /// Distinct temperatures in order of first appearance
    pub fn temperatures(&self) -> Vec<f64> {
        let mut temperatures: Vec<f64> = Vec::with_capacity(self.experiments.len());
        for experiment in self.experiments.iter() {
            if !temperatures.contains(&experiment.temperature()) {
                temperatures.push(experiment.temperature());
            }
        }
        temperatures
    }

    /// Returns a copy with every experiment scaled by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.experiments.iter().map(|e| e.scaled(factor)).collect())
    }

    /// Generates a dataset from the forward model
    ///
    /// One experiment is produced per temperature, all sharing the same time points
    /// and initial concentration. If `noise` is given as `(sigma, seed)`, normally
    /// distributed noise with standard deviation `sigma` is added to every
    /// observation using a seeded generator, so results are reproducible.
    ///
    /// # Arguments
    /// * `params` - Parameters used to generate the data
    /// * `temperatures` - One experiment per temperature [K]
    /// * `times` - Sampling times [s]
    /// * `initial_concentration` - Concentration of A at t = 0 [mol/L]
    /// * `setup` - Integration settings of the forward model
    /// * `noise` - Optional `(sigma, seed)` pair for additive Gaussian noise
    pub fn synthesize(
        params: &ParameterSet,
        temperatures: &[f64],
        times: &[f64],
        initial_concentration: f64,
        setup: &SimulationSetup,
        noise: Option<(f64, u64)>,
    ) -> Result<Self, DataError> {
        let mut sampler = match noise {
            Some((sigma, seed)) => {
                let normal = Normal::new(0.0, sigma).map_err(|_| DataError::InvalidNoise(sigma))?;
                Some((normal, StdRng::seed_from_u64(seed)))
            }
            None => None,
        };

        let mut experiments = Vec::with_capacity(temperatures.len());
        for &temperature in temperatures {
            let system = ReversibleSystem::new(params, temperature, initial_concentration);
            let mut concentration = system
                .trajectory(peroxide::fuga::RK4, setup, times)
                .map_err(|e| DataError::Synthesis(e.to_string()))?;

            if let Some((normal, rng)) = sampler.as_mut() {
                for c in concentration.iter_mut() {
                    *c += normal.sample(rng);
                }
            }

            experiments.push(Experiment::new(
                temperature,
                initial_concentration,
                times.to_vec(),
                concentration,
            )?);
        }

        Ok(Self::new(experiments))
    }
}

/// Returns the three built-in batch-reactor experiments
pub fn default_dataset() -> Dataset {
    let experiments = DEFAULT_TEMPERATURES
        .iter()
        .zip(DEFAULT_CONCENTRATIONS.iter())
        .map(|(&temperature, concentration)| Experiment {
            temperature,
            initial_concentration: DEFAULT_INITIAL_CONCENTRATION,
            time: DEFAULT_TIMES.to_vec(),
            concentration: concentration.to_vec(),
        })
        .collect();

    Dataset::new(experiments)
}

/// Single row of the flattened observation table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub temperature: f64,
    pub time: f64,
    pub initial_concentration: f64,
    pub concentration: f64,
}

/// All observations of a dataset flattened into parallel columns
///
/// Rows are ordered by experiment, then by time within each experiment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationTable {
    pub temperature: Vec<f64>,
    pub time: Vec<f64>,
    pub initial_concentration: Vec<f64>,
    pub concentration: Vec<f64>,
}

impl ObservationTable {
    pub fn len(&self) -> usize {
        self.concentration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concentration.is_empty()
    }

    /// (temperature, time) pairs in table order
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.temperature
            .iter()
            .copied()
            .zip(self.time.iter().copied())
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Observation> + '_ {
        izip!(
            &self.temperature,
            &self.time,
            &self.initial_concentration,
            &self.concentration
        )
        .map(|(&temperature, &time, &initial_concentration, &concentration)| Observation {
            temperature,
            time,
            initial_concentration,
            concentration,
        })
    }
}

impl TryFrom<&Dataset> for ObservationTable {
    type Error = DataError;

    fn try_from(dataset: &Dataset) -> Result<Self, Self::Error> {
        let n = dataset.n_points();
        if n == 0 {
            return Err(DataError::Empty);
        }

        let mut table = ObservationTable {
            temperature: Vec::with_capacity(n),
            time: Vec::with_capacity(n),
            initial_concentration: Vec::with_capacity(n),
            concentration: Vec::with_capacity(n),
        };

        for experiment in dataset.experiments.iter() {
            for (&t, &c) in experiment.time().iter().zip(experiment.concentration()) {
                table.temperature.push(experiment.temperature());
                table.time.push(t);
                table
                    .initial_concentration
                    .push(experiment.initial_concentration());
                table.concentration.push(c);
            }
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dataset_shape() {
        let dataset = default_dataset();
        assert_eq!(dataset.experiments.len(), 3);
        assert_eq!(dataset.n_points(), 30);
        assert_eq!(dataset.temperatures(), vec![298.15, 308.15, 323.15]);

        for experiment in dataset.experiments.iter() {
            assert_eq!(experiment.initial_concentration(), 10.0);
            assert_eq!(experiment.time().first(), Some(&10.0));
            assert_eq!(experiment.time().last(), Some(&100.0));
        }
    }

    #[test]
    fn test_experiment_length_mismatch() {
        let result = Experiment::new(300.0, 10.0, vec![1.0, 2.0], vec![9.0]);
        assert!(matches!(
            result,
            Err(DataError::LengthMismatch {
                times: 2,
                concentrations: 1
            })
        ));
    }

    #[test]
    fn test_experiment_invalid_temperature() {
        let result = Experiment::new(0.0, 10.0, vec![1.0], vec![9.0]);
        assert!(matches!(result, Err(DataError::InvalidTemperature(_))));
    }

    #[test]
    fn test_experiment_negative_time() {
        let result = Experiment::new(300.0, 10.0, vec![-1.0], vec![9.0]);
        assert!(matches!(result, Err(DataError::InvalidTime(_))));
    }

    #[test]
    fn test_observation_table_order() {
        let dataset = default_dataset();
        let table = ObservationTable::try_from(&dataset).unwrap();

        assert_eq!(table.len(), 30);
        assert_eq!(table.temperature[0], 298.15);
        assert_eq!(table.temperature[10], 308.15);
        assert_eq!(table.temperature[29], 323.15);
        assert_eq!(table.time[9], 100.0);
        assert_eq!(table.time[10], 10.0);
        assert_eq!(table.concentration[0], 8.3949);
        assert_eq!(table.concentration[29], 5.5308);

        let pairs = table.pairs();
        assert_eq!(pairs[11], (308.15, 20.0));
    }

    #[test]
    fn test_empty_table() {
        let result = ObservationTable::try_from(&Dataset::default());
        assert!(matches!(result, Err(DataError::Empty)));
    }

    #[test]
    fn test_scaled() {
        let dataset = default_dataset().scaled(2.0);
        let experiment = &dataset.experiments[0];
        assert_eq!(experiment.initial_concentration(), 20.0);
        assert_eq!(experiment.concentration()[0], 16.7898);
    }

    #[test]
    fn test_synthesize_without_noise() {
        let params = ParameterSet::new(7.5, 52.8, -11.5, -37.4);
        let dataset = Dataset::synthesize(
            &params,
            &DEFAULT_TEMPERATURES,
            &[0.0, 50.0],
            DEFAULT_INITIAL_CONCENTRATION,
            &SimulationSetup::default(),
            None,
        )
        .unwrap();

        assert_eq!(dataset.experiments.len(), 3);
        for experiment in dataset.experiments.iter() {
            let rates = crate::kinetics::RateConstants::new(&params, experiment.temperature());
            let expected = rates.analytic_concentration(DEFAULT_INITIAL_CONCENTRATION, 50.0);

            assert_eq!(experiment.concentration()[0], DEFAULT_INITIAL_CONCENTRATION);
            assert!((experiment.concentration()[1] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_synthesize_noise_is_seeded() {
        let params = ParameterSet::default();
        let synthesize = |seed| {
            Dataset::synthesize(
                &params,
                &[300.0],
                &DEFAULT_TIMES,
                DEFAULT_INITIAL_CONCENTRATION,
                &SimulationSetup::default(),
                Some((0.1, seed)),
            )
            .unwrap()
        };

        assert_eq!(synthesize(7), synthesize(7));
        assert_ne!(synthesize(7), synthesize(8));
    }

    #[test]
    fn test_synthesize_rejects_invalid_noise() {
        let result = Dataset::synthesize(
            &ParameterSet::default(),
            &[300.0],
            &DEFAULT_TIMES,
            DEFAULT_INITIAL_CONCENTRATION,
            &SimulationSetup::default(),
            Some((-1.0, 0)),
        );
        assert!(matches!(result, Err(DataError::InvalidNoise(_))));
    }

    #[test]
    fn test_deserialize_rejects_mismatch() {
        let json = r#"{"experiments": [{"temperature": 300.0, "initial_concentration": 10.0,
            "time": [1.0, 2.0], "concentration": [9.0]}]}"#;
        let result: Result<Dataset, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
