//! Arrhenius-Fit Rust Library
//!
//! This library estimates the kinetic and thermodynamic parameters of a reversible
//! first-order reaction A ⇌ B from batch-reactor data measured at several
//! temperatures. It provides:
//! - Experiment records, the built-in dataset and synthetic data generation
//! - Rate constants from the Arrhenius form and the van 't Hoff relation
//! - Simulation of the rate equation and its parameter sensitivities
//! - Least-squares fitting with covariance-based uncertainties
//! - Tabular and JSON reporting

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::data::*;
    pub use crate::io::*;
    pub use crate::kinetics::*;
    pub use crate::parameters::*;

    pub use crate::simulation::error::*;
    pub use crate::simulation::model::*;
    pub use crate::simulation::result::*;
    pub use crate::simulation::setup::*;
    pub use crate::simulation::system::*;

    pub use crate::optim::*;
}

/// Experimental data and synthetic data generation
pub mod data;

/// Fitted parameters
pub mod parameters;

/// Rate and equilibrium constants
pub mod kinetics;

/// Simulation of the rate equation
pub mod simulation {
    pub use crate::simulation::setup::SimulationSetup;
    pub use peroxide::fuga::{ODEIntegrator, ODEProblem, RK4, RK5};

    /// Error types for simulation failures
    pub mod error;
    /// Forward model over (temperature, time) pairs
    pub mod model;
    /// Simulation result data structures
    pub mod result;
    /// Simulation setup and configuration
    pub mod setup;
    /// Rate equation and sensitivity system
    pub mod system;
}

pub mod optim {
    pub use crate::optim::error::*;
    pub use crate::optim::metrics::Metrics;
    pub use crate::optim::optimizers::*;
    pub use crate::optim::problem::*;
    pub use crate::optim::report::*;
    pub use crate::optim::uncertainty::*;
    pub use argmin::core::{CostFunction, Gradient, Jacobian, Operator};
    pub use peroxide::fuga::{RK4, RK5};

    pub mod error;
    pub mod metrics;
    pub mod observer;
    pub mod problem;
    pub mod report;
    pub mod system;
    pub mod uncertainty;

    pub mod optimizers {
        pub use crate::optim::optimizers::lbfgs::*;
        pub use crate::optim::optimizers::lm::*;
        pub use crate::optim::optimizers::optimizer::*;
        pub mod lbfgs;
        pub mod lm;
        pub mod optimizer;
    }
}

/// Table formatting of datasets and reports
pub mod info;

/// IO functionality
pub mod io;
