//! L-BFGS optimization algorithm implementation.
//!
//! This module provides the Limited-memory BFGS (L-BFGS) quasi-Newton method as an
//! alternative to Levenberg-Marquardt. It minimizes the sum of squared residuals
//! using the analytic gradient `2 Jᵀr` and a More-Thuente line search. The
//! implementation includes:
//!
//! - The main `LBFGS` optimizer struct and implementation
//! - A builder pattern via `LBFGSBuilder` for convenient configuration
//! - Support for line search parameters and convergence criteria

use argmin::core::observers::ObserverMode;
use argmin::core::{Executor, State, TerminationReason};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS as ArgminLBFGS;
use argmin_observer_slog::SlogLogger;
use peroxide::fuga::ODEIntegrator;

use crate::optim::{
    error::OptimizeError,
    observer::LogObserver,
    optimizers::lm::termination_text,
    optimizers::optimizer::{InitialGuesses, Optimizer},
    problem::Problem,
    report::FitReport,
};

/// Implementation of the L-BFGS optimization algorithm.
///
/// L-BFGS (Limited-memory BFGS) is a quasi-Newton method for solving unconstrained
/// optimization problems that approximates the Broyden–Fletcher–Goldfarb–Shanno (BFGS)
/// algorithm using a limited amount of memory.
pub struct LBFGS {
    /// The history size for storing previous iterations
    pub m: usize,
    /// Maximum number of iterations before stopping
    pub max_iters: u64,
    /// Target cost function value for convergence criteria
    pub target_cost: f64,
    /// Line search parameter c1 (sufficient decrease condition)
    pub c1: f64,
    /// Line search parameter c2 (curvature condition)
    pub c2: f64,
    /// Whether to print progress to the terminal
    pub progress: bool,
}

impl LBFGS {
    pub const NAME: &'static str = "L-BFGS";

    /// Creates a new LBFGS optimizer instance with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `c1` - Line search parameter for sufficient decrease condition
    /// * `c2` - Line search parameter for curvature condition
    /// * `m` - History size for storing previous iterations
    /// * `max_iters` - Maximum number of iterations
    /// * `target_cost` - Target cost function value for convergence
    pub fn new(c1: f64, c2: f64, m: usize, max_iters: u64, target_cost: f64) -> Self {
        Self {
            c1,
            c2,
            m,
            max_iters,
            target_cost,
            progress: false,
        }
    }
}

impl<S: ODEIntegrator + Copy> Optimizer<S> for LBFGS {
    /// Fits the given problem using the L-BFGS algorithm.
    ///
    /// # Arguments
    ///
    /// * `problem` - The estimation problem to solve
    /// * `initial_guess` - Initial parameter values to start optimization from
    ///
    /// # Returns
    ///
    /// * `Ok(FitReport)` - Best-fit parameters with statistics
    /// * `Err(OptimizeError)` - Error if optimization fails or finds no solution
    fn optimize<T>(
        &self,
        problem: &Problem<S>,
        initial_guess: Option<T>,
    ) -> Result<FitReport, OptimizeError>
    where
        T: Into<InitialGuesses>,
    {
        let initial_guess = InitialGuesses::resolve(initial_guess)?;
        log::info!(
            "Fitting {} observations with {}",
            problem.n_points(),
            Self::NAME
        );

        let linesearch = MoreThuenteLineSearch::new().with_c(self.c1, self.c2)?;
        let solver = ArgminLBFGS::new(linesearch, self.m);

        let mut executor = Executor::new(problem.clone(), solver)
            .configure(|state| {
                state
                    .param(initial_guess.clone())
                    .max_iters(self.max_iters)
                    .target_cost(self.target_cost)
            })
            .add_observer(LogObserver::new(Self::NAME), ObserverMode::Always);

        if self.progress {
            executor = executor.add_observer(SlogLogger::term(), ObserverMode::Always);
        }

        let res = executor.run().map_err(|e| {
            e.downcast::<OptimizeError>()
                .unwrap_or_else(OptimizeError::ArgMinError)
        })?;

        if !res.state.get_best_cost().is_finite() {
            return Err(OptimizeError::CostNaN);
        }

        if let Some(TerminationReason::MaxItersReached) = res.state.get_termination_reason() {
            log::warn!("{} stopped after {} iterations", Self::NAME, self.max_iters);
        }

        let best = res
            .state
            .get_best_param()
            .cloned()
            .ok_or(OptimizeError::NoSolution)?;

        let report = FitReport::new(
            problem,
            Self::NAME,
            &initial_guess,
            &best,
            res.state.get_iter(),
            termination_text(res.state.get_termination_reason()),
        )?;

        log::info!(
            "{} finished after {} iterations ({}): SSE = {:.6}",
            Self::NAME,
            report.iterations,
            report.termination,
            report.metrics.sse
        );

        Ok(report)
    }
}

/// Builder for configuring and constructing LBFGS instances.
///
/// This builder provides a fluent interface for setting up LBFGS optimizer instances
/// with custom parameters and configuration options.
pub struct LBFGSBuilder {
    /// Line search parameter c1 for sufficient decrease condition
    c1: f64,
    /// Line search parameter c2 for curvature condition
    c2: f64,
    /// Maximum number of iterations before stopping
    max_iters: u64,
    /// Target cost function value for convergence criteria
    target_cost: f64,
    /// The history size for storing previous iterations
    m: usize,
    progress: bool,
}

impl LBFGSBuilder {
    /// Sets the line search parameters.
    ///
    /// # Arguments
    ///
    /// * `c1` - Sufficient decrease parameter (0 < c1 < c2 < 1)
    /// * `c2` - Curvature condition parameter (c1 < c2 < 1)
    pub fn linesearch(mut self, c1: f64, c2: f64) -> Self {
        self.c1 = c1;
        self.c2 = c2;
        self
    }

    /// Sets the maximum number of iterations.
    pub fn max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Sets the target cost function value for convergence.
    pub fn target_cost(mut self, target_cost: f64) -> Self {
        self.target_cost = target_cost;
        self
    }

    /// Sets the history size.
    pub fn m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    /// Prints solver progress to the terminal.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Builds and returns an LBFGS instance with the configured settings.
    pub fn build(self) -> LBFGS {
        LBFGS {
            c1: self.c1,
            c2: self.c2,
            m: self.m,
            max_iters: self.max_iters,
            target_cost: self.target_cost,
            progress: self.progress,
        }
    }
}

impl Default for LBFGSBuilder {
    /// Creates a new LBFGSBuilder with default settings.
    ///
    /// Default values:
    /// - c1: 1e-4 (sufficient decrease parameter)
    /// - c2: 0.9 (curvature condition parameter)
    /// - m: 5 (history size)
    /// - max_iters: 500
    /// - target_cost: 0.0
    fn default() -> Self {
        Self {
            c1: 1e-4,
            c2: 0.9,
            m: 5,
            max_iters: 500,
            target_cost: 0.0,
            progress: false,
        }
    }
}
