//! Levenberg-Marquardt least-squares solver.
//!
//! This module provides a damped Gauss-Newton method for nonlinear least-squares
//! problems, written as an argmin [`Solver`] over any problem exposing its residuals
//! ([`Operator`]) and their [`Jacobian`]. The implementation includes:
//!
//! - The `LevenbergMarquardt` optimizer struct and its `Optimizer` implementation
//! - A builder pattern via `LevenbergMarquardtBuilder` for convenient configuration
//! - The argmin solver `DampedLeastSquares` performing the iterations
//!
//! Each iteration solves `(JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr`. A trial step is accepted
//! only if it lowers the sum of squared residuals, after which `λ` is decreased;
//! otherwise `λ` is increased and the step is recomputed.

use argmin::core::{
    observers::ObserverMode, ArgminError, Error, Executor, IterState, Jacobian, Operator,
    Problem as ArgminProblem, Solver, State, TerminationReason, KV,
};
use argmin_observer_slog::SlogLogger;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use peroxide::fuga::ODEIntegrator;

use crate::optim::{
    error::OptimizeError,
    observer::LogObserver,
    optimizers::optimizer::{InitialGuesses, Optimizer},
    problem::Problem,
    report::FitReport,
};

/// State of the Levenberg-Marquardt iterations. Residuals and Jacobian of the
/// current parameters are carried between iterations.
pub type LeastSquaresState = IterState<Array1<f64>, (), Array2<f64>, (), Array1<f64>, f64>;

const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e16;
const MIN_SCALE: f64 = 1e-30;

/// Implementation of the Levenberg-Marquardt algorithm.
///
/// Levenberg-Marquardt interpolates between Gauss-Newton steps (small damping)
/// and scaled gradient descent steps (large damping). It minimizes the sum of
/// squared residuals and terminates on
///
/// - a relative cost reduction below `ftol` or a relative step size below
///   `xtol`, provided a Gauss-Newton step would not reduce the cost by more
///   than `ftol` either
/// - a maximum absolute entry of `Jᵀr` below `gtol`
/// - `max_iters` accepted steps
pub struct LevenbergMarquardt {
    /// Maximum number of iterations before stopping
    pub max_iters: u64,
    /// Tolerance on the relative reduction of the cost
    pub ftol: f64,
    /// Tolerance on the relative step size
    pub xtol: f64,
    /// Tolerance on the gradient
    pub gtol: f64,
    /// Damping parameter of the first iteration
    pub initial_damping: f64,
    /// Factor by which the damping is increased or decreased
    pub damping_factor: f64,
    /// Whether to print progress to the terminal
    pub progress: bool,
}

impl LevenbergMarquardt {
    pub const NAME: &'static str = "Levenberg-Marquardt";
}

impl<S: ODEIntegrator + Copy> Optimizer<S> for LevenbergMarquardt {
    /// Fits the given problem using the Levenberg-Marquardt algorithm.
    ///
    /// # Arguments
    ///
    /// * `problem` - The estimation problem to solve
    /// * `initial_guess` - Initial parameter values to start from
    ///
    /// # Returns
    ///
    /// * `Ok(FitReport)` - Best-fit parameters with statistics
    /// * `Err(OptimizeError)` - Error if the solver fails or finds no solution
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

        let solver = DampedLeastSquares::new(
            self.initial_damping,
            self.damping_factor,
            self.ftol,
            self.xtol,
            self.gtol,
        );

        let mut executor = Executor::new(problem.clone(), solver)
            .configure(|state| state.param(initial_guess.clone()).max_iters(self.max_iters))
            .add_observer(LogObserver::new(Self::NAME), ObserverMode::Always);

        if self.progress {
            executor = executor.add_observer(SlogLogger::term(), ObserverMode::Always);
        }

        let res = executor.run().map_err(|e| {
            e.downcast::<OptimizeError>()
                .unwrap_or_else(OptimizeError::ArgMinError)
        })?;

        let termination = termination_text(res.state.get_termination_reason());
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
            termination,
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

pub(crate) fn termination_text(reason: Option<&TerminationReason>) -> String {
    reason
        .map(|r| r.text().to_string())
        .unwrap_or_else(|| "Not terminated".to_string())
}

/// argmin solver performing damped Gauss-Newton iterations
#[derive(Debug, Clone)]
pub struct DampedLeastSquares {
    initial_damping: f64,
    damping: f64,
    damping_factor: f64,
    ftol: f64,
    xtol: f64,
    gtol: f64,
}

impl DampedLeastSquares {
    pub fn new(initial_damping: f64, damping_factor: f64, ftol: f64, xtol: f64, gtol: f64) -> Self {
        Self {
            initial_damping,
            damping: initial_damping,
            damping_factor,
            ftol,
            xtol,
            gtol,
        }
    }

    /// Current damping parameter
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Solves `(JᵀJ + λ diag(JᵀJ)) δ = -g` for the current damping
    fn step(&self, jtj: &Array2<f64>, gradient: &Array1<f64>) -> Option<Array1<f64>> {
        damped_step(jtj, gradient, self.damping)
    }

    /// Whether a Gauss-Newton step from the given point is predicted to lower
    /// the cost by at most `ftol` relative to `cost`
    fn is_stationary(&self, jacobian: &Array2<f64>, residuals: &Array1<f64>, cost: f64) -> bool {
        let jtj = jacobian.t().dot(jacobian);
        let gradient = jacobian.t().dot(residuals);

        // The linear model predicts |r + Jδ|² = rᵀr + gᵀδ for the Gauss-Newton step
        match damped_step(&jtj, &gradient, MIN_DAMPING) {
            Some(delta) => -gradient.dot(&delta) <= self.ftol * cost,
            None => false,
        }
    }
}

fn damped_step(jtj: &Array2<f64>, gradient: &Array1<f64>, damping: f64) -> Option<Array1<f64>> {
    let p = gradient.len();
    let matrix = DMatrix::from_fn(p, p, |i, j| {
        if i == j {
            jtj[[i, j]] + damping * jtj[[i, i]].max(MIN_SCALE)
        } else {
            jtj[[i, j]]
        }
    });
    let rhs = DVector::from_iterator(p, gradient.iter().map(|g| -g));

    let delta = match matrix.clone().cholesky() {
        Some(cholesky) => cholesky.solve(&rhs),
        None => matrix.lu().solve(&rhs)?,
    };

    if delta.iter().all(|d| d.is_finite()) {
        Some(Array1::from_iter(delta.iter().copied()))
    } else {
        None
    }
}

impl<O> Solver<O, LeastSquaresState> for DampedLeastSquares
where
    O: Operator<Param = Array1<f64>, Output = Array1<f64>>
        + Jacobian<Param = Array1<f64>, Jacobian = Array2<f64>>,
{
    const NAME: &'static str = "Levenberg-Marquardt";

    fn init(
        &mut self,
        problem: &mut ArgminProblem<O>,
        mut state: LeastSquaresState,
    ) -> Result<(LeastSquaresState, Option<KV>), Error> {
        let param = state.take_param().ok_or_else(|| ArgminError::NotInitialized {
            text: "Levenberg-Marquardt requires an initial parameter vector".to_string(),
        })?;

        let residuals = problem.apply(&param)?;
        let cost = residuals.dot(&residuals);
        if !cost.is_finite() {
            return Err(OptimizeError::CostNaN.into());
        }
        let jacobian = problem.jacobian(&param)?;

        self.damping = self.initial_damping;

        Ok((
            state
                .param(param)
                .residuals(residuals)
                .jacobian(jacobian)
                .cost(cost),
            None,
        ))
    }

    fn next_iter(
        &mut self,
        problem: &mut ArgminProblem<O>,
        mut state: LeastSquaresState,
    ) -> Result<(LeastSquaresState, Option<KV>), Error> {
        let missing = |what: &str| ArgminError::NotInitialized {
            text: format!("Levenberg-Marquardt state is missing its {}", what),
        };
        let param = state.take_param().ok_or_else(|| missing("parameters"))?;
        let residuals = state.take_residuals().ok_or_else(|| missing("residuals"))?;
        let jacobian = state.take_jacobian().ok_or_else(|| missing("Jacobian"))?;
        let cost = state.get_cost();

        let jtj = jacobian.t().dot(&jacobian);
        let gradient = jacobian.t().dot(&residuals);

        if gradient.iter().all(|g| g.abs() <= self.gtol) {
            return Ok((
                state
                    .param(param)
                    .residuals(residuals)
                    .jacobian(jacobian)
                    .cost(cost)
                    .terminate_with(TerminationReason::SolverConverged),
                None,
            ));
        }

        loop {
            if let Some(delta) = self.step(&jtj, &gradient) {
                let candidate = &param + &delta;
                let candidate_residuals = problem.apply(&candidate)?;
                let candidate_cost = candidate_residuals.dot(&candidate_residuals);

                if candidate_cost.is_finite() && candidate_cost < cost {
                    self.damping = (self.damping / self.damping_factor).max(MIN_DAMPING);

                    let candidate_jacobian = problem.jacobian(&candidate)?;
                    let reduction = (cost - candidate_cost) / cost;
                    let step_norm = delta.dot(&delta).sqrt();
                    let param_norm = param.dot(&param).sqrt();
                    let small_change = reduction <= self.ftol
                        || step_norm <= self.xtol * (param_norm + self.xtol);

                    // A short step under heavy damping says nothing about the optimum
                    let converged = small_change
                        && self.is_stationary(
                            &candidate_jacobian,
                            &candidate_residuals,
                            candidate_cost,
                        );

                    let kv = argmin::kv!(
                        "damping" => self.damping;
                        "step_norm" => step_norm;
                        "reduction" => reduction;
                    );

                    let state = state
                        .param(candidate)
                        .residuals(candidate_residuals)
                        .jacobian(candidate_jacobian)
                        .cost(candidate_cost);

                    if converged {
                        return Ok((
                            state.terminate_with(TerminationReason::SolverConverged),
                            Some(kv),
                        ));
                    }

                    return Ok((state, Some(kv)));
                }
            }

            self.damping *= self.damping_factor;
            if self.damping > MAX_DAMPING {
                return Ok((
                    state
                        .param(param)
                        .residuals(residuals)
                        .jacobian(jacobian)
                        .cost(cost)
                        .terminate_with(TerminationReason::SolverExit(
                            "Damping parameter exceeded its upper bound".to_string(),
                        )),
                    None,
                ));
            }
        }
    }
}

/// Builder for configuring and constructing LevenbergMarquardt instances.
pub struct LevenbergMarquardtBuilder {
    max_iters: u64,
    ftol: f64,
    xtol: f64,
    gtol: f64,
    initial_damping: f64,
    damping_factor: f64,
    progress: bool,
}

impl LevenbergMarquardtBuilder {
    /// Sets the maximum number of iterations.
    pub fn max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Sets the tolerance on the relative cost reduction.
    pub fn ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    /// Sets the tolerance on the relative step size.
    pub fn xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    /// Sets the tolerance on the gradient.
    pub fn gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// Sets the damping parameter of the first iteration.
    pub fn initial_damping(mut self, initial_damping: f64) -> Self {
        self.initial_damping = initial_damping;
        self
    }

    /// Sets the factor by which the damping is scaled after each trial step.
    pub fn damping_factor(mut self, damping_factor: f64) -> Self {
        self.damping_factor = damping_factor;
        self
    }

    /// Prints solver progress to the terminal.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Builds and returns a LevenbergMarquardt instance with the configured settings.
    pub fn build(self) -> LevenbergMarquardt {
        LevenbergMarquardt {
            max_iters: self.max_iters,
            ftol: self.ftol,
            xtol: self.xtol,
            gtol: self.gtol,
            initial_damping: self.initial_damping,
            damping_factor: self.damping_factor,
            progress: self.progress,
        }
    }
}

impl Default for LevenbergMarquardtBuilder {
    /// Creates a new LevenbergMarquardtBuilder with default settings.
    ///
    /// Default values:
    /// - max_iters: 200
    /// - ftol: 1e-10
    /// - xtol: 1e-10
    /// - gtol: 1e-12
    /// - initial_damping: 1e-3
    /// - damping_factor: 10
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            initial_damping: 1e-3,
            damping_factor: 10.0,
            progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use argmin::core::Executor;
    use ndarray::array;

    use super::*;

    /// Exponential decay `y = a exp(-b t)` sampled without noise
    #[derive(Clone)]
    struct Decay {
        t: Array1<f64>,
        y: Array1<f64>,
    }

    impl Decay {
        fn new(a: f64, b: f64) -> Self {
            let t = Array1::linspace(0.0, 4.0, 9);
            let y = t.mapv(|t| a * (-b * t).exp());
            Self { t, y }
        }
    }

    impl Operator for Decay {
        type Param = Array1<f64>;
        type Output = Array1<f64>;

        fn apply(&self, p: &Self::Param) -> Result<Self::Output, Error> {
            Ok(&self.y - &self.t.mapv(|t| p[0] * (-p[1] * t).exp()))
        }
    }

    impl Jacobian for Decay {
        type Param = Array1<f64>;
        type Jacobian = Array2<f64>;

        fn jacobian(&self, p: &Self::Param) -> Result<Self::Jacobian, Error> {
            let mut jacobian = Array2::zeros((self.t.len(), 2));
            for (i, t) in self.t.iter().enumerate() {
                let e = (-p[1] * t).exp();
                jacobian[[i, 0]] = -e;
                jacobian[[i, 1]] = p[0] * t * e;
            }
            Ok(jacobian)
        }
    }

    #[test]
    fn test_recovers_exponential_decay() {
        // ARRANGE
        let problem = Decay::new(3.0, 0.7);
        let solver = DampedLeastSquares::new(1e-3, 10.0, 1e-14, 1e-14, 1e-14);

        // ACT
        let res = Executor::new(problem, solver)
            .configure(|state| state.param(array![1.0, 0.1]).max_iters(100))
            .run()
            .unwrap();

        // ASSERT
        let best = res.state.get_best_param().unwrap();
        assert_relative_eq!(best[0], 3.0, max_relative = 1e-8);
        assert_relative_eq!(best[1], 0.7, max_relative = 1e-8);
        assert!(res.state.get_best_cost() < 1e-16);
    }

    /// Heavily damped first steps barely reduce the cost, which must not be
    /// mistaken for convergence while a Gauss-Newton step still promises
    /// a large reduction.
    #[test]
    fn test_heavy_initial_damping_keeps_iterating() {
        // ARRANGE
        let problem = Decay::new(3.0, 0.7);
        let solver = DampedLeastSquares::new(1e6, 10.0, 1e-4, 1e-14, 1e-14);

        // ACT
        let res = Executor::new(problem, solver)
            .configure(|state| state.param(array![1.0, 0.1]).max_iters(200))
            .run()
            .unwrap();

        // ASSERT
        let best = res.state.get_best_param().unwrap();
        assert!(res.state.get_iter() > 1);
        assert_relative_eq!(best[0], 3.0, max_relative = 1e-6);
        assert_relative_eq!(best[1], 0.7, max_relative = 1e-6);
    }

    #[test]
    fn test_rejects_non_finite_start() {
        let problem = Decay::new(3.0, 0.7);
        let solver = DampedLeastSquares::new(1e-3, 10.0, 1e-10, 1e-10, 1e-10);

        let res = Executor::new(problem, solver)
            .configure(|state| state.param(array![f64::NAN, 0.1]).max_iters(10))
            .run();

        assert!(res.is_err());
    }
}
