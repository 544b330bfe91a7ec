use super::config::SolverConfig;
use super::differentiation::Differentiator;
use super::error::EngineError;
use super::log::DesignVectorLog;
use super::problem::{ConstrainedProblem, Evaluation};
use super::progress::{Progress, ProgressReporter};
use super::state::{SolverOutcome, SolverStatus};
use argmin::core::{
    CostFunction, Error as ArgminError, Executor, Gradient, State, TerminationReason,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use nalgebra::DVector;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

type InnerSolver = LBFGS<MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64>, Vec<f64>, Vec<f64>, f64>;

/// Violation must shrink to this fraction of its previous value, or the penalty grows.
const SUFFICIENT_DECREASE: f64 = 0.25;

/// Consecutive aborted inner solves after which the run is given up.
const MAX_CONSECUTIVE_ABORTS: usize = 3;

/// How one inner L-BFGS solve ended.
#[derive(Debug, Clone, PartialEq)]
enum InnerSolve {
    /// The solver stopped on its own criteria; carries its best iterate.
    Finished(Vec<f64>),
    /// Some trial point produced a NaN or infinite objective, constraint or derivative.
    NonFinite,
    /// The solver gave up without a usable iterate.
    Aborted(String),
}

/// Augmented-Lagrangian driver for inequality-constrained problems.
///
/// Each outer iteration minimizes
/// `s*f(x) + sum_i (1/(2*mu)) * (max(0, lambda_i + mu*(c_i(x) - u_i))^2 - lambda_i^2)`
/// with L-BFGS, then updates the multipliers `lambda_i` and, when the violation did not
/// shrink enough, the penalty `mu`.
pub struct AugmentedLagrangian<'d> {
    settings: SolverConfig,
    objective_scale: f64,
    differentiator: &'d dyn Differentiator,
}

impl<'d> AugmentedLagrangian<'d> {
    pub fn new(
        settings: SolverConfig,
        objective_scale: f64,
        differentiator: &'d dyn Differentiator,
    ) -> Self {
        Self {
            settings,
            objective_scale,
            differentiator,
        }
    }

    /// Runs the driver from `x0`.
    ///
    /// Numerical failure ends the run with [`SolverStatus::Failed`] and the iterates logged
    /// so far; it is not returned as an error. Errors are reserved for faults in the
    /// problem itself, such as a design vector of the wrong length.
    #[instrument(skip_all, name = "augmented_lagrangian")]
    pub fn minimize<P: ConstrainedProblem>(
        &self,
        problem: &P,
        x0: Vec<f64>,
        reporter: &ProgressReporter,
    ) -> Result<SolverOutcome, EngineError> {
        let bounds = problem.constraint_bounds().to_vec();
        let mut multipliers = vec![0.0; bounds.len()];
        let mut penalty = self.settings.initial_penalty;
        let inner_solver = self.inner_solver()?;
        let mut log = DesignVectorLog::new();
        let mut x = x0;
        log.push(&x);

        let mut evaluation = problem.evaluate(&x)?;
        if !evaluation.is_finite() {
            return Ok(SolverOutcome {
                status: SolverStatus::Failed {
                    reason: "non-finite value at the starting point".to_string(),
                },
                design_vector: x,
                evaluation: None,
                iterations: 0,
                multipliers,
                log,
            });
        }
        let mut previous_violation = evaluation.max_violation(&bounds);
        info!(
            dimension = problem.dimension(),
            constraints = bounds.len(),
            objective = evaluation.objective,
            max_violation = previous_violation,
            "Starting augmented-Lagrangian optimization."
        );

        reporter.report(Progress::TaskStart {
            total_steps: self.settings.max_outer_iterations as u64,
        });
        let mut status = SolverStatus::Iterating;
        let mut iterations = 0;
        let mut consecutive_aborts = 0;

        while !status.is_terminal() {
            if iterations >= self.settings.max_outer_iterations {
                status = SolverStatus::MaxIterations;
                break;
            }
            iterations += 1;

            let inner = if problem.dimension() == 0 {
                InnerSolve::Finished(x.clone())
            } else {
                self.solve_subproblem(
                    problem,
                    inner_solver.clone(),
                    &x,
                    &multipliers,
                    penalty,
                    iterations,
                )?
            };
            let inner_finished = matches!(inner, InnerSolve::Finished(_));
            let candidate = match inner {
                InnerSolve::Finished(candidate) => {
                    consecutive_aborts = 0;
                    candidate
                }
                InnerSolve::NonFinite => {
                    status = SolverStatus::Failed {
                        reason: format!("non-finite value at iteration {iterations}"),
                    };
                    break;
                }
                InnerSolve::Aborted(reason) => {
                    consecutive_aborts += 1;
                    warn!(
                        iteration = iterations,
                        %reason,
                        "Inner solve aborted; keeping the previous iterate."
                    );
                    if consecutive_aborts >= MAX_CONSECUTIVE_ABORTS {
                        status = SolverStatus::Failed {
                            reason: format!(
                                "inner solver aborted {consecutive_aborts} times in a row: {reason}"
                            ),
                        };
                        break;
                    }
                    x.clone()
                }
            };

            let candidate_evaluation = problem.evaluate(&candidate)?;
            if !candidate_evaluation.is_finite() {
                status = SolverStatus::Failed {
                    reason: format!("non-finite value at iteration {iterations}"),
                };
                break;
            }

            let step = candidate
                .iter()
                .zip(&x)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            x = candidate;
            evaluation = candidate_evaluation;
            log.push(&x);

            let violation = evaluation.max_violation(&bounds);
            for ((lambda, c), u) in multipliers
                .iter_mut()
                .zip(&evaluation.constraints)
                .zip(&bounds)
            {
                *lambda = (*lambda + penalty * (c - u)).max(0.0);
            }

            info!(
                iteration = iterations,
                objective = evaluation.objective,
                max_violation = violation,
                step,
                penalty,
                "Outer iteration complete."
            );
            reporter.report(Progress::Iteration {
                index: iterations,
                objective: evaluation.objective,
                max_violation: violation,
            });
            reporter.report(Progress::TaskIncrement);

            if has_converged(&self.settings, violation, step, inner_finished) {
                status = SolverStatus::Converged;
            } else if violation > SUFFICIENT_DECREASE * previous_violation {
                penalty *= self.settings.penalty_growth;
                debug!(penalty, "Violation did not shrink enough; increasing penalty.");
            }
            previous_violation = violation;
        }

        reporter.report(Progress::TaskFinish);
        info!(status = %status, iterations, "Optimization finished.");

        Ok(SolverOutcome {
            status,
            design_vector: x,
            evaluation: Some(evaluation),
            iterations,
            multipliers,
            log,
        })
    }

    fn inner_solver(&self) -> Result<InnerSolver, EngineError> {
        LBFGS::new(MoreThuenteLineSearch::new(), self.settings.lbfgs_memory)
            .with_tolerance_grad(self.settings.gradient_tolerance)
            .map_err(|e| EngineError::Solver(e.to_string()))
    }

    /// Minimizes the merit function from `x`.
    ///
    /// L-BFGS turns a failed line search into an ordinary termination, so a non-finite
    /// trial point is detected through a flag the merit function raises rather than
    /// through the returned error.
    fn solve_subproblem<P: ConstrainedProblem>(
        &self,
        problem: &P,
        solver: InnerSolver,
        x: &[f64],
        multipliers: &[f64],
        penalty: f64,
        iteration: usize,
    ) -> Result<InnerSolve, EngineError> {
        let non_finite = AtomicBool::new(false);
        let subproblem = Subproblem {
            problem,
            differentiator: self.differentiator,
            multipliers,
            penalty,
            scale: self.objective_scale,
            iteration,
            non_finite: &non_finite,
        };
        let result = Executor::new(subproblem, solver)
            .configure(|state| {
                state
                    .param(x.to_vec())
                    .max_iters(self.settings.max_inner_iterations as u64)
            })
            .run();
        if non_finite.load(Ordering::Relaxed) {
            return Ok(InnerSolve::NonFinite);
        }
        match result {
            Ok(result) => {
                let state = result.state();
                if let Some(TerminationReason::SolverExit(reason)) = state.get_termination_reason() {
                    debug!(iteration, %reason, "Inner solver exited early.");
                }
                Ok(InnerSolve::Finished(
                    state.get_best_param().cloned().unwrap_or_else(|| x.to_vec()),
                ))
            }
            Err(err) => match err.downcast::<EngineError>() {
                Ok(EngineError::NonFinite { .. }) => Ok(InnerSolve::NonFinite),
                Ok(other) => Err(other),
                Err(other) => Ok(InnerSolve::Aborted(other.to_string())),
            },
        }
    }
}

/// An outer iteration converges only on a completed inner solve that left the iterate
/// feasible and nearly unmoved.
fn has_converged(settings: &SolverConfig, violation: f64, step: f64, inner_finished: bool) -> bool {
    inner_finished
        && violation <= settings.feasibility_tolerance
        && step <= settings.step_tolerance
}

/// The smooth unconstrained merit function minimized in one outer iteration.
struct Subproblem<'a, P> {
    problem: &'a P,
    differentiator: &'a dyn Differentiator,
    multipliers: &'a [f64],
    penalty: f64,
    scale: f64,
    iteration: usize,
    /// Raised on the first NaN or infinite value seen at any trial point.
    non_finite: &'a AtomicBool,
}

impl<P: ConstrainedProblem> Subproblem<'_, P> {
    fn evaluate_finite(&self, x: &[f64]) -> Result<Evaluation, EngineError> {
        let evaluation = self.problem.evaluate(x)?;
        if evaluation.is_finite() {
            Ok(evaluation)
        } else {
            self.non_finite.store(true, Ordering::Relaxed);
            Err(EngineError::NonFinite {
                what: "objective or constraint value".to_string(),
                iteration: self.iteration,
            })
        }
    }

    /// Shifted multiplier estimates `max(0, lambda_i + mu*(c_i - u_i))`.
    fn shifted_multipliers<'e>(&'e self, evaluation: &'e Evaluation) -> impl Iterator<Item = f64> + 'e {
        evaluation
            .constraints
            .iter()
            .zip(self.problem.constraint_bounds())
            .zip(self.multipliers)
            .map(|((c, u), lambda)| (lambda + self.penalty * (c - u)).max(0.0))
    }

    fn merit(&self, evaluation: &Evaluation) -> f64 {
        let penalty_terms: f64 = self
            .shifted_multipliers(evaluation)
            .zip(self.multipliers)
            .map(|(shifted, lambda)| shifted * shifted - lambda * lambda)
            .sum();
        self.scale * evaluation.objective + penalty_terms / (2.0 * self.penalty)
    }
}

impl<P: ConstrainedProblem> CostFunction for Subproblem<'_, P> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, ArgminError> {
        let evaluation = self.evaluate_finite(x)?;
        Ok(self.merit(&evaluation))
    }
}

impl<P: ConstrainedProblem> Gradient for Subproblem<'_, P> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, ArgminError> {
        let values = |y: &[f64]| -> Result<Vec<f64>, EngineError> {
            let evaluation = self.evaluate_finite(y)?;
            Ok(std::iter::once(evaluation.objective)
                .chain(evaluation.constraints)
                .collect())
        };
        let jacobian = self
            .differentiator
            .jacobian(&values, x)
            .map_err(|e| match e {
                EngineError::NonFinite { what, .. } => {
                    self.non_finite.store(true, Ordering::Relaxed);
                    EngineError::NonFinite {
                        what,
                        iteration: self.iteration,
                    }
                }
                other => other,
            })?;

        let evaluation = self.evaluate_finite(x)?;
        let weights = DVector::from_iterator(
            jacobian.nrows(),
            std::iter::once(self.scale).chain(self.shifted_multipliers(&evaluation)),
        );
        Ok((jacobian.transpose() * weights).iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{ObjectiveKind, OptimizationConfigBuilder};
    use crate::engine::differentiation::CentralDifference;
    use std::sync::{Arc, Mutex};

    /// Minimize (x - 3)^2 + (y + 1)^2 subject to x <= 2.
    struct ShiftedBowl {
        bounds: Vec<f64>,
    }

    impl ConstrainedProblem for ShiftedBowl {
        fn dimension(&self) -> usize {
            2
        }
        fn constraint_bounds(&self) -> &[f64] {
            &self.bounds
        }
        fn evaluate(&self, x: &[f64]) -> Result<Evaluation, EngineError> {
            Ok(Evaluation {
                objective: (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2),
                constraints: if self.bounds.is_empty() { vec![] } else { vec![x[0]] },
            })
        }
    }

    /// Finite only while x stays below one half.
    struct Cliff;

    impl ConstrainedProblem for Cliff {
        fn dimension(&self) -> usize {
            1
        }
        fn constraint_bounds(&self) -> &[f64] {
            &[]
        }
        fn evaluate(&self, x: &[f64]) -> Result<Evaluation, EngineError> {
            let objective = if x[0] > 0.5 { f64::NAN } else { (x[0] - 3.0).powi(2) };
            Ok(Evaluation {
                objective,
                constraints: vec![],
            })
        }
    }

    fn settings() -> SolverConfig {
        OptimizationConfigBuilder::new()
            .objective(ObjectiveKind::AggregateGap)
            .max_outer_iterations(50)
            .build()
            .unwrap()
            .solver
    }

    #[test]
    fn constrained_minimum_lies_on_the_bound() {
        let differentiator = CentralDifference::new(1e-6);
        let driver = AugmentedLagrangian::new(settings(), 1.0, &differentiator);
        let problem = ShiftedBowl { bounds: vec![2.0] };
        let outcome = driver
            .minimize(&problem, vec![0.0, 0.0], &ProgressReporter::new())
            .unwrap();
        assert_eq!(outcome.status, SolverStatus::Converged);
        assert!((outcome.design_vector[0] - 2.0).abs() < 1e-2);
        assert!((outcome.design_vector[1] + 1.0).abs() < 1e-2);
        assert!((outcome.multipliers[0] - 2.0).abs() < 1e-1);
        assert_eq!(outcome.log.entries()[0], vec![0.0, 0.0]);
        assert_eq!(outcome.log.len(), outcome.iterations + 1);
    }

    #[test]
    fn unconstrained_problem_reaches_free_minimum() {
        let differentiator = CentralDifference::new(1e-6);
        let driver = AugmentedLagrangian::new(settings(), 1.0, &differentiator);
        let problem = ShiftedBowl { bounds: vec![] };
        let outcome = driver
            .minimize(&problem, vec![0.0, 0.0], &ProgressReporter::new())
            .unwrap();
        assert_eq!(outcome.status, SolverStatus::Converged);
        assert!((outcome.design_vector[0] - 3.0).abs() < 1e-3);
        assert!((outcome.design_vector[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn iteration_budget_is_respected() {
        let differentiator = CentralDifference::new(1e-6);
        let mut limited = settings();
        limited.max_outer_iterations = 1;
        let driver = AugmentedLagrangian::new(limited, 1.0, &differentiator);
        let problem = ShiftedBowl { bounds: vec![2.0] };
        let outcome = driver
            .minimize(&problem, vec![0.0, 0.0], &ProgressReporter::new())
            .unwrap();
        assert_eq!(outcome.status, SolverStatus::MaxIterations);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.log.len(), 2);
    }

    #[test]
    fn non_finite_values_fail_the_run_with_partial_log() {
        let differentiator = CentralDifference::new(1e-6);
        let driver = AugmentedLagrangian::new(settings(), 1.0, &differentiator);
        let outcome = driver
            .minimize(&Cliff, vec![0.0], &ProgressReporter::new())
            .unwrap();
        match &outcome.status {
            SolverStatus::Failed { reason } => assert!(reason.contains("non-finite"), "{reason}"),
            other => panic!("expected a failed run, got {other}"),
        }
        assert!(!outcome.log.is_empty());
        assert_eq!(outcome.log.entries()[0], vec![0.0]);
        assert!(outcome.design_vector[0] <= 0.5);
        assert!(outcome.evaluation.is_some_and(|e| e.is_finite()));
    }

    #[test]
    fn non_finite_trial_point_is_caught_inside_the_line_search() {
        let differentiator = CentralDifference::new(1e-6);
        let driver = AugmentedLagrangian::new(settings(), 1.0, &differentiator);
        let inner = driver
            .solve_subproblem(&Cliff, driver.inner_solver().unwrap(), &[0.0], &[], 10.0, 1)
            .unwrap();
        assert_eq!(inner, InnerSolve::NonFinite);

        let inner = driver
            .solve_subproblem(
                &ShiftedBowl { bounds: vec![] },
                driver.inner_solver().unwrap(),
                &[0.0, 0.0],
                &[],
                10.0,
                1,
            )
            .unwrap();
        assert!(matches!(inner, InnerSolve::Finished(x) if (x[0] - 3.0).abs() < 1e-3));
    }

    #[test]
    fn convergence_requires_a_finished_inner_solve() {
        let settings = settings();
        assert!(has_converged(&settings, 0.0, 0.0, true));
        assert!(!has_converged(&settings, 0.0, 0.0, false));
        assert!(!has_converged(&settings, 1.0, 0.0, true));
        assert!(!has_converged(&settings, 0.0, 1.0, true));
    }

    #[test]
    fn non_finite_start_fails_immediately() {
        let differentiator = CentralDifference::new(1e-6);
        let driver = AugmentedLagrangian::new(settings(), 1.0, &differentiator);
        let outcome = driver
            .minimize(&Cliff, vec![1.0], &ProgressReporter::new())
            .unwrap();
        assert!(matches!(outcome.status, SolverStatus::Failed { .. }));
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.evaluation.is_none());
    }

    #[test]
    fn every_outer_iteration_is_reported() {
        let differentiator = CentralDifference::new(1e-6);
        let driver = AugmentedLagrangian::new(settings(), 1.0, &differentiator);
        let iterations = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&iterations);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::Iteration { .. } = event {
                *counter.lock().unwrap() += 1;
            }
        }));
        let outcome = driver
            .minimize(&ShiftedBowl { bounds: vec![2.0] }, vec![0.0, 0.0], &reporter)
            .unwrap();
        assert_eq!(*iterations.lock().unwrap(), outcome.iterations);
    }
}
