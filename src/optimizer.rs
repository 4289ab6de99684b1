//! Potential minimisation via the `argmin` crate.
//!
//! Wraps the all-pairs sweep into argmin's `CostFunction` + `Gradient`
//! traits over the flattened `3m` position vector, then runs either
//! Nelder–Mead (no gradient) or L-BFGS (gradient = −net force).
//!
//! The argmin parameter is a plain `Vec<f64>` (argmin-math `vec` backend);
//! positions become an `Array2` only inside the sweep.

use crate::potential::PotentialModel;
use crate::types::{MinimizeResult, ModgraphError, Result, SolverOptions, Strategy, Termination};
use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::neldermead::NelderMead;
use argmin::solver::quasinewton::LBFGS;
use ndarray::Array2;
use std::cell::{Cell, RefCell};

// ─────────────────────────────────────────────────────────────
//  Position packing / unpacking
// ─────────────────────────────────────────────────────────────

/// Check that every coordinate is finite and no two nodes share a point.
pub fn check_positions(positions: &Array2<f64>) -> Result<()> {
    for (node, row) in positions.rows().into_iter().enumerate() {
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ModgraphError::NonFinitePosition { node });
        }
    }
    let m = positions.nrows();
    for first in 0..m {
        for second in (first + 1)..m {
            if positions.row(first) == positions.row(second) {
                return Err(ModgraphError::CoincidentNodes { first, second });
            }
        }
    }
    Ok(())
}

/// Flatten `m × 3` positions into `[x0, y0, z0, x1, ...]`.
pub fn flatten_positions(positions: &Array2<f64>) -> Vec<f64> {
    positions.iter().copied().collect()
}

/// Inverse of [`flatten_positions`].
///
/// Fails with [`ModgraphError::InvalidDimension`] unless the length is a
/// multiple of three.
pub fn reshape_positions(theta: &[f64]) -> Result<Array2<f64>> {
    let n = theta.len();
    if n % 3 != 0 {
        return Err(ModgraphError::InvalidDimension(n));
    }
    Array2::from_shape_vec((n / 3, 3), theta.to_vec())
        .map_err(|_| ModgraphError::InvalidDimension(n))
}

// ─────────────────────────────────────────────────────────────
//  argmin problem wrapper
// ─────────────────────────────────────────────────────────────

/// Bookkeeping that must outlive the executor, which consumes the problem
/// and drops it when the solver errors out.
#[derive(Debug, Default)]
struct RunLog {
    evaluations: Cell<u64>,
    /// Lowest potential seen so far and where.
    best: RefCell<Option<(f64, Vec<f64>)>>,
}

impl RunLog {
    fn record(&self, potential: f64, theta: &[f64]) {
        let mut best = self.best.borrow_mut();
        let improves = match best.as_ref() {
            Some((p, _)) => potential < *p,
            None => potential.is_finite(),
        };
        if improves {
            *best = Some((potential, theta.to_vec()));
        }
    }

    fn best_param(&self) -> Option<Vec<f64>> {
        self.best.borrow().as_ref().map(|(_, t)| t.clone())
    }

    /// Turn a solver error into a no-progress stop at the best point seen.
    /// Errors raised by our own callbacks stay fatal.
    fn recover(&self, e: argmin::core::Error) -> Result<RunOutcome> {
        match e.downcast::<ModgraphError>() {
            Ok(inner) => Err(inner),
            Err(e) => {
                tracing::warn!(error = %e, "solver stopped without further progress");
                let param = self
                    .best_param()
                    .ok_or_else(|| ModgraphError::Solver(e.to_string()))?;
                Ok(RunOutcome { param, iterations: None, reason: None })
            }
        }
    }
}

struct Evaluation {
    theta: Vec<f64>,
    potential: f64,
    gradient: Vec<f64>,
}

/// Adapts a [`PotentialModel`] to argmin.
///
/// argmin calls `cost(θ)` and `gradient(θ)` separately at the same θ, so the
/// last `(θ, potential, gradient)` is cached and the `O(m²)` sweep runs once
/// per unique θ.  `RefCell` because argmin's traits take `&self`.
struct LayoutProblem<'a, 'g> {
    model: &'a PotentialModel<'g>,
    report_frequency: u64,
    log: &'a RunLog,
    last_eval: RefCell<Option<Evaluation>>,
}

impl<'a, 'g> LayoutProblem<'a, 'g> {
    fn new(model: &'a PotentialModel<'g>, report_frequency: u64, log: &'a RunLog) -> Self {
        Self {
            model,
            report_frequency,
            log,
            last_eval: RefCell::new(None),
        }
    }

    fn ensure_evaluated(&self, theta: &[f64]) -> Result<(), argmin::core::Error> {
        if let Some(eval) = self.last_eval.borrow().as_ref() {
            if eval.theta == theta {
                return Ok(());
            }
        }
        let positions = reshape_positions(theta).map_err(argmin::core::Error::new)?;
        let field = self.model.evaluate(&positions);

        let n = self.log.evaluations.get() + 1;
        self.log.evaluations.set(n);
        if !field.potential.is_finite() {
            return Err(argmin::core::Error::new(ModgraphError::NonFinitePotential {
                evaluations: n,
            }));
        }
        if self.report_frequency > 0 && n % self.report_frequency == 0 {
            tracing::debug!(evaluations = n, potential = field.potential, "minimiser progress");
        }
        self.log.record(field.potential, theta);

        *self.last_eval.borrow_mut() = Some(Evaluation {
            theta: theta.to_vec(),
            potential: field.potential,
            gradient: field.gradient(),
        });
        Ok(())
    }

    fn cached<T>(&self, pick: impl FnOnce(&Evaluation) -> T) -> Result<T, argmin::core::Error> {
        self.last_eval
            .borrow()
            .as_ref()
            .map(pick)
            .ok_or_else(|| argmin::core::Error::msg("potential was not evaluated"))
    }
}

impl CostFunction for LayoutProblem<'_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        self.ensure_evaluated(theta)?;
        self.cached(|e| e.potential)
    }
}

impl Gradient for LayoutProblem<'_, '_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        self.ensure_evaluated(theta)?;
        self.cached(|e| e.gradient.clone())
    }
}

// ─────────────────────────────────────────────────────────────
//  Minimiser
// ─────────────────────────────────────────────────────────────

/// What a single solver run handed back.
struct RunOutcome {
    param: Vec<f64>,
    iterations: Option<u64>,
    /// `None` when the run aborted.
    reason: Option<TerminationReason>,
}

/// Drives one strategy, chosen at construction, over a potential model.
#[derive(Debug, Clone)]
pub struct Minimizer<'a, 'g> {
    model: &'a PotentialModel<'g>,
    options: SolverOptions,
}

impl<'a, 'g> Minimizer<'a, 'g> {
    pub fn new(model: &'a PotentialModel<'g>, options: SolverOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { model, options })
    }

    pub fn strategy(&self) -> Strategy {
        self.options.strategy
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Minimise the potential starting from `initial` (`m × 3`).
    ///
    /// Non-convergence is not an error: the best vector the method produced
    /// is returned with a [`Termination`] other than `Converged`, and a
    /// warning is logged.
    ///
    /// Starts with a non-finite coordinate or two coincident nodes are
    /// rejected up front; a potential that turns non-finite mid-run aborts
    /// with [`ModgraphError::NonFinitePotential`].
    pub fn minimize(&self, initial: &Array2<f64>) -> Result<MinimizeResult> {
        let m = self.model.graph().size();
        if initial.ncols() != 3 || initial.nrows() != m {
            return Err(ModgraphError::InvalidDimension(initial.len()));
        }
        check_positions(initial)?;
        let x0 = flatten_positions(initial);

        // Fewer than two nodes: no pairs, nothing to move.
        if m < 2 {
            let field = self.model.evaluate(initial);
            return Ok(MinimizeResult {
                positions: initial.clone(),
                potential: field.potential,
                gradient_norm: 0.0,
                max_net_force: 0.0,
                termination: Termination::Converged,
                iterations: Some(0),
                evaluations: 1,
                strategy: self.options.strategy,
            });
        }

        let log = RunLog::default();
        let outcome = match self.options.strategy {
            Strategy::Simplex => self.run_simplex(x0, &log)?,
            Strategy::Gradient => self.run_gradient(x0, &log)?,
        };

        let positions = reshape_positions(&outcome.param)?;
        let field = self.model.evaluate(&positions);
        let gradient_norm = field.gradient_norm();

        let termination = match self.options.strategy {
            Strategy::Gradient if gradient_norm < self.options.gradient_tolerance => {
                Termination::Converged
            }
            Strategy::Simplex
                if matches!(outcome.reason, Some(TerminationReason::SolverConverged)) =>
            {
                Termination::Converged
            }
            _ => match outcome.reason {
                Some(TerminationReason::MaxItersReached) => Termination::IterationCap,
                _ => Termination::NoProgress,
            },
        };

        let evaluations = log.evaluations.get();
        if termination == Termination::Converged {
            tracing::info!(
                modulus = m,
                potential = field.potential,
                gradient_norm,
                iterations = ?outcome.iterations,
                "converged to minimum"
            );
        } else {
            tracing::warn!(
                modulus = m,
                ?termination,
                potential = field.potential,
                gradient_norm,
                iterations = ?outcome.iterations,
                evaluations,
                "minimisation did not converge; keeping best positions found"
            );
        }

        Ok(MinimizeResult {
            potential: field.potential,
            gradient_norm,
            max_net_force: field.max_net_force(),
            positions,
            termination,
            iterations: outcome.iterations,
            evaluations,
            strategy: self.options.strategy,
        })
    }

    /// Nelder–Mead from a simplex spanned by `x0` and one step along each axis.
    fn run_simplex(&self, x0: Vec<f64>, log: &RunLog) -> Result<RunOutcome> {
        let n = x0.len();
        let mut simplex = Vec::with_capacity(n + 1);
        for k in 0..n {
            let mut vertex = x0.clone();
            vertex[k] += self.options.simplex_step;
            simplex.push(vertex);
        }
        simplex.push(x0);

        let solver = NelderMead::new(simplex).with_sd_tolerance(self.options.simplex_tolerance)?;
        let problem = LayoutProblem::new(self.model, self.options.report_frequency, log);

        let run = Executor::new(problem, solver)
            .configure(|config| config.max_iters(self.options.max_iterations))
            .run();

        match run {
            Ok(result) => {
                let state = result.state();
                let param = state
                    .get_best_param()
                    .cloned()
                    .or_else(|| log.best_param())
                    .ok_or_else(|| ModgraphError::Solver("Nelder-Mead returned no best parameters".into()))?;
                Ok(RunOutcome {
                    param,
                    iterations: Some(state.get_iter()),
                    reason: state.get_termination_reason().cloned(),
                })
            }
            Err(e) => log.recover(e),
        }
    }

    /// L-BFGS with a Moré–Thuente line search on the force-derived gradient.
    fn run_gradient(&self, x0: Vec<f64>, log: &RunLog) -> Result<RunOutcome> {
        let linesearch = MoreThuenteLineSearch::new();
        let solver = LBFGS::new(linesearch, self.options.lbfgs_memory)
            .with_tolerance_grad(self.options.gradient_tolerance)?;
        let problem = LayoutProblem::new(self.model, self.options.report_frequency, log);

        let run = Executor::new(problem, solver)
            .configure(|config| {
                config
                    .param(x0)
                    .max_iters(self.options.max_iterations)
                    .target_cost(f64::NEG_INFINITY)
            })
            .run();

        match run {
            Ok(result) => {
                let state = result.state();
                let param = state
                    .get_best_param()
                    .cloned()
                    .or_else(|| log.best_param())
                    .ok_or_else(|| ModgraphError::Solver("L-BFGS returned no best parameters".into()))?;
                Ok(RunOutcome {
                    param,
                    iterations: Some(state.get_iter()),
                    reason: state.get_termination_reason().cloned(),
                })
            }
            Err(e) => log.recover(e),
        }
    }
}
