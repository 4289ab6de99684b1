use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────
//  Error type
// ─────────────────────────────────────────────────────────────

/// Unified error type for all fallible operations in the crate.
///
/// Non-convergence of the minimiser is *not* an error; it is reported through
/// [`Termination`] on the result.
#[derive(Debug, Error)]
pub enum ModgraphError {
    /// Graph construction was asked for a negative modulus.
    #[error("illegal modulus {0}: must be non-negative")]
    InvalidModulus(i64),

    /// Partition traversal reached a node already claimed by another
    /// subgraph.  Unreachable for a correctly built graph.
    #[error("conflict between subgraphs: node {node} is in subgraph {existing}, reached from subgraph {incoming}")]
    SubgraphConflict {
        node: usize,
        existing: usize,
        incoming: usize,
    },

    /// A flattened position vector whose length is not a multiple of three.
    #[error("invalid dimension: {0} coordinates is not a multiple of three")]
    InvalidDimension(usize),

    /// A starting coordinate is NaN or infinite.
    #[error("node {node} starts at a non-finite position")]
    NonFinitePosition { node: usize },

    /// Two nodes start at the same point, where repulsion is singular.
    #[error("nodes {first} and {second} start at the same position")]
    CoincidentNodes { first: usize, second: usize },

    /// The potential evaluated to NaN or infinity during minimisation.
    #[error("potential is not finite after {evaluations} evaluations")]
    NonFinitePotential { evaluations: u64 },

    /// Rejected configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// Argmin solver failed for a reason other than lack of progress.
    #[error("solver error: {0}")]
    Solver(String),
}

impl From<argmin::core::Error> for ModgraphError {
    fn from(e: argmin::core::Error) -> Self {
        match e.downcast::<ModgraphError>() {
            Ok(inner) => inner,
            Err(other) => Self::Solver(other.to_string()),
        }
    }
}

pub type Result<T, E = ModgraphError> = std::result::Result<T, E>;

// ─────────────────────────────────────────────────────────────
//  Potential scales
// ─────────────────────────────────────────────────────────────

/// Scale constants of the fixed four-term potential.
///
/// Repulsion is unit-strength at unit distance; every attraction uses the
/// reciprocal of its scale as spring constant, so larger values mean weaker
/// springs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotentialScales {
    /// Nodes joined by a directed edge.
    pub edge_attract: f64,
    /// Nodes whose sum modulo `m` is a factor `f` or `m - f`.
    pub sum_attract: f64,
    /// Nodes where either index is a factor `f` or `m - f`.
    pub factor_attract: f64,
}

impl Default for PotentialScales {
    fn default() -> Self {
        Self {
            edge_attract: 1.5,
            sum_attract: 15.0,
            factor_attract: 150.0,
        }
    }
}

impl PotentialScales {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("edge_attract", self.edge_attract),
            ("sum_attract", self.sum_attract),
            ("factor_attract", self.factor_attract),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(ModgraphError::Config(format!(
                    "{name} must be finite and positive, got {v}"
                )));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Solver options
// ─────────────────────────────────────────────────────────────

/// Numerical method used by the minimiser, fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Derivative-free Nelder–Mead simplex.
    Simplex,
    /// L-BFGS driven by the force-derived gradient.
    #[default]
    Gradient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub strategy: Strategy,
    /// Hard cap on solver iterations.
    pub max_iterations: u64,
    /// Converged when the Euclidean norm of the gradient drops below this.
    pub gradient_tolerance: f64,
    /// Simplex converged when the std. deviation of vertex potentials drops
    /// below this.
    pub simplex_tolerance: f64,
    /// Displacement of each initial simplex vertex along its coordinate.
    pub simplex_step: f64,
    /// Number of L-BFGS correction pairs.
    pub lbfgs_memory: usize,
    /// Log progress every this many objective evaluations (0 disables).
    pub report_frequency: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Gradient,
            max_iterations: 1_000_000,
            gradient_tolerance: 1e-4,
            simplex_tolerance: 1e-8,
            simplex_step: 10.0,
            lbfgs_memory: 10,
            report_frequency: 100,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ModgraphError::Config("max_iterations must be > 0".into()));
        }
        if !(self.gradient_tolerance.is_finite() && self.gradient_tolerance > 0.0) {
            return Err(ModgraphError::Config(format!(
                "gradient_tolerance must be finite and positive, got {}",
                self.gradient_tolerance
            )));
        }
        if !(self.simplex_tolerance.is_finite() && self.simplex_tolerance >= 0.0) {
            return Err(ModgraphError::Config(format!(
                "simplex_tolerance must be finite and non-negative, got {}",
                self.simplex_tolerance
            )));
        }
        if !(self.simplex_step.is_finite() && self.simplex_step != 0.0) {
            return Err(ModgraphError::Config(format!(
                "simplex_step must be finite and non-zero, got {}",
                self.simplex_step
            )));
        }
        if self.lbfgs_memory == 0 {
            return Err(ModgraphError::Config("lbfgs_memory must be > 0".into()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Layout configuration
// ─────────────────────────────────────────────────────────────

/// Side of the cube, centred on the origin, from which initial positions are
/// drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialSpread {
    /// Side `m`.
    Modulus,
    /// Side `sqrt(m)`.
    #[default]
    SqrtModulus,
}

impl InitialSpread {
    pub fn side(self, m: usize) -> f64 {
        match self {
            Self::Modulus => m as f64,
            Self::SqrtModulus => (m as f64).sqrt(),
        }
    }
}

/// Everything needed to go from a modulus to a finished layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub scales: PotentialScales,
    pub solver: SolverOptions,
    pub spread: InitialSpread,
    /// Seed for the initial positions; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Also compute the connected-subgraph partition.
    pub partition: bool,
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        self.scales.validate()?;
        self.solver.validate()
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| ModgraphError::Config(format!("invalid layout config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

// ─────────────────────────────────────────────────────────────
//  Minimiser result
// ─────────────────────────────────────────────────────────────

/// How a minimisation run ended.  None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Gradient norm (or simplex spread) fell below tolerance.
    Converged,
    /// The method stopped making progress before converging.
    NoProgress,
    /// `max_iterations` was reached.
    IterationCap,
}

#[derive(Debug, Clone)]
pub struct MinimizeResult {
    /// Final positions, `m × 3`.
    pub positions: Array2<f64>,
    /// Potential at `positions`.
    pub potential: f64,
    /// Euclidean norm of the gradient at `positions`.
    pub gradient_norm: f64,
    /// Largest net-force magnitude felt by any single node.
    pub max_net_force: f64,
    pub termination: Termination,
    /// Solver iterations; `None` when the solver aborted and its state was lost.
    pub iterations: Option<u64>,
    /// Distinct positions at which the potential was evaluated.
    pub evaluations: u64,
    pub strategy: Strategy,
}

impl MinimizeResult {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}
