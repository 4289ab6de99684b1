//! Entry point: modulus → graph → (partition) → minimised 3-D layout.

use crate::graph::Graph;
use crate::optimizer::Minimizer;
use crate::partition::{compute_partition, Partition};
use crate::potential::{norm, PotentialModel, Vec3};
use crate::types::{InitialSpread, LayoutConfig, MinimizeResult, Result, Strategy, Termination};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Length trimmed from each end of a drawn edge.
pub const ARROW_INSET: f64 = 0.25;

/// Uniform random positions in a cube of the given spread, centred on the origin.
pub fn initial_positions<R: Rng>(m: usize, spread: InitialSpread, rng: &mut R) -> Array2<f64> {
    let side = spread.side(m);
    Array2::from_shape_fn((m, 3), |_| side * (rng.gen::<f64>() - 0.5))
}

/// Read-only data a renderer needs for one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeView {
    pub index: usize,
    pub position: Vec3,
    pub next: usize,
    /// Present only when the layout was built with a partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgraph: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<usize>,
}

/// Segment from `from` toward `to`, trimmed by [`ARROW_INSET`] at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arrow {
    pub from: usize,
    pub to: usize,
    pub begin: Vec3,
    pub end: Vec3,
}

/// Summary of the minimisation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub strategy: Strategy,
    pub termination: Termination,
    pub potential: f64,
    pub gradient_norm: f64,
    pub max_net_force: f64,
    pub iterations: Option<u64>,
    pub evaluations: u64,
}

/// Everything renderers consume, in serialisable form.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub modulus: usize,
    pub biggest_radius: f64,
    pub subgraphs: Option<Vec<Vec<usize>>>,
    pub nodes: Vec<NodeView>,
    pub arrows: Vec<Arrow>,
    pub stats: RunStats,
}

/// A finished layout of the graph of squares for one modulus.
#[derive(Debug, Clone)]
pub struct Layout {
    graph: Graph,
    partition: Option<Partition>,
    result: MinimizeResult,
}

impl Layout {
    /// Build the graph for `modulus` and lay it out under `config`.
    pub fn compute(modulus: i64, config: &LayoutConfig) -> Result<Self> {
        let graph = Graph::new(modulus)?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let initial = initial_positions(graph.size(), config.spread, &mut rng);
        Self::from_initial(graph, initial, config)
    }

    /// Lay out an existing graph starting from explicit positions (`m × 3`).
    pub fn from_initial(graph: Graph, initial: Array2<f64>, config: &LayoutConfig) -> Result<Self> {
        config.validate()?;
        let partition = if config.partition {
            Some(compute_partition(&graph)?)
        } else {
            None
        };

        let result = {
            let model = PotentialModel::new(&graph, config.scales);
            let minimizer = Minimizer::new(&model, config.solver.clone())?;
            minimizer.minimize(&initial)?
        };

        tracing::info!(
            modulus = graph.modulus(),
            fixed_points = graph.fixed_points().count(),
            termination = ?result.termination,
            "layout complete"
        );
        Ok(Self { graph, partition, result })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    pub fn result(&self) -> &MinimizeResult {
        &self.result
    }

    /// Final positions, `m × 3`.
    pub fn positions(&self) -> &Array2<f64> {
        &self.result.positions
    }

    pub fn position(&self, i: usize) -> Vec3 {
        let p = &self.result.positions;
        [p[[i, 0]], p[[i, 1]], p[[i, 2]]]
    }

    pub fn node(&self, i: usize) -> Option<NodeView> {
        (i < self.graph.size()).then(|| NodeView {
            index: i,
            position: self.position(i),
            next: self.graph.next(i),
            subgraph: self.partition.as_ref().map(|p| p.subgraph_of(i)),
            complement: self.graph.complement(i),
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeView> + '_ {
        (0..self.graph.size()).filter_map(|i| self.node(i))
    }

    /// Largest distance of any node from the origin.
    pub fn biggest_radius(&self) -> f64 {
        (0..self.graph.size())
            .map(|i| norm(&self.position(i)))
            .fold(0.0, f64::max)
    }

    /// One arrow per node that does not map to itself.
    pub fn arrows(&self) -> Vec<Arrow> {
        (0..self.graph.size())
            .filter_map(|i| {
                let j = self.graph.next(i);
                if i == j {
                    return None;
                }
                let (pi, pj) = (self.position(i), self.position(j));
                let d = [pj[0] - pi[0], pj[1] - pi[1], pj[2] - pi[2]];
                let r = norm(&d);
                let q = [0, 1, 2].map(|k| d[k] / r * ARROW_INSET);
                Some(Arrow {
                    from: i,
                    to: j,
                    begin: [0, 1, 2].map(|k| pi[k] + q[k]),
                    end: [0, 1, 2].map(|k| pj[k] - q[k]),
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        let r = &self.result;
        Snapshot {
            modulus: self.graph.modulus(),
            biggest_radius: self.biggest_radius(),
            subgraphs: self
                .partition
                .as_ref()
                .map(|p| p.subgraphs().iter().map(|s| s.members.clone()).collect()),
            nodes: self.nodes().collect(),
            arrows: self.arrows(),
            stats: RunStats {
                strategy: r.strategy,
                termination: r.termination,
                potential: r.potential,
                gradient_norm: r.gradient_norm,
                max_net_force: r.max_net_force,
                iterations: r.iterations,
                evaluations: r.evaluations,
            },
        }
    }
}
