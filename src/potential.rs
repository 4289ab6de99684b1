//! Composite pairwise potential and the all-pairs force sweep.
//!
//! Four terms act between every ordered pair `(i, j)`:
//!
//! | term              | active when                                 | spring constant        |
//! |-------------------|---------------------------------------------|------------------------|
//! | repulsion         | always                                      | —  (force `−u / r²`)   |
//! | edge attraction   | `next(i) == j` or `next(j) == i`            | `1 / edge_attract`     |
//! | sum attraction    | `(i + j) mod m` is `f` or `m − f`           | `f / (m · sum_attract)`|
//! | factor attraction | `i` or `j` is `f` or `m − f`                | `f / (m · factor_attract)` |
//!
//! where `f` runs over [`factors_of`](crate::number_theory::factors_of).  For
//! the sentinel `f = 0` the spring constant is the full reciprocal scale.
//!
//! Forces are descent directions of the potential: the force on node `i` from
//! node `j` is `−∂V_ij/∂x_i`, so the gradient of the total potential is the
//! negated net-force vector.

use crate::graph::Graph;
use crate::types::PotentialScales;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

pub type Vec3 = [f64; 3];

const ZERO: Vec3 = [0.0; 3];

#[inline]
fn add_assign(a: &mut Vec3, b: Vec3) {
    for d in 0..3 {
        a[d] += b[d];
    }
}

#[inline]
fn scaled(u: &Vec3, s: f64) -> Vec3 {
    [u[0] * s, u[1] * s, u[2] * s]
}

#[inline]
pub fn norm(v: &Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

// ─────────────────────────────────────────────────────────────
//  Node pair geometry
// ─────────────────────────────────────────────────────────────

/// Geometry of one ordered pair: indices, separation, unit vector `i → j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePair {
    pub i: usize,
    pub j: usize,
    pub r: f64,
    pub u: Vec3,
}

impl NodePair {
    /// `d` is the displacement from node `i` to node `j`.
    pub fn new(i: usize, j: usize, d: Vec3) -> Self {
        let r = norm(&d);
        Self { i, j, r, u: scaled(&d, 1.0 / r) }
    }

    /// Pair read from an `m × 3` position array.
    pub fn from_positions(i: usize, j: usize, positions: &Array2<f64>) -> Self {
        let d = [
            positions[[j, 0]] - positions[[i, 0]],
            positions[[j, 1]] - positions[[i, 1]],
            positions[[j, 2]] - positions[[i, 2]],
        ];
        Self::new(i, j, d)
    }
}

// ─────────────────────────────────────────────────────────────
//  Potential model
// ─────────────────────────────────────────────────────────────

/// The fixed four-term potential bound to one graph.
///
/// Every term method returns the force felt by `pair.i` from `pair.j` and adds
/// its potential energy into `potential`.
#[derive(Debug, Clone)]
pub struct PotentialModel<'g> {
    graph: &'g Graph,
    scales: PotentialScales,
}

impl<'g> PotentialModel<'g> {
    pub fn new(graph: &'g Graph, scales: PotentialScales) -> Self {
        Self { graph, scales }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn scales(&self) -> &PotentialScales {
        &self.scales
    }

    /// Spring constant along graph edges.
    pub fn k_edge(&self) -> f64 {
        1.0 / self.scales.edge_attract
    }

    /// Spring attraction `k·r·u`, potential `½·k·r²`.
    #[inline]
    pub fn attract(k: f64, pair: &NodePair, potential: &mut f64) -> Vec3 {
        *potential += 0.5 * k * pair.r * pair.r;
        scaled(&pair.u, k * pair.r)
    }

    /// Inverse-square repulsion `−u/r²`, potential `1/r`.
    #[inline]
    pub fn repel(pair: &NodePair, potential: &mut f64) -> Vec3 {
        *potential += 1.0 / pair.r;
        scaled(&pair.u, -1.0 / (pair.r * pair.r))
    }

    pub fn edge_attract(&self, pair: &NodePair, potential: &mut f64) -> Vec3 {
        if self.graph.is_edge(pair.i, pair.j) {
            Self::attract(self.k_edge(), pair, potential)
        } else {
            ZERO
        }
    }

    pub fn sum_attract(&self, pair: &NodePair, potential: &mut f64) -> Vec3 {
        let m = self.graph.modulus();
        let sum = (pair.i + pair.j) % m;
        let c = 1.0 / self.scales.sum_attract;
        let b = c / m as f64;
        let mut f = ZERO;
        for &n in self.graph.factors() {
            let a = n as f64 * b;
            if sum == n {
                add_assign(&mut f, Self::attract(if n == 0 { c } else { a }, pair, potential));
            }
            if m - sum == n {
                add_assign(&mut f, Self::attract(a, pair, potential));
            }
        }
        f
    }

    pub fn factor_attract(&self, pair: &NodePair, potential: &mut f64) -> Vec3 {
        let m = self.graph.modulus();
        let (i, j) = (pair.i, pair.j);
        let c = 1.0 / self.scales.factor_attract;
        let b = c / m as f64;
        let mut f = ZERO;
        for &n in self.graph.factors() {
            let a = n as f64 * b;
            if i == n || j == n {
                add_assign(&mut f, Self::attract(if n == 0 { c } else { a }, pair, potential));
            }
            if i == m - n || j == m - n {
                add_assign(&mut f, Self::attract(a, pair, potential));
            }
        }
        f
    }

    /// Net force on `pair.i` from `pair.j` over all four terms.
    pub fn force_and_potential(&self, pair: &NodePair, potential: &mut f64) -> Vec3 {
        let mut f = Self::repel(pair, potential);
        add_assign(&mut f, self.edge_attract(pair, potential));
        add_assign(&mut f, self.sum_attract(pair, potential));
        add_assign(&mut f, self.factor_attract(pair, potential));
        f
    }

    /// Force on `i` from `j` at the given positions.  `i != j`.
    pub fn pair_force(
        &self,
        i: usize,
        j: usize,
        positions: &Array2<f64>,
        potential: &mut f64,
    ) -> Vec3 {
        self.force_and_potential(&NodePair::from_positions(i, j, positions), potential)
    }

    /// Full `O(m²)` sweep at `positions` (`m × 3`).
    ///
    /// Rows `i` (pairs `i < j`) are computed in parallel; the reduction into the
    /// table and the potential runs in row order so results are reproducible.
    pub fn evaluate(&self, positions: &Array2<f64>) -> ForceField {
        let m = positions.nrows();

        let rows: Vec<(f64, Vec<Vec3>)> = (0..m)
            .into_par_iter()
            .map(|i| {
                let mut potential = 0.0;
                let forces: Vec<Vec3> = ((i + 1)..m)
                    .map(|j| self.pair_force(i, j, positions, &mut potential))
                    .collect();
                (potential, forces)
            })
            .collect();

        let mut potential = 0.0;
        let mut pairwise = Array2::zeros((3 * m, m));
        for (i, (row_potential, forces)) in rows.into_iter().enumerate() {
            potential += row_potential;
            for (offset, f) in forces.into_iter().enumerate() {
                let j = i + 1 + offset;
                for d in 0..3 {
                    pairwise[[3 * i + d, j]] = f[d];
                    pairwise[[3 * j + d, i]] = -f[d];
                }
            }
        }
        let net = pairwise.sum_axis(Axis(1));

        ForceField { potential, pairwise, net }
    }
}

// ─────────────────────────────────────────────────────────────
//  Force field  (result of one sweep)
// ─────────────────────────────────────────────────────────────

/// Potential and forces at one position vector.
#[derive(Debug, Clone)]
pub struct ForceField {
    pub potential: f64,
    /// `pairwise[[3i + d, j]]` is component `d` of the force on `i` from `j`.
    pub pairwise: Array2<f64>,
    /// Row sums of `pairwise`: net force on each node, flattened `3m`.
    pub net: Array1<f64>,
}

impl ForceField {
    pub fn num_nodes(&self) -> usize {
        self.pairwise.ncols()
    }

    /// Force on `i` from `j`.
    pub fn force_between(&self, i: usize, j: usize) -> Vec3 {
        [
            self.pairwise[[3 * i, j]],
            self.pairwise[[3 * i + 1, j]],
            self.pairwise[[3 * i + 2, j]],
        ]
    }

    pub fn net_force(&self, i: usize) -> Vec3 {
        [self.net[3 * i], self.net[3 * i + 1], self.net[3 * i + 2]]
    }

    /// Gradient of the potential w.r.t. the flattened positions: `−net`.
    pub fn gradient(&self) -> Vec<f64> {
        self.net.iter().map(|f| -f).collect()
    }

    pub fn gradient_norm(&self) -> f64 {
        self.net.dot(&self.net).sqrt()
    }

    /// Largest net-force magnitude on any single node.
    pub fn max_net_force(&self) -> f64 {
        (0..self.num_nodes())
            .map(|i| norm(&self.net_force(i)))
            .fold(0.0, f64::max)
    }
}
