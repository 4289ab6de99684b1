//! Directed functional graph of `x -> x*x mod m`.

use crate::number_theory::{factors_of, next_of};
use crate::types::{ModgraphError, Result};

/// One integer `i` in `[0, m)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// `i*i mod m`.
    pub next: usize,
    /// Every `j` with `next(j) == i`, ascending.
    pub prev: Vec<usize>,
}

/// Connectivity of the graph of squares for one modulus.
///
/// Edge structure is fixed at construction.  Positions are not stored here;
/// they belong to the minimiser and the [`Layout`](crate::layout::Layout).
#[derive(Debug, Clone)]
pub struct Graph {
    modulus: usize,
    nodes: Vec<Node>,
    factors: Vec<usize>,
}

impl Graph {
    /// Build the graph for modulus `m`.
    ///
    /// Fails with [`ModgraphError::InvalidModulus`] when `m < 0`.
    pub fn new(m: i64) -> Result<Self> {
        let modulus = usize::try_from(m).map_err(|_| ModgraphError::InvalidModulus(m))?;
        Ok(Self::with_modulus(modulus))
    }

    /// Build the graph for a modulus already known to be non-negative.
    pub fn with_modulus(modulus: usize) -> Self {
        let mut nodes: Vec<Node> = (0..modulus)
            .map(|i| Node { next: next_of(i, modulus), prev: Vec::new() })
            .collect();
        for i in 0..modulus {
            let nxt = nodes[i].next;
            nodes[nxt].prev.push(i);
        }
        tracing::debug!(modulus, "built graph of squares");
        Self {
            modulus,
            nodes,
            factors: factors_of(modulus),
        }
    }

    pub fn modulus(&self) -> usize {
        self.modulus
    }

    /// Number of nodes (equal to the modulus).
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Target of the single outgoing edge of `i`.
    pub fn next(&self, i: usize) -> usize {
        self.nodes[i].next
    }

    /// Modular square roots of `i` (sources of its incoming edges).
    pub fn prev(&self, i: usize) -> &[usize] {
        &self.nodes[i].prev
    }

    /// Factor list of the modulus, computed once per graph.
    pub fn factors(&self) -> &[usize] {
        &self.factors
    }

    /// True when a directed edge joins `i` and `j` in either direction.
    #[inline]
    pub fn is_edge(&self, i: usize, j: usize) -> bool {
        self.nodes[i].next == j || self.nodes[j].next == i
    }

    /// The node `m - i`, unless that is `m` itself (`i == 0`) or `i` itself.
    pub fn complement(&self, i: usize) -> Option<usize> {
        if i == 0 || i >= self.modulus {
            return None;
        }
        let c = self.modulus - i;
        (c != i).then_some(c)
    }

    /// Nodes that map to themselves.
    pub fn fixed_points(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().enumerate().filter(|(i, n)| n.next == *i).map(|(i, _)| i)
    }
}
