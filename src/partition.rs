//! Weakly connected components of the graph of squares.
//!
//! `next` and `prev` edges are treated as undirected adjacency.  Traversal is
//! an explicit depth-first worklist over an arena of subgraph ids, so deep
//! chains cannot overflow the call stack.

use crate::graph::Graph;
use crate::types::{ModgraphError, Result};

/// Marker for a node not yet reached by any traversal.
const UNASSIGNED: usize = usize::MAX;

/// One connected component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    pub id: usize,
    /// Node indices, ascending.
    pub members: Vec<usize>,
}

impl Subgraph {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.members.binary_search(&node).is_ok()
    }
}

/// Total, disjoint assignment of every node to one subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    subgraph_of: Vec<usize>,
    subgraphs: Vec<Subgraph>,
}

impl Partition {
    /// Id of the subgraph containing `node`.
    pub fn subgraph_of(&self, node: usize) -> usize {
        self.subgraph_of[node]
    }

    pub fn subgraphs(&self) -> &[Subgraph] {
        &self.subgraphs
    }

    pub fn len(&self) -> usize {
        self.subgraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subgraphs.is_empty()
    }
}

/// Partition `graph` into connected subgraphs.
///
/// Subgraph ids are assigned in increasing order of the smallest node that
/// opens them.  From each node the traversal follows `next` first, then
/// `prev` in stored order, so two runs on the same graph agree exactly.
pub fn compute_partition(graph: &Graph) -> Result<Partition> {
    let m = graph.size();
    let mut subgraph_of = vec![UNASSIGNED; m];
    let mut subgraphs = Vec::new();
    let mut stack = Vec::new();

    for start in 0..m {
        if subgraph_of[start] != UNASSIGNED {
            continue;
        }
        let sid = subgraphs.len();
        let mut members = Vec::new();

        subgraph_of[start] = sid;
        stack.push(start);
        while let Some(n) = stack.pop() {
            members.push(n);
            let node = &graph.nodes()[n];
            // LIFO: push prev in reverse, next last, so next is visited first.
            for &nb in node.prev.iter().rev().chain(std::iter::once(&node.next)) {
                match subgraph_of[nb] {
                    UNASSIGNED => {
                        subgraph_of[nb] = sid;
                        stack.push(nb);
                    }
                    s if s == sid => {}
                    s => {
                        return Err(ModgraphError::SubgraphConflict {
                            node: nb,
                            existing: s,
                            incoming: sid,
                        })
                    }
                }
            }
        }

        members.sort_unstable();
        subgraphs.push(Subgraph { id: sid, members });
    }

    tracing::info!(modulus = m, subgraphs = subgraphs.len(), "partitioned graph");
    Ok(Partition { subgraph_of, subgraphs })
}
