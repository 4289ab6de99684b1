//! **modgraph** — 3-D layout of the graph of squares modulo `m`.
//!
//! Each integer `i` in `0..m` points at `i*i mod m`.  The crate builds that
//! functional graph, splits it into connected subgraphs, and places the nodes
//! in space by minimising a fixed potential:
//!
//! 1. **Number theory** (`number_theory`): squaring map and factor list.
//! 2. **Graph** (`graph`): `next` / `prev` edges, built once.
//! 3. **Partition** (`partition`): weakly connected components.
//! 4. **Potential** (`potential`): repulsion + edge / sum / factor springs.
//! 5. **Optimiser** (`optimizer`): Nelder–Mead or L-BFGS via `argmin`.
//! 6. **Layout** (`layout`): orchestration and the read-only renderer view.

pub mod types;
pub mod number_theory;
pub mod graph;
pub mod partition;
pub mod potential;
pub mod optimizer;
pub mod layout;

pub use graph::Graph;
pub use layout::Layout;
pub use types::{LayoutConfig, ModgraphError, Result};
