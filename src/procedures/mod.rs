//! Graph procedures (§4.10, §6): `CALL`-invoked routines that are not part
//! of the pattern-matching core — path finding (`algo.shortestPath`,
//! `algo.SPpaths`, `algo.SSpaths`) and schema introspection
//! (`db.constraints`). Each exposes a plain function returning output rows
//! in its declared column order; [`crate::plan::procedure_call`] is the
//! operator that wires one into a running plan.

pub mod list_constraints;
pub mod path;

use crate::value::{PathValue, V};
use path::Path;
use std::sync::Arc;

/// Column order shared by all three path procedures (§4.10, §6): the path
/// itself, its accumulated weight, and its accumulated cost.
pub const PATH_COLUMNS: [&str; 3] = ["path", "weight", "cost"];

fn path_row(p: &Path) -> Vec<V> {
    vec![
        V::Path(Arc::new(PathValue { nodes: p.nodes.clone(), edges: p.edges.clone() })),
        V::Double(p.weight),
        V::Double(p.cost),
    ]
}

/// `CALL algo.shortestPath(...)`: zero or one output row.
pub fn shortest_path_rows(store: &crate::graph::store::GraphStore, config: &path::PathConfig) -> Vec<Vec<V>> {
    path::shortest_path(store, config).iter().map(path_row).collect()
}

/// `CALL algo.SPpaths(...)` / `CALL algo.SSpaths(...)`: every path the
/// search retains, already ordered by `(weight, cost, len)`.
pub fn all_paths_rows(store: &crate::graph::store::GraphStore, config: &path::PathConfig) -> Vec<Vec<V>> {
    path::all_paths(store, config).iter().map(path_row).collect()
}

pub use list_constraints::list_constraints;
