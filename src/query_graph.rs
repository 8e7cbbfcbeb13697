//! `QueryGraph` (`QG`): the pattern-time representation of a `MATCH`
//! clause — an undirected multigraph over alias bindings, built from the
//! (externally parsed) AST before compilation to an operator tree.
//!
//! Built on `petgraph::graphmap::UnGraphMap`, which natively supports the
//! parallel-edge-free undirected case; parallel pattern edges between the
//! same two aliases (e.g. `(a)-[:KNOWS]->(b)-[:LIKES]->(a)` style multi-hop
//! patterns written between the same pair) are tracked in a side table
//! since petgraph's `GraphMap` keys edges by endpoint pair alone.

use petgraph::graphmap::UnGraphMap;
use std::collections::{HashMap, HashSet};

pub type AliasId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePattern {
    pub alias: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePattern {
    pub alias: Option<String>,
    pub rel_types: Vec<String>,
    pub src: AliasId,
    pub dest: AliasId,
    /// `true` when the pattern is written left-to-right (`()-->()`),
    /// `false` for `()<--()`; undirected patterns (`()--()`) set both
    /// directions to `true` via two registered edges.
    pub directed_forward: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QueryGraph {
    nodes: Vec<NodePattern>,
    alias_to_id: HashMap<String, AliasId>,
    edges: Vec<EdgePattern>,
    graph: UnGraphMap<AliasId, Vec<usize>>,
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, alias: impl Into<String>, labels: Vec<String>) -> AliasId {
        let alias = alias.into();
        if let Some(id) = self.alias_to_id.get(&alias) {
            return *id;
        }
        let id = self.nodes.len() as AliasId;
        self.nodes.push(NodePattern { alias: alias.clone(), labels });
        self.alias_to_id.insert(alias, id);
        self.graph.add_node(id);
        id
    }

    pub fn add_edge(
        &mut self,
        alias: Option<String>,
        rel_types: Vec<String>,
        src: AliasId,
        dest: AliasId,
        directed_forward: bool,
    ) -> usize {
        let edge_idx = self.edges.len();
        self.edges.push(EdgePattern { alias, rel_types, src, dest, directed_forward });
        self.graph.add_edge(src, dest, match self.graph.edge_weight(src, dest) {
            Some(existing) => {
                let mut v = existing.clone();
                v.push(edge_idx);
                v
            }
            None => vec![edge_idx],
        });
        edge_idx
    }

    pub fn alias_id(&self, alias: &str) -> Option<AliasId> {
        self.alias_to_id.get(alias).copied()
    }

    pub fn node(&self, id: AliasId) -> Option<&NodePattern> {
        self.nodes.get(id as usize)
    }

    pub fn edge(&self, idx: usize) -> Option<&EdgePattern> {
        self.edges.get(idx)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Pattern edges between two aliases (there may be several — the same
    /// pair connected by more than one relationship pattern).
    pub fn edges_between(&self, a: AliasId, b: AliasId) -> Vec<usize> {
        self.graph.edge_weight(a, b).cloned().unwrap_or_default()
    }

    pub fn neighbors(&self, alias: AliasId) -> impl Iterator<Item = AliasId> + '_ {
        self.graph.neighbors(alias)
    }

    /// Split the pattern into its connected components — each becomes an
    /// independent scan-and-join unit in the compiled plan (a Cartesian
    /// product joins components with no shared alias).
    pub fn connected_components(&self) -> Vec<Vec<AliasId>> {
        let mut visited: HashSet<AliasId> = HashSet::new();
        let mut components = Vec::new();

        for node in self.graph.nodes() {
            if visited.contains(&node) {
                continue;
            }
            let mut stack = vec![node];
            let mut component = Vec::new();
            while let Some(n) = stack.pop() {
                if !visited.insert(n) {
                    continue;
                }
                component.push(n);
                for neighbor in self.graph.neighbors(n) {
                    if !visited.contains(&neighbor) {
                        stack.push(neighbor);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// Extract the sequence of alternating node/edge-pattern ids along a
    /// simple path between two aliases, used by named-path projections
    /// (`MATCH p = (a)-[*]->(b)`). Returns `None` if no path exists in the
    /// pattern graph.
    pub fn extract_path(&self, from: AliasId, to: AliasId) -> Option<Vec<AliasId>> {
        if from == to {
            return Some(vec![from]);
        }
        let mut visited = HashSet::new();
        let mut stack = vec![vec![from]];
        while let Some(path) = stack.pop() {
            let last = *path.last().unwrap();
            if last == to {
                return Some(path);
            }
            if !visited.insert(last) {
                continue;
            }
            for neighbor in self.graph.neighbors(last) {
                if !path.contains(&neighbor) {
                    let mut next = path.clone();
                    next.push(neighbor);
                    stack.push(next);
                }
            }
        }
        None
    }
}
