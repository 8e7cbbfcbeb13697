//! Path-finding procedures (§4.10): `algo.shortestPath`, `algo.SPpaths`
//! (single-pair), `algo.SSpaths` (single-source). Both share one DFS-with-
//! backtracking core; they differ only in whether a target node gates
//! which frontier heads are emitted.

use crate::graph::store::GraphStore;
use crate::types::{AttrId, Direction, EdgeId, NodeId, RelTypeId};
use crate::value::V;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Validated shared config for all three path procedures (§4.10).
/// Construction applies the documented defaults: `relDirection =
/// outgoing`, `maxLen = LONG_MAX-1`, `pathCount = 1`, `maxCost = ∞`.
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub source_node: NodeId,
    pub target_node: Option<NodeId>,
    pub rel_types: Vec<RelTypeId>,
    pub direction: Direction,
    pub min_len: usize,
    pub max_len: usize,
    pub weight_prop: Option<AttrId>,
    pub cost_prop: Option<AttrId>,
    pub max_cost: f64,
    pub path_count: usize,
}

impl PathConfig {
    pub fn new(source_node: NodeId, rel_types: Vec<RelTypeId>) -> Self {
        Self {
            source_node,
            target_node: None,
            rel_types,
            direction: Direction::Outgoing,
            min_len: 0,
            max_len: (i64::MAX - 1) as usize,
            weight_prop: None,
            cost_prop: None,
            max_cost: f64::INFINITY,
            path_count: 1,
        }
    }
}

/// A discovered walk: parallel node/edge id sequences (one more node than
/// edge) plus its accumulated weight and cost. Back-references are by id,
/// not structural — a cyclic graph is expressed through duplicate ids
/// across *different* paths, never a cycle within one path (§8 "cyclic
/// paths": cycle elimination forbids revisiting a node on the current
/// path).
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub weight: f64,
    pub cost: f64,
}

impl Path {
    fn key(&self) -> (OrderedFloat, OrderedFloat, usize) {
        (OrderedFloat(self.weight), OrderedFloat(self.cost), self.edges.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedFloat(f64);

impl Eq for OrderedFloat {}
impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// Candidate wrapper ordered by `(weight, cost, len)` so a max-heap's peek
/// is always the current worst of the retained set (§4.10 `pathCount = k`
/// bounding).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate(Path);

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key().cmp(&other.0.key())
    }
}

impl Eq for Path {}
impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn prop(store: &GraphStore, edge_id: EdgeId, attr: Option<AttrId>) -> f64 {
    let Some(attr) = attr else { return 1.0 };
    match store.get_edge(edge_id).and_then(|e| e.attrs.get(attr)) {
        Some(V::Int64(i)) => *i as f64,
        Some(V::Double(d)) => *d,
        _ => 0.0,
    }
}

struct Search<'a> {
    store: &'a GraphStore,
    config: &'a PathConfig,
    heap: BinaryHeap<Candidate>,
    min_weight_seen: f64,
    current_nodes: Vec<NodeId>,
    current_edges: Vec<EdgeId>,
    weight: f64,
    cost: f64,
}

impl<'a> Search<'a> {
    fn neighbors(&self, at: NodeId) -> Vec<(EdgeId, NodeId)> {
        let mut out = Vec::new();
        for rel in &self.config.rel_types {
            if matches!(self.config.direction, Direction::Outgoing | Direction::Both) {
                out.extend(self.store.expand(at, *rel));
            }
            if matches!(self.config.direction, Direction::Incoming | Direction::Both) {
                out.extend(self.store.expand_incoming(at, *rel));
            }
        }
        out
    }

    /// Current worst-acceptable weight, used to prune branches once the
    /// bounded heap is full (§4.10: "cap `max_weight` to the heap's
    /// current worst to prune DFS aggressively").
    fn max_weight_cap(&self) -> f64 {
        if self.config.path_count > 1 && self.heap.len() >= self.config.path_count {
            self.heap.peek().map(|c| c.0.weight).unwrap_or(f64::INFINITY)
        } else if self.config.path_count == 1 {
            self.min_weight_seen
        } else {
            f64::INFINITY
        }
    }

    fn record_candidate(&mut self) {
        let depth = self.current_edges.len();
        if depth < self.config.min_len || depth > self.config.max_len {
            return;
        }
        if let Some(target) = self.config.target_node {
            if *self.current_nodes.last().unwrap() != target {
                return;
            }
        }
        let path = Path { nodes: self.current_nodes.clone(), edges: self.current_edges.clone(), weight: self.weight, cost: self.cost };

        match self.config.path_count {
            0 => {
                if self.weight < self.min_weight_seen {
                    self.min_weight_seen = self.weight;
                    self.heap.clear();
                    self.heap.push(Candidate(path));
                } else if self.weight == self.min_weight_seen {
                    self.heap.push(Candidate(path));
                }
            }
            1 => {
                if self.weight < self.min_weight_seen || self.heap.is_empty() {
                    self.min_weight_seen = self.weight;
                    self.heap.clear();
                    self.heap.push(Candidate(path));
                }
            }
            k => {
                self.heap.push(Candidate(path));
                while self.heap.len() > k {
                    self.heap.pop();
                }
            }
        }
    }

    fn walk(&mut self, at: NodeId) {
        self.record_candidate();
        if self.current_edges.len() >= self.config.max_len {
            return;
        }
        if self.weight > self.max_weight_cap() {
            return;
        }
        for (edge_id, next) in self.neighbors(at) {
            if self.current_nodes.contains(&next) {
                continue;
            }
            let edge_weight = prop(self.store, edge_id, self.config.weight_prop);
            let edge_cost = prop(self.store, edge_id, self.config.cost_prop);
            let new_weight = self.weight + edge_weight;
            let new_cost = self.cost + edge_cost;
            if new_cost > self.config.max_cost {
                continue;
            }
            if new_weight > self.max_weight_cap() {
                continue;
            }
            self.current_nodes.push(next);
            self.current_edges.push(edge_id);
            self.weight = new_weight;
            self.cost = new_cost;

            self.walk(next);

            self.current_nodes.pop();
            self.current_edges.pop();
            self.weight -= edge_weight;
            self.cost -= edge_cost;
        }
    }

    fn run(mut self) -> Vec<Path> {
        self.current_nodes.push(self.config.source_node);
        self.walk(self.config.source_node);
        let mut out: Vec<Path> = self.heap.into_iter().map(|c| c.0).collect();
        out.sort();
        out
    }
}

/// `algo.shortestPath`: the `pathCount = 1` special case, returning the
/// single best path (or `None` if the target is unreachable within the
/// configured bounds).
pub fn shortest_path(store: &GraphStore, config: &PathConfig) -> Option<Path> {
    let mut cfg = config.clone();
    cfg.path_count = 1;
    all_paths(store, &cfg).into_iter().next()
}

/// `algo.SPpaths` / `algo.SSpaths`: the general form, honouring
/// `pathCount` (`0` = all minimum-weight paths, `k` = the `k` smallest
/// under `(weight, cost, len)` lex order). `SSpaths` is simply an
/// `SPpaths` search run with `config.target_node = None`.
pub fn all_paths(store: &GraphStore, config: &PathConfig) -> Vec<Path> {
    let search = Search {
        store,
        config,
        heap: BinaryHeap::new(),
        min_weight_seen: f64::INFINITY,
        current_nodes: Vec::new(),
        current_edges: Vec::new(),
        weight: 0.0,
        cost: 0.0,
    };
    search.run()
}
