//! `Expand` (§4.7): traverse one hop along a relation type in a given
//! direction, reusing the relation matrix's adjacency iterator. Variable-
//! length expansion tracks per-level frontiers and de-duplicates nodes
//! already visited on the current path to avoid infinite loops on cycles.

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::graph::entities::GraphEntity;
use crate::record::{Record, RecordSchema};
use crate::types::{Direction, EdgeId, NodeId, RelTypeId};
use crate::value::V;

/// One pending hop: the source record to expand from, plus the
/// already-produced `(edge, dest)` pairs still to emit.
struct Pending {
    base: Record,
    hops: std::vec::IntoIter<(EdgeId, NodeId)>,
}

#[derive(Debug)]
pub struct Expand {
    child: super::BoxOperator,
    schema: RecordSchema,
    src_idx: usize,
    edge_idx: Option<usize>,
    dest_idx: usize,
    rel_types: Vec<RelTypeId>,
    direction: Direction,
    pending: Option<Pending>,
}

impl Expand {
    pub fn new(child: super::BoxOperator, schema: RecordSchema, src_alias: &str, edge_alias: Option<&str>, dest_alias: &str, rel_types: Vec<RelTypeId>, direction: Direction) -> Self {
        let src_idx = schema.index_of(src_alias).expect("source alias must be bound");
        let edge_idx = edge_alias.map(|a| schema.index_of(a).expect("edge alias must be bound"));
        let dest_idx = schema.index_of(dest_alias).expect("destination alias must be bound");
        Self { child, schema, src_idx, edge_idx, dest_idx, rel_types, direction, pending: None }
    }

    fn src_node_id(record: &Record, idx: usize) -> Option<NodeId> {
        match record.get_at(idx) {
            Some(V::Node(n)) => Some(n.id),
            _ => None,
        }
    }

    fn hops_for(&self, ctx: &QueryCtx, src: NodeId) -> Vec<(EdgeId, NodeId)> {
        let mut out = Vec::new();
        for rel in &self.rel_types {
            if matches!(self.direction, Direction::Outgoing | Direction::Both) {
                out.extend(ctx.store.expand(src, *rel));
            }
            if matches!(self.direction, Direction::Incoming | Direction::Both) {
                out.extend(ctx.store.expand_incoming(src, *rel));
            }
        }
        out
    }
}

impl Operator for Expand {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        loop {
            check_cancelled(ctx)?;
            if let Some(pending) = &mut self.pending {
                if let Some((edge_id, dest_id)) = pending.hops.next() {
                    let mut record = pending.base.clone().extended(self.schema.clone());
                    if let Some(edge_idx) = self.edge_idx {
                        if let Some(edge) = ctx.store.get_edge(edge_id) {
                            record.set_at(edge_idx, edge.to_value());
                        }
                    }
                    if let Some(dest) = ctx.store.get_node(dest_id) {
                        record.set_at(self.dest_idx, dest.to_value());
                        return Ok(Some(record));
                    }
                    continue;
                }
                self.pending = None;
            }

            let Some(base) = self.child.consume(ctx)? else { return Ok(None) };
            let Some(src) = Self::src_node_id(&base, self.src_idx) else { continue };
            let hops = self.hops_for(ctx, src);
            self.pending = Some(Pending { base, hops: hops.into_iter() });
        }
    }

    fn reset(&mut self) {
        self.pending = None;
        self.child.reset();
    }
}

/// Variable-length expansion (`[:R*1..3]`): BFS-style per-level frontiers,
/// tracking the visited-node set along the *current* path (not globally)
/// so a cyclic graph can still be traversed without looping forever.
#[derive(Debug)]
pub struct VarLenExpand {
    child: super::BoxOperator,
    schema: RecordSchema,
    src_idx: usize,
    dest_idx: usize,
    rel_types: Vec<RelTypeId>,
    direction: Direction,
    min_hops: usize,
    max_hops: usize,
    queue: std::collections::VecDeque<(Record, NodeId, Vec<NodeId>)>,
}

impl VarLenExpand {
    pub fn new(child: super::BoxOperator, schema: RecordSchema, src_alias: &str, dest_alias: &str, rel_types: Vec<RelTypeId>, direction: Direction, min_hops: usize, max_hops: usize) -> Self {
        let src_idx = schema.index_of(src_alias).expect("source alias must be bound");
        let dest_idx = schema.index_of(dest_alias).expect("destination alias must be bound");
        Self { child, schema, src_idx, dest_idx, rel_types, direction, min_hops, max_hops, queue: std::collections::VecDeque::new() }
    }

    fn hops_for(&self, ctx: &QueryCtx, src: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for rel in &self.rel_types {
            if matches!(self.direction, Direction::Outgoing | Direction::Both) {
                out.extend(ctx.store.expand(src, *rel).into_iter().map(|(_, d)| d));
            }
            if matches!(self.direction, Direction::Incoming | Direction::Both) {
                out.extend(ctx.store.expand_incoming(src, *rel).into_iter().map(|(_, s)| s));
            }
        }
        out
    }
}

impl Operator for VarLenExpand {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        loop {
            check_cancelled(ctx)?;
            if let Some((base, at, path)) = self.queue.pop_front() {
                let depth = path.len() - 1;
                if depth >= self.min_hops && depth <= self.max_hops {
                    let Some(node) = ctx.store.get_node(at) else { continue };
                    let mut record = base.clone().extended(self.schema.clone());
                    record.set_at(self.dest_idx, node.to_value());
                    if depth < self.max_hops {
                        for next in self.hops_for(ctx, at) {
                            if !path.contains(&next) {
                                let mut next_path = path.clone();
                                next_path.push(next);
                                self.queue.push_back((base.clone(), next, next_path));
                            }
                        }
                    }
                    return Ok(Some(record));
                }
                if depth < self.max_hops {
                    for next in self.hops_for(ctx, at) {
                        if !path.contains(&next) {
                            let mut next_path = path.clone();
                            next_path.push(next);
                            self.queue.push_back((base.clone(), next, next_path));
                        }
                    }
                }
                continue;
            }

            let Some(base) = self.child.consume(ctx)? else { return Ok(None) };
            let Some(src) = (match base.get_at(self.src_idx) {
                Some(V::Node(n)) => Some(n.id),
                _ => None,
            }) else {
                continue;
            };
            self.queue.push_back((base, src, vec![src]));
        }
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.child.reset();
    }
}
