//! Sparse boolean label matrices (`M_L`) and relation adjacency matrices
//! (`A_R`), backed by `roaring::RoaringBitmap`.
//!
//! Entity ids are truncated to `u32` for bitmap membership — this engine's
//! in-memory model targets graphs that fit comfortably under `u32::MAX`
//! entities per type, the same practical ceiling `roaring` itself imposes.
//!
//! Mutations to a matrix are buffered and only folded into the bitmap on
//! [`RoaringMatrix::sync`] / [`RelationMatrix::sync`], controlled by a
//! [`SyncPolicy`] the caller chooses per mutation batch:
//!
//! - `Nop`: leave the buffer pending (a future op will see stale matrix
//!   state but queries always read `pending` first, see [`RoaringMatrix::contains`]).
//! - `Resize`: fold pending writes into the bitmap immediately.
//! - `FlushResize`: fold pending writes in, then run `run_optimize()` to
//!   compact the bitmap's run-length encoding — worth it after a large
//!   bulk load, wasteful per single mutation.

use crate::types::{EdgeId, NodeId};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPolicy {
    Nop,
    Resize,
    FlushResize,
}

fn truncate(id: u64) -> u32 {
    id as u32
}

/// A single label's membership bitmap, i.e. one row of `M_L`.
#[derive(Debug, Clone, Default)]
pub struct RoaringMatrix {
    committed: RoaringBitmap,
    pending_set: RoaringBitmap,
    pending_clear: RoaringBitmap,
}

impl RoaringMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, node: NodeId) {
        let b = truncate(node.get());
        self.pending_clear.remove(b);
        self.pending_set.insert(b);
    }

    pub fn clear(&mut self, node: NodeId) {
        let b = truncate(node.get());
        self.pending_set.remove(b);
        self.pending_clear.insert(b);
    }

    /// Membership check that always reflects pending writes, regardless of
    /// whether `sync` has run — readers never observe a stale "not
    /// present" for a write in the same transaction.
    pub fn contains(&self, node: NodeId) -> bool {
        let b = truncate(node.get());
        if self.pending_clear.contains(b) {
            return false;
        }
        self.pending_set.contains(b) || self.committed.contains(b)
    }

    pub fn sync(&mut self, policy: SyncPolicy) {
        if policy == SyncPolicy::Nop {
            return;
        }
        self.committed |= std::mem::take(&mut self.pending_set);
        self.committed -= std::mem::take(&mut self.pending_clear);
        if policy == SyncPolicy::FlushResize {
            self.committed.run_optimize();
        }
    }

    pub fn len(&self) -> u64 {
        self.committed.len() + self.pending_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (&self.committed | &self.pending_set).into_iter().filter(|b| !self.pending_clear.contains(*b))
    }
}

/// A single edge cell in `A_R`: most node pairs connected by a relationship
/// type have exactly one edge between them, so the common case is stored
/// inline; multigraphs (several parallel edges of the same type) spill to
/// a `Vec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeCell {
    Single(EdgeId),
    Multi(Vec<EdgeId>),
}

impl EdgeCell {
    pub fn push(self, id: EdgeId) -> Self {
        match self {
            EdgeCell::Single(existing) => EdgeCell::Multi(vec![existing, id]),
            EdgeCell::Multi(mut ids) => {
                ids.push(id);
                EdgeCell::Multi(ids)
            }
        }
    }

    pub fn ids(&self) -> Vec<EdgeId> {
        match self {
            EdgeCell::Single(id) => vec![*id],
            EdgeCell::Multi(ids) => ids.clone(),
        }
    }

    pub fn remove(&self, id: EdgeId) -> Option<EdgeCell> {
        match self {
            EdgeCell::Single(existing) if *existing == id => None,
            EdgeCell::Single(_) => Some(self.clone()),
            EdgeCell::Multi(ids) => {
                let remaining: Vec<EdgeId> = ids.iter().copied().filter(|e| *e != id).collect();
                match remaining.len() {
                    0 => None,
                    1 => Some(EdgeCell::Single(remaining[0])),
                    _ => Some(EdgeCell::Multi(remaining)),
                }
            }
        }
    }
}

/// One relationship type's adjacency: an existence bitmap for fast
/// `expand()` iteration plus a sparse cell map resolving `(src, dest)` to
/// the actual edge id(s).
#[derive(Debug, Clone, Default)]
pub struct RelationMatrix {
    outgoing: HashMap<u32, RoaringBitmap>,
    incoming: HashMap<u32, RoaringBitmap>,
    cells: HashMap<(u32, u32), EdgeCell>,
}

impl RelationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: NodeId, dest: NodeId, edge: EdgeId) {
        let (s, d) = (truncate(src.get()), truncate(dest.get()));
        self.outgoing.entry(s).or_default().insert(d);
        self.incoming.entry(d).or_default().insert(s);
        self.cells
            .entry((s, d))
            .and_modify(|cell| *cell = cell.clone().push(edge))
            .or_insert(EdgeCell::Single(edge));
    }

    pub fn remove(&mut self, src: NodeId, dest: NodeId, edge: EdgeId) {
        let (s, d) = (truncate(src.get()), truncate(dest.get()));
        let remove_bitmap_entry = match self.cells.get(&(s, d)) {
            Some(cell) => match cell.remove(edge) {
                Some(updated) => {
                    self.cells.insert((s, d), updated);
                    false
                }
                None => {
                    self.cells.remove(&(s, d));
                    true
                }
            },
            None => false,
        };
        if remove_bitmap_entry {
            if let Some(bm) = self.outgoing.get_mut(&s) {
                bm.remove(d);
            }
            if let Some(bm) = self.incoming.get_mut(&d) {
                bm.remove(s);
            }
        }
    }

    pub fn edges_between(&self, src: NodeId, dest: NodeId) -> Vec<EdgeId> {
        let (s, d) = (truncate(src.get()), truncate(dest.get()));
        self.cells.get(&(s, d)).map(|c| c.ids()).unwrap_or_default()
    }

    /// All destinations reachable from `src` by an outgoing edge of this
    /// type.
    pub fn successors(&self, src: NodeId) -> Vec<NodeId> {
        self.outgoing
            .get(&truncate(src.get()))
            .map(|bm| bm.iter().map(|d| NodeId::new(d as u64).unwrap()).collect())
            .unwrap_or_default()
    }

    /// All sources with an outgoing edge of this type landing on `dest`.
    pub fn predecessors(&self, dest: NodeId) -> Vec<NodeId> {
        self.incoming
            .get(&truncate(dest.get()))
            .map(|bm| bm.iter().map(|s| NodeId::new(s as u64).unwrap()).collect())
            .unwrap_or_default()
    }

    /// `sync` is a no-op for `RelationMatrix` today — the cell map is
    /// always consistent immediately — but kept symmetric with
    /// `RoaringMatrix::sync` so callers can apply one policy uniformly
    /// across a store's whole matrix set.
    pub fn sync(&mut self, _policy: SyncPolicy) {}
}
