//! The undo log: an append-only, reversible record of every mutation a
//! query performs, making the query atomic under failure (§3.6, §4.8).
//!
//! Every mutation operator calls the matching `record_*` method *before*
//! the change becomes externally visible. On success the log is simply
//! dropped. On error or timeout, [`UndoLog::rollback`] walks the log in
//! reverse, groups contiguous runs of the same operation kind, and replays
//! each group's inverse against the store.

use crate::attribute_set::AttributeSet;
use crate::graph::store::GraphStore;
use crate::types::{AttrId, EdgeId, LabelId, NodeId, RelTypeId};
use crate::value::V;

#[derive(Debug, Clone)]
enum UndoOp {
    CreateNode { id: NodeId },
    CreateEdge { id: EdgeId },
    DeleteNode { id: NodeId, labels: Vec<LabelId>, attrs: AttributeSet },
    DeleteEdge { id: EdgeId, rel_type: RelTypeId, src: NodeId, dest: NodeId, attrs: AttributeSet },
    UpdateNodeAttr { id: NodeId, attr: AttrId, old: Option<V> },
    UpdateEdgeAttr { id: EdgeId, attr: AttrId, old: Option<V> },
    SetLabels { id: NodeId, labels: Vec<LabelId> },
    RemoveLabels { id: NodeId, labels: Vec<LabelId> },
    AddLabelSchema,
    AddRelTypeSchema,
    AddAttrSchema,
}

/// Discriminant used to group contiguous runs of the same kind (§4.8 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    CreateNode,
    CreateEdge,
    DeleteNode,
    DeleteEdge,
    UpdateNodeAttr,
    UpdateEdgeAttr,
    SetLabels,
    RemoveLabels,
    AddLabelSchema,
    AddRelTypeSchema,
    AddAttrSchema,
}

impl UndoOp {
    fn kind(&self) -> Kind {
        match self {
            UndoOp::CreateNode { .. } => Kind::CreateNode,
            UndoOp::CreateEdge { .. } => Kind::CreateEdge,
            UndoOp::DeleteNode { .. } => Kind::DeleteNode,
            UndoOp::DeleteEdge { .. } => Kind::DeleteEdge,
            UndoOp::UpdateNodeAttr { .. } => Kind::UpdateNodeAttr,
            UndoOp::UpdateEdgeAttr { .. } => Kind::UpdateEdgeAttr,
            UndoOp::SetLabels { .. } => Kind::SetLabels,
            UndoOp::RemoveLabels { .. } => Kind::RemoveLabels,
            UndoOp::AddLabelSchema => Kind::AddLabelSchema,
            UndoOp::AddRelTypeSchema => Kind::AddRelTypeSchema,
            UndoOp::AddAttrSchema => Kind::AddAttrSchema,
        }
    }
}

/// Per-query mutation journal. Lives on the `QueryCtx` for the duration of
/// one query; discarded on commit, replayed on abort.
#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    ops: Vec<UndoOp>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn record_create_node(&mut self, id: NodeId) {
        self.ops.push(UndoOp::CreateNode { id });
    }

    pub fn record_create_edge(&mut self, id: EdgeId) {
        self.ops.push(UndoOp::CreateEdge { id });
    }

    pub fn record_delete_node(&mut self, id: NodeId, labels: Vec<LabelId>, attrs: AttributeSet) {
        self.ops.push(UndoOp::DeleteNode { id, labels, attrs });
    }

    pub fn record_delete_edge(&mut self, id: EdgeId, rel_type: RelTypeId, src: NodeId, dest: NodeId, attrs: AttributeSet) {
        self.ops.push(UndoOp::DeleteEdge { id, rel_type, src, dest, attrs });
    }

    pub fn record_update_node_attr(&mut self, id: NodeId, attr: AttrId, old: Option<V>) {
        self.ops.push(UndoOp::UpdateNodeAttr { id, attr, old });
    }

    pub fn record_update_edge_attr(&mut self, id: EdgeId, attr: AttrId, old: Option<V>) {
        self.ops.push(UndoOp::UpdateEdgeAttr { id, attr, old });
    }

    pub fn record_set_labels(&mut self, id: NodeId, labels: Vec<LabelId>) {
        if !labels.is_empty() {
            self.ops.push(UndoOp::SetLabels { id, labels });
        }
    }

    pub fn record_remove_labels(&mut self, id: NodeId, labels: Vec<LabelId>) {
        if !labels.is_empty() {
            self.ops.push(UndoOp::RemoveLabels { id, labels });
        }
    }

    pub fn record_add_label_schema(&mut self) {
        self.ops.push(UndoOp::AddLabelSchema);
    }

    pub fn record_add_rel_type_schema(&mut self) {
        self.ops.push(UndoOp::AddRelTypeSchema);
    }

    pub fn record_add_attr_schema(&mut self) {
        self.ops.push(UndoOp::AddAttrSchema);
    }

    /// Replay the log in reverse against `store`, restoring it to its
    /// pre-query state. Returns the number of entries reverted (surfaced to
    /// `observability::Operation::UndoRollback`).
    pub fn rollback(&mut self, store: &mut GraphStore) -> usize {
        let ops: Vec<UndoOp> = std::mem::take(&mut self.ops).into_iter().rev().collect();
        let mut reverted = 0;
        let mut i = 0;
        while i < ops.len() {
            let kind = ops[i].kind();
            let mut j = i;
            while j < ops.len() && ops[j].kind() == kind {
                j += 1;
            }
            for op in &ops[i..j] {
                Self::undo_one(store, op);
                reverted += 1;
            }
            i = j;
        }
        reverted
    }

    fn undo_one(store: &mut GraphStore, op: &UndoOp) {
        match op {
            UndoOp::CreateNode { id } => {
                let _ = store.delete_node(*id);
            }
            UndoOp::CreateEdge { id } => {
                let _ = store.delete_edge(*id);
            }
            UndoOp::DeleteNode { id, labels, attrs } => {
                store.restore_node(*id, labels.clone(), attrs.clone());
            }
            UndoOp::DeleteEdge { id, rel_type, src, dest, attrs } => {
                store.restore_edge(*id, *rel_type, *src, *dest, attrs.clone());
            }
            UndoOp::UpdateNodeAttr { id, attr, old } => {
                let value = old.clone().unwrap_or(V::Null);
                let _ = store.set_node_attr(*id, *attr, value);
            }
            UndoOp::UpdateEdgeAttr { id, attr, old } => {
                let value = old.clone().unwrap_or(V::Null);
                let _ = store.set_edge_attr(*id, *attr, value);
            }
            UndoOp::SetLabels { id, labels } => {
                let _ = store.remove_labels(*id, labels);
            }
            UndoOp::RemoveLabels { id, labels } => {
                let _ = store.add_labels(*id, labels);
            }
            UndoOp::AddLabelSchema => store.schema_mut().pop_label(),
            UndoOp::AddRelTypeSchema => store.schema_mut().pop_rel_type(),
            UndoOp::AddAttrSchema => store.schema_mut().pop_attr(),
        }
    }
}
