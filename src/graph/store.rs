//! `GraphStore`: the mutable graph — dense node/edge tables, the sparse
//! label/relation matrices, the schema catalog, and the attribute indexes
//! layered over it.

use crate::attribute_set::{AttributeSet, SetOutcome};
use crate::errors::{QueryError, QueryResult};
use crate::graph::entities::{Edge, Node};
use crate::graph::matrix::{RelationMatrix, RoaringMatrix, SyncPolicy};
use crate::graph::schema::{ExactMatchIndex, IndexTarget, Schema};
use crate::types::{AttrId, EdgeId, LabelId, NodeId, RelTypeId};
use crate::value::V;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    next_node_id: u64,
    next_edge_id: u64,
    label_matrices: HashMap<LabelId, RoaringMatrix>,
    relation_matrices: HashMap<RelTypeId, RelationMatrix>,
    schema: Schema,
    indexes: HashMap<(IndexTarget, LabelId, AttrId), ExactMatchIndex>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    // ---- node lifecycle -------------------------------------------------

    pub fn create_node(&mut self, labels: Vec<LabelId>) -> NodeId {
        let id = NodeId::new(self.next_node_id).expect("node id space exhausted");
        self.next_node_id += 1;
        let mut node = Node::new(id);
        for label in labels {
            node.add_label(label);
            self.label_matrices.entry(label).or_default().set(id);
        }
        let idx = id.get() as usize;
        if self.nodes.len() <= idx {
            self.nodes.resize(idx + 1, None);
        }
        self.nodes[idx] = Some(node);
        id
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.get() as usize).and_then(|n| n.as_ref())
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.get() as usize).and_then(|n| n.as_mut())
    }

    /// Remove a node. Errors if the node still has incident edges — callers
    /// (the `delete` operator, `DETACH DELETE`) are responsible for
    /// removing edges first.
    pub fn delete_node(&mut self, id: NodeId) -> QueryResult<()> {
        let idx = id.get() as usize;
        let Some(Some(node)) = self.nodes.get(idx) else {
            return Err(QueryError::RuntimeError(format!("node {id} does not exist")));
        };
        for label in node.labels.clone() {
            if let Some(m) = self.label_matrices.get_mut(&label) {
                m.clear(id);
            }
        }
        self.nodes[idx] = None;
        Ok(())
    }

    /// Re-create a node that was previously deleted, preserving its
    /// original id, labels and attributes. Used only by [`crate::undo_log`]
    /// rollback — the id allocator is left untouched since `id` was already
    /// handed out before the delete this call is undoing.
    pub fn restore_node(&mut self, id: NodeId, labels: Vec<LabelId>, attrs: AttributeSet) {
        let idx = id.get() as usize;
        if self.nodes.len() <= idx {
            self.nodes.resize(idx + 1, None);
        }
        let mut node = Node::new(id);
        for label in &labels {
            node.add_label(*label);
            self.label_matrices.entry(*label).or_default().set(id);
        }
        node.attrs = attrs;
        self.nodes[idx] = Some(node);
    }

    /// Add or remove label bits for a node already in the store, returning
    /// the set of labels actually added (resp. removed) so the undo log can
    /// record exactly what changed.
    pub fn add_labels(&mut self, id: NodeId, labels: &[LabelId]) -> Vec<LabelId> {
        let mut added = Vec::new();
        if let Some(node) = self.get_node_mut(id) {
            for label in labels {
                if !node.has_label(*label) {
                    node.add_label(*label);
                    added.push(*label);
                }
            }
        }
        for label in &added {
            self.label_matrices.entry(*label).or_default().set(id);
        }
        added
    }

    pub fn remove_labels(&mut self, id: NodeId, labels: &[LabelId]) -> Vec<LabelId> {
        let mut removed = Vec::new();
        if let Some(node) = self.get_node_mut(id) {
            for label in labels {
                if node.remove_label(*label) {
                    removed.push(*label);
                }
            }
        }
        for label in &removed {
            if let Some(m) = self.label_matrices.get_mut(label) {
                m.clear(id);
            }
        }
        removed
    }

    pub fn node_has_label(&self, id: NodeId, label: LabelId) -> bool {
        self.label_matrices.get(&label).map(|m| m.contains(id)).unwrap_or(false)
    }

    pub fn nodes_with_label(&self, label: LabelId) -> Vec<NodeId> {
        self.label_matrices
            .get(&label)
            .map(|m| m.iter().map(|id| NodeId::new(id as u64).unwrap()).collect())
            .unwrap_or_default()
    }

    pub fn all_node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| n.as_ref().map(|_| NodeId::new(i as u64).unwrap()))
    }

    pub fn all_edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().enumerate().filter_map(|(i, e)| e.as_ref().map(|_| EdgeId::new(i as u64).unwrap()))
    }

    /// One past the highest node id ever handed out. Bounds `AllNodeScan`'s
    /// id sweep so it terminates at the allocator's current high-water
    /// mark instead of walking towards `u64::MAX`.
    pub fn node_capacity(&self) -> u64 {
        self.nodes.len() as u64
    }

    /// One past the highest edge id ever handed out.
    pub fn edge_capacity(&self) -> u64 {
        self.edges.len() as u64
    }

    // ---- edge lifecycle ---------------------------------------------------

    pub fn create_edge(&mut self, rel_type: RelTypeId, src: NodeId, dest: NodeId) -> QueryResult<EdgeId> {
        if self.get_node(src).is_none() || self.get_node(dest).is_none() {
            return Err(QueryError::RuntimeError("edge endpoints must exist".into()));
        }
        let id = EdgeId::new(self.next_edge_id).expect("edge id space exhausted");
        self.next_edge_id += 1;
        let idx = id.get() as usize;
        if self.edges.len() <= idx {
            self.edges.resize(idx + 1, None);
        }
        self.edges[idx] = Some(Edge::new(id, rel_type, src, dest));
        self.relation_matrices.entry(rel_type).or_default().insert(src, dest, id);
        Ok(id)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.get() as usize).and_then(|e| e.as_ref())
    }

    pub fn get_edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.get() as usize).and_then(|e| e.as_mut())
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> QueryResult<()> {
        let idx = id.get() as usize;
        let Some(Some(edge)) = self.edges.get(idx) else {
            return Err(QueryError::RuntimeError(format!("edge {id} does not exist")));
        };
        let (rel_type, src, dest) = (edge.rel_type, edge.src, edge.dest);
        if let Some(m) = self.relation_matrices.get_mut(&rel_type) {
            m.remove(src, dest, id);
        }
        self.edges[idx] = None;
        Ok(())
    }

    /// Re-create an edge that was previously deleted, preserving its
    /// original id, endpoints and attributes. Undo-log rollback only.
    pub fn restore_edge(&mut self, id: EdgeId, rel_type: RelTypeId, src: NodeId, dest: NodeId, attrs: AttributeSet) {
        let idx = id.get() as usize;
        if self.edges.len() <= idx {
            self.edges.resize(idx + 1, None);
        }
        let mut edge = Edge::new(id, rel_type, src, dest);
        edge.attrs = attrs;
        self.edges[idx] = Some(edge);
        self.relation_matrices.entry(rel_type).or_default().insert(src, dest, id);
    }

    pub fn expand(&self, src: NodeId, rel_type: RelTypeId) -> Vec<(EdgeId, NodeId)> {
        let Some(matrix) = self.relation_matrices.get(&rel_type) else { return Vec::new() };
        matrix
            .successors(src)
            .into_iter()
            .flat_map(|dest| matrix.edges_between(src, dest).into_iter().map(move |e| (e, dest)))
            .collect()
    }

    pub fn expand_incoming(&self, dest: NodeId, rel_type: RelTypeId) -> Vec<(EdgeId, NodeId)> {
        let Some(matrix) = self.relation_matrices.get(&rel_type) else { return Vec::new() };
        matrix
            .predecessors(dest)
            .into_iter()
            .flat_map(|src| matrix.edges_between(src, dest).into_iter().map(move |e| (e, src)))
            .collect()
    }

    /// Apply `policy` to every label and relation matrix — called after a
    /// mutation batch (a `CREATE`/`MERGE` clause's `PendingCreations`)
    /// commits, per §4.2's matrix sync policy.
    pub fn sync_matrices(&mut self, policy: SyncPolicy) {
        for m in self.label_matrices.values_mut() {
            m.sync(policy);
        }
        for m in self.relation_matrices.values_mut() {
            m.sync(policy);
        }
    }

    // ---- indexes ----------------------------------------------------------

    pub fn create_index(&mut self, target: IndexTarget, label: LabelId, attr: AttrId) {
        self.indexes.entry((target, label, attr)).or_insert_with(|| ExactMatchIndex::new(target, label, attr));
    }

    pub fn index_for(&self, target: IndexTarget, label: LabelId, attr: AttrId) -> Option<&ExactMatchIndex> {
        self.indexes.get(&(target, label, attr))
    }

    pub fn has_index(&self, target: IndexTarget, label: LabelId, attr: AttrId) -> bool {
        self.indexes.contains_key(&(target, label, attr))
    }

    /// Keep every index touching this attribute in sync with an attribute
    /// write. Called by the `update`/`create`/`merge` operators right
    /// after they mutate a node's `AttributeSet`.
    pub fn reindex_node_attr(&mut self, node: NodeId, label: LabelId, attr: AttrId, old: Option<&V>, new: Option<&V>) {
        if let Some(index) = self.indexes.get_mut(&(IndexTarget::Node, label, attr)) {
            if let Some(old_v) = old {
                index.remove(old_v, node.get());
            }
            if let Some(new_v) = new {
                index.insert(new_v.clone(), node.get());
            }
        }
    }

    /// Reindex an attribute write across every label currently carried by
    /// `node` — a write doesn't know in advance which of the node's labels
    /// (if any) have an index over this attribute.
    pub fn reindex_node_attr_all_labels(&mut self, node: NodeId, attr: AttrId, old: Option<&V>, new: Option<&V>) {
        let Some(n) = self.get_node(node) else { return };
        for label in n.labels.clone() {
            self.reindex_node_attr(node, label, attr, old, new);
        }
    }

    /// Set a node attribute, keeping every matching index in sync. Returns
    /// the previous value (`None` if the attribute was absent, which the
    /// undo log needs to record an `update_entity` entry) alongside the
    /// `AttributeSet::set` change tag, so a caller can tell a genuine write
    /// apart from a no-change `SET n.x = n.x`.
    pub fn set_node_attr(&mut self, id: NodeId, attr: AttrId, value: V) -> QueryResult<(Option<V>, SetOutcome)> {
        let Some(node) = self.get_node_mut(id) else {
            return Err(QueryError::RuntimeError(format!("node {id} does not exist")));
        };
        let old = node.attrs.get(attr).cloned();
        let outcome = node.attrs.set(attr, value.clone());
        let new = if value.is_null() { None } else { Some(&value) };
        self.reindex_node_attr_all_labels(id, attr, old.as_ref(), new);
        Ok((old, outcome))
    }

    pub fn set_edge_attr(&mut self, id: EdgeId, attr: AttrId, value: V) -> QueryResult<(Option<V>, SetOutcome)> {
        let Some(edge) = self.get_edge_mut(id) else {
            return Err(QueryError::RuntimeError(format!("edge {id} does not exist")));
        };
        let old = edge.attrs.get(attr).cloned();
        let outcome = edge.attrs.set(attr, value);
        Ok((old, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaName;

    #[test]
    fn create_node_registers_in_label_matrix() {
        let mut store = GraphStore::new();
        let person = store.schema_mut().get_or_create_label(SchemaName::new("Person").unwrap());
        let n = store.create_node(vec![person]);
        assert!(store.node_has_label(n, person));
        assert_eq!(store.nodes_with_label(person), vec![n]);
    }

    #[test]
    fn create_edge_requires_existing_endpoints() {
        let mut store = GraphStore::new();
        let rel = store.schema_mut().get_or_create_rel_type(SchemaName::new("KNOWS").unwrap());
        let bogus = NodeId::new(99).unwrap();
        assert!(store.create_edge(rel, bogus, bogus).is_err());
    }

    #[test]
    fn expand_finds_outgoing_edges() {
        let mut store = GraphStore::new();
        let rel = store.schema_mut().get_or_create_rel_type(SchemaName::new("KNOWS").unwrap());
        let a = store.create_node(vec![]);
        let b = store.create_node(vec![]);
        let e = store.create_edge(rel, a, b).unwrap();
        assert_eq!(store.expand(a, rel), vec![(e, b)]);
        assert_eq!(store.expand_incoming(b, rel), vec![(e, a)]);
    }

    #[test]
    fn delete_edge_removes_it_from_expand() {
        let mut store = GraphStore::new();
        let rel = store.schema_mut().get_or_create_rel_type(SchemaName::new("KNOWS").unwrap());
        let a = store.create_node(vec![]);
        let b = store.create_node(vec![]);
        let e = store.create_edge(rel, a, b).unwrap();
        store.delete_edge(e).unwrap();
        assert!(store.expand(a, rel).is_empty());
    }

    #[test]
    fn delete_node_clears_label_membership() {
        let mut store = GraphStore::new();
        let person = store.schema_mut().get_or_create_label(SchemaName::new("Person").unwrap());
        let n = store.create_node(vec![person]);
        store.delete_node(n).unwrap();
        assert!(!store.node_has_label(n, person));
        assert!(store.get_node(n).is_none());
    }

    #[test]
    fn reindex_node_attr_updates_index_bucket() {
        let mut store = GraphStore::new();
        let person = store.schema_mut().get_or_create_label(SchemaName::new("Person").unwrap());
        let age = store.schema_mut().get_or_create_attr(SchemaName::new("age").unwrap()).unwrap();
        store.create_index(IndexTarget::Node, person, age);
        let n = store.create_node(vec![person]);

        store.reindex_node_attr(n, person, age, None, Some(&V::Int64(30)));
        assert_eq!(store.index_for(IndexTarget::Node, person, age).unwrap().seek(&V::Int64(30)), vec![n.get()]);

        store.reindex_node_attr(n, person, age, Some(&V::Int64(30)), Some(&V::Int64(31)));
        assert!(store.index_for(IndexTarget::Node, person, age).unwrap().seek(&V::Int64(30)).is_empty());
        assert_eq!(store.index_for(IndexTarget::Node, person, age).unwrap().seek(&V::Int64(31)), vec![n.get()]);
    }
}
