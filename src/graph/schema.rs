//! Name interning for labels, relationship types and attributes, plus the
//! exact-match per-attribute index built on the generic B+ tree.

use crate::pure::btree::{self, BTreeRoot};
use crate::types::{AttrId, EdgeId, LabelId, NodeId, RelTypeId, SchemaName};
use crate::value::ops::total_order;
use crate::value::V;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sortable wrapper around [`V`] so it can key the generic B+ tree, which
/// requires `Ord`. Orders via [`total_order`] — the same total order used
/// by `ORDER BY` — so index range scans and `ORDER BY` agree on sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey(pub V);

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        total_order(&self.0, &other.0)
    }
}

/// Two-way name<->id interning table, shared by labels, relationship
/// types, and attribute names. Ids are handed out densely starting at 0
/// and are never reused even after a name is no longer referenced by any
/// live entity, so a stale `AttrId` in an old plan never silently refers
/// to a different attribute.
#[derive(Debug, Clone, Default)]
pub struct NameTable<Id> {
    by_name: HashMap<SchemaName, Id>,
    by_id: Vec<SchemaName>,
}

impl<Id> NameTable<Id>
where
    Id: Copy,
{
    pub fn new() -> Self {
        Self { by_name: HashMap::new(), by_id: Vec::new() }
    }

    pub fn resolve(&self, name: &SchemaName) -> Option<Id> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: usize) -> Option<&SchemaName> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Undo-log support for `add_schema` (§4.8): schema ids are only ever
    /// appended, so the entry to roll back is always the current tail.
    pub fn pop_last(&mut self) {
        if let Some(name) = self.by_id.pop() {
            self.by_name.remove(&name);
        }
    }
}

/// Schema catalog: owns the three interning tables and allocates fresh ids.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    labels: NameTable<LabelId>,
    rel_types: NameTable<RelTypeId>,
    attrs: NameTable<AttrId>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_label(&mut self, name: SchemaName) -> LabelId {
        self.get_or_create_label_reporting(name).0
    }

    /// Like [`Self::get_or_create_label`], but also reports whether this
    /// call is the one that actually created the schema entry (`AddSchema`
    /// in the original) versus returning an id that already existed —
    /// the signal mutation operators need to increment `labels_added` only
    /// once per distinct new label, not once per node that carries it.
    pub fn get_or_create_label_reporting(&mut self, name: SchemaName) -> (LabelId, bool) {
        if let Some(id) = self.labels.resolve(&name) {
            return (id, false);
        }
        let id = LabelId::new(self.labels.by_id.len() as u16);
        self.labels.by_name.insert(name.clone(), id);
        self.labels.by_id.push(name);
        (id, true)
    }

    pub fn get_or_create_rel_type(&mut self, name: SchemaName) -> RelTypeId {
        if let Some(id) = self.rel_types.resolve(&name) {
            return id;
        }
        let id = RelTypeId::new(self.rel_types.by_id.len() as u16);
        self.rel_types.by_name.insert(name.clone(), id);
        self.rel_types.by_id.push(name);
        id
    }

    pub fn get_or_create_attr(&mut self, name: SchemaName) -> crate::errors::QueryResult<AttrId> {
        if let Some(id) = self.attrs.resolve(&name) {
            return Ok(id);
        }
        let next = self.attrs.by_id.len();
        let id = AttrId::new(next as u16)
            .map_err(|_| crate::errors::QueryError::Internal("attribute id space exhausted".into()))?;
        self.attrs.by_name.insert(name.clone(), id);
        self.attrs.by_id.push(name);
        Ok(id)
    }

    pub fn label_name(&self, id: LabelId) -> Option<&SchemaName> {
        self.labels.name_of(id.get() as usize)
    }

    pub fn rel_type_name(&self, id: RelTypeId) -> Option<&SchemaName> {
        self.rel_types.name_of(id.get() as usize)
    }

    pub fn attr_name(&self, id: AttrId) -> Option<&SchemaName> {
        self.attrs.name_of(id.get() as usize)
    }

    pub fn resolve_label(&self, name: &SchemaName) -> Option<LabelId> {
        self.labels.resolve(name)
    }

    pub fn resolve_rel_type(&self, name: &SchemaName) -> Option<RelTypeId> {
        self.rel_types.resolve(name)
    }

    pub fn resolve_attr(&self, name: &SchemaName) -> Option<AttrId> {
        self.attrs.resolve(name)
    }

    /// Roll back the most recent `get_or_create_label` (undo log `add_schema`).
    pub fn pop_label(&mut self) {
        self.labels.pop_last();
    }

    /// Roll back the most recent `get_or_create_rel_type`.
    pub fn pop_rel_type(&mut self) {
        self.rel_types.pop_last();
    }

    /// Roll back the most recent `get_or_create_attr` (undo log `add_attribute`).
    pub fn pop_attr(&mut self) {
        self.attrs.pop_last();
    }
}

/// Which entity kind an [`ExactMatchIndex`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTarget {
    Node,
    Edge,
}

/// Exact-match (and range) index over one `(label, attribute)` pair,
/// backed by the generic B+ tree. One index key can map to several entity
/// ids (non-unique attribute values), so each leaf value is a small vec.
#[derive(Debug, Clone)]
pub struct ExactMatchIndex {
    pub target: IndexTarget,
    pub label: LabelId,
    pub attr: AttrId,
    tree: BTreeRoot<IndexKey, Vec<u64>>,
}

impl ExactMatchIndex {
    pub fn new(target: IndexTarget, label: LabelId, attr: AttrId) -> Self {
        Self { target, label, attr, tree: btree::create_empty_tree() }
    }

    pub fn insert(&mut self, key: V, id: u64) {
        let ik = IndexKey(key);
        let tree = std::mem::replace(&mut self.tree, btree::create_empty_tree());
        let mut ids = btree::search_in_tree(&tree, &ik).unwrap_or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
        self.tree = btree::insert_into_tree(tree, ik, ids).expect("index insert cannot fail");
    }

    pub fn remove(&mut self, key: &V, id: u64) {
        let ik = IndexKey(key.clone());
        let tree = std::mem::replace(&mut self.tree, btree::create_empty_tree());
        let Some(mut ids) = btree::search_in_tree(&tree, &ik) else {
            self.tree = tree;
            return;
        };
        ids.retain(|existing| *existing != id);
        self.tree = if ids.is_empty() {
            btree::delete_from_tree(tree, &ik).expect("index delete cannot fail")
        } else {
            btree::insert_into_tree(tree, ik, ids).expect("index insert cannot fail")
        };
    }

    pub fn seek(&self, key: &V) -> Vec<u64> {
        btree::search_in_tree(&self.tree, &IndexKey(key.clone())).unwrap_or_default()
    }

    /// Range scan `[lo, hi)`, used by index push-down for `<`/`<=`/`>`/`>=`
    /// predicates once the filter tree has tightened the bound (see
    /// `filter::range`).
    pub fn range(&self, lo: Option<&V>, hi: Option<&V>) -> Vec<u64> {
        let lo_key = lo.map(|v| IndexKey(v.clone()));
        let hi_key = hi.map(|v| IndexKey(v.clone()));
        btree::range_in_tree(&self.tree, lo_key.as_ref(), hi_key.as_ref())
            .into_iter()
            .flat_map(|(_, ids)| ids)
            .collect()
    }

    pub fn len(&self) -> usize {
        btree::count_total_keys(&self.tree)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_interning_is_idempotent() {
        let mut s = Schema::new();
        let a = s.get_or_create_label(SchemaName::new("Person").unwrap());
        let b = s.get_or_create_label(SchemaName::new("Person").unwrap());
        assert_eq!(a, b);
        assert_eq!(s.label_name(a).unwrap().as_str(), "Person");
    }

    #[test]
    fn distinct_names_get_distinct_ids() {
        let mut s = Schema::new();
        let a = s.get_or_create_rel_type(SchemaName::new("KNOWS").unwrap());
        let b = s.get_or_create_rel_type(SchemaName::new("LIKES").unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn exact_match_index_seek_and_range() {
        let mut idx = ExactMatchIndex::new(
            IndexTarget::Node,
            LabelId::new(0),
            AttrId::new(0).unwrap(),
        );
        idx.insert(V::Int64(10), 1);
        idx.insert(V::Int64(20), 2);
        idx.insert(V::Int64(10), 3);

        let mut hits = idx.seek(&V::Int64(10));
        hits.sort();
        assert_eq!(hits, vec![1, 3]);

        let range_hits = idx.range(Some(&V::Int64(15)), None);
        assert_eq!(range_hits, vec![2]);
    }

    #[test]
    fn exact_match_index_remove_shrinks_bucket() {
        let mut idx = ExactMatchIndex::new(
            IndexTarget::Node,
            LabelId::new(0),
            AttrId::new(0).unwrap(),
        );
        idx.insert(V::Int64(10), 1);
        idx.insert(V::Int64(10), 2);
        idx.remove(&V::Int64(10), 1);
        assert_eq!(idx.seek(&V::Int64(10)), vec![2]);
        idx.remove(&V::Int64(10), 2);
        assert!(idx.seek(&V::Int64(10)).is_empty());
        assert!(idx.is_empty());
    }

    #[allow(unused)]
    fn node_edge_ids_distinguish(_a: NodeId, _b: EdgeId) {}
}
