//! Constraint engine (§3.8, §4.9): mandatory and unique constraints over a
//! label's or relationship-type's attribute set.
//!
//! A constraint is born `Pending` the moment it is declared — existing
//! entities haven't been checked yet — and transitions to `Active` once a
//! batched enforcement pass confirms every live entity satisfies it, or to
//! `Failed` the moment a violation is found. Enforcement processes entities
//! in fixed-size batches (§4.9: 10,000 nodes / 1,000 edges), handing the
//! caller a yield point between batches so a host can release its writer
//! lock rather than hold it for one pass over the whole graph.
//!
//! Grounded on the original's `src/constraint/mandatory_constraint.c` and
//! `.../unique_constraint.c` (§10.5): kept as two distinct enforcement
//! loops rather than one parameterized one, matching that structure,
//! including the "arrays and paths vacuously satisfy uniqueness" rule.

use crate::errors::{QueryError, QueryResult};
use crate::graph::schema::{ExactMatchIndex, IndexTarget};
use crate::graph::store::GraphStore;
use crate::types::{AttrId, EdgeId, LabelId, NodeId, RelTypeId};
use crate::value::V;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Batch size a mandatory/unique enforcement pass processes before handing
/// control back to the caller (§4.9).
pub const NODE_BATCH_SIZE: usize = 10_000;
pub const EDGE_BATCH_SIZE: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Mandatory,
    Unique,
}

impl ConstraintKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::Mandatory => "mandatory",
            ConstraintKind::Unique => "unique",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Node,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintStatus {
    Pending,
    Active,
    Failed,
}

/// A label or relationship-type id, whichever `entity_type` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaId {
    Label(LabelId),
    RelType(RelTypeId),
}

/// One declared constraint. `pending_changes` starts at 1 (the initial
/// "not yet enforced" sweep owed to every existing entity) and is bumped
/// by [`Constraint::note_mutation`] whenever a write touches an entity the
/// constraint covers while enforcement is in flight, so a pass that races
/// a concurrent writer knows to run again rather than declare victory
/// against a stale snapshot.
#[derive(Debug)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub entity_type: EntityType,
    pub schema_id: SchemaId,
    pub attr_ids: Vec<AttrId>,
    pending_changes: AtomicU32,
    status: Mutex<ConstraintStatus>,
    failure_reason: Mutex<Option<String>>,
}

impl Constraint {
    pub fn new_pending(kind: ConstraintKind, entity_type: EntityType, schema_id: SchemaId, attr_ids: Vec<AttrId>) -> Self {
        Self {
            kind,
            entity_type,
            schema_id,
            attr_ids,
            pending_changes: AtomicU32::new(1),
            status: Mutex::new(ConstraintStatus::Pending),
            failure_reason: Mutex::new(None),
        }
    }

    pub fn status(&self) -> ConstraintStatus {
        *self.status.lock()
    }

    pub fn pending_changes(&self) -> u32 {
        self.pending_changes.load(Ordering::Acquire)
    }

    /// Record that a write touched an entity under this constraint's
    /// schema while a pass may be mid-flight.
    pub fn note_mutation(&self) {
        self.pending_changes.fetch_add(1, Ordering::AcqRel);
    }

    fn mark_active(&self) {
        *self.status.lock() = ConstraintStatus::Active;
    }

    fn mark_failed(&self, reason: String) {
        *self.status.lock() = ConstraintStatus::Failed;
        *self.failure_reason.lock() = Some(reason);
    }

    pub fn failure_reason(&self) -> Option<String> {
        self.failure_reason.lock().clone()
    }
}

/// Every constraint declared against a graph, in declaration order — the
/// set `db.constraints()` (§10.5, `procedures::list_constraints`) walks.
#[derive(Debug, Default)]
pub struct ConstraintRegistry {
    constraints: Vec<Constraint>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

fn schema_name(store: &GraphStore, schema_id: SchemaId) -> String {
    match schema_id {
        SchemaId::Label(l) => store.schema().label_name(l).map(|n| n.to_string()).unwrap_or_default(),
        SchemaId::RelType(r) => store.schema().rel_type_name(r).map(|n| n.to_string()).unwrap_or_default(),
    }
}

fn attr_names(store: &GraphStore, attr_ids: &[AttrId]) -> Vec<String> {
    attr_ids.iter().map(|a| store.schema().attr_name(*a).map(|n| n.to_string()).unwrap_or_default()).collect()
}

fn node_ids_for(store: &GraphStore, schema_id: SchemaId) -> Vec<NodeId> {
    match schema_id {
        SchemaId::Label(l) => store.nodes_with_label(l),
        SchemaId::RelType(_) => Vec::new(),
    }
}

fn edge_ids_for(store: &GraphStore, schema_id: SchemaId) -> Vec<EdgeId> {
    match schema_id {
        SchemaId::RelType(r) => store.all_edge_ids().filter(|id| store.get_edge(*id).map(|e| e.rel_type == r).unwrap_or(false)).collect(),
        SchemaId::Label(_) => Vec::new(),
    }
}

/// Run a mandatory-constraint pass: every covered entity must carry every
/// attribute in `attr_ids`. Batches of [`NODE_BATCH_SIZE`]/[`EDGE_BATCH_SIZE`]
/// are processed with `on_batch_boundary` called between them — the hook a
/// host wires to release and reacquire its writer lock (§4.9, §5).
fn enforce_mandatory(constraint: &Constraint, store: &GraphStore, on_batch_boundary: &mut dyn FnMut()) -> QueryResult<()> {
    match constraint.entity_type {
        EntityType::Node => {
            let ids = node_ids_for(store, constraint.schema_id);
            for chunk in ids.chunks(NODE_BATCH_SIZE) {
                for &id in chunk {
                    let Some(node) = store.get_node(id) else { continue };
                    for attr in &constraint.attr_ids {
                        if !node.attrs.contains(*attr) {
                            return Err(missing_attr_error(store, constraint, id.to_string()));
                        }
                    }
                }
                on_batch_boundary();
            }
        }
        EntityType::Edge => {
            let ids = edge_ids_for(store, constraint.schema_id);
            for chunk in ids.chunks(EDGE_BATCH_SIZE) {
                for &id in chunk {
                    let Some(edge) = store.get_edge(id) else { continue };
                    for attr in &constraint.attr_ids {
                        if !edge.attrs.contains(*attr) {
                            return Err(missing_attr_error(store, constraint, id.to_string()));
                        }
                    }
                }
                on_batch_boundary();
            }
        }
    }
    Ok(())
}

fn missing_attr_error(store: &GraphStore, constraint: &Constraint, entity: String) -> QueryError {
    QueryError::constraint_violation(
        schema_name(store, constraint.schema_id),
        attr_names(store, &constraint.attr_ids),
        format!("entity {entity} is missing a mandatory attribute"),
    )
}

/// A unique constraint's composite key: the constrained attributes' values
/// in declaration order. An array or path member makes the whole key
/// vacuously unique (never collides with anything, including itself) per
/// the original's `unique_constraint.c` — uniqueness is defined over
/// scalar keys only.
fn composite_key(attrs: &crate::attribute_set::AttributeSet, attr_ids: &[AttrId]) -> Option<Vec<V>> {
    let mut key = Vec::with_capacity(attr_ids.len());
    for attr in attr_ids {
        let v = attrs.get(*attr).cloned().unwrap_or(V::Null);
        if matches!(v, V::Array(_) | V::Path(_)) {
            return None;
        }
        key.push(v);
    }
    Some(key)
}

/// A scratch `ExactMatchIndex` seeded once per enforcement pass, keyed by
/// the composite value itself (`V::Array(key)`) rather than a hash fold —
/// `seek` walks the same B+ tree `create_index` builds for a real schema
/// index, so two composite keys only collide when they actually compare
/// equal under [`crate::value::ops::total_order`], not when a 64-bit hash
/// happens to fold the same way.
fn new_scratch_index(constraint: &Constraint) -> ExactMatchIndex {
    let target = match constraint.entity_type {
        EntityType::Node => IndexTarget::Node,
        EntityType::Edge => IndexTarget::Edge,
    };
    let label = match constraint.schema_id {
        SchemaId::Label(l) => l,
        SchemaId::RelType(_) => LabelId::new(0),
    };
    let attr = constraint.attr_ids.first().copied().unwrap_or(AttrId::NONE);
    ExactMatchIndex::new(target, label, attr)
}

/// Run a unique-constraint pass: no two covered entities may share the
/// same composite key over `attr_ids`. A key containing an array or path
/// value is skipped (vacuously unique).
fn enforce_unique(constraint: &Constraint, store: &GraphStore, on_batch_boundary: &mut dyn FnMut()) -> QueryResult<()> {
    let mut seen = new_scratch_index(constraint);
    match constraint.entity_type {
        EntityType::Node => {
            let ids = node_ids_for(store, constraint.schema_id);
            for chunk in ids.chunks(NODE_BATCH_SIZE) {
                for &id in chunk {
                    let Some(node) = store.get_node(id) else { continue };
                    let Some(key) = composite_key(&node.attrs, &constraint.attr_ids) else { continue };
                    let composite = V::array(key);
                    if seen.seek(&composite).iter().any(|&prior| prior != id.get()) {
                        return Err(duplicate_key_error(store, constraint));
                    }
                    seen.insert(composite, id.get());
                }
                on_batch_boundary();
            }
        }
        EntityType::Edge => {
            let ids = edge_ids_for(store, constraint.schema_id);
            for chunk in ids.chunks(EDGE_BATCH_SIZE) {
                for &id in chunk {
                    let Some(edge) = store.get_edge(id) else { continue };
                    let Some(key) = composite_key(&edge.attrs, &constraint.attr_ids) else { continue };
                    let composite = V::array(key);
                    if seen.seek(&composite).iter().any(|&prior| prior != id.get()) {
                        return Err(duplicate_key_error(store, constraint));
                    }
                    seen.insert(composite, id.get());
                }
                on_batch_boundary();
            }
        }
    }
    Ok(())
}

fn duplicate_key_error(store: &GraphStore, constraint: &Constraint) -> QueryError {
    QueryError::constraint_violation(
        schema_name(store, constraint.schema_id),
        attr_names(store, &constraint.attr_ids),
        "duplicate value for a unique constraint".to_string(),
    )
}

/// Run one enforcement pass over `constraint` against `store`, transitioning
/// it to `Active` on success or `Failed` on the first violation found.
/// Drains [`Constraint::pending_changes`] down to zero before declaring
/// victory — a concurrent mutation bumping the counter mid-pass means the
/// pass must run again rather than trust a snapshot a writer has since
/// invalidated.
pub fn enforce(constraint: &Constraint, store: &GraphStore, on_batch_boundary: &mut dyn FnMut()) {
    loop {
        let before = constraint.pending_changes();
        if before == 0 {
            break;
        }
        let result = match constraint.kind {
            ConstraintKind::Mandatory => enforce_mandatory(constraint, store, on_batch_boundary),
            ConstraintKind::Unique => enforce_unique(constraint, store, on_batch_boundary),
        };
        if let Err(e) = result {
            constraint.mark_failed(e.to_string());
            return;
        }
        // Only clear the changes this pass actually observed — a mutation
        // recorded after `before` was read must trigger another pass.
        constraint.pending_changes.fetch_sub(before, Ordering::AcqRel);
    }
    constraint.mark_active();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaName;

    fn setup() -> (GraphStore, LabelId, AttrId) {
        let mut store = GraphStore::new();
        let person = store.schema_mut().get_or_create_label(SchemaName::new("Person").unwrap());
        let email = store.schema_mut().get_or_create_attr(SchemaName::new("email").unwrap()).unwrap();
        (store, person, email)
    }

    #[test]
    fn mandatory_constraint_activates_when_all_entities_have_the_attribute() {
        let (mut store, person, email) = setup();
        let n = store.create_node(vec![person]);
        store.set_node_attr(n, email, V::from("a@example.com")).unwrap();

        let c = Constraint::new_pending(ConstraintKind::Mandatory, EntityType::Node, SchemaId::Label(person), vec![email]);
        enforce(&c, &store, &mut || {});
        assert_eq!(c.status(), ConstraintStatus::Active);
    }

    #[test]
    fn mandatory_constraint_fails_when_an_entity_is_missing_the_attribute() {
        let (mut store, person, email) = setup();
        store.create_node(vec![person]);

        let c = Constraint::new_pending(ConstraintKind::Mandatory, EntityType::Node, SchemaId::Label(person), vec![email]);
        enforce(&c, &store, &mut || {});
        assert_eq!(c.status(), ConstraintStatus::Failed);
        assert!(c.failure_reason().is_some());
    }

    #[test]
    fn unique_constraint_fails_on_duplicate_values() {
        let (mut store, person, email) = setup();
        let a = store.create_node(vec![person]);
        let b = store.create_node(vec![person]);
        store.set_node_attr(a, email, V::from("dup@example.com")).unwrap();
        store.set_node_attr(b, email, V::from("dup@example.com")).unwrap();

        let c = Constraint::new_pending(ConstraintKind::Unique, EntityType::Node, SchemaId::Label(person), vec![email]);
        enforce(&c, &store, &mut || {});
        assert_eq!(c.status(), ConstraintStatus::Failed);
    }

    #[test]
    fn unique_constraint_activates_when_every_key_is_distinct() {
        let (mut store, person, email) = setup();
        let a = store.create_node(vec![person]);
        let b = store.create_node(vec![person]);
        store.set_node_attr(a, email, V::from("a@example.com")).unwrap();
        store.set_node_attr(b, email, V::from("b@example.com")).unwrap();

        let c = Constraint::new_pending(ConstraintKind::Unique, EntityType::Node, SchemaId::Label(person), vec![email]);
        enforce(&c, &store, &mut || {});
        assert_eq!(c.status(), ConstraintStatus::Active);
    }

    #[test]
    fn unique_constraint_ignores_array_valued_keys() {
        let (mut store, person, email) = setup();
        let a = store.create_node(vec![person]);
        let b = store.create_node(vec![person]);
        store.set_node_attr(a, email, V::array(vec![V::from("x")])).unwrap();
        store.set_node_attr(b, email, V::array(vec![V::from("x")])).unwrap();

        let c = Constraint::new_pending(ConstraintKind::Unique, EntityType::Node, SchemaId::Label(person), vec![email]);
        enforce(&c, &store, &mut || {});
        assert_eq!(c.status(), ConstraintStatus::Active);
    }

    #[test]
    fn batch_boundary_hook_runs_once_per_batch() {
        let (mut store, person, email) = setup();
        for _ in 0..5 {
            let n = store.create_node(vec![person]);
            store.set_node_attr(n, email, V::from("x")).unwrap();
        }
        let c = Constraint::new_pending(ConstraintKind::Mandatory, EntityType::Node, SchemaId::Label(person), vec![email]);
        let mut boundaries = 0;
        enforce(&c, &store, &mut || boundaries += 1);
        assert_eq!(boundaries, 1);
    }
}
