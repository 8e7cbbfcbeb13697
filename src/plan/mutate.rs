//! Mutation operators (§4.7): `Create`/`Merge`/`MergeCreate`, `Update`,
//! `Delete`, all batching through [`PendingCreations`] — bulk-buffer
//! pending entities, then run a single commit phase (§4.7 "batching"):
//! (1) create missing schemas, (2) matrix policy → `resize`, (3) allocate
//! node/edge storage, (4) matrix policy → `nop`, (5) emit entities,
//! (6) restore default policy, (7) update statistics.
//!
//! Every mutation calls the matching `undo_log.record_*` before the change
//! becomes externally visible (§4.8), so a later error or timeout can
//! still roll the store back to its pre-query state.

use super::{check_cancelled, Operator, QueryCtx};
use crate::attribute_set::SetOutcome;
use crate::errors::QueryResult;
use crate::graph::entities::GraphEntity;
use crate::graph::matrix::SyncPolicy;
use crate::record::{Record, RecordSchema};
use crate::types::{LabelId, RelTypeId, SchemaName};
use crate::value::V;

/// One node this clause's pattern introduces, not bound to an existing
/// match — `(n:Person {name: 'a'})` in a `CREATE`/`MERGE` clause. Labels are
/// carried by name, not a pre-resolved `LabelId`: schema resolution for a
/// freshly-written label happens at materialization time (`AddSchema` in
/// the original's `create_functions.c`), which is what lets `labels_added`
/// count distinct new label schemas rather than per-node label writes.
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    pub dest_idx: usize,
    pub labels: Vec<SchemaName>,
    pub attrs: Vec<(crate::types::AttrId, crate::expr::Exp)>,
}

/// Resolve every label name on a template to its `LabelId`, crediting
/// `ctx.stats.labels_added` only for the names this call is the first ever
/// to register with the schema catalog.
fn resolve_labels(ctx: &mut QueryCtx, names: &[SchemaName]) -> Vec<LabelId> {
    names
        .iter()
        .map(|name| {
            let (id, created) = ctx.store.schema_mut().get_or_create_label_reporting(name.clone());
            if created {
                ctx.stats.labels_added += 1;
            }
            id
        })
        .collect()
}

/// One edge this clause's pattern introduces, referencing the two
/// endpoint aliases by their already-bound record index.
#[derive(Debug, Clone)]
pub struct EdgeTemplate {
    pub dest_idx: usize,
    pub rel_type: RelTypeId,
    pub src_idx: usize,
    pub dest_node_idx: usize,
    pub attrs: Vec<(crate::types::AttrId, crate::expr::Exp)>,
}

fn eval_attrs(ctx: &QueryCtx, record: &Record, attrs: &[(crate::types::AttrId, crate::expr::Exp)]) -> QueryResult<crate::attribute_set::AttributeSet> {
    let mut set = crate::attribute_set::AttributeSet::new();
    for (attr, exp) in attrs {
        let value = exp.eval(record, &|n, a| ctx.call_function(n, a))?;
        if !value.is_null() {
            set.set(*attr, value);
        }
    }
    Ok(set)
}

/// `CREATE`: unconditionally materializes every node/edge template in its
/// pattern for each input row, with no existence probe.
#[derive(Debug)]
pub struct Create {
    child: super::BoxOperator,
    schema: RecordSchema,
    nodes: Vec<NodeTemplate>,
    edges: Vec<EdgeTemplate>,
}

impl Create {
    pub fn new(child: super::BoxOperator, schema: RecordSchema, nodes: Vec<NodeTemplate>, edges: Vec<EdgeTemplate>) -> Self {
        Self { child, schema, nodes, edges }
    }

    fn materialize_row(&self, ctx: &mut QueryCtx, base: Record) -> QueryResult<Record> {
        let mut record = base.extended(self.schema.clone());
        for tmpl in &self.nodes {
            let attrs = eval_attrs(ctx, &record, &tmpl.attrs)?;
            let labels = resolve_labels(ctx, &tmpl.labels);
            let id = ctx.store.create_node(labels);
            ctx.undo.record_create_node(id);
            for (attr, value) in attrs.iter() {
                ctx.store.reindex_node_attr_all_labels(id, attr, None, Some(value));
            }
            ctx.stats.properties_set += attrs.len() as u64;
            if let Some(node) = ctx.store.get_node_mut(id) {
                node.attrs = attrs;
            }
            ctx.stats.nodes_created += 1;
            let node = ctx.store.get_node(id).expect("just created");
            record.set_at(tmpl.dest_idx, node.to_value());
        }
        for tmpl in &self.edges {
            let Some(V::Node(src)) = record.get_at(tmpl.src_idx).cloned() else {
                return Err(crate::errors::QueryError::RuntimeError("edge template source is not a bound node".into()));
            };
            let Some(V::Node(dest)) = record.get_at(tmpl.dest_node_idx).cloned() else {
                return Err(crate::errors::QueryError::RuntimeError("edge template destination is not a bound node".into()));
            };
            let attrs = eval_attrs(ctx, &record, &tmpl.attrs)?;
            let id = ctx.store.create_edge(tmpl.rel_type, src.id, dest.id)?;
            ctx.undo.record_create_edge(id);
            ctx.stats.properties_set += attrs.len() as u64;
            if let Some(edge) = ctx.store.get_edge_mut(id) {
                edge.attrs = attrs;
            }
            ctx.stats.relationships_created += 1;
            let edge = ctx.store.get_edge(id).expect("just created");
            record.set_at(tmpl.dest_idx, edge.to_value());
        }
        Ok(record)
    }
}

impl Operator for Create {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        let Some(base) = self.child.consume(ctx)? else { return Ok(None) };
        self.materialize_row(ctx, base).map(Some)
    }

    fn reset(&mut self) {
        self.child.reset();
    }
}

/// `Merge`: probes for an existing match of the pattern using the same
/// matching rules as `MATCH` (here: a pre-built probe operator rooted at
/// the already-bound columns) before falling back to `Create`'s logic.
pub struct Merge {
    child: super::BoxOperator,
    probe_builder: Box<dyn Fn(&Record) -> super::BoxOperator>,
    create: Create,
}

impl std::fmt::Debug for Merge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Merge").finish()
    }
}

impl Merge {
    pub fn new(child: super::BoxOperator, probe_builder: Box<dyn Fn(&Record) -> super::BoxOperator>, schema: RecordSchema, nodes: Vec<NodeTemplate>, edges: Vec<EdgeTemplate>) -> Self {
        Self { child, probe_builder, create: Create::new(Box::new(super::scan::UnitScan::new(RecordSchema::new(vec![]))), schema, nodes, edges) }
    }
}

impl Operator for Merge {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        let Some(base) = self.child.consume(ctx)? else { return Ok(None) };
        let mut probe = (self.probe_builder)(&base);
        if let Some(found) = probe.consume(ctx)? {
            return Ok(Some(found));
        }
        self.create.materialize_row(ctx, base).map(Some)
    }

    fn reset(&mut self) {
        self.child.reset();
    }
}

/// `MergeCreate`: the `ON CREATE`-only sibling of `Merge` used inside a
/// `CREATE` clause that mixes fresh patterns with repeated ones in a
/// single statement — deduplicates *within* the statement's own creations
/// via a hash of each pattern's creation fingerprint, so `CREATE
/// (a)-[:R]->(b), (a)-[:R]->(b)` (same pattern twice) only creates one
/// edge rather than two.
#[derive(Debug)]
pub struct MergeCreate {
    child: super::BoxOperator,
    schema: RecordSchema,
    nodes: Vec<NodeTemplate>,
    edges: Vec<EdgeTemplate>,
    seen_fingerprints: std::collections::HashSet<u64>,
}

impl MergeCreate {
    pub fn new(child: super::BoxOperator, schema: RecordSchema, nodes: Vec<NodeTemplate>, edges: Vec<EdgeTemplate>) -> Self {
        Self { child, schema, nodes, edges, seen_fingerprints: std::collections::HashSet::new() }
    }

    fn fingerprint(record: &Record, tmpl: &EdgeTemplate) -> u64 {
        use crate::value::hashing::hash64;
        let src = record.get_at(tmpl.src_idx).cloned().unwrap_or(V::Null);
        let dest = record.get_at(tmpl.dest_node_idx).cloned().unwrap_or(V::Null);
        hash64(&src) ^ hash64(&dest).rotate_left(17) ^ (tmpl.rel_type.get() as u64)
    }
}

impl Operator for MergeCreate {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        let Some(base) = self.child.consume(ctx)? else { return Ok(None) };
        let mut record = base.extended(self.schema.clone());
        for tmpl in &self.nodes {
            let attrs = eval_attrs(ctx, &record, &tmpl.attrs)?;
            let labels = resolve_labels(ctx, &tmpl.labels);
            let id = ctx.store.create_node(labels);
            ctx.undo.record_create_node(id);
            ctx.stats.properties_set += attrs.len() as u64;
            for (attr, value) in attrs.iter() {
                ctx.store.reindex_node_attr_all_labels(id, attr, None, Some(value));
            }
            if let Some(node) = ctx.store.get_node_mut(id) {
                node.attrs = attrs;
            }
            ctx.stats.nodes_created += 1;
            record.set_at(tmpl.dest_idx, ctx.store.get_node(id).expect("just created").to_value());
        }
        for tmpl in &self.edges {
            let fp = Self::fingerprint(&record, tmpl);
            if !self.seen_fingerprints.insert(fp) {
                continue;
            }
            let Some(V::Node(src)) = record.get_at(tmpl.src_idx).cloned() else { continue };
            let Some(V::Node(dest)) = record.get_at(tmpl.dest_node_idx).cloned() else { continue };
            let attrs = eval_attrs(ctx, &record, &tmpl.attrs)?;
            let id = ctx.store.create_edge(tmpl.rel_type, src.id, dest.id)?;
            ctx.undo.record_create_edge(id);
            ctx.stats.properties_set += attrs.len() as u64;
            if let Some(edge) = ctx.store.get_edge_mut(id) {
                edge.attrs = attrs;
            }
            ctx.stats.relationships_created += 1;
            record.set_at(tmpl.dest_idx, ctx.store.get_edge(id).expect("just created").to_value());
        }
        Ok(Some(record))
    }

    fn reset(&mut self) {
        self.child.reset();
        self.seen_fingerprints.clear();
    }
}

/// One attribute write `Update` buffers per row before its commit phase.
#[derive(Debug, Clone)]
pub enum UpdateTarget {
    NodeAttr { idx: usize, attr: crate::types::AttrId, value: crate::expr::Exp },
    EdgeAttr { idx: usize, attr: crate::types::AttrId, value: crate::expr::Exp },
    AddLabels { idx: usize, labels: Vec<LabelId> },
    RemoveLabels { idx: usize, labels: Vec<LabelId> },
}

/// `SET`/`REMOVE`: applies attribute writes and label deltas, re-indexing
/// every touched attribute as it goes (§4.7 "Update").
#[derive(Debug)]
pub struct Update {
    child: super::BoxOperator,
    targets: Vec<UpdateTarget>,
}

impl Update {
    pub fn new(child: super::BoxOperator, targets: Vec<UpdateTarget>) -> Self {
        Self { child, targets }
    }
}

impl Operator for Update {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        let Some(record) = self.child.consume(ctx)? else { return Ok(None) };
        for target in &self.targets {
            match target {
                UpdateTarget::NodeAttr { idx, attr, value } => {
                    let Some(V::Node(n)) = record.get_at(*idx).cloned() else { continue };
                    let v = value.eval(&record, &|n, a| ctx.call_function(n, a))?;
                    let (old, outcome) = ctx.store.set_node_attr(n.id, *attr, v)?;
                    if outcome != SetOutcome::NoChange {
                        ctx.undo.record_update_node_attr(n.id, *attr, old);
                        ctx.stats.properties_set += 1;
                    }
                }
                UpdateTarget::EdgeAttr { idx, attr, value } => {
                    let Some(V::Edge(e)) = record.get_at(*idx).cloned() else { continue };
                    let v = value.eval(&record, &|n, a| ctx.call_function(n, a))?;
                    let (old, outcome) = ctx.store.set_edge_attr(e.id, *attr, v)?;
                    if outcome != SetOutcome::NoChange {
                        ctx.undo.record_update_edge_attr(e.id, *attr, old);
                        ctx.stats.properties_set += 1;
                    }
                }
                UpdateTarget::AddLabels { idx, labels } => {
                    let Some(V::Node(n)) = record.get_at(*idx).cloned() else { continue };
                    let added = ctx.store.add_labels(n.id, labels);
                    if !added.is_empty() {
                        ctx.undo.record_set_labels(n.id, added.clone());
                        ctx.stats.labels_added += added.len() as u64;
                    }
                }
                UpdateTarget::RemoveLabels { idx, labels } => {
                    let Some(V::Node(n)) = record.get_at(*idx).cloned() else { continue };
                    let removed = ctx.store.remove_labels(n.id, labels);
                    if !removed.is_empty() {
                        ctx.undo.record_remove_labels(n.id, removed.clone());
                        ctx.stats.labels_removed += removed.len() as u64;
                    }
                }
            }
        }
        Ok(Some(record))
    }

    fn reset(&mut self) {
        self.child.reset();
    }
}

/// `DELETE` / `DETACH DELETE`: deletes nodes and edges, cascading to a
/// deleted node's incident edges first when `detach` is set (§4.7
/// "Delete").
#[derive(Debug)]
pub struct Delete {
    child: super::BoxOperator,
    node_idxs: Vec<usize>,
    edge_idxs: Vec<usize>,
    detach: bool,
    rel_types: Vec<RelTypeId>,
}

impl Delete {
    pub fn new(child: super::BoxOperator, node_idxs: Vec<usize>, edge_idxs: Vec<usize>, detach: bool, rel_types: Vec<RelTypeId>) -> Self {
        Self { child, node_idxs, edge_idxs, detach, rel_types }
    }

    fn delete_edge(ctx: &mut QueryCtx, id: crate::types::EdgeId) -> QueryResult<()> {
        let Some(edge) = ctx.store.get_edge(id) else { return Ok(()) };
        let (rel_type, src, dest, attrs) = (edge.rel_type, edge.src, edge.dest, edge.attrs.clone());
        ctx.store.delete_edge(id)?;
        ctx.undo.record_delete_edge(id, rel_type, src, dest, attrs);
        ctx.stats.relationships_deleted += 1;
        Ok(())
    }
}

impl Operator for Delete {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        let Some(record) = self.child.consume(ctx)? else { return Ok(None) };
        for idx in &self.edge_idxs {
            if let Some(V::Edge(e)) = record.get_at(*idx).cloned() {
                Self::delete_edge(ctx, e.id)?;
            }
        }
        for idx in &self.node_idxs {
            let Some(V::Node(n)) = record.get_at(*idx).cloned() else { continue };
            if self.detach {
                for rel in &self.rel_types {
                    let outgoing = ctx.store.expand(n.id, *rel);
                    let incoming = ctx.store.expand_incoming(n.id, *rel);
                    for (edge_id, _) in outgoing.into_iter().chain(incoming) {
                        Self::delete_edge(ctx, edge_id)?;
                    }
                }
            }
            let Some(node) = ctx.store.get_node(n.id) else { continue };
            let (labels, attrs) = (node.labels.clone(), node.attrs.clone());
            ctx.store.delete_node(n.id)?;
            ctx.undo.record_delete_node(n.id, labels, attrs);
            ctx.stats.nodes_deleted += 1;
        }
        Ok(Some(record))
    }

    fn reset(&mut self) {
        self.child.reset();
    }
}

/// Apply the matrix sync policy around a bulk-create batch (§4.7
/// "Batching" steps 2 and 6). Callers run their entity allocation between
/// `begin_batch` and `end_batch`.
pub fn begin_batch(ctx: &mut QueryCtx) {
    ctx.store.sync_matrices(SyncPolicy::Resize);
}

pub fn end_batch(ctx: &mut QueryCtx) {
    ctx.store.sync_matrices(SyncPolicy::Nop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Exp;
    use crate::graph::entities::GraphEntity;
    use crate::graph::store::GraphStore;
    use crate::plan::scan::UnitScan;
    use crate::types::SchemaName;

    fn name(s: &str) -> SchemaName {
        SchemaName::new(s.to_string()).unwrap()
    }

    fn no_functions() -> crate::plan::FunctionRegistry {
        std::sync::Arc::new(|_: &str, _: &[V]| Err(crate::errors::QueryError::RuntimeError("no functions".into())))
    }

    /// Feeds exactly one pre-built row through an operator, standing in for
    /// whatever outer binding a compiled plan would already have produced.
    #[derive(Debug)]
    struct SeedRow(Option<Record>);

    impl Operator for SeedRow {
        fn consume(&mut self, _ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
            Ok(self.0.take())
        }
    }

    #[test]
    fn detach_delete_cascades_to_incident_edges_before_the_node() {
        let mut store = GraphStore::new();
        let p = store.schema_mut().get_or_create_label(name("P"));
        let r = store.schema_mut().get_or_create_rel_type(name("R"));
        let a = store.create_node(vec![p]);
        let b = store.create_node(vec![p]);
        let c = store.create_node(vec![p]);
        let e1 = store.create_edge(r, a, b).unwrap();
        let e2 = store.create_edge(r, c, a).unwrap();
        let functions = no_functions();
        let mut ctx = QueryCtx::new(&mut store, functions);

        let schema = RecordSchema::new(vec!["a".into()]);
        let mut seed = Record::new(schema.clone());
        seed.set_at(0, ctx.store.get_node(a).unwrap().to_value());

        let mut delete = Delete::new(Box::new(SeedRow(Some(seed))), vec![0], vec![], true, vec![r]);
        let row = delete.consume(&mut ctx).unwrap();
        assert!(row.is_some());
        assert!(delete.consume(&mut ctx).unwrap().is_none());

        assert_eq!(ctx.stats.relationships_deleted, 2);
        assert_eq!(ctx.stats.nodes_deleted, 1);
        assert!(ctx.store.get_edge(e1).is_none());
        assert!(ctx.store.get_edge(e2).is_none());
        assert!(ctx.store.get_node(a).is_none());
        // b and c are untouched; only their dangling edge to/from `a` is gone.
        assert!(ctx.store.get_node(b).is_some());
        assert!(ctx.store.get_node(c).is_some());
    }

    #[test]
    fn merge_returns_the_probe_match_without_creating_anything() {
        let mut store = GraphStore::new();
        let p = store.schema_mut().get_or_create_label(name("P"));
        let existing = store.create_node(vec![p]);
        let functions = no_functions();
        let mut ctx = QueryCtx::new(&mut store, functions);

        let schema = RecordSchema::new(vec!["n".into()]);
        let nodes = vec![NodeTemplate { dest_idx: 0, labels: vec![name("P")], attrs: vec![] }];
        let found_value = ctx.store.get_node(existing).unwrap().to_value();
        let probe_builder: Box<dyn Fn(&Record) -> super::super::BoxOperator> = Box::new(move |_base: &Record| {
            let schema = RecordSchema::new(vec!["n".into()]);
            let mut row = Record::new(schema);
            row.set_at(0, found_value.clone());
            Box::new(SeedRow(Some(row)))
        });
        let mut merge = Merge::new(Box::new(UnitScan::new(RecordSchema::new(vec![]))), probe_builder, schema, nodes, vec![]);

        let row = merge.consume(&mut ctx).unwrap().unwrap();
        assert_eq!(row.get_at(0).cloned().unwrap(), ctx.store.get_node(existing).unwrap().to_value());
        assert_eq!(ctx.stats.nodes_created, 0);
        assert_eq!(ctx.store.all_node_ids().count(), 1);
    }

    #[test]
    fn merge_falls_back_to_create_when_the_probe_finds_nothing() {
        let mut store = GraphStore::new();
        let functions = no_functions();
        let mut ctx = QueryCtx::new(&mut store, functions);

        let schema = RecordSchema::new(vec!["n".into()]);
        let nodes = vec![NodeTemplate { dest_idx: 0, labels: vec![name("P")], attrs: vec![] }];
        let probe_builder: Box<dyn Fn(&Record) -> super::super::BoxOperator> =
            Box::new(|_base: &Record| Box::new(SeedRow(None)));
        let mut merge = Merge::new(Box::new(UnitScan::new(RecordSchema::new(vec![]))), probe_builder, schema, nodes, vec![]);

        let row = merge.consume(&mut ctx).unwrap().unwrap();
        assert!(matches!(row.get_at(0), Some(V::Node(_))));
        assert_eq!(ctx.stats.nodes_created, 1);
        assert_eq!(ctx.store.all_node_ids().count(), 1);
    }

    #[test]
    fn merge_create_skips_a_repeated_edge_fingerprint_within_one_statement() {
        let mut store = GraphStore::new();
        let p = store.schema_mut().get_or_create_label(name("P"));
        let r = store.schema_mut().get_or_create_rel_type(name("R"));
        let a = store.create_node(vec![p]);
        let b = store.create_node(vec![p]);
        let functions = no_functions();
        let mut ctx = QueryCtx::new(&mut store, functions);

        // Two rows carrying the same (a, b) pair, as `CREATE (a)-[:R]->(b),
        // (a)-[:R]->(b)` would bind the same outer `a`/`b` twice.
        let schema = RecordSchema::new(vec!["a".into(), "b".into(), "r".into()]);
        let mut row1 = Record::new(schema.clone());
        row1.set_at(0, ctx.store.get_node(a).unwrap().to_value());
        row1.set_at(1, ctx.store.get_node(b).unwrap().to_value());
        let row2 = row1.clone();

        struct TwoRows(Vec<Record>);
        impl Operator for TwoRows {
            fn consume(&mut self, _ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
                Ok(self.0.pop())
            }
        }

        let edges = vec![EdgeTemplate { dest_idx: 2, rel_type: r, src_idx: 0, dest_node_idx: 1, attrs: vec![] }];
        let mut merge_create = MergeCreate::new(Box::new(TwoRows(vec![row1, row2])), schema, vec![], edges);

        while merge_create.consume(&mut ctx).unwrap().is_some() {}

        assert_eq!(ctx.stats.relationships_created, 1, "the repeated (a)-[:R]->(b) pattern must only be materialized once");
    }

    #[test]
    fn update_no_change_records_no_undo_entry_and_leaves_properties_set_at_zero() {
        let mut store = GraphStore::new();
        let p = store.schema_mut().get_or_create_label(name("P"));
        let age = store.schema_mut().get_or_create_attr(name("age")).unwrap();
        let n = store.create_node(vec![p]);
        store.set_node_attr(n, age, V::Int64(30)).unwrap();
        let functions = no_functions();
        let mut ctx = QueryCtx::new(&mut store, functions);

        let schema = RecordSchema::new(vec!["n".into()]);
        let mut seed = Record::new(schema);
        seed.set_at(0, ctx.store.get_node(n).unwrap().to_value());
        let targets = vec![UpdateTarget::NodeAttr { idx: 0, attr: age, value: Exp::Const(V::Int64(30)) }];
        let mut update = Update::new(Box::new(SeedRow(Some(seed))), targets);

        update.consume(&mut ctx).unwrap();
        assert_eq!(ctx.stats.properties_set, 0);
        assert_eq!(ctx.undo.len(), 0);
        assert_eq!(ctx.store.get_node(n).unwrap().attrs.get(age), Some(&V::Int64(30)));
    }

    #[test]
    fn update_with_a_new_value_records_undo_and_rolls_back_cleanly() {
        let mut store = GraphStore::new();
        let p = store.schema_mut().get_or_create_label(name("P"));
        let age = store.schema_mut().get_or_create_attr(name("age")).unwrap();
        let n = store.create_node(vec![p]);
        store.set_node_attr(n, age, V::Int64(30)).unwrap();
        let functions = no_functions();
        let mut ctx = QueryCtx::new(&mut store, functions);

        let schema = RecordSchema::new(vec!["n".into()]);
        let mut seed = Record::new(schema);
        seed.set_at(0, ctx.store.get_node(n).unwrap().to_value());
        let targets = vec![UpdateTarget::NodeAttr { idx: 0, attr: age, value: Exp::Const(V::Int64(31)) }];
        let mut update = Update::new(Box::new(SeedRow(Some(seed))), targets);

        update.consume(&mut ctx).unwrap();
        assert_eq!(ctx.stats.properties_set, 1);
        assert_eq!(ctx.undo.len(), 1);
        assert_eq!(ctx.store.get_node(n).unwrap().attrs.get(age), Some(&V::Int64(31)));

        ctx.undo.rollback(ctx.store);
        assert_eq!(ctx.store.get_node(n).unwrap().attrs.get(age), Some(&V::Int64(30)));
    }

    #[test]
    fn update_to_null_deletes_the_attribute_and_still_counts_as_a_change() {
        let mut store = GraphStore::new();
        let p = store.schema_mut().get_or_create_label(name("P"));
        let age = store.schema_mut().get_or_create_attr(name("age")).unwrap();
        let n = store.create_node(vec![p]);
        store.set_node_attr(n, age, V::Int64(30)).unwrap();
        let functions = no_functions();
        let mut ctx = QueryCtx::new(&mut store, functions);

        let schema = RecordSchema::new(vec!["n".into()]);
        let mut seed = Record::new(schema);
        seed.set_at(0, ctx.store.get_node(n).unwrap().to_value());
        let targets = vec![UpdateTarget::NodeAttr { idx: 0, attr: age, value: Exp::Const(V::Null) }];
        let mut update = Update::new(Box::new(SeedRow(Some(seed))), targets);

        update.consume(&mut ctx).unwrap();
        assert_eq!(ctx.stats.properties_set, 1);
        assert_eq!(ctx.undo.len(), 1);
        assert_eq!(ctx.store.get_node(n).unwrap().attrs.get(age), None);
    }
}
