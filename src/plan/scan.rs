//! Leaf scan operators (§4.7): `AllNodeScan`, `NodeByLabelScan` (iterates
//! `M_L`), `IndexScan` (driven by an [`IndexQueryNode`] produced by index
//! push-down, §4.6).

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::external::index::eval_against_exact_match;
use crate::filter::index_pushdown::IndexQueryNode;
use crate::graph::entities::GraphEntity;
use crate::graph::schema::IndexTarget;
use crate::record::{Record, RecordSchema};
use crate::types::{AttrId, LabelId, NodeId};
use crate::value::V;

#[derive(Debug)]
pub struct AllNodeScan {
    schema: RecordSchema,
    alias_idx: usize,
    next: u64,
}

impl AllNodeScan {
    pub fn new(schema: RecordSchema, alias: &str) -> Self {
        let alias_idx = schema.index_of(alias).expect("alias must already be bound in the record schema");
        Self { schema, alias_idx, next: 0 }
    }
}

impl Operator for AllNodeScan {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        loop {
            if self.next >= ctx.store.node_capacity() {
                return Ok(None);
            }
            let Ok(id) = NodeId::new(self.next) else { return Ok(None) };
            self.next += 1;
            if let Some(node) = ctx.store.get_node(id) {
                let mut record = Record::new(self.schema.clone());
                record.set_at(self.alias_idx, node.to_value());
                return Ok(Some(record));
            }
        }
    }

    fn reset(&mut self) {
        self.next = 0;
    }
}

#[derive(Debug)]
pub struct NodeByLabelScan {
    schema: RecordSchema,
    alias_idx: usize,
    ids: Vec<NodeId>,
    pos: usize,
}

impl NodeByLabelScan {
    pub fn new(schema: RecordSchema, alias: &str, ids: Vec<NodeId>) -> Self {
        let alias_idx = schema.index_of(alias).expect("alias must already be bound in the record schema");
        Self { schema, alias_idx, ids, pos: 0 }
    }
}

impl Operator for NodeByLabelScan {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        while self.pos < self.ids.len() {
            let id = self.ids[self.pos];
            self.pos += 1;
            if let Some(node) = ctx.store.get_node(id) {
                let mut record = Record::new(self.schema.clone());
                record.set_at(self.alias_idx, node.to_value());
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.pos = 0;
    }
}

/// Replaces a `NodeByLabelScan` whose parent filter chain is fully
/// index-covered (§4.6, §4.7 "execution plan rewrites"). The candidate id
/// set is resolved once at construction time against the label's attribute
/// index rather than re-evaluated per row.
#[derive(Debug)]
pub struct IndexScan {
    schema: RecordSchema,
    alias_idx: usize,
    ids: Vec<NodeId>,
    pos: usize,
}

impl IndexScan {
    pub fn new(schema: RecordSchema, alias: &str, label: LabelId, attr: AttrId, query: &IndexQueryNode, store: &crate::graph::store::GraphStore) -> Self {
        let alias_idx = schema.index_of(alias).expect("alias must already be bound in the record schema");
        let ids = store
            .index_for(IndexTarget::Node, label, attr)
            .map(|index| eval_against_exact_match(index, query).into_iter().filter_map(NodeId::new).collect())
            .unwrap_or_default();
        Self { schema, alias_idx, ids, pos: 0 }
    }
}

impl Operator for IndexScan {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        while self.pos < self.ids.len() {
            let id = self.ids[self.pos];
            self.pos += 1;
            if let Some(node) = ctx.store.get_node(id) {
                let mut record = Record::new(self.schema.clone());
                record.set_at(self.alias_idx, node.to_value());
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.pos = 0;
    }
}

/// A leaf that yields a single empty row, for queries with no `MATCH`
/// pattern at all (`RETURN 1`, `CREATE (...)`'s outer driver row).
#[derive(Debug)]
pub struct UnitScan {
    schema: RecordSchema,
    yielded: bool,
}

impl UnitScan {
    pub fn new(schema: RecordSchema) -> Self {
        Self { schema, yielded: false }
    }
}

impl Operator for UnitScan {
    fn consume(&mut self, _ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        if self.yielded {
            return Ok(None);
        }
        self.yielded = true;
        Ok(Some(Record::new(self.schema.clone())))
    }

    fn reset(&mut self) {
        self.yielded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaName;

    #[test]
    fn all_node_scan_yields_every_live_node() {
        let mut store = crate::graph::store::GraphStore::new();
        store.create_node(vec![]);
        store.create_node(vec![]);
        let schema = RecordSchema::new(vec!["n".into()]);
        let functions = std::sync::Arc::new(|_: &str, _: &[V]| Err(crate::errors::QueryError::RuntimeError("no functions".into())));
        let mut ctx = QueryCtx::new(&mut store, functions);
        let mut scan = AllNodeScan::new(schema, "n");
        let mut count = 0;
        while scan.consume(&mut ctx).unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn node_by_label_scan_skips_deleted_nodes() {
        let mut store = crate::graph::store::GraphStore::new();
        let person = store.schema_mut().get_or_create_label(SchemaName::new("Person").unwrap());
        let a = store.create_node(vec![person]);
        let b = store.create_node(vec![person]);
        store.delete_node(b).unwrap();
        let schema = RecordSchema::new(vec!["n".into()]);
        let functions = std::sync::Arc::new(|_: &str, _: &[V]| Err(crate::errors::QueryError::RuntimeError("no functions".into())));
        let mut ctx = QueryCtx::new(&mut store, functions);
        let mut scan = NodeByLabelScan::new(schema, "n", vec![a, b]);
        assert!(scan.consume(&mut ctx).unwrap().is_some());
        assert!(scan.consume(&mut ctx).unwrap().is_none());
    }

    #[test]
    fn unit_scan_yields_exactly_one_empty_row() {
        let mut store = crate::graph::store::GraphStore::new();
        let functions = std::sync::Arc::new(|_: &str, _: &[V]| Err(crate::errors::QueryError::RuntimeError("no functions".into())));
        let mut ctx = QueryCtx::new(&mut store, functions);
        let mut scan = UnitScan::new(RecordSchema::new(vec![]));
        assert!(scan.consume(&mut ctx).unwrap().is_some());
        assert!(scan.consume(&mut ctx).unwrap().is_none());
    }
}
