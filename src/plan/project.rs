//! `Project`: materializes `alias.attribute` property columns and
//! computed `RETURN`/`WITH` expressions into a record's schema. Filter
//! predicates and arithmetic expressions read already-projected values
//! (see [`crate::expr::Exp::Property`]'s doc comment) rather than
//! resolving attribute lookups themselves, so every operator that
//! references a property is preceded by a `Project` naming it.

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::graph::entities::GraphEntity;
use crate::record::{Record, RecordSchema};
use crate::value::V;

/// One property this projection materializes: read `alias.attribute` off
/// the bound node/edge at `source_idx` and write it to `dest_idx`.
#[derive(Debug, Clone)]
pub struct PropertyColumn {
    pub source_idx: usize,
    pub attribute_name: String,
    pub dest_idx: usize,
}

/// One computed expression this projection materializes at `dest_idx`.
#[derive(Debug, Clone)]
pub struct ComputedColumn {
    pub expr: crate::expr::Exp,
    pub dest_idx: usize,
}

#[derive(Debug)]
pub struct Project {
    child: super::BoxOperator,
    schema: RecordSchema,
    properties: Vec<PropertyColumn>,
    computed: Vec<ComputedColumn>,
}

impl Project {
    pub fn new(child: super::BoxOperator, schema: RecordSchema, properties: Vec<PropertyColumn>, computed: Vec<ComputedColumn>) -> Self {
        Self { child, schema, properties, computed }
    }

    fn attr_value(ctx: &QueryCtx, entity: &V, attribute: &str) -> QueryResult<V> {
        let Ok(name) = crate::types::SchemaName::new(attribute.to_string()) else { return Ok(V::Null) };
        let attr_id = match ctx.store.schema().resolve_attr(&name) {
            Some(id) => id,
            None => return Ok(V::Null),
        };
        match entity {
            V::Node(n) => Ok(ctx.store.get_node(n.id).and_then(|node| node.attrs.get(attr_id)).cloned().unwrap_or(V::Null)),
            V::Edge(e) => Ok(ctx.store.get_edge(e.id).and_then(|edge| edge.attrs.get(attr_id)).cloned().unwrap_or(V::Null)),
            V::Map(entries) => Ok(entries.iter().find(|(k, _)| k.as_ref() == attribute).map(|(_, v)| v.clone()).unwrap_or(V::Null)),
            _ => Ok(V::Null),
        }
    }
}

impl Operator for Project {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        let Some(base) = self.child.consume(ctx)? else { return Ok(None) };
        let mut record = base.extended(self.schema.clone());
        for col in &self.properties {
            let entity = record.get_at(col.source_idx).cloned().unwrap_or(V::Null);
            let value = Self::attr_value(ctx, &entity, &col.attribute_name)?;
            record.set_at(col.dest_idx, value);
        }
        for col in &self.computed {
            let functions = ctx.functions.clone();
            let value = col.expr.eval(&record, &move |name, args| (functions)(name, args))?;
            record.set_at(col.dest_idx, value);
        }
        Ok(Some(record))
    }

    fn reset(&mut self) {
        self.child.reset();
    }
}
