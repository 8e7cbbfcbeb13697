//! `ProcedureCall` (§4.7, §6): invokes a graph procedure (`algo.shortestPath`,
//! `algo.SPpaths`, `algo.SSpaths`, `db.constraints`) once per outer record
//! and yields one joined row per result the procedure produces — the same
//! shape as [`super::expand::Expand`] joining a traversal hop, except the
//! right-hand side is a procedure's output columns rather than a node.
//!
//! A procedure with no outer pattern (`CALL db.constraints() YIELD ...` on
//! its own) still flows through here: the planner feeds it a single
//! [`super::scan::UnitScan`] row as its child.

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::record::{Record, RecordSchema};
use crate::value::V;

/// Computes a procedure's output rows for one outer record. Boxed so the
/// planner can close over whichever procedure and its evaluated arguments;
/// each inner `Vec<V>` is one output row in the procedure's declared
/// column order.
pub type ProcedureBuilder = Box<dyn Fn(&mut QueryCtx, &Record) -> QueryResult<Vec<Vec<V>>>>;

pub struct ProcedureCall {
    child: super::BoxOperator,
    builder: ProcedureBuilder,
    schema: RecordSchema,
    /// Destination column for each position in a procedure output row, in
    /// the order `YIELD` named them.
    yield_idxs: Vec<usize>,
    pending: Option<(Record, std::vec::IntoIter<Vec<V>>)>,
}

impl std::fmt::Debug for ProcedureCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcedureCall").field("yield_idxs", &self.yield_idxs).finish()
    }
}

impl ProcedureCall {
    pub fn new(child: super::BoxOperator, builder: ProcedureBuilder, schema: RecordSchema, yield_idxs: Vec<usize>) -> Self {
        Self { child, builder, schema, yield_idxs, pending: None }
    }
}

impl Operator for ProcedureCall {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        loop {
            check_cancelled(ctx)?;
            if let Some((base, rows)) = &mut self.pending {
                if let Some(row) = rows.next() {
                    let mut record = base.clone().extended(self.schema.clone());
                    for (idx, value) in self.yield_idxs.iter().zip(row) {
                        record.set_at(*idx, value);
                    }
                    return Ok(Some(record));
                }
                self.pending = None;
            }

            let Some(base) = self.child.consume(ctx)? else { return Ok(None) };
            let rows = (self.builder)(ctx, &base)?;
            self.pending = Some((base, rows.into_iter()));
        }
    }

    fn reset(&mut self) {
        self.pending = None;
        self.child.reset();
    }
}
