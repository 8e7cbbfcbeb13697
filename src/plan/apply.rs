//! `Apply` / `SemiApply` / `AntiSemiApply` (§4.7): drive a right-hand
//! subplan once per left-hand record. `Apply` emits every row the
//! right-hand side produces (each extended with the left-hand bindings);
//! `SemiApply`/`AntiSemiApply` emit the left-hand row unchanged, gated on
//! whether the right-hand side produced at least one row (used for
//! pattern-existence predicates and `OPTIONAL MATCH`'s negative form).

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::record::{Record, RecordSchema};

/// A right-hand subplan builder: given the current left-hand row, produce
/// a freshly seeded operator tree to drive to exhaustion. Subplans are
/// rebuilt per left row rather than merely `reset()`, since a correlated
/// subquery's leaf scans are themselves parameterized by the left row's
/// bound values (e.g. `MATCH (n) WHERE (n)-->(:X)` binds `n` into the
/// right-hand pattern).
pub type RhsBuilder = Box<dyn Fn(&Record) -> super::BoxOperator>;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum ApplyKind {
    #[default]
    Apply,
    SemiApply,
    AntiSemiApply,
}

pub struct Apply {
    child: super::BoxOperator,
    rhs_builder: RhsBuilder,
    schema: RecordSchema,
    kind: ApplyKind,
    current_rhs: Option<(Record, super::BoxOperator)>,
}

impl std::fmt::Debug for Apply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Apply").field("kind", &self.kind).finish()
    }
}

impl Apply {
    pub fn new(child: super::BoxOperator, rhs_builder: RhsBuilder, schema: RecordSchema, kind: ApplyKind) -> Self {
        Self { child, rhs_builder, schema, kind, current_rhs: None }
    }
}

impl Operator for Apply {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        loop {
            check_cancelled(ctx)?;
            match self.kind {
                ApplyKind::Apply => {
                    if let Some((left, rhs)) = &mut self.current_rhs {
                        if let Some(right) = rhs.consume(ctx)? {
                            let mut merged = left.clone().extended(self.schema.clone());
                            for (i, v) in right.values().iter().enumerate() {
                                if !v.is_null() {
                                    merged.set_at(i, v.clone());
                                }
                            }
                            return Ok(Some(merged));
                        }
                        self.current_rhs = None;
                    }
                    let Some(left) = self.child.consume(ctx)? else { return Ok(None) };
                    let rhs = (self.rhs_builder)(&left);
                    self.current_rhs = Some((left, rhs));
                }
                ApplyKind::SemiApply | ApplyKind::AntiSemiApply => {
                    let Some(left) = self.child.consume(ctx)? else { return Ok(None) };
                    let mut rhs = (self.rhs_builder)(&left);
                    let matched = rhs.consume(ctx)?.is_some();
                    let wants_match = self.kind == ApplyKind::SemiApply;
                    if matched == wants_match {
                        return Ok(Some(left));
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        self.current_rhs = None;
        self.child.reset();
    }
}
