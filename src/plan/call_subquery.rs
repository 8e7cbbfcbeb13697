//! `CallSubquery` (§4.7): executes an inner plan once per outer record,
//! honouring the projection-renaming rewrite for eager-and-returning
//! subqueries (§4.4).
//!
//! **Correlated-subquery rewrite.** When a `CALL { ... }` body is eager
//! (contains writes or aggregations) and `RETURN`s, its reads of outer
//! bindings can race with its own materialization: the subquery's write
//! might be observed by a later read of the same outer alias within the
//! same body. The rewrite:
//! 1. Renames every outer alias the subquery body references to an
//!    internal `@`-prefixed column (rejected as a user identifier by
//!    [`crate::external::ast::reject_reserved_identifier`]) so the body's
//!    intermediate clauses operate on a private copy.
//! 2. Restores the original name in the subquery's final `RETURN`
//!    projection, so the outer operator tree above `CallSubquery` keeps
//!    referencing the name it always knew.
//!
//! Rationale: after the rewrite, the eager step operates on internally
//! renamed columns while the outer tree continues to reference the
//! original names, eliminating the read/write race without the planner
//! needing snapshot isolation.

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::record::{Record, RecordSchema};

pub type SubplanBuilder = Box<dyn Fn(&Record) -> super::BoxOperator>;

/// Rename map applied before a subquery body runs. [`rename_bound_aliases`]
/// and [`restore_original_aliases`] are the two halves of the §4.4
/// rewrite, kept as free functions so the planner can apply them while
/// compiling the subquery's AST, independent of the `CallSubquery`
/// operator itself.
pub fn internal_alias(outer_alias: &str) -> String {
    format!("@{outer_alias}")
}

/// Rewrite every reference to `outer_aliases` inside `body_aliases` to its
/// `@`-prefixed internal form, returning the rewritten alias list the
/// subquery's intermediate clauses should bind against.
pub fn rename_bound_aliases(body_aliases: &[String], outer_aliases: &[String]) -> Vec<String> {
    body_aliases
        .iter()
        .map(|a| if outer_aliases.iter().any(|o| o == a) { internal_alias(a) } else { a.clone() })
        .collect()
}

/// Undo the rename for the subquery's final `RETURN` projection: any
/// `@`-prefixed column whose bare name matches an outer alias is restored
/// to that bare name so the outer tree's references keep resolving.
pub fn restore_original_aliases(return_aliases: &[String], outer_aliases: &[String]) -> Vec<String> {
    return_aliases
        .iter()
        .map(|a| {
            a.strip_prefix('@')
                .filter(|bare| outer_aliases.iter().any(|o| o == bare))
                .map(|bare| bare.to_string())
                .unwrap_or_else(|| a.clone())
        })
        .collect()
}

pub struct CallSubquery {
    child: super::BoxOperator,
    builder: SubplanBuilder,
    schema: RecordSchema,
    is_returning: bool,
    current: Option<(Record, super::BoxOperator)>,
}

impl std::fmt::Debug for CallSubquery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSubquery").field("is_returning", &self.is_returning).finish()
    }
}

impl CallSubquery {
    /// `builder` compiles the (already rewritten) subquery body into a
    /// fresh operator tree parameterized by the current outer row.
    /// `is_returning` distinguishes a `RETURN`-ing subquery (joined row per
    /// inner result) from a void one (exactly one pass-through row per
    /// outer record, run for its side effects only).
    pub fn new(child: super::BoxOperator, builder: SubplanBuilder, schema: RecordSchema, is_returning: bool) -> Self {
        Self { child, builder, schema, is_returning, current: None }
    }
}

impl Operator for CallSubquery {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        loop {
            check_cancelled(ctx)?;
            if let Some((left, inner)) = &mut self.current {
                match inner.consume(ctx)? {
                    Some(right) if self.is_returning => {
                        let mut merged = left.clone().extended(self.schema.clone());
                        for (i, v) in right.values().iter().enumerate() {
                            if !v.is_null() {
                                merged.set_at(i, v.clone());
                            }
                        }
                        return Ok(Some(merged));
                    }
                    Some(_) => continue,
                    None => {
                        let exhausted_left = left.clone();
                        self.current = None;
                        if !self.is_returning {
                            return Ok(Some(exhausted_left.extended(self.schema.clone())));
                        }
                    }
                }
                continue;
            }
            let Some(left) = self.child.consume(ctx)? else { return Ok(None) };
            let inner = (self.builder)(&left);
            self.current = Some((left, inner));
        }
    }

    fn reset(&mut self) {
        self.current = None;
        self.child.reset();
    }
}
