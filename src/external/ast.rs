//! The parser boundary: this crate consumes an already-parsed AST as
//! opaque node handles and type tags (§1 Non-goals: "query language
//! parsing is consumed from an external parser"). It never constructs or
//! validates query text itself.
//!
//! [`AstNode`] and [`Clause`] are the minimal shape `query_graph::
//! QueryGraph::from_ast` (and the planner above it) need from a parser:
//! enough to walk pattern clauses and collect alias bindings. A real
//! integration hands the core its own AST type implementing [`AstNode`]
//! rather than this crate defining a grammar.

/// One clause of a parsed query, in the order the parser produced them.
/// `Other` carries clause kinds this core doesn't lower directly (e.g.
/// `ORDER BY`, `UNWIND`) so a host can still round-trip an AST it doesn't
/// fully understand without the boundary trait needing a variant per
/// clause kind this crate will ever learn about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseKind {
    Match,
    OptionalMatch,
    Create,
    Merge,
    Set,
    Delete,
    With,
    Return,
    Call,
    CallSubquery,
    Other(String),
}

/// An opaque handle into the external parser's AST. The core never
/// dereferences the handle itself — it asks the [`AstNode`] trait (which
/// the host's parser implements over its own tree) for the structural
/// facts compilation needs: clause kind, child clauses, and identifiers
/// reserved by the `@`-rename rewrite (§4.4, §9) that must be rejected at
/// parse time rather than silently collide with it.
pub trait AstNode {
    fn clause_kind(&self) -> ClauseKind;
    fn children(&self) -> Vec<&dyn AstNode>;
    /// Identifiers this clause binds (aliases introduced by `MATCH`,
    /// `WITH`, `CREATE`, ...).
    fn bound_aliases(&self) -> Vec<String>;
    /// `true` for a `CALL { ... }` subquery whose body performs a write or
    /// an aggregation and also `RETURN`s — the case the projection-rename
    /// rewrite (§4.4) must apply to before this clause reaches the planner.
    fn is_eager_returning_subquery(&self) -> bool {
        false
    }
}

/// Reject identifiers the subquery rewrite's internal renaming scheme
/// reserves (§9: "document and reject identifiers beginning with `@` at
/// parse time"). The core calls this defensively on every alias it binds,
/// even though the primary enforcement point is the external parser.
pub fn reject_reserved_identifier(name: &str) -> crate::errors::QueryResult<()> {
    if name.starts_with('@') {
        return Err(crate::errors::QueryError::InvalidArgument {
            function: "identifier".into(),
            reason: format!("identifier `{name}` is reserved for the internal subquery rewrite"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_prefixed_identifiers_are_rejected() {
        assert!(reject_reserved_identifier("@n").is_err());
        assert!(reject_reserved_identifier("n").is_ok());
    }
}
