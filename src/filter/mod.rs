//! The filter tree: a boolean-expression tree of predicates and conditions
//! evaluated against a [`Record`] (§3.7). Submodules implement the
//! rewrites run before a filter tree is wired into a plan: [`normalize`]
//! (constant-on-the-right), [`demorgan`] (push `not` to the leaves),
//! [`fold`] (constant folding with `and`/`or` short-circuit absorption),
//! [`range`] (per-attribute range tightening) and [`index_pushdown`]
//! (translating a tightened, applicable subtree into an index query).

pub mod demorgan;
pub mod fold;
pub mod index_pushdown;
pub mod normalize;
pub mod range;

use crate::errors::QueryResult;
use crate::expr::Exp;
use crate::record::Record;
use crate::value::ops::{compare, Tvl};
use crate::value::V;
use std::cmp::Ordering;

pub type FunctionRegistry<'a> = dyn Fn(&str, &[V]) -> QueryResult<V> + 'a;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    StartsWith,
    EndsWith,
    Contains,
    IsNull,
    IsNotNull,
}

impl CompareOp {
    /// Swap the operator to match swapped operand sides, for normalization
    /// (§4.5: "reverse the operator accordingly"). `None` for ops where
    /// swapping sides isn't meaningful (`in`, string-match ops, null
    /// checks) — normalization leaves those predicates untouched.
    pub fn flip(self) -> Option<CompareOp> {
        use CompareOp::*;
        match self {
            Eq => Some(Eq),
            Ne => Some(Ne),
            Lt => Some(Gt),
            Gt => Some(Lt),
            Le => Some(Ge),
            Ge => Some(Le),
            _ => None,
        }
    }

    /// Logical negation in place, for De Morgan leaf rewriting. `None` for
    /// ops with no single-operator complement (`in`, string-match ops) —
    /// those get wrapped in an explicit `not` node instead.
    pub fn negate(self) -> Option<CompareOp> {
        use CompareOp::*;
        match self {
            Eq => Some(Ne),
            Ne => Some(Eq),
            Lt => Some(Ge),
            Ge => Some(Lt),
            Le => Some(Gt),
            Gt => Some(Le),
            IsNull => Some(IsNotNull),
            IsNotNull => Some(IsNull),
            In | StartsWith | EndsWith | Contains => None,
        }
    }

    pub fn name(self) -> &'static str {
        use CompareOp::*;
        match self {
            Eq => "=",
            Ne => "<>",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            In => "in",
            StartsWith => "starts_with",
            EndsWith => "ends_with",
            Contains => "contains",
            IsNull => "is null",
            IsNotNull => "is not null",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondOp {
    And,
    Or,
    Xor,
    /// Uses `left` only.
    Not,
}

#[derive(Debug, Clone)]
pub enum FilterTree {
    Pred { lhs: Exp, op: CompareOp, rhs: Exp },
    Cond { op: CondOp, left: Box<FilterTree>, right: Option<Box<FilterTree>> },
    Exp(Exp),
    Const(bool),
}

impl FilterTree {
    pub fn and(left: FilterTree, right: FilterTree) -> FilterTree {
        FilterTree::Cond { op: CondOp::And, left: Box::new(left), right: Some(Box::new(right)) }
    }

    pub fn or(left: FilterTree, right: FilterTree) -> FilterTree {
        FilterTree::Cond { op: CondOp::Or, left: Box::new(left), right: Some(Box::new(right)) }
    }

    pub fn not(tree: FilterTree) -> FilterTree {
        FilterTree::Cond { op: CondOp::Not, left: Box::new(tree), right: None }
    }

    /// Break the tree into the maximal list of independent subtrees
    /// reachable by peeling off top-level `and` nodes, stopping at `or`
    /// boundaries (§4.5). Used by index push-down: each returned subtree
    /// is examined independently for index applicability.
    pub fn sub_trees(&self) -> Vec<&FilterTree> {
        match self {
            FilterTree::Cond { op: CondOp::And, left, right } => {
                let mut out = left.sub_trees();
                if let Some(r) = right {
                    out.extend(r.sub_trees());
                }
                out
            }
            other => vec![other],
        }
    }

    /// Evaluate the tree against `record`, short-circuiting `and`/`or`
    /// per §4.5. The top-level boolean verdict a filter operator acts on
    /// is `apply(...).is_true()` — `Unknown` behaves like `false` for row
    /// admission, same as SQL/Cypher `WHERE`.
    pub fn apply(&self, record: &Record, functions: &FunctionRegistry) -> QueryResult<Tvl> {
        match self {
            FilterTree::Const(b) => Ok(Tvl::from_bool(*b)),
            FilterTree::Exp(e) => match e.eval(record, functions)? {
                V::Bool(b) => Ok(Tvl::from_bool(b)),
                V::Null => Ok(Tvl::Unknown),
                other => Err(crate::errors::QueryError::type_mismatch("bool", other.type_name(), "filter expression")),
            },
            FilterTree::Pred { lhs, op, rhs } => {
                let l = lhs.eval(record, functions)?;
                let r = rhs.eval(record, functions)?;
                eval_pred(&l, *op, &r)
            }
            FilterTree::Cond { op: CondOp::Not, left, .. } => Ok(left.apply(record, functions)?.not()),
            FilterTree::Cond { op: CondOp::And, left, right } => {
                let l = left.apply(record, functions)?;
                if l == Tvl::False {
                    return Ok(Tvl::False);
                }
                let right = right.as_ref().expect("and node must have a right child");
                Ok(l.and(right.apply(record, functions)?))
            }
            FilterTree::Cond { op: CondOp::Or, left, right } => {
                let l = left.apply(record, functions)?;
                if l == Tvl::True {
                    return Ok(Tvl::True);
                }
                let right = right.as_ref().expect("or node must have a right child");
                Ok(l.or(right.apply(record, functions)?))
            }
            FilterTree::Cond { op: CondOp::Xor, left, right } => {
                let right = right.as_ref().expect("xor node must have a right child");
                Ok(left.apply(record, functions)?.xor(right.apply(record, functions)?))
            }
        }
    }
}

/// Entry point used by [`fold`] to evaluate a predicate whose operands are
/// both compile-time constants, without needing a `Record`.
pub fn eval_pred_pub(lhs: &V, op: CompareOp, rhs: &V) -> QueryResult<Tvl> {
    eval_pred(lhs, op, rhs)
}

fn eval_pred(lhs: &V, op: CompareOp, rhs: &V) -> QueryResult<Tvl> {
    use crate::errors::QueryError;
    use CompareOp::*;
    match op {
        IsNull => Ok(Tvl::from_bool(lhs.is_null())),
        IsNotNull => Ok(Tvl::from_bool(!lhs.is_null())),
        Eq | Ne => {
            if lhs.is_null() || rhs.is_null() {
                return Ok(Tvl::Unknown);
            }
            if !lhs.comparable_with(rhs) {
                // Disjoint types: allowed for = / <>, returning false / true.
                return Ok(Tvl::from_bool(op == Ne));
            }
            let eq = compare(lhs, rhs) == Some(Ordering::Equal);
            Ok(Tvl::from_bool(if op == Eq { eq } else { !eq }))
        }
        Lt | Le | Gt | Ge => {
            if lhs.is_null() || rhs.is_null() {
                return Ok(Tvl::Unknown);
            }
            if !lhs.comparable_with(rhs) {
                return Err(QueryError::type_mismatch(lhs.type_name(), rhs.type_name(), op.name()));
            }
            let Some(ord) = compare(lhs, rhs) else { return Ok(Tvl::Unknown) };
            let truth = match op {
                Lt => ord == Ordering::Less,
                Le => ord != Ordering::Greater,
                Gt => ord == Ordering::Greater,
                Ge => ord != Ordering::Less,
                _ => unreachable!(),
            };
            Ok(Tvl::from_bool(truth))
        }
        In => {
            if rhs.is_null() {
                return Ok(Tvl::Unknown);
            }
            let V::Array(items) = rhs else {
                return Err(QueryError::type_mismatch("array", rhs.type_name(), "in"));
            };
            if items.is_empty() {
                return Ok(Tvl::False);
            }
            if lhs.is_null() {
                return Ok(Tvl::Unknown);
            }
            let mut saw_null = false;
            for item in items.iter() {
                if item.is_null() {
                    saw_null = true;
                    continue;
                }
                if lhs.comparable_with(item) && compare(lhs, item) == Some(Ordering::Equal) {
                    return Ok(Tvl::True);
                }
            }
            Ok(if saw_null { Tvl::Unknown } else { Tvl::False })
        }
        StartsWith | EndsWith | Contains => {
            if lhs.is_null() || rhs.is_null() {
                return Ok(Tvl::Unknown);
            }
            match (lhs, rhs) {
                (V::String(a), V::String(b)) => Ok(Tvl::from_bool(match op {
                    StartsWith => a.starts_with(b.as_ref()),
                    EndsWith => a.ends_with(b.as_ref()),
                    Contains => a.contains(b.as_ref()),
                    _ => unreachable!(),
                })),
                _ => Err(QueryError::type_mismatch("string", lhs.type_name(), op.name())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordSchema;

    fn noop_functions(_name: &str, _args: &[V]) -> QueryResult<V> {
        Err(crate::errors::QueryError::invalid_argument("test", "no functions registered"))
    }

    fn empty_record() -> Record {
        Record::new(RecordSchema::new(vec![]))
    }

    #[test]
    fn and_short_circuits_on_false_without_evaluating_right() {
        let tree = FilterTree::and(
            FilterTree::Const(false),
            FilterTree::Exp(Exp::FunctionCall { name: "boom".into(), args: vec![] }),
        );
        assert_eq!(tree.apply(&empty_record(), &noop_functions).unwrap(), Tvl::False);
    }

    #[test]
    fn or_short_circuits_on_true() {
        let tree = FilterTree::or(
            FilterTree::Const(true),
            FilterTree::Exp(Exp::FunctionCall { name: "boom".into(), args: vec![] }),
        );
        assert_eq!(tree.apply(&empty_record(), &noop_functions).unwrap(), Tvl::True);
    }

    #[test]
    fn in_over_empty_array_is_false_not_unknown() {
        let tree = FilterTree::Pred { lhs: Exp::Const(V::Int64(1)), op: CompareOp::In, rhs: Exp::Const(V::array(vec![])) };
        assert_eq!(tree.apply(&empty_record(), &noop_functions).unwrap(), Tvl::False);
    }

    #[test]
    fn comparison_with_null_operand_is_unknown() {
        let tree = FilterTree::Pred { lhs: Exp::Const(V::Null), op: CompareOp::Lt, rhs: Exp::Const(V::Int64(1)) };
        assert_eq!(tree.apply(&empty_record(), &noop_functions).unwrap(), Tvl::Unknown);
    }

    #[test]
    fn disjoint_equality_is_false_not_an_error() {
        let tree = FilterTree::Pred { lhs: Exp::Const(V::from("x")), op: CompareOp::Eq, rhs: Exp::Const(V::Int64(1)) };
        assert_eq!(tree.apply(&empty_record(), &noop_functions).unwrap(), Tvl::False);
    }

    #[test]
    fn disjoint_ordering_comparison_is_a_type_error() {
        let tree = FilterTree::Pred { lhs: Exp::Const(V::from("x")), op: CompareOp::Lt, rhs: Exp::Const(V::Int64(1)) };
        assert!(tree.apply(&empty_record(), &noop_functions).is_err());
    }

    #[test]
    fn sub_trees_peels_off_top_level_and_chain() {
        let a = FilterTree::Pred { lhs: Exp::Const(V::Int64(1)), op: CompareOp::Eq, rhs: Exp::Const(V::Int64(1)) };
        let b = FilterTree::Pred { lhs: Exp::Const(V::Int64(2)), op: CompareOp::Eq, rhs: Exp::Const(V::Int64(2)) };
        let or_node = FilterTree::or(a.clone(), b.clone());
        let tree = FilterTree::and(a.clone(), or_node);
        assert_eq!(tree.sub_trees().len(), 2);
    }
}
