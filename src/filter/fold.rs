//! Constant folding (§4.5): evaluate constant subtrees eagerly and absorb
//! `true`/`false` constants into the surrounding `and`/`or` node.

use super::{CondOp, FilterTree};
use crate::errors::QueryResult;
use crate::value::V;

pub fn fold(tree: &FilterTree, functions: &dyn Fn(&str, &[V]) -> QueryResult<V>) -> FilterTree {
    match tree {
        FilterTree::Const(b) => FilterTree::Const(*b),
        FilterTree::Exp(e) => {
            if e.is_constant() {
                if let Ok(v) = e.eval_const(functions) {
                    return match v {
                        V::Bool(b) => FilterTree::Const(b),
                        // Non-bool and null constants don't fold to a
                        // definite Const — leave them for apply() to
                        // raise/resolve at evaluation time.
                        _ => FilterTree::Exp(e.clone()),
                    };
                }
            }
            FilterTree::Exp(e.clone())
        }
        FilterTree::Pred { lhs, op, rhs } => {
            if lhs.is_constant() && rhs.is_constant() {
                if let (Ok(l), Ok(r)) = (lhs.eval_const(functions), rhs.eval_const(functions)) {
                    if let Ok(tvl) = super::eval_pred_pub(&l, *op, &r) {
                        return match tvl {
                            crate::value::ops::Tvl::True => FilterTree::Const(true),
                            crate::value::ops::Tvl::False => FilterTree::Const(false),
                            crate::value::ops::Tvl::Unknown => {
                                FilterTree::Pred { lhs: lhs.clone(), op: *op, rhs: rhs.clone() }
                            }
                        };
                    }
                }
            }
            FilterTree::Pred { lhs: lhs.clone(), op: *op, rhs: rhs.clone() }
        }
        FilterTree::Cond { op: CondOp::Not, left, .. } => {
            let folded = fold(left, functions);
            match folded {
                FilterTree::Const(b) => FilterTree::Const(!b),
                other => FilterTree::not(other),
            }
        }
        FilterTree::Cond { op: CondOp::And, left, right } => {
            let l = fold(left, functions);
            let r = right.as_ref().map(|r| fold(r, functions));
            match (&l, &r) {
                (FilterTree::Const(false), _) | (_, Some(FilterTree::Const(false))) => FilterTree::Const(false),
                (FilterTree::Const(true), Some(r)) => r.clone(),
                (l, Some(FilterTree::Const(true))) => l.clone(),
                _ => FilterTree::Cond { op: CondOp::And, left: Box::new(l), right: r.map(Box::new) },
            }
        }
        FilterTree::Cond { op: CondOp::Or, left, right } => {
            let l = fold(left, functions);
            let r = right.as_ref().map(|r| fold(r, functions));
            match (&l, &r) {
                (FilterTree::Const(true), _) | (_, Some(FilterTree::Const(true))) => FilterTree::Const(true),
                (FilterTree::Const(false), Some(r)) => r.clone(),
                (l, Some(FilterTree::Const(false))) => l.clone(),
                _ => FilterTree::Cond { op: CondOp::Or, left: Box::new(l), right: r.map(Box::new) },
            }
        }
        FilterTree::Cond { op: CondOp::Xor, left, right } => {
            let l = fold(left, functions);
            let r = right.as_ref().map(|r| fold(r, functions));
            if let (FilterTree::Const(a), Some(FilterTree::Const(b))) = (&l, &r) {
                return FilterTree::Const(a != b);
            }
            FilterTree::Cond { op: CondOp::Xor, left: Box::new(l), right: r.map(Box::new) }
        }
    }
}
