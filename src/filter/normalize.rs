//! Normalize a filter tree so every `Pred`'s constant operand (if any) sits
//! on the right-hand side (§4.5). Index push-down and range tightening
//! both assume this shape.

use super::{CompareOp, CondOp, FilterTree};

pub fn normalize(tree: &FilterTree) -> FilterTree {
    match tree {
        FilterTree::Pred { lhs, op, rhs } => {
            if !lhs.is_constant() || rhs.is_constant() {
                return FilterTree::Pred { lhs: lhs.clone(), op: *op, rhs: rhs.clone() };
            }
            match op.flip() {
                Some(flipped) => FilterTree::Pred { lhs: rhs.clone(), op: flipped, rhs: lhs.clone() },
                None => FilterTree::Pred { lhs: lhs.clone(), op: *op, rhs: rhs.clone() },
            }
        }
        FilterTree::Cond { op, left, right } => FilterTree::Cond {
            op: *op,
            left: Box::new(normalize(left)),
            right: right.as_ref().map(|r| Box::new(normalize(r))),
        },
        FilterTree::Exp(e) => FilterTree::Exp(e.clone()),
        FilterTree::Const(b) => FilterTree::Const(*b),
    }
}
