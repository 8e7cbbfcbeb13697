//! Push a `not` node through its subtree so only leaves carry negation
//! (§4.5). A `not` applied an odd number of times (tracked by the `negate`
//! flag as we recurse) flips `and`<->`or`, negates leaf predicate
//! operators in place where a complement exists, and otherwise wraps the
//! node in an explicit `not`.

use super::{CompareOp, CondOp, FilterTree};

pub fn demorgan(tree: &FilterTree) -> FilterTree {
    push_not(tree, false)
}

fn push_not(tree: &FilterTree, negate: bool) -> FilterTree {
    match tree {
        FilterTree::Cond { op: CondOp::Not, left, .. } => push_not(left, !negate),
        FilterTree::Cond { op: CondOp::And, left, right } => {
            let (l, r) = (push_not(left, negate), right.as_ref().map(|r| push_not(r, negate)));
            if negate {
                FilterTree::Cond { op: CondOp::Or, left: Box::new(l), right: r.map(Box::new) }
            } else {
                FilterTree::Cond { op: CondOp::And, left: Box::new(l), right: r.map(Box::new) }
            }
        }
        FilterTree::Cond { op: CondOp::Or, left, right } => {
            let (l, r) = (push_not(left, negate), right.as_ref().map(|r| push_not(r, negate)));
            if negate {
                FilterTree::Cond { op: CondOp::And, left: Box::new(l), right: r.map(Box::new) }
            } else {
                FilterTree::Cond { op: CondOp::Or, left: Box::new(l), right: r.map(Box::new) }
            }
        }
        FilterTree::Cond { op: CondOp::Xor, left, right } => {
            // No clean De Morgan form for xor; push into children unnegated
            // and wrap the whole node in `not` if a negation is pending.
            let node = FilterTree::Cond {
                op: CondOp::Xor,
                left: Box::new(push_not(left, false)),
                right: right.as_ref().map(|r| Box::new(push_not(r, false))),
            };
            if negate {
                FilterTree::not(node)
            } else {
                node
            }
        }
        FilterTree::Pred { lhs, op, rhs } => {
            if !negate {
                return FilterTree::Pred { lhs: lhs.clone(), op: *op, rhs: rhs.clone() };
            }
            match op.negate() {
                Some(negated) => FilterTree::Pred { lhs: lhs.clone(), op: negated, rhs: rhs.clone() },
                None => FilterTree::not(FilterTree::Pred { lhs: lhs.clone(), op: *op, rhs: rhs.clone() }),
            }
        }
        FilterTree::Exp(e) => {
            let node = FilterTree::Exp(e.clone());
            if negate {
                FilterTree::not(node)
            } else {
                node
            }
        }
        FilterTree::Const(b) => FilterTree::Const(if negate { !b } else { *b }),
    }
}

#[allow(unused)]
fn requires_no_complement(op: CompareOp) -> bool {
    op.negate().is_none()
}
