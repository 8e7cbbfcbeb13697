//! Execution plan rewrites (§4.7): the pass run between compiling a query's
//! filter tree and wiring it into an operator tree.
//!
//! 1. Normalize → push De Morgan's `not` to the leaves → constant-fold
//!    (§4.5's own pipeline, composed here in the order the planner runs it).
//! 2. Decide whether a label scan can be replaced by an [`IndexScan`]: if
//!    any top-level conjunct pushes down to an index query (§4.6), that
//!    conjunct is dropped from the residual filter the plan still
//!    evaluates row-by-row — the index already enforced it exactly.
//! 3. Reorder the remaining conjuncts so the ones a filter operator can
//!    answer without calling into the function registry run first — a
//!    registry call is the one predicate form whose cost isn't a simple
//!    tree-shape comparison, so cheap predicates get first refusal at
//!    rejecting a row.

use super::scan::{IndexScan, NodeByLabelScan};
use crate::filter::index_pushdown::{push_down, IndexQueryNode};
use crate::filter::{demorgan::demorgan, fold::fold, normalize::normalize, FilterTree};
use crate::graph::schema::IndexTarget;
use crate::graph::store::GraphStore;
use crate::record::RecordSchema;
use crate::types::{AttrId, LabelId};
use crate::value::V;
use std::collections::HashSet;

/// Run the full §4.5 normalization pipeline: normalize constant-on-the-left
/// predicates, push `not` to the leaves, then fold constant subtrees.
pub fn simplify(tree: &FilterTree, functions: &dyn Fn(&str, &[V]) -> crate::errors::QueryResult<V>) -> FilterTree {
    fold(&demorgan(&normalize(tree)), functions)
}

fn references_function_call(tree: &FilterTree) -> bool {
    fn exp_has_call(exp: &crate::expr::Exp) -> bool {
        use crate::expr::Exp;
        match exp {
            Exp::FunctionCall { .. } => true,
            Exp::Add(a, b) | Exp::Sub(a, b) | Exp::Mul(a, b) | Exp::Div(a, b) | Exp::Mod(a, b) => exp_has_call(a) || exp_has_call(b),
            Exp::Neg(a) => exp_has_call(a),
            Exp::Const(_) | Exp::Alias(_) | Exp::Property { .. } => false,
        }
    }
    match tree {
        FilterTree::Pred { lhs, rhs, .. } => exp_has_call(lhs) || exp_has_call(rhs),
        FilterTree::Exp(e) => exp_has_call(e),
        FilterTree::Cond { left, right, .. } => references_function_call(left) || right.as_ref().is_some_and(|r| references_function_call(r)),
        FilterTree::Const(_) => false,
    }
}

/// Reorder a top-level conjunct list so predicates free of function calls
/// run before ones that call into the registry, preserving relative order
/// within each group (a stable sort) so conjuncts with no dependency
/// ordering between them don't get needlessly shuffled.
pub fn reorder_conjuncts(conjuncts: Vec<FilterTree>) -> Vec<FilterTree> {
    let mut indexed: Vec<(bool, FilterTree)> = conjuncts.into_iter().map(|t| (references_function_call(&t), t)).collect();
    indexed.sort_by_key(|(has_call, _)| *has_call);
    indexed.into_iter().map(|(_, t)| t).collect()
}

/// Recombine a conjunct list back into a single `and`-chain, or `Const(true)`
/// for an empty list (the identity filter).
pub fn rebuild_conjunction(conjuncts: Vec<FilterTree>) -> FilterTree {
    let mut iter = conjuncts.into_iter();
    let Some(first) = iter.next() else { return FilterTree::Const(true) };
    iter.fold(first, FilterTree::and)
}

/// The outcome of attempting to cover a `NodeByLabelScan` with an index:
/// either the scan stays label-driven, or it is replaced by an
/// [`IndexScan`] and the covering conjunct is removed from what the plan
/// still needs to check row-by-row.
pub enum ScanChoice {
    Label,
    Index { query: IndexQueryNode },
}

/// Try to cover a label scan's filter with an index on `label`/`attr`
/// (§4.6, §4.7 "replace index-covered `NodeByLabelScan` with `IndexScan`").
/// Peels the filter into its top-level conjuncts (stopping at `or`
/// boundaries, per [`FilterTree::sub_trees`]), classifies each against the
/// indexed attribute, and pushes the first one that qualifies. Returns the
/// scan choice plus whatever conjuncts remain unconsumed.
pub fn cover_label_scan(tree: &FilterTree, alias: &str, attr_name: &str) -> (ScanChoice, Vec<FilterTree>) {
    let indexed: HashSet<String> = std::iter::once(attr_name.to_string()).collect();
    let conjuncts = tree.sub_trees();
    for (i, candidate) in conjuncts.iter().enumerate() {
        let (pushed, residual) = push_down(candidate, alias, &indexed);
        if let Some(query) = pushed {
            let mut remaining: Vec<FilterTree> = conjuncts.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, t)| (*t).clone()).collect();
            if let Some(r) = residual {
                remaining.push(r);
            }
            return (ScanChoice::Index { query }, remaining);
        }
    }
    (ScanChoice::Label, conjuncts.into_iter().cloned().collect())
}

/// Build the scan operator a rewritten plan should use: an [`IndexScan`]
/// when a covering index query was found, otherwise a plain
/// [`NodeByLabelScan`] over every node carrying `label`.
pub fn build_scan(schema: RecordSchema, alias: &str, label: LabelId, store: &GraphStore, choice: &ScanChoice, attr: AttrId) -> Box<dyn super::Operator> {
    match choice {
        ScanChoice::Index { query } => Box::new(IndexScan::new(schema, alias, label, attr, query, store)),
        ScanChoice::Label => {
            let ids = store.nodes_with_label(label);
            Box::new(NodeByLabelScan::new(schema, alias, ids))
        }
    }
}

/// `true` when replacing a label scan with an index scan is even worth
/// attempting: the label has at least one attribute index registered.
/// Mirrors §4.7's gate ("`NodeByLabelScan` is replaced by `IndexScan` only
/// when at least one subtree pushed") at the planning layer, before index
/// push-down itself is run.
pub fn label_has_index(store: &GraphStore, label: LabelId, attr: AttrId) -> bool {
    store.index_for(IndexTarget::Node, label, attr).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Exp;
    use crate::filter::CompareOp;

    fn noop_functions(_name: &str, _args: &[V]) -> crate::errors::QueryResult<V> {
        Err(crate::errors::QueryError::invalid_argument("test", "no functions registered"))
    }

    #[test]
    fn simplify_folds_constant_and_with_true() {
        let tree = FilterTree::and(FilterTree::Const(true), FilterTree::Pred { lhs: Exp::Const(V::Int64(1)), op: CompareOp::Eq, rhs: Exp::Const(V::Int64(1)) });
        let simplified = simplify(&tree, &noop_functions);
        assert!(matches!(simplified, FilterTree::Const(true)));
    }

    #[test]
    fn reorder_moves_function_call_predicates_last() {
        let plain = FilterTree::Pred { lhs: Exp::Alias("n".into()), op: CompareOp::Eq, rhs: Exp::Const(V::Int64(1)) };
        let with_call = FilterTree::Exp(Exp::FunctionCall { name: "exists".into(), args: vec![Exp::Alias("n".into())] });
        let reordered = reorder_conjuncts(vec![with_call.clone(), plain.clone()]);
        assert!(matches!(reordered[0], FilterTree::Pred { .. }));
        assert!(matches!(reordered[1], FilterTree::Exp(Exp::FunctionCall { .. })));
    }

    #[test]
    fn rebuild_conjunction_of_empty_list_is_const_true() {
        assert!(matches!(rebuild_conjunction(vec![]), FilterTree::Const(true)));
    }

    #[test]
    fn cover_label_scan_pushes_down_a_covering_equality() {
        let tree = FilterTree::Pred { lhs: Exp::Property { alias: "n".into(), attribute: "age".into() }, op: CompareOp::Eq, rhs: Exp::Const(V::Int64(30)) };
        let (choice, remaining) = cover_label_scan(&tree, "n", "age");
        assert!(matches!(choice, ScanChoice::Index { .. }));
        assert!(remaining.is_empty());
    }

    #[test]
    fn cover_label_scan_leaves_non_covering_predicate_in_place() {
        let tree = FilterTree::Pred { lhs: Exp::Property { alias: "n".into(), attribute: "name".into() }, op: CompareOp::Eq, rhs: Exp::Const(V::from("bob")) };
        let (choice, remaining) = cover_label_scan(&tree, "n", "age");
        assert!(matches!(choice, ScanChoice::Label));
        assert_eq!(remaining.len(), 1);
    }
}
