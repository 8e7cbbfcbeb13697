//! Index push-down (§4.6): translate the subset of a filter tree that an
//! indexed label's attributes can answer into an index-query subtree,
//! leaving whatever remains as a residual filter tree the plan still
//! evaluates row-by-row. `NodeByLabelScan` is replaced by `IndexScan` only
//! when at least one subtree pushed.

use super::range::{NumericRange, StringRange};
use super::{CompareOp, FilterTree};
use crate::expr::Exp;
use crate::value::{Point, V};
use std::collections::{HashMap, HashSet};

/// The external secondary-index collaborator's query-node shape (§6):
/// `token`/`tag` (exact match), `numeric`/`geo`/`lex-range` (range scans),
/// `union`/`intersect` (combinators), `empty` (provably no matches).
#[derive(Debug, Clone, PartialEq)]
pub enum IndexQueryNode {
    Token(String),
    Tag { attribute: String, value: String },
    Numeric { attribute: String, min: Option<(f64, bool)>, max: Option<(f64, bool)> },
    Geo { attribute: String, origin: Point, radius: f64 },
    LexRange { attribute: String, min: Option<(String, bool)>, max: Option<(String, bool)> },
    Union(Vec<IndexQueryNode>),
    Intersect(Vec<IndexQueryNode>),
    Empty,
}

enum Pushed {
    Range { attribute: String, op: CompareOp, value: V },
    In { attribute: String, values: Vec<V> },
    Geo { attribute: String, origin: Point, radius: f64 },
}

/// Classify one subtree from [`FilterTree::sub_trees`] as index-applicable
/// or not. Applicable forms (§4.6): a simple comparison on an indexed
/// `alias.attribute`, no `≠`; `IN` over a literal list with no `null`
/// members; `distance(alias.attribute, origin) < radius`.
fn classify(tree: &FilterTree, alias: &str, indexed: &HashSet<String>) -> Option<Pushed> {
    match tree {
        FilterTree::Pred { lhs: Exp::Property { alias: a, attribute }, op, rhs: Exp::Const(v) }
            if a == alias && indexed.contains(attribute) =>
        {
            match op {
                CompareOp::Eq | CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
                    Some(Pushed::Range { attribute: attribute.clone(), op: *op, value: v.clone() })
                }
                CompareOp::In => match v {
                    V::Array(items) if !items.is_empty() && items.iter().all(|it| !it.is_null()) => {
                        Some(Pushed::In { attribute: attribute.clone(), values: items.as_ref().clone() })
                    }
                    _ => None,
                },
                _ => None,
            }
        }
        FilterTree::Pred { lhs: Exp::FunctionCall { name, args }, op: CompareOp::Lt | CompareOp::Le, rhs: Exp::Const(V::Double(radius)) }
            if name == "distance" =>
        {
            geo_operands(args, alias, indexed).map(|(attribute, origin)| Pushed::Geo { attribute, origin, radius: *radius })
        }
        _ => None,
    }
}

fn geo_operands(args: &[Exp], alias: &str, indexed: &HashSet<String>) -> Option<(String, Point)> {
    match args {
        [Exp::Property { alias: a, attribute }, Exp::Const(V::Point(p))] if a == alias && indexed.contains(attribute) => {
            Some((attribute.clone(), *p))
        }
        [Exp::Const(V::Point(p)), Exp::Property { alias: a, attribute }] if a == alias && indexed.contains(attribute) => {
            Some((attribute.clone(), *p))
        }
        _ => None,
    }
}

/// Split `tree` into an index-query subtree (if anything pushed) and the
/// residual filter tree (if anything remains). An empty range collapses
/// the whole query to [`IndexQueryNode::Empty`] regardless of what else
/// pushed, since the scan can never produce a row (§4.6, §8 "range
/// validity").
pub fn push_down(tree: &FilterTree, alias: &str, indexed_attrs: &HashSet<String>) -> (Option<IndexQueryNode>, Option<FilterTree>) {
    let mut numeric_ranges: HashMap<String, NumericRange> = HashMap::new();
    let mut string_ranges: HashMap<String, StringRange> = HashMap::new();
    let mut pushed_nodes: Vec<IndexQueryNode> = Vec::new();
    let mut residual: Vec<FilterTree> = Vec::new();

    for sub in tree.sub_trees() {
        match classify(sub, alias, indexed_attrs) {
            Some(Pushed::Range { attribute, op, value }) => match value {
                V::Int64(i) => numeric_ranges.entry(attribute).or_insert_with(NumericRange::unbounded).tighten(op, i as f64),
                V::Double(d) => numeric_ranges.entry(attribute).or_insert_with(NumericRange::unbounded).tighten(op, d),
                V::String(s) => string_ranges.entry(attribute).or_insert_with(StringRange::unbounded).tighten(op, s.to_string()),
                _ => residual.push(sub.clone()),
            },
            Some(Pushed::In { attribute, values }) => {
                let members = values
                    .iter()
                    .map(|v| IndexQueryNode::Tag { attribute: attribute.clone(), value: crate::value::render::display(v) })
                    .collect();
                pushed_nodes.push(IndexQueryNode::Union(members));
            }
            Some(Pushed::Geo { attribute, origin, radius }) => {
                pushed_nodes.push(IndexQueryNode::Geo { attribute, origin, radius });
            }
            None => residual.push(sub.clone()),
        }
    }

    for (attribute, range) in numeric_ranges {
        if range.is_empty() {
            return (Some(IndexQueryNode::Empty), None);
        }
        pushed_nodes.push(IndexQueryNode::Numeric {
            attribute,
            min: range.min.map(|b| (b.value, b.inclusive)),
            max: range.max.map(|b| (b.value, b.inclusive)),
        });
    }
    for (attribute, range) in string_ranges {
        if range.is_empty() {
            return (Some(IndexQueryNode::Empty), None);
        }
        pushed_nodes.push(IndexQueryNode::LexRange {
            attribute,
            min: range.min.map(|b| (b.value, b.inclusive)),
            max: range.max.map(|b| (b.value, b.inclusive)),
        });
    }

    let index_query = match pushed_nodes.len() {
        0 => None,
        1 => pushed_nodes.into_iter().next(),
        _ => Some(IndexQueryNode::Intersect(pushed_nodes)),
    };
    let residual_tree = residual.into_iter().reduce(FilterTree::and);
    (index_query, residual_tree)
}
