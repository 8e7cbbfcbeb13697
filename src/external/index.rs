//! The full-text/secondary-index collaborator contract (§6): `create`,
//! `add_document`, `remove_document`, `query_iterator_next`, plus the
//! query-node constructors `token`/`tag`/`numeric-range`/`geo`/`lex-range`/
//! `union`/`intersect`/`empty` that [`crate::filter::index_pushdown`]
//! translates a tightened filter subtree into.
//!
//! This crate's own exact-match attribute index
//! ([`crate::graph::schema::ExactMatchIndex`]) answers the `Numeric`/
//! `LexRange`/`Tag` node shapes directly off its B+ tree; `Token` (free-text)
//! and `Geo` (radius search over a spatial structure) have no in-core
//! backend and are the seam a host wires its own full-text/geo index
//! behind via this trait.

pub use crate::filter::index_pushdown::IndexQueryNode;

/// A document identifier as the external index sees it — this crate's
/// graph entities identify themselves by their dense `u64` id.
pub type DocId = u64;

pub trait SecondaryIndex {
    fn create(&mut self, label: &str, attribute: &str);
    fn add_document(&mut self, id: DocId, value: &crate::value::V);
    fn remove_document(&mut self, id: DocId);
    /// Evaluate `query` and return the next matching document id, or
    /// `None` once the query is exhausted.
    fn query_iterator_next(&mut self, query: &IndexQueryNode) -> Option<DocId>;
}

/// Evaluate an [`IndexQueryNode`] against this crate's in-core exact-match
/// index for the `Numeric`/`LexRange`/`Tag`/`Union`/`Intersect`/`Empty`
/// node shapes (everything index push-down can itself produce from a
/// filter tree, §4.6). `Token`/`Geo` nodes require a full-text/spatial
/// backend this crate doesn't carry and return no matches here — a host
/// wiring a real [`SecondaryIndex`] answers those instead.
pub fn eval_against_exact_match(index: &crate::graph::schema::ExactMatchIndex, query: &IndexQueryNode) -> Vec<DocId> {
    use crate::value::V;
    match query {
        IndexQueryNode::Empty => Vec::new(),
        IndexQueryNode::Token(_) | IndexQueryNode::Geo { .. } => Vec::new(),
        IndexQueryNode::Tag { value, .. } => index.seek(&V::string(value.clone())),
        IndexQueryNode::Numeric { min, max, .. } => {
            let lo = min.as_ref().map(|(v, _)| V::Double(*v));
            let hi = max.as_ref().map(|(v, _)| V::Double(*v));
            index.range(lo.as_ref(), hi.as_ref())
        }
        IndexQueryNode::LexRange { min, max, .. } => {
            let lo = min.as_ref().map(|(v, _)| V::string(v.clone()));
            let hi = max.as_ref().map(|(v, _)| V::string(v.clone()));
            index.range(lo.as_ref(), hi.as_ref())
        }
        IndexQueryNode::Union(nodes) => {
            let mut out: Vec<DocId> = nodes.iter().flat_map(|n| eval_against_exact_match(index, n)).collect();
            out.sort_unstable();
            out.dedup();
            out
        }
        IndexQueryNode::Intersect(nodes) => {
            let Some((first, rest)) = nodes.split_first() else { return Vec::new() };
            let mut acc: std::collections::HashSet<DocId> = eval_against_exact_match(index, first).into_iter().collect();
            for n in rest {
                let hits: std::collections::HashSet<DocId> = eval_against_exact_match(index, n).into_iter().collect();
                acc = acc.intersection(&hits).copied().collect();
            }
            let mut out: Vec<DocId> = acc.into_iter().collect();
            out.sort_unstable();
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::schema::IndexTarget;
    use crate::types::{AttrId, LabelId};
    use crate::value::V;

    #[test]
    fn numeric_node_evaluates_as_a_range_scan() {
        let mut idx = crate::graph::schema::ExactMatchIndex::new(IndexTarget::Node, LabelId::new(0), AttrId::new(0).unwrap());
        idx.insert(V::Int64(10), 1);
        idx.insert(V::Int64(20), 2);
        let node = IndexQueryNode::Numeric { attribute: "age".into(), min: Some((15.0, true)), max: None };
        assert_eq!(eval_against_exact_match(&idx, &node), vec![2]);
    }

    #[test]
    fn empty_node_never_matches() {
        let idx = crate::graph::schema::ExactMatchIndex::new(IndexTarget::Node, LabelId::new(0), AttrId::new(0).unwrap());
        assert!(eval_against_exact_match(&idx, &IndexQueryNode::Empty).is_empty());
    }

    #[test]
    fn intersect_of_two_tags_is_their_common_ids() {
        let mut idx = crate::graph::schema::ExactMatchIndex::new(IndexTarget::Node, LabelId::new(0), AttrId::new(0).unwrap());
        idx.insert(V::from("x"), 1);
        idx.insert(V::from("x"), 2);
        let node = IndexQueryNode::Intersect(vec![
            IndexQueryNode::Tag { attribute: "name".into(), value: "x".into() },
            IndexQueryNode::Tag { attribute: "name".into(), value: "x".into() },
        ]);
        assert_eq!(eval_against_exact_match(&idx, &node), vec![1, 2]);
    }
}
