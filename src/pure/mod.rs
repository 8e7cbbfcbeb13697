//! Pure, side-effect-free data structures shared by the engine.
//!
//! Only the generic B+ tree survives here from the teacher's original
//! "pure functions" module — it backs [`crate::graph::schema::ExactMatchIndex`].
//! The document-store-specific bulk-load helpers the teacher built this
//! module around (`bulk_insert_into_tree` et al., keyed on its own
//! `ValidatedDocumentId`/`ValidatedPath` types) had no counterpart in a
//! property-graph engine and were dropped.

pub mod btree;

pub use btree::{create_empty_tree, delete_from_tree, insert_into_tree, search_in_tree, BTreeNode, BTreeRoot};
