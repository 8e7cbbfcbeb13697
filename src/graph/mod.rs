//! The in-memory graph data model: entities, sparse label/relation
//! matrices, the mutable store, and the schema/index layer above it.

pub mod entities;
pub mod matrix;
pub mod schema;
pub mod store;

pub use entities::{Edge, Node};
pub use store::GraphStore;
