//! GraphCore — an embeddable property-graph query engine core.
//!
//! This crate implements the query-compilation and execution layer of a
//! labeled, directed, attributed multigraph database: the tagged value
//! system, the in-memory graph store, filter-tree normalization and index
//! push-down, a pull-based operator execution plan, the undo log that makes
//! a query atomic under failure, an asynchronous constraint engine, and the
//! path-finding procedures exposed via `CALL`.
//!
//! What this crate deliberately does not do — parsing a query-language AST,
//! on-disk durability, network framing, client protocol, clustering and
//! multi-tenant host integration — lives behind the narrow collaborator
//! traits in [`external`]; a host wires its own implementation behind them.

pub mod attribute_set;
pub mod builders;
pub mod config;
pub mod constraints;
pub mod errors;
pub mod expr;
pub mod external;
pub mod filter;
pub mod graph;
pub mod observability;
pub mod plan;
pub mod procedures;
pub mod pure;
pub mod query_graph;
pub mod record;
pub mod resultset;
pub mod types;
pub mod undo_log;
pub mod value;

// Re-export the value system and core identifier types.
pub use types::{AttrId, Direction, EdgeId, LabelId, NodeId, RelTypeId, SchemaName};
pub use value::{EdgeRef, NodeRef, PathValue, Point, V};

// Re-export the graph data model.
pub use graph::{Edge, GraphStore, Node};
pub use graph::entities::GraphEntity;
pub use graph::schema::{ExactMatchIndex, IndexTarget, Schema};

// Re-export the attribute set and record types.
pub use attribute_set::AttributeSet;
pub use record::{Record, RecordSchema};

// Re-export the query graph.
pub use query_graph::{AliasId, EdgePattern, NodePattern, QueryGraph};

// Re-export the filter tree and expression system.
pub use expr::Exp;
pub use filter::{CompareOp, CondOp, FilterTree};

// Re-export the execution plan.
pub use plan::{BoxOperator, ExecutionStats, Operator, QueryCtx};

// Re-export result sets and wire-format encoders.
pub use resultset::{
    compact_result, compact_row, verbose_result, verbose_row, ColumnHeader, ColumnKind, ResultSet, TypeTag,
};

// Re-export the undo log.
pub use undo_log::UndoLog;

// Re-export constraints.
pub use constraints::{Constraint, ConstraintKind, ConstraintRegistry, ConstraintStatus, EntityType, SchemaId};

// Re-export errors.
pub use errors::{QueryError, QueryResult};

// Re-export configuration.
pub use builders::EngineConfigBuilder;
pub use config::EngineConfig;

// Re-export observability.
pub use observability::{init_logging, init_logging_with_level, log_operation, record_metric, with_trace_id, MetricType, Operation};

// Re-export graph procedures.
pub use procedures::{all_paths_rows, list_constraints, shortest_path_rows, PATH_COLUMNS};
pub use procedures::path::{Path, PathConfig};

// Re-export the pure B+ tree backing attribute indexes.
pub use pure::{create_empty_tree, delete_from_tree, insert_into_tree, search_in_tree, BTreeNode, BTreeRoot};
