//! Execution plan (§4.7): a DAG of pull-based operators. `consume()`
//! returns the next [`Record`] or end-of-stream (`None`); inner operators
//! transform rows pulled from their children, leaves either scan the graph
//! store or synthesize rows, and sinks commit mutations or hand rows to a
//! [`crate::resultset`] formatter.
//!
//! Each query runs on one worker thread pulling rows through its operator
//! tree sequentially (§7 "scheduling model"); [`QueryCtx`] is that thread's
//! scoped state — graph store access, undo log, execution statistics and
//! the cooperative cancellation flag — threaded through every `consume`
//! call rather than held as a process-global.

pub mod aggregate;
pub mod apply;
pub mod call_subquery;
pub mod expand;
pub mod filter;
pub mod limit;
pub mod mutate;
pub mod procedure_call;
pub mod project;
pub mod rewrite;
pub mod scan;
pub mod sort;

use crate::errors::QueryResult;
use crate::graph::store::GraphStore;
use crate::record::Record;
use crate::undo_log::UndoLog;
use crate::value::V;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type FunctionRegistry = Arc<dyn Fn(&str, &[V]) -> QueryResult<V> + Send + Sync>;

/// Running counters surfaced to the caller as execution statistics (§4.7
/// "update statistics", §8 seed scenario 5's `stats` assertion).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionStats {
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub relationships_created: u64,
    pub relationships_deleted: u64,
    pub properties_set: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
}

/// The per-query scoped state a worker thread owns for the lifetime of one
/// query (§7 "query isolation"): store access, the reversible mutation
/// log, statistics, the function registry and cooperative cancellation.
pub struct QueryCtx<'a> {
    pub store: &'a mut GraphStore,
    pub undo: UndoLog,
    pub stats: ExecutionStats,
    pub functions: FunctionRegistry,
    pub deadline: Option<Instant>,
    pub cancel: Arc<AtomicBool>,
}

impl<'a> QueryCtx<'a> {
    pub fn new(store: &'a mut GraphStore, functions: FunctionRegistry) -> Self {
        Self {
            store,
            undo: UndoLog::default(),
            stats: ExecutionStats::default(),
            functions,
            deadline: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Polled at each operator boundary (§7 "suspension points",
    /// "cancellation"). `true` once the cooperative cancel flag is set or
    /// the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(AtomicOrdering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn call_function(&self, name: &str, args: &[V]) -> QueryResult<V> {
        (self.functions)(name, args)
    }
}

/// A pull-based execution operator. Every clause lowers to a tree of these;
/// `consume` is called repeatedly until it returns `Ok(None)` (end of
/// stream) or an error, which the driver turns into an undo-log rollback.
pub trait Operator: std::fmt::Debug {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>>;

    /// Reset internal iteration state so the operator can be pulled from
    /// the beginning again — used by `Apply`'s right-hand subplan, which
    /// restarts once per left-hand input record.
    fn reset(&mut self) {}
}

pub type BoxOperator = Box<dyn Operator>;

/// Returned by [`Operator::consume`] boundaries to signal the query was
/// cancelled or timed out mid-pipeline (§7 "cancellation"): the driver
/// treats this the same as any other error — undo-log rollback, release
/// locks, free per-query state.
pub fn check_cancelled(ctx: &QueryCtx) -> QueryResult<()> {
    if ctx.is_cancelled() {
        return Err(crate::errors::QueryError::Cancelled);
    }
    Ok(())
}
