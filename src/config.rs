//! Engine-wide configuration. A plain, `Default`-implementing struct
//! constructed directly or via [`crate::builders::EngineConfigBuilder`] —
//! this layer is never parsed from a config file; that belongs to the
//! out-of-scope host integration.

use crate::graph::matrix::SyncPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of pending entities processed per constraint-enforcement
    /// batch before the writer lock is released (§4.9).
    pub constraint_batch_size: usize,
    /// Default `pathCount` cap for `algo.SPpaths`/`algo.SSpaths` when the
    /// query omits one.
    pub default_path_count_cap: usize,
    /// Default matrix sync policy applied after a mutation batch commits.
    pub default_sync_policy: SyncPolicy,
    /// How long a caller blocks waiting to acquire the store's
    /// readers-writer lock before failing with `QueryError::Timeout`.
    pub lock_acquire_timeout_ms: u64,
    /// Default wall-clock budget for one query's execution.
    pub query_timeout_ms: u64,
    /// Worker threads available to the executor's thread pool collaborator.
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            constraint_batch_size: 1000,
            default_path_count_cap: 1,
            default_sync_policy: SyncPolicy::Resize,
            lock_acquire_timeout_ms: 5_000,
            query_timeout_ms: 30_000,
            worker_threads: num_cpus::get(),
        }
    }
}
