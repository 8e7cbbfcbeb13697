//! Fluent builders, following the teacher codebase's `XBuilder` pattern:
//! a builder validates its inputs only at `build()`, never on individual
//! setter calls, so callers can set fields in any order without tripping
//! an intermediate invariant.

use crate::config::EngineConfig;
use crate::errors::{QueryError, QueryResult};
use crate::graph::matrix::SyncPolicy;

#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    constraint_batch_size: Option<usize>,
    default_path_count_cap: Option<usize>,
    default_sync_policy: Option<SyncPolicy>,
    lock_acquire_timeout_ms: Option<u64>,
    query_timeout_ms: Option<u64>,
    worker_threads: Option<usize>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraint_batch_size(mut self, size: usize) -> Self {
        self.constraint_batch_size = Some(size);
        self
    }

    pub fn default_path_count_cap(mut self, cap: usize) -> Self {
        self.default_path_count_cap = Some(cap);
        self
    }

    pub fn default_sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.default_sync_policy = Some(policy);
        self
    }

    pub fn lock_acquire_timeout_ms(mut self, ms: u64) -> Self {
        self.lock_acquire_timeout_ms = Some(ms);
        self
    }

    pub fn query_timeout_ms(mut self, ms: u64) -> Self {
        self.query_timeout_ms = Some(ms);
        self
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn build(self) -> QueryResult<EngineConfig> {
        let defaults = EngineConfig::default();
        let cfg = EngineConfig {
            constraint_batch_size: self.constraint_batch_size.unwrap_or(defaults.constraint_batch_size),
            default_path_count_cap: self.default_path_count_cap.unwrap_or(defaults.default_path_count_cap),
            default_sync_policy: self.default_sync_policy.unwrap_or(defaults.default_sync_policy),
            lock_acquire_timeout_ms: self.lock_acquire_timeout_ms.unwrap_or(defaults.lock_acquire_timeout_ms),
            query_timeout_ms: self.query_timeout_ms.unwrap_or(defaults.query_timeout_ms),
            worker_threads: self.worker_threads.unwrap_or(defaults.worker_threads),
        };

        if cfg.constraint_batch_size == 0 {
            return Err(QueryError::invalid_argument(
                "EngineConfigBuilder",
                "constraint_batch_size must be greater than zero",
            ));
        }
        if cfg.worker_threads == 0 {
            return Err(QueryError::invalid_argument(
                "EngineConfigBuilder",
                "worker_threads must be greater than zero",
            ));
        }
        if cfg.query_timeout_ms == 0 {
            return Err(QueryError::invalid_argument(
                "EngineConfigBuilder",
                "query_timeout_ms must be greater than zero",
            ));
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_with_no_overrides_matches_default() {
        let cfg = EngineConfigBuilder::new().build().unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn builder_overrides_take_effect() {
        let cfg = EngineConfigBuilder::new().constraint_batch_size(50).worker_threads(2).build().unwrap();
        assert_eq!(cfg.constraint_batch_size, 50);
        assert_eq!(cfg.worker_threads, 2);
    }

    #[test]
    fn builder_rejects_zero_batch_size() {
        assert!(EngineConfigBuilder::new().constraint_batch_size(0).build().is_err());
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(EngineConfigBuilder::new().query_timeout_ms(0).build().is_err());
    }
}
