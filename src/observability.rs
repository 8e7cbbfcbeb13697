//! Structured logging, tracing and in-process metrics for the query engine.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

static OPERATION_COUNTER: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNTER: AtomicU64 = AtomicU64::new(0);
static QUERY_COUNTER: AtomicU64 = AtomicU64::new(0);
static INDEX_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Initialize logging with the engine's default verbosity (warnings and
/// errors for `graphcore`, errors only for dependencies). Call once at
/// process startup; safe to call more than once (subsequent calls are a
/// no-op, matching test-harness re-entry).
pub fn init_logging() -> Result<()> {
    init_logging_with_level(false, false)
}

/// Initialize logging with explicit verbosity flags. `quiet` always wins
/// over `verbose` and over `RUST_LOG`.
pub fn init_logging_with_level(verbose: bool, quiet: bool) -> Result<()> {
    let filter_level = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("graphcore=debug,info")
    } else {
        EnvFilter::new("graphcore=warn,error")
    };

    let env_filter = if quiet {
        EnvFilter::new("error")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or(filter_level)
    } else {
        filter_level
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(!quiet)
        .with_thread_ids(!quiet)
        .with_line_number(!quiet)
        .with_file(!quiet)
        .with_ansi(true);

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => {
            if !quiet {
                info!("graphcore observability initialized");
            }
            Ok(())
        }
        Err(_) => Ok(()),
    }
}

/// Structured description of an engine operation, for uniform logging
/// across the plan tree and the mutation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    PlanBuild {
        query_id: Uuid,
        operator_count: usize,
    },
    PlanExecute {
        query_id: Uuid,
        rows_produced: usize,
    },
    IndexScan {
        label: String,
        rows_scanned: usize,
    },
    IndexSeek {
        attribute: String,
        hits: usize,
    },
    MutationCommit {
        query_id: Uuid,
        nodes_created: usize,
        edges_created: usize,
        entities_deleted: usize,
    },
    ConstraintEnforcement {
        schema: String,
        pending_before: usize,
        pending_after: usize,
    },
    UndoRollback {
        entries_reverted: usize,
    },
}

impl Operation {
    pub fn validate(&self) -> Result<()> {
        match self {
            Operation::PlanBuild { operator_count, .. } => {
                if *operator_count == 0 {
                    anyhow::bail!("a plan must have at least one operator");
                }
            }
            Operation::ConstraintEnforcement {
                pending_before,
                pending_after,
                ..
            } => {
                if pending_after > pending_before {
                    anyhow::bail!("pending constraint count cannot grow during enforcement");
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Metric kinds recorded by [`record_metric`].
#[derive(Debug, Clone)]
pub enum MetricType {
    Counter { name: &'static str, value: u64 },
    Gauge { name: &'static str, value: f64 },
    Histogram { name: &'static str, value: f64, unit: &'static str },
    Timer { name: &'static str, duration: Duration },
}

/// Per-query tracing context, threaded through operator `consume()` calls
/// via `QueryCtx` so every log line can be correlated back to one query.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub trace_id: Uuid,
    pub span_id: Uuid,
    pub parent_span_id: Option<Uuid>,
    pub operation: String,
    pub start_time: Instant,
    pub attributes: Vec<(String, String)>,
}

impl OperationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            span_id: Uuid::new_v4(),
            parent_span_id: None,
            operation: operation.into(),
            start_time: Instant::now(),
            attributes: Vec::new(),
        }
    }

    pub fn child(&self, operation: impl Into<String>) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: Uuid::new_v4(),
            parent_span_id: Some(self.span_id),
            operation: operation.into(),
            start_time: Instant::now(),
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((key.into(), value.into()));
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[instrument(skip(ctx))]
pub fn log_operation(ctx: &OperationContext, op: &Operation, result: &Result<()>) {
    let elapsed = ctx.elapsed();
    let attrs = ctx
        .attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");

    match result {
        Ok(()) => {
            info!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                parent_span_id = ?ctx.parent_span_id,
                operation = %ctx.operation,
                elapsed_ms = elapsed.as_millis(),
                attributes = %attrs,
                "operation completed: {:?}", op
            );
            OPERATION_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            error!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                parent_span_id = ?ctx.parent_span_id,
                operation = %ctx.operation,
                elapsed_ms = elapsed.as_millis(),
                attributes = %attrs,
                error = %e,
                "operation failed: {:?}", op
            );
            ERROR_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
    }

    match op {
        Operation::PlanExecute { .. } => {
            QUERY_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        Operation::IndexScan { .. } | Operation::IndexSeek { .. } => {
            INDEX_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        _ => {}
    }
}

pub fn record_metric(metric: MetricType) {
    match metric {
        MetricType::Counter { name, value } => debug!("metric.counter {} = {}", name, value),
        MetricType::Gauge { name, value } => debug!("metric.gauge {} = {}", name, value),
        MetricType::Histogram { name, value, unit } => {
            debug!("metric.histogram {} = {} {}", name, value, unit)
        }
        MetricType::Timer { name, duration } => debug!("metric.timer {} = {:?}", name, duration),
    }
}

/// Run a future under a fresh trace context, logging entry/exit and timing.
pub async fn with_trace_id<F, T>(operation: &str, f: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let ctx = OperationContext::new(operation);
    info!(trace_id = %ctx.trace_id, span_id = %ctx.span_id, "starting operation: {}", operation);

    let start = Instant::now();
    let result = f.await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => {
            info!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                elapsed_ms = elapsed.as_millis(),
                "operation completed successfully: {}", operation
            );
            record_metric(MetricType::Timer { name: "operation.duration", duration: elapsed });
        }
        Err(e) => {
            error!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                elapsed_ms = elapsed.as_millis(),
                error = %e,
                "operation failed: {}", operation
            );
            record_metric(MetricType::Counter { name: "operation.errors", value: 1 });
        }
    }

    result
}

pub fn get_metrics() -> serde_json::Value {
    serde_json::json!({
        "operations": {
            "total": OPERATION_COUNTER.load(Ordering::Relaxed),
            "errors": ERROR_COUNTER.load(Ordering::Relaxed),
            "queries": QUERY_COUNTER.load(Ordering::Relaxed),
            "index_ops": INDEX_COUNTER.load(Ordering::Relaxed),
        },
        "timestamp": Utc::now().to_rfc3339(),
    })
}

#[instrument]
pub fn log_error_with_context(error: &anyhow::Error, ctx: &OperationContext) {
    let error_chain = error.chain().map(|e| e.to_string()).collect::<Vec<_>>().join(" -> ");
    error!(
        trace_id = %ctx.trace_id,
        span_id = %ctx.span_id,
        operation = %ctx.operation,
        error_chain = %error_chain,
        "error occurred during operation"
    );
}

/// Scoped timer that logs and records a metric on drop. Used around
/// `consume()` calls in the plan tree when the `trace` config flag is set.
pub struct PerfTimer {
    name: String,
    start: Instant,
    ctx: OperationContext,
}

impl PerfTimer {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let ctx = OperationContext::new(&name);
        info!(trace_id = %ctx.trace_id, span_id = %ctx.span_id, "timer started: {}", name);
        Self { name, start: Instant::now(), ctx }
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        info!(
            trace_id = %self.ctx.trace_id,
            span_id = %self.ctx.span_id,
            elapsed_ms = elapsed.as_millis(),
            "timer completed: {}", self.name
        );
        record_metric(MetricType::Timer { name: "perf.timer", duration: elapsed });
    }
}
