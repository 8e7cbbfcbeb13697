//! The worker thread pool collaborator contract (§6): `submit_reader` for
//! read-only query execution, `submit_writer` for the single-writer path
//! that mutations and constraint enforcement run on. Unlike `matrix` and
//! `ast`, this crate does carry a concrete implementation
//! ([`RayonThreadPool`]) since readers/writers are genuinely scheduled work,
//! not a shape another in-core type already happens to satisfy.

use rayon::{ThreadPool as RayonPool, ThreadPoolBuilder};

/// A pool that separates read-only query execution from the single-writer
/// mutation path, mirroring the original's reader/writer thread
/// separation so that a long-running read never blocks a pending write
/// queue behind it (or vice versa).
pub trait ThreadPool {
    /// Run `job` on a reader thread and block until it completes.
    fn submit_reader<F, R>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send;

    /// Run `job` on the single writer thread and block until it completes.
    fn submit_writer<F, R>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send;
}

/// A [`ThreadPool`] backed by two `rayon` pools: a `reader` pool sized per
/// [`crate::config::EngineConfig::worker_threads`] and a single-thread
/// `writer` pool, serializing mutations the way a single-writer graph
/// store requires.
pub struct RayonThreadPool {
    reader: RayonPool,
    writer: RayonPool,
}

impl RayonThreadPool {
    pub fn new(worker_threads: usize) -> Self {
        let reader = ThreadPoolBuilder::new()
            .num_threads(worker_threads.max(1))
            .thread_name(|i| format!("graphcore-reader-{i}"))
            .build()
            .expect("reader thread pool construction cannot fail with a valid thread count");
        let writer = ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|_| "graphcore-writer".to_string())
            .build()
            .expect("single-thread writer pool construction cannot fail");
        Self { reader, writer }
    }
}

impl ThreadPool for RayonThreadPool {
    fn submit_reader<F, R>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.reader.install(job)
    }

    fn submit_writer<F, R>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.writer.install(job)
    }
}
