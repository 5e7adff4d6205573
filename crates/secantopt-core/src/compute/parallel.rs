//! Parallel computing support.
//!
//! A [`WorkerPool`] owns a fixed-size rayon thread pool. Its map operations
//! preserve input order, so results are identical whatever the number of
//! workers.

use crate::error::{ManifoldError, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use tracing::debug;

/// Configuration for parallel execution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParallelConfig {
    /// Number of worker threads (None = number of logical CPUs)
    pub num_threads: Option<usize>,
    /// Minimum number of jobs before work is spread over the pool
    pub min_jobs_for_parallel: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            min_jobs_for_parallel: 2,
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads.
    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Set the minimum number of jobs for parallel execution.
    pub fn with_min_jobs(mut self, jobs: usize) -> Self {
        self.min_jobs_for_parallel = jobs;
        self
    }

    /// Number of threads the pool will be built with.
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Check if parallel execution should be used for a job count.
    pub fn should_parallelize(&self, jobs: usize) -> bool {
        jobs >= self.min_jobs_for_parallel && self.effective_threads() > 1
    }
}

/// Fixed-size pool of worker threads.
pub struct WorkerPool {
    pool: ThreadPool,
    config: ParallelConfig,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.pool.current_num_threads())
            .field("config", &self.config)
            .finish()
    }
}

impl WorkerPool {
    /// Builds a pool from a configuration.
    pub fn new(config: ParallelConfig) -> Result<Self> {
        if config.num_threads == Some(0) {
            return Err(ManifoldError::invalid_parameter(
                "worker pool needs at least one thread",
            ));
        }
        let threads = config.effective_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("secantopt-worker-{i}"))
            .build()
            .map_err(|e| ManifoldError::numerical_error(format!("thread pool: {e}")))?;
        debug!(threads, "worker pool started");
        Ok(Self { pool, config })
    }

    /// Builds a pool with `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        Self::new(ParallelConfig::new().with_num_threads(threads))
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Maps `func` over `items`, returning results in input order.
    pub fn map<I, R, F>(&self, items: &[I], func: F) -> Vec<R>
    where
        I: Sync,
        R: Send,
        F: Fn(&I) -> R + Sync + Send,
    {
        if !self.config.should_parallelize(items.len()) {
            return items.iter().map(func).collect();
        }
        self.pool
            .install(|| items.par_iter().map(|item| func(item)).collect())
    }

    /// Fallible order-preserving map; the first error in input order wins.
    pub fn try_map<I, R, E, F>(&self, items: &[I], func: F) -> std::result::Result<Vec<R>, E>
    where
        I: Sync,
        R: Send,
        E: Send,
        F: Fn(&I) -> std::result::Result<R, E> + Sync + Send,
    {
        self.map(items, func).into_iter().collect()
    }

    /// Runs `job` inside the pool.
    pub fn install<R, F>(&self, job: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(job)
    }
}
