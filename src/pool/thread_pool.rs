//! Thread pool implementation

use crate::core::{ClosureJob, Job, Result, ThreadError};
use crate::pool::worker::{Worker, WorkerStats};
use crate::queue::BoundedJobQueue;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Configuration for thread pool
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of worker threads
    pub num_threads: usize,
    /// Maximum number of queued, not yet running jobs
    pub queue_capacity: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Stack size for worker threads (None = platform default)
    pub stack_size: Option<usize>,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            queue_capacity: 1024,
            thread_name_prefix: "worker".to_string(),
            stack_size: None,
        }
    }
}

impl ThreadPoolConfig {
    /// Create a new configuration with the given worker count and queue capacity
    #[must_use]
    pub fn new(num_threads: usize, queue_capacity: usize) -> Self {
        Self {
            num_threads,
            queue_capacity,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the stack size of each worker thread, in bytes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(ThreadError::invalid_argument(
                "num_threads",
                "Number of threads must be greater than 0",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ThreadError::invalid_argument(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        if self.stack_size == Some(0) {
            return Err(ThreadError::invalid_argument(
                "stack_size",
                "Stack size must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// A fixed-size pool of worker threads fed by a bounded job queue
///
/// Workers start as soon as the pool is constructed. [`submit`](Self::submit)
/// blocks while the queue is full; that is the pool's only backpressure.
///
/// # Shutdown
///
/// [`shutdown`](Self::shutdown) is cooperative. Jobs already running finish,
/// jobs still queued are dropped without running, and every worker is joined.
/// Dropping the pool shuts it down if that has not happened yet.
///
/// # Panicking Jobs
///
/// A job that panics takes its worker thread down with it, and the worker is
/// not replaced. Once every worker has died nothing drains the queue, so
/// `submit` fills it and then blocks until `shutdown` is called from another
/// thread. `shutdown` reports the first such worker as
/// `ThreadError::WorkerPanic`.
pub struct ThreadPool {
    config: ThreadPoolConfig,
    queue: Arc<BoundedJobQueue>,
    workers: Mutex<WorkerSet>,
    joined: Condvar,
    worker_threads: Vec<ThreadId>,
    stats: Vec<Arc<WorkerStats>>,
    total_jobs_submitted: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinState {
    Running,
    Joining,
    Joined,
}

/// Worker handles plus how far shutdown has got with them.
struct WorkerSet {
    workers: Vec<Worker>,
    state: JoinState,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.config)
            .field("queue", &self.queue)
            .field(
                "total_jobs_submitted",
                &self.total_jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl ThreadPool {
    /// Create a pool with `num_threads` workers and room for `queue_capacity` queued jobs
    pub fn new(num_threads: usize, queue_capacity: usize) -> Result<Self> {
        Self::with_config(ThreadPoolConfig::new(num_threads, queue_capacity))
    }

    /// Create a pool from a configuration and start its workers
    ///
    /// # Errors
    ///
    /// - `ThreadError::InvalidArgument` - a count is zero
    /// - `ThreadError::OutOfMemory` - the worker handles or job slots cannot be allocated
    /// - `ThreadError::ThreadCreationFailed` - a worker could not be spawned; workers
    ///   spawned before it are shut down and joined first
    pub fn with_config(config: ThreadPoolConfig) -> Result<Self> {
        config.validate()?;

        let mut workers = Vec::new();
        workers
            .try_reserve_exact(config.num_threads)
            .map_err(|_| ThreadError::out_of_memory("worker handles", config.num_threads))?;

        let queue = Arc::new(BoundedJobQueue::new(config.queue_capacity)?);

        spawn_workers(&queue, &mut workers, config.num_threads, |id| {
            Worker::spawn(
                id,
                Arc::clone(&queue),
                &config.thread_name_prefix,
                config.stack_size,
            )
        })?;

        log::info!(
            "thread pool '{}' started: {} workers, queue capacity {}",
            config.thread_name_prefix,
            config.num_threads,
            config.queue_capacity
        );

        let stats = workers.iter().map(Worker::stats).collect();
        let worker_threads = workers.iter().filter_map(Worker::thread_id).collect();
        Ok(Self {
            config,
            queue,
            workers: Mutex::new(WorkerSet {
                workers,
                state: JoinState::Running,
            }),
            joined: Condvar::new(),
            worker_threads,
            stats,
            total_jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Submit a job to the pool, blocking while the queue is full
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::ShutdownInProgress` once shutdown has begun,
    /// including when shutdown wakes a caller blocked on a full queue.
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        // Counted before the handoff so a running job never sees itself missing
        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.queue.enqueue(Box::new(job)) {
            self.total_jobs_submitted.fetch_sub(1, Ordering::Relaxed);
            return Err(e.into());
        }
        Ok(())
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Get the number of worker threads
    pub fn num_threads(&self) -> usize {
        self.config.num_threads
    }

    /// Get the queue capacity
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Check if shutdown has begun
    pub fn is_shutdown(&self) -> bool {
        self.queue.is_shutdown()
    }

    /// Get total number of jobs accepted by the queue
    ///
    /// A submission is counted just before its job is handed to the queue and
    /// uncounted if the queue rejects it, so a concurrent reader may briefly
    /// see a submission that is about to fail.
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.stats.clone()
    }

    /// Get total jobs run to completion across all workers
    pub fn total_jobs_processed(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_processed()).sum()
    }

    /// Shut the pool down and wait for every worker to exit
    ///
    /// 1. Destroys the queue: further submits fail, blocked producers and idle
    ///    workers wake up, and queued jobs are dropped without running
    /// 2. Joins the workers in order; a job that is running is allowed to finish
    ///
    /// Concurrent and repeated calls wait until the first call has joined every
    /// worker, then return `Ok(())`. A call made from inside a job returns
    /// without waiting, since its own worker cannot be joined yet.
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::WorkerPanic` for the first worker that was
    /// terminated by a panicking job. All workers are joined regardless.
    /// Only the call that performed the joins reports it.
    pub fn shutdown(&self) -> Result<()> {
        let discarded = self.queue.destroy();
        if discarded > 0 {
            log::warn!(
                "thread pool '{}' discarded {} queued jobs at shutdown",
                self.config.thread_name_prefix,
                discarded
            );
        }

        let mut set = self.workers.lock();
        match set.state {
            JoinState::Running => {}
            JoinState::Joined => return Ok(()),
            JoinState::Joining => {
                if self.on_worker_thread() {
                    return Ok(());
                }
                while set.state != JoinState::Joined {
                    self.joined.wait(&mut set);
                }
                return Ok(());
            }
        }
        set.state = JoinState::Joining;
        let workers = std::mem::take(&mut set.workers);
        drop(set);

        let result = join_all(workers);

        self.workers.lock().state = JoinState::Joined;
        self.joined.notify_all();

        log::info!(
            "thread pool '{}' shut down after {} jobs",
            self.config.thread_name_prefix,
            self.total_jobs_processed()
        );
        result
    }

    fn on_worker_thread(&self) -> bool {
        self.worker_threads.contains(&thread::current().id())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!(
                "Failed to shutdown thread pool '{}' during drop: {}",
                self.config.thread_name_prefix,
                e
            );
        }
    }
}

/// Spawns `count` workers into `workers`.
///
/// If a spawn fails the queue is destroyed and every worker already started
/// is joined before the error is returned.
fn spawn_workers<F>(
    queue: &BoundedJobQueue,
    workers: &mut Vec<Worker>,
    count: usize,
    mut spawn: F,
) -> Result<()>
where
    F: FnMut(usize) -> Result<Worker>,
{
    for id in 0..count {
        match spawn(id) {
            Ok(worker) => workers.push(worker),
            Err(e) => {
                log::error!("rolling back {} started workers: {}", workers.len(), e);
                queue.destroy();
                if let Err(join_err) = join_all(std::mem::take(workers)) {
                    log::error!("worker failed during rollback: {}", join_err);
                }
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Joins every worker, returning the first failure.
fn join_all(workers: Vec<Worker>) -> Result<()> {
    let mut first_error = None;
    for worker in workers {
        let id = worker.id();
        if let Err(e) = worker.join() {
            log::error!("worker {} did not exit cleanly: {}", id, e);
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
