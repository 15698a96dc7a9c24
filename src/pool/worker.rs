//! Worker thread implementation

use crate::core::{Result, ThreadError};
use crate::queue::BoundedJobQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs run to completion
    pub jobs_processed: AtomicU64,
    /// Total time spent running jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed job
    pub fn record_job(&self, microseconds: u64) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get average processing time per job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.jobs_processed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// Logs if the worker loop is left by a panic instead of by shutdown.
struct PanicSentinel {
    id: usize,
}

impl Drop for PanicSentinel {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("worker {} terminated by a panicking job", self.id);
        }
    }
}

/// A worker thread that runs jobs from the pool's queue
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker bound to `queue`
    ///
    /// The thread is named `"{name_prefix}-{id}"`. It runs jobs until
    /// `dequeue` reports that the queue has been shut down.
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::ThreadCreationFailed` if the OS refuses the thread.
    pub fn spawn(
        id: usize,
        queue: Arc<BoundedJobQueue>,
        name_prefix: &str,
        stack_size: Option<usize>,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let mut builder = thread::Builder::new().name(format!("{}-{}", name_prefix, id));
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }

        let thread = builder
            .spawn(move || {
                Self::run(id, &queue, &stats_clone);
            })
            .map_err(|e| ThreadError::thread_creation_with_source(id, e.to_string(), e))?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the worker's thread ID, if it has not been joined
    pub fn thread_id(&self) -> Option<thread::ThreadId> {
        self.thread.as_ref().map(|t| t.thread().id())
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the worker thread to exit
    ///
    /// The queue must already be shut down, otherwise this blocks until it is.
    /// When called from the worker's own thread the handle is detached instead,
    /// and the thread exits after its current job returns.
    pub fn join(mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        if thread.thread().id() == thread::current().id() {
            log::warn!("worker {} asked to join itself; detaching", self.id);
            return Ok(());
        }

        thread.join().map_err(|panic_info| {
            let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            ThreadError::worker_panic(self.id, message)
        })
    }

    /// Main worker loop
    ///
    /// Strict FIFO, one job at a time. Job panics are not caught: they end
    /// this thread and surface from [`Worker::join`].
    fn run(id: usize, queue: &BoundedJobQueue, stats: &WorkerStats) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        let _sentinel = PanicSentinel { id };
        log::debug!("worker {} started", id);

        while let Ok(job) = queue.dequeue() {
            #[cfg(feature = "tracing")]
            let job_span = span!(Level::DEBUG, "job_execution", job_type = job.job_type());
            #[cfg(feature = "tracing")]
            let _job_guard = job_span.enter();

            let start = Instant::now();
            job.execute();
            stats.record_job(start.elapsed().as_micros() as u64);
        }

        log::debug!(
            "worker {} observed shutdown after {} jobs",
            id,
            stats.get_jobs_processed()
        );
    }
}
