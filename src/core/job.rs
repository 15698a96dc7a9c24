//! Job trait and related types

use std::fmt;

/// A unit of work executed exactly once by one worker thread.
///
/// The job owns whatever state it needs; the queue and pool only move it
/// around and never look inside. Failures are the job's own concern: the
/// pool does not inspect, log, or retry them.
pub trait Job: Send {
    /// Run the job, consuming it
    fn execute(self: Box<Self>);

    /// Get the job's type name for debugging
    fn job_type(&self) -> &str {
        "Job"
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.job_type())
    }
}

/// A boxed job that can be sent across threads
pub type BoxedJob = Box<dyn Job>;

/// Helper to create a job from a closure
pub struct ClosureJob<F>
where
    F: FnOnce() + Send,
{
    closure: F,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() + Send,
{
    /// Create a new closure job
    pub fn new(closure: F) -> Self {
        Self {
            closure,
            name: "ClosureJob".to_string(),
        }
    }

    /// Create a new closure job with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure,
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() + Send,
{
    fn execute(self: Box<Self>) {
        let job = *self;
        (job.closure)()
    }

    fn job_type(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let job: BoxedJob = Box::new(ClosureJob::new(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(job.job_type(), "ClosureJob");
        job.execute();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closure_job_with_name() {
        let job: BoxedJob = Box::new(ClosureJob::with_name(|| {}, "TestJob"));
        assert_eq!(job.job_type(), "TestJob");
        assert_eq!(format!("{:?}", job), "Job(TestJob)");
    }

    #[test]
    fn test_dropping_unexecuted_job_releases_captures() {
        let payload = Arc::new(String::from("argument"));
        let job: BoxedJob = Box::new(ClosureJob::new({
            let payload = Arc::clone(&payload);
            move || drop(payload)
        }));
        assert_eq!(Arc::strong_count(&payload), 2);

        drop(job);
        assert_eq!(Arc::strong_count(&payload), 1);
    }
}
