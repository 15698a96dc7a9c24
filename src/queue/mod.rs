//! The bounded job queue shared between producers and worker threads.
//!
//! [`BoundedJobQueue`] is a fixed-capacity circular buffer of [`BoxedJob`]s.
//! Producers block while it is full, consumers block while it is empty, and
//! [`BoundedJobQueue::destroy`] is a one-way switch that wakes everyone.
//!
//! The pool owns its queue; this module is public so the queue can be used
//! and tested on its own.

mod bounded;
mod semaphore;

pub use bounded::BoundedJobQueue;

use crate::core::{BoxedJob, ThreadError};

/// Errors that can occur during queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue is shut down; the job was not enqueued and is handed back
    #[error("queue is shut down, job rejected")]
    Rejected(BoxedJob),
    /// The queue is shut down; no job was dequeued
    #[error("queue is shut down")]
    ShutDown,
}

impl QueueError {
    /// Takes back the job a failed enqueue did not accept.
    pub fn into_job(self) -> Option<BoxedJob> {
        match self {
            QueueError::Rejected(job) => Some(job),
            QueueError::ShutDown => None,
        }
    }
}

impl From<QueueError> for ThreadError {
    fn from(_: QueueError) -> Self {
        ThreadError::ShutdownInProgress
    }
}
