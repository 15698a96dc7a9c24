//! Error types for the thread pool

/// Result type for thread pool operations
pub type Result<T> = std::result::Result<T, ThreadError>;

/// Errors that can occur in the thread pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ThreadError {
    /// A construction parameter was out of range
    #[error("Invalid argument '{parameter}': {message}")]
    InvalidArgument {
        /// Parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// A long-lived buffer could not be allocated
    #[error("Out of memory allocating {what} ({requested} slots)")]
    OutOfMemory {
        /// Which buffer failed to allocate
        what: &'static str,
        /// Number of slots requested
        requested: usize,
    },

    /// Spawning a worker failed; every previously spawned worker was rolled back
    #[error("Failed to create worker thread #{thread_id}: {message}")]
    ThreadCreationFailed {
        /// ID of the worker that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Shutdown has been requested or completed; no further work is accepted
    #[error("Thread pool is shutting down")]
    ShutdownInProgress,

    /// A worker thread was terminated by a panicking job
    #[error("Worker thread #{thread_id} panicked: {message}")]
    WorkerPanic {
        /// ID of the panicked worker
        thread_id: usize,
        /// Panic message
        message: String,
    },
}

impl ThreadError {
    /// Create an invalid argument error
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an out of memory error
    pub fn out_of_memory(what: &'static str, requested: usize) -> Self {
        ThreadError::OutOfMemory { what, requested }
    }

    /// Create a thread creation error
    pub fn thread_creation(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::ThreadCreationFailed {
            thread_id,
            message: message.into(),
            source: None,
        }
    }

    /// Create a thread creation error with source
    pub fn thread_creation_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ThreadError::ThreadCreationFailed {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a worker panic error
    pub fn worker_panic(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::WorkerPanic {
            thread_id,
            message: message.into(),
        }
    }

    /// Returns true if this error means the pool no longer accepts work
    pub fn is_shutdown(&self) -> bool {
        matches!(self, ThreadError::ShutdownInProgress)
    }
}
