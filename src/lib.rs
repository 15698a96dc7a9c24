//! # Rust Bounded Pool
//!
//! A fixed-size worker thread pool fed by a bounded, blocking, circular job queue.
//!
//! ## Features
//!
//! - **Fixed Pool**: `N` worker threads started at construction, never resized
//! - **Bounded Queue**: Circular buffer of fixed capacity; producers block while it is full
//! - **Blocking Handoff**: Idle workers sleep on the queue instead of polling
//! - **Strict FIFO**: Jobs are dequeued in the order they were accepted
//! - **Cooperative Shutdown**: Running jobs finish, idle workers wake, every thread is joined
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_bounded_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // 4 workers, at most 10 queued jobs
//! let pool = ThreadPool::new(4, 10)?;
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!     })?;
//! }
//!
//! pool.shutdown()?;
//! assert!(matches!(pool.execute(|| {}), Err(ThreadError::ShutdownInProgress)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use rust_bounded_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = ThreadPoolConfig::new(8, 1000).with_thread_name_prefix("my-worker");
//!
//! let pool = ThreadPool::with_config(config)?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use rust_bounded_pool::prelude::*;
//!
//! struct MyJob {
//!     data: String,
//! }
//!
//! impl Job for MyJob {
//!     fn execute(self: Box<Self>) {
//!         println!("Processing: {}", self.data);
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "MyJob"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = ThreadPool::new(2, 4)?;
//! pool.submit(MyJob {
//!     data: "test".to_string(),
//! })?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Shutdown Semantics
//!
//! Shutdown does not drain the queue. Jobs that are still queued when
//! [`ThreadPool::shutdown`] is called are dropped without running; wait for
//! your own completion signal first if every job must run.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;

pub use core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
pub use pool::{ThreadPool, ThreadPoolConfig, WorkerStats};
pub use queue::{BoundedJobQueue, QueueError};
