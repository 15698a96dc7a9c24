//! Core types and traits for the thread pool

pub mod error;
pub mod job;

pub use error::{Result, ThreadError};
pub use job::{BoxedJob, ClosureJob, Job};
