//! Error types for the store, job queue, and worker pool.
//!
//! This module defines the central `Error` enum, which captures every
//! recoverable condition raised by the crate. None of these are fatal: they
//! are handled at the smallest enclosing scope (a producer, a worker, or the
//! HTTP boundary) and converted into a result or response.
//!
//! A lookup miss on the [`Store`](crate::Store) is deliberately absent here. It
//! is a negative result (`None`), not an error.
//!
//! ## Error Cases
//! - `QueueClosed`: The queue owner already closed the queue.
//! - `QueueFull`: A non-blocking submit found the queue at capacity.
//! - `ShuttingDown`: Cancellation fired while a producer was waiting.
//! - `InvalidJob`: A job payload the handler cannot interpret.
//! - `Upstream`: The outbound fetcher failed (transport, status, decode).
//! - `DeadlineExceeded`: The outbound fetcher did not answer in time.
//! - `Processing`: A work unit failed for any other reason.

use core::time::Duration;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the roster crate.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The job queue was closed by its owner; no more jobs are accepted.
    #[error("Job queue is closed")]
    QueueClosed,

    /// The job queue is at capacity.
    #[error("Job queue is full (capacity: {capacity})")]
    QueueFull { capacity: usize },

    /// Cancellation fired before the job could be enqueued.
    #[error("Service is shutting down")]
    ShuttingDown,

    /// The job payload could not be interpreted by its handler.
    #[error("Invalid job: {reason}")]
    InvalidJob { reason: String },

    /// The outbound data-fetch collaborator failed.
    #[error("Upstream error: {context}")]
    Upstream { context: String },

    /// The outbound data-fetch collaborator missed its deadline.
    #[error("Upstream deadline of {deadline:?} exceeded")]
    DeadlineExceeded { deadline: Duration },

    /// A job's work unit failed.
    #[error("Processing error: {reason}")]
    Processing { reason: String },
}
