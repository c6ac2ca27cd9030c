//! # `roster`: In-memory entity store with a cancellable worker pool
//!
//! `roster` pairs a concurrency-safe, in-memory [`Store`] with a bounded job
//! queue, a fixed-size pool of Tokio workers, and a [`Shutdown`] coordinator
//! that brings the pool down without leaking tasks or closing the queue twice.
//!
//! ## Highlights
//!
//! - **Readers-writer store**: any number of concurrent readers; writers hold
//!   the lock only for a single insertion. Snapshots are copies.
//! - **Single-closer queue**: the [`QueueOwner`] is the only way to close the
//!   queue and is consumed by doing so. Producers hold weak handles and
//!   workers hold receive-only handles.
//! - **Cooperative cancellation**: workers wait on a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken) and the next
//!   job at once; in-flight jobs always finish.
//! - **Shutdown barrier**: dependents are released only after every worker
//!   has reported.
//!
//! ## Example
//!
//! ```rust
//! use core::num::NonZeroUsize;
//! use roster::{Job, Shutdown, Simulated};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> roster::Result<()> {
//! let shutdown = Shutdown::start(
//!     NonZeroUsize::new(3).unwrap(),
//!     NonZeroUsize::new(100).unwrap(),
//!     Arc::new(Simulated::new(Duration::from_millis(1))),
//! );
//!
//! let producer = shutdown.producer();
//! producer.submit(Job::from("reindex")).await?;
//!
//! let report = shutdown.execute().await;
//! assert_eq!(report.workers.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`store`] - The entity store.
//! - [`queue`] - Job descriptors and the bounded queue.
//! - [`pool`] - Worker pool and per-worker reports.
//! - [`handler`] - Work units run by workers.
//! - [`fetch`] - Seam for the outbound data-fetch collaborator.
//! - [`shutdown`] - The shutdown coordinator.

mod entity;
mod error;
pub mod fetch;
pub mod handler;
pub mod pool;
pub mod queue;
pub mod shutdown;
pub mod store;

pub use entity::{Entity, NewEntity};
pub use error::{Error, Result};
pub use fetch::{Fetcher, fetch_with_deadline};
pub use handler::{JobHandler, RepoSync, Simulated};
pub use pool::{Exit, WorkerPool, WorkerReport};
pub use queue::{Job, JobReceiver, Producer, QueueOwner, bounded};
pub use shutdown::{Shutdown, ShutdownReport};
pub use store::Store;
