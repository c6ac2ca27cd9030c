//! Bounded multi-producer, multi-consumer job queue with a single closer.
//!
//! [`bounded`] splits a queue into two capabilities:
//!
//! - [`QueueOwner`] holds the only strong sender. It is not `Clone`, and
//!   [`QueueOwner::close`] consumes it, so the queue can be closed at most once
//!   and a second close does not compile.
//! - [`JobReceiver`] is the receive-only side shared by every worker.
//!
//! Producers get a [`Producer`] from the owner. A producer holds a weak sender:
//! it can enqueue while the owner is alive but never keeps the queue open on
//! its own. Once the owner closes, submissions fail with
//! [`Error::QueueClosed`] instead of reaching the channel, including a
//! submission already waiting for capacity, and receivers drain whatever is
//! still buffered before observing the close.

use crate::error::{Error, Result};
use core::fmt;
use core::num::NonZeroUsize;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// An opaque unit of work, consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(String);

impl Job {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Job {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Job {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Creates a job queue buffering at most `capacity` jobs.
pub fn bounded(capacity: NonZeroUsize) -> (QueueOwner, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity.get());
    (
        QueueOwner {
            tx,
            closed: CancellationToken::new(),
        },
        JobReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// The single closing capability of a job queue.
#[derive(Debug)]
pub struct QueueOwner {
    tx: mpsc::Sender<Job>,
    closed: CancellationToken,
}

impl QueueOwner {
    /// Returns a cloneable producer handle.
    ///
    /// `cancel` bounds how long [`Producer::submit`] may wait for capacity.
    pub fn producer(&self, cancel: CancellationToken) -> Producer {
        Producer {
            tx: self.tx.downgrade(),
            capacity: self.tx.max_capacity(),
            closed: self.closed.clone(),
            cancel,
        }
    }

    /// Enqueues a job directly, waiting for capacity.
    pub async fn send(&self, job: Job) -> Result<()> {
        self.tx.send(job).await.map_err(|_| Error::QueueClosed)
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of jobs currently buffered.
    ///
    /// Reads 0 once every [`JobReceiver`] has been dropped, since dropping the
    /// last receiver discards whatever was still buffered.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the queue. Buffered jobs remain available to receivers.
    ///
    /// Producers waiting for capacity are woken and fail with
    /// [`Error::QueueClosed`]; their jobs never reach the channel.
    pub fn close(self) {
        tracing::debug!(buffered = self.len(), "Closing job queue");
        self.closed.cancel();
        drop(self.tx);
    }
}

/// A cloneable handle for enqueueing jobs that never keeps the queue open.
#[derive(Debug, Clone)]
pub struct Producer {
    tx: mpsc::WeakSender<Job>,
    capacity: usize,
    closed: CancellationToken,
    cancel: CancellationToken,
}

impl Producer {
    /// Enqueues a job, waiting for capacity (back-pressure).
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] if cancellation fires first.
    /// - [`Error::QueueClosed`] if the owner has closed the queue.
    pub async fn submit(&self, job: Job) -> Result<()> {
        let tx = self.upgrade()?;

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::ShuttingDown),
            () = self.closed.cancelled() => Err(Error::QueueClosed),
            res = tx.send(job) => res.map_err(|_| Error::QueueClosed),
        }
    }

    /// Enqueues a job without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] if cancellation already fired.
    /// - [`Error::QueueClosed`] if the owner has closed the queue.
    /// - [`Error::QueueFull`] if the queue is at capacity.
    pub fn try_submit(&self, job: Job) -> Result<()> {
        let tx = self.upgrade()?;

        tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::QueueFull {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => Error::QueueClosed,
        })
    }

    fn upgrade(&self) -> Result<mpsc::Sender<Job>> {
        if self.cancel.is_cancelled() {
            return Err(Error::ShuttingDown);
        }
        if self.closed.is_cancelled() {
            return Err(Error::QueueClosed);
        }
        self.tx.upgrade().ok_or(Error::QueueClosed)
    }
}

/// The receive-only side of a job queue, shared by all workers.
///
/// Whichever worker is waiting first gets the next job.
#[derive(Debug, Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl JobReceiver {
    /// Waits for the next job.
    ///
    /// Returns `None` once the queue is closed and every buffered job has been
    /// handed out. Cancel-safe: dropping the future never loses a job.
    pub async fn recv(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }
}
