use crate::{handler::JobHandler, queue::JobReceiver};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exit {
    /// The queue was closed and every buffered job had been handed out.
    Drained,
    /// The shared cancellation token fired while the worker was idle.
    Cancelled,
}

/// Outcome of a single worker, reported through the pool barrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker_id: usize,
    /// Jobs this worker took off the queue, including failed ones.
    pub processed: usize,
    pub failed: usize,
    pub exit: Exit,
}

/// Worker task that consumes jobs until the queue drains or cancellation
/// fires.
///
/// This function is designed to be spawned as a Tokio task. While idle the
/// worker waits on two sources at once: the cancellation token and the next
/// job. Cancellation is polled first, so a cancelled worker never starts a new
/// job, but a job already running is always allowed to finish.
///
/// # Arguments
///
/// - `worker_id`: Identifier for this worker (used for logs and its report).
/// - `jobs`: Shared receive side of the job queue.
/// - `handler`: Work unit applied to each job.
/// - `shutdown_token`: Token fired by the shutdown coordinator.
///
/// # Exit paths
///
/// - [`Exit::Drained`] when the queue reports closed and empty.
/// - [`Exit::Cancelled`] when the token fires while idle. Jobs still buffered
///   at that point are left unprocessed.
pub async fn worker_loop<H: JobHandler>(
    worker_id: usize,
    jobs: JobReceiver,
    handler: Arc<H>,
    shutdown_token: CancellationToken,
) -> WorkerReport {
    tracing::debug!("Worker {worker_id} started");

    let mut processed = 0;
    let mut failed = 0;

    let exit = loop {
        let job = tokio::select! {
            biased;
            () = shutdown_token.cancelled() => {
                tracing::debug!("Worker {worker_id} shutdown via cancellation token");
                break Exit::Cancelled;
            }
            job = jobs.recv() => match job {
                Some(job) => job,
                None => {
                    tracing::debug!("Worker {worker_id} queue drained");
                    break Exit::Drained;
                }
            },
        };

        processed += 1;
        if let Err(e) = handler.handle(worker_id, &job).await {
            failed += 1;
            tracing::warn!("Worker {worker_id} failed job `{job}`: {e}");
        }
    };

    tracing::debug!("Worker {worker_id} stopped after {processed} jobs ({exit:?})");

    WorkerReport {
        worker_id,
        processed,
        failed,
        exit,
    }
}
