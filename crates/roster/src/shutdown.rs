//! Orderly shutdown of the job queue and worker pool.
//!
//! [`Shutdown`] is the single owner of everything that must be torn down in
//! order: the cancellation token, the queue's closing capability, and the
//! worker pool. Its sequence runs once, because [`Shutdown::execute`] consumes
//! the coordinator:
//!
//! 1. Cancel the shared token. Idle workers exit, busy workers finish their
//!    current job, waiting producers give up.
//! 2. Close the job queue.
//! 3. Wait on the pool barrier until every worker has terminated.
//! 4. Cancel the [`released`](Shutdown::released) token so dependents (for
//!    example an HTTP server) can stop.
//!
//! Dependents must not tear down shared state (such as the
//! [`Store`](crate::Store)) before step 4.

use crate::{
    handler::JobHandler,
    pool::{Exit, WorkerPool, WorkerReport},
    queue::{JobReceiver, Producer, QueueOwner, bounded},
};
use core::future::Future;
use core::num::NonZeroUsize;
use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of a completed shutdown sequence.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub workers: Vec<WorkerReport>,
    /// Time spent between cancelling and releasing dependents.
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// Jobs taken off the queue across all workers.
    pub fn processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed).sum()
    }

    pub fn failed(&self) -> usize {
        self.workers.iter().map(|w| w.failed).sum()
    }

    /// Workers that left through cancellation rather than a drained queue.
    pub fn cancelled(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| w.exit == Exit::Cancelled)
            .count()
    }
}

pub struct Shutdown {
    token: CancellationToken,
    queue: QueueOwner,
    pool: WorkerPool,
    released: CancellationToken,
}

impl Shutdown {
    /// Takes ownership of an already running pool and its queue.
    ///
    /// `token` must be the token the pool's workers observe.
    pub fn new(token: CancellationToken, queue: QueueOwner, pool: WorkerPool) -> Self {
        Self {
            token,
            queue,
            pool,
            released: CancellationToken::new(),
        }
    }

    /// Creates a queue of `capacity` jobs, spawns `workers` workers running
    /// `handler` against it, and returns the coordinator owning both.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start<H: JobHandler>(
        workers: NonZeroUsize,
        capacity: NonZeroUsize,
        handler: Arc<H>,
    ) -> Self {
        let token = CancellationToken::new();
        let (queue, jobs): (QueueOwner, JobReceiver) = bounded(capacity);
        let pool = WorkerPool::spawn(workers, jobs, handler, token.clone());
        Self::new(token, queue, pool)
    }

    /// A producer for the managed queue that gives up once shutdown begins.
    pub fn producer(&self) -> Producer {
        self.queue.producer(self.token.clone())
    }

    /// The token cancelled at the start of shutdown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The token cancelled once every worker has terminated.
    pub fn released(&self) -> CancellationToken {
        self.released.clone()
    }

    /// Waits for `trigger` to complete, then runs the shutdown sequence.
    ///
    /// `trigger` is awaited exactly once; anything it observes after
    /// completing (for example a repeated signal) has no further effect.
    pub async fn run<F>(self, trigger: F) -> ShutdownReport
    where
        F: Future<Output = ()>,
    {
        trigger.await;
        tracing::info!("Shutdown signal received, terminating gracefully...");
        self.execute().await
    }

    /// Runs the shutdown sequence immediately.
    pub async fn execute(self) -> ShutdownReport {
        let Self {
            token,
            queue,
            pool,
            released,
        } = self;
        let start = Instant::now();

        // === Phase 1: Cancel in-flight work ===
        tracing::info!("Cancelling in-flight work ({} workers)", pool.active());
        token.cancel();

        // === Phase 2: Close the queue ===
        queue.close();

        // === Phase 3: Wait for every worker ===
        let workers = pool.join().await;

        // === Phase 4: Release dependents ===
        released.cancel();

        let report = ShutdownReport {
            workers,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Worker pool shutdown complete in {:?} ({} jobs processed, {} failed)",
            report.elapsed,
            report.processed(),
            report.failed()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{Error, Result},
        handler::Simulated,
        queue::Job,
    };
    use tokio::sync::oneshot;
    use tokio::time::{sleep, timeout};

    const BARRIER_TIMEOUT: Duration = Duration::from_secs(5);

    fn n(v: usize) -> NonZeroUsize {
        NonZeroUsize::new(v).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn releases_dependents_only_after_barrier() {
        let shutdown = Shutdown::start(
            n(3),
            n(16),
            Arc::new(Simulated::new(Duration::from_millis(150))),
        );
        let producer = shutdown.producer();
        let released = shutdown.released();

        for i in 0..6 {
            producer.submit(Job::new(format!("job-{i}"))).await.unwrap();
        }
        // Give each worker a job to be busy with.
        sleep(Duration::from_millis(20)).await;

        let handle = tokio::spawn(shutdown.execute());
        sleep(Duration::from_millis(40)).await;
        assert!(!released.is_cancelled(), "released while workers were busy");

        let report = timeout(BARRIER_TIMEOUT, handle).await.unwrap().unwrap();
        assert!(released.is_cancelled());
        assert_eq!(report.workers.len(), 3);
        assert_eq!(report.cancelled(), 3);
        assert!(report.elapsed >= Duration::from_millis(100));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_waits_for_trigger() {
        let shutdown = Shutdown::start(n(2), n(4), Arc::new(Simulated::default()));
        let released = shutdown.released();
        let token = shutdown.token();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(shutdown.run(async move {
            let _ = rx.await;
        }));

        sleep(Duration::from_millis(30)).await;
        assert!(!token.is_cancelled());
        assert!(!released.is_cancelled());

        tx.send(()).unwrap();
        let report = timeout(BARRIER_TIMEOUT, handle).await.unwrap().unwrap();
        assert_eq!(report.workers.len(), 2);
        assert!(token.is_cancelled());
        assert!(released.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn producers_fail_once_shutdown_begins() {
        let shutdown = Shutdown::start(n(1), n(4), Arc::new(Simulated::default()));
        let producer = shutdown.producer();

        let _ = timeout(BARRIER_TIMEOUT, shutdown.execute()).await.unwrap();

        assert_eq!(producer.submit(Job::from("late")).await, Err(Error::ShuttingDown));
        assert_eq!(producer.try_submit(Job::from("late")), Err(Error::ShuttingDown));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tolerates_token_cancelled_ahead_of_time() {
        let shutdown = Shutdown::start(n(2), n(4), Arc::new(Simulated::default()));
        // A second source cancelling first must resolve to the same outcome.
        shutdown.token().cancel();
        shutdown.token().cancel();

        let report = timeout(BARRIER_TIMEOUT, shutdown.execute()).await.unwrap();
        assert_eq!(report.workers.len(), 2);
        assert_eq!(report.cancelled(), 2);
    }

    struct AlwaysFails;

    impl JobHandler for AlwaysFails {
        async fn handle(&self, _worker_id: usize, _job: &Job) -> Result<()> {
            Err(Error::Processing {
                reason: "boom".to_string(),
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failures_are_counted_not_fatal() {
        let shutdown = Shutdown::start(n(2), n(8), Arc::new(AlwaysFails));
        let producer = shutdown.producer();
        for i in 0..4 {
            producer.submit(Job::new(i.to_string())).await.unwrap();
        }
        // Failing jobs are instant; wait for the queue to empty.
        timeout(BARRIER_TIMEOUT, async {
            while !shutdown.queue.is_empty() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        sleep(Duration::from_millis(20)).await;

        let report = shutdown.execute().await;
        assert_eq!(report.processed(), 4);
        assert_eq!(report.failed(), 4);
    }
}
