//! Fixed-size pool of asynchronous job workers.
//!
//! This module defines the [`WorkerPool`] struct, which owns a set of Tokio
//! tasks running [`worker_loop`]. Workers share one [`JobReceiver`], so a job
//! goes to whichever worker is ready first rather than being routed
//! round-robin.
//!
//! The pool never closes the queue and never cancels its own token; both
//! belong to the [shutdown coordinator](crate::Shutdown). The pool's only
//! shutdown duty is [`WorkerPool::join`], the barrier that waits for exactly
//! as many workers as were spawned.

use super::worker::{WorkerReport, worker_loop};
use crate::{handler::JobHandler, queue::JobReceiver};
use core::num::NonZeroUsize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct WorkerPool {
    workers: JoinSet<WorkerReport>,
    size: usize,
}

impl WorkerPool {
    /// Spawns `size` workers on the current Tokio runtime.
    ///
    /// Every worker receives a clone of `jobs`, the shared `handler`, and the
    /// shared `shutdown_token`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn<H: JobHandler>(
        size: NonZeroUsize,
        jobs: JobReceiver,
        handler: Arc<H>,
        shutdown_token: CancellationToken,
    ) -> Self {
        let size = size.get();
        let mut workers = JoinSet::new();

        for worker_id in 0..size {
            workers.spawn(worker_loop(
                worker_id,
                jobs.clone(),
                Arc::clone(&handler),
                shutdown_token.clone(),
            ));
        }

        tracing::debug!("Spawned {size} workers");
        Self { workers, size }
    }

    /// Number of workers the pool was started with.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of workers that have not terminated yet.
    pub fn active(&self) -> usize {
        self.workers.len()
    }

    /// Waits until every worker has terminated.
    ///
    /// Reports are returned in completion order. A worker that panicked has
    /// no report; the panic is logged and the barrier still completes.
    pub async fn join(mut self) -> Vec<WorkerReport> {
        let mut reports = Vec::with_capacity(self.size);

        while let Some(res) = self.workers.join_next().await {
            match res {
                Ok(report) => {
                    tracing::trace!("Worker {} joined", report.worker_id);
                    reports.push(report);
                }
                Err(e) => {
                    tracing::error!("Worker task failed: {e}");
                }
            }
        }

        tracing::debug!("All {} workers terminated", self.size);
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{Error, Result},
        handler::Simulated,
        pool::Exit,
        queue::{Job, bounded},
    };
    use core::time::Duration;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tokio::time::timeout;

    const BARRIER_TIMEOUT: Duration = Duration::from_secs(5);

    fn n(v: usize) -> NonZeroUsize {
        NonZeroUsize::new(v).unwrap()
    }

    /// Records which worker handled which job.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(usize, String)>>,
        delay: Duration,
    }

    impl JobHandler for Recorder {
        async fn handle(&self, worker_id: usize, job: &Job) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.seen.lock().push((worker_id, job.to_string()));
            if job.as_str().starts_with("bad") {
                return Err(Error::Processing {
                    reason: "refused".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn processes_each_job_exactly_once_then_drains() {
        let (owner, jobs) = bounded(n(8));
        let token = CancellationToken::new();
        let recorder = Arc::new(Recorder {
            delay: Duration::from_millis(5),
            ..Default::default()
        });
        let pool = WorkerPool::spawn(n(3), jobs, Arc::clone(&recorder), token);

        for name in ["a", "b", "c", "d"] {
            owner.send(Job::from(name)).await.unwrap();
        }
        owner.close();

        let reports = timeout(BARRIER_TIMEOUT, pool.join()).await.unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.exit == Exit::Drained));
        assert_eq!(reports.iter().map(|r| r.processed).sum::<usize>(), 4);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for (_, job) in recorder.seen.lock().iter() {
            *counts.entry(job.clone()).or_default() += 1;
        }
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 1), "duplicated job: {counts:?}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancellation_terminates_workers_with_jobs_still_buffered() {
        let (owner, jobs) = bounded(n(64));
        // Hold a receiver so abandoned jobs stay buffered after the workers
        // are gone.
        let held = jobs.clone();
        let token = CancellationToken::new();
        let pool = WorkerPool::spawn(
            n(3),
            jobs,
            Arc::new(Simulated::new(Duration::from_millis(50))),
            token.clone(),
        );

        for i in 0..64 {
            owner.send(Job::new(format!("job-{i}"))).await.unwrap();
        }
        // Let every worker pick up its first job, then cancel without ever
        // closing the queue.
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let reports = timeout(BARRIER_TIMEOUT, pool.join()).await.unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.exit == Exit::Cancelled));
        // In-flight jobs finish; the rest are abandoned.
        let processed: usize = reports.iter().map(|r| r.processed).sum();
        assert!(processed < 64, "processed {processed}");
        assert_eq!(owner.len(), 64 - processed);
        drop(held);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_worker_never_starts_new_job() {
        let (owner, jobs) = bounded(n(4));
        let token = CancellationToken::new();
        token.cancel();

        owner.send(Job::from("a")).await.unwrap();
        let recorder = Arc::new(Recorder::default());
        let pool = WorkerPool::spawn(n(2), jobs, Arc::clone(&recorder), token);

        let reports = timeout(BARRIER_TIMEOUT, pool.join()).await.unwrap();
        assert!(reports.iter().all(|r| r.exit == Exit::Cancelled && r.processed == 0));
        assert!(recorder.seen.lock().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_job_does_not_stop_the_worker() {
        let (owner, jobs) = bounded(n(8));
        let recorder = Arc::new(Recorder::default());
        let pool = WorkerPool::spawn(n(1), jobs, Arc::clone(&recorder), CancellationToken::new());

        for name in ["bad-1", "ok-1", "bad-2", "ok-2"] {
            owner.send(Job::from(name)).await.unwrap();
        }
        owner.close();

        let reports = timeout(BARRIER_TIMEOUT, pool.join()).await.unwrap();
        assert_eq!(
            reports,
            vec![WorkerReport {
                worker_id: 0,
                processed: 4,
                failed: 2,
                exit: Exit::Drained,
            }]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn idle_pool_drains_on_close() {
        let (owner, jobs) = bounded(n(1));
        let pool = WorkerPool::spawn(n(4), jobs, Arc::new(Simulated::default()), CancellationToken::new());
        assert_eq!(pool.size(), 4);

        owner.close();
        let reports = timeout(BARRIER_TIMEOUT, pool.join()).await.unwrap();
        assert_eq!(reports.len(), 4);
        assert!(reports.iter().all(|r| r.exit == Exit::Drained && r.processed == 0));
    }
}
