use crate::server::telemetry::{
    increment_job_failures, increment_jobs_processed, record_job_duration,
};
use roster::{Job, JobHandler, Result};
use std::time::Instant;

/// Wraps a [`JobHandler`] and records job metrics around it.
///
/// Without the `metrics` feature the recording calls are no-ops.
pub struct Metered<H> {
    inner: H,
}

impl<H: JobHandler> Metered<H> {
    pub const fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: JobHandler> JobHandler for Metered<H> {
    async fn handle(&self, worker_id: usize, job: &Job) -> Result<()> {
        let start = Instant::now();
        increment_jobs_processed();

        let res = self.inner.handle(worker_id, job).await;

        record_job_duration(start.elapsed().as_secs_f64() * 1000.0);
        if res.is_err() {
            increment_job_failures();
        }
        res
    }
}
