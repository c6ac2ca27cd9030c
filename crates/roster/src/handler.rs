//! Work units executed by pool workers.
//!
//! A [`JobHandler`] turns one [`Job`] into side effects. Handlers are shared by
//! every worker in a pool, so they take `&self` and must be `Sync`. A handler
//! that returns `Err` fails only that job: the worker logs the error and goes
//! back to waiting for the next one.

use crate::{
    error::{Error, Result},
    fetch::{Fetcher, fetch_with_deadline},
    queue::Job,
    store::Store,
};
use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

pub trait JobHandler: Send + Sync + 'static {
    fn handle(&self, worker_id: usize, job: &Job) -> impl Future<Output = Result<()>> + Send;
}

/// A simulated, time-bounded work unit: log the job, then sleep.
#[derive(Debug, Clone, Copy)]
pub struct Simulated {
    delay: Duration,
}

impl Simulated {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for Simulated {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl JobHandler for Simulated {
    async fn handle(&self, worker_id: usize, job: &Job) -> Result<()> {
        tracing::info!(worker_id, %job, "Processing job");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Syncs a remote repository into the [`Store`].
///
/// Each job is an `owner/name` pair. The record is fetched through the
/// [`Fetcher`] under a deadline and then inserted, replacing any earlier sync
/// of the same repository.
pub struct RepoSync<F> {
    fetcher: F,
    store: Arc<Store>,
    deadline: Duration,
}

impl<F: Fetcher> RepoSync<F> {
    pub const fn new(fetcher: F, store: Arc<Store>, deadline: Duration) -> Self {
        Self {
            fetcher,
            store,
            deadline,
        }
    }
}

fn parse_repo(job: &Job) -> Result<(&str, &str)> {
    match job.as_str().split_once('/') {
        Some((owner, name))
            if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((owner, name))
        }
        _ => Err(Error::InvalidJob {
            reason: format!("expected `owner/name`, got `{job}`"),
        }),
    }
}

impl<F: Fetcher> JobHandler for RepoSync<F> {
    async fn handle(&self, worker_id: usize, job: &Job) -> Result<()> {
        let (owner, name) = parse_repo(job)?;
        let record = fetch_with_deadline(&self.fetcher, owner, name, self.deadline).await?;
        let stored = self.store.create(record);
        tracing::debug!(worker_id, id = %stored.id, "Synced repository");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NewEntity;

    struct Echo;

    impl Fetcher for Echo {
        async fn fetch(&self, owner: &str, name: &str) -> Result<NewEntity> {
            Ok(NewEntity::new(
                format!("{owner}/{name}"),
                name,
                format!("{owner}@example.com"),
                "repository",
            ))
        }
    }

    #[test]
    fn parses_owner_and_name() {
        assert_eq!(parse_repo(&Job::from("tokio-rs/axum")).unwrap(), ("tokio-rs", "axum"));
        for bad in ["", "axum", "/axum", "tokio-rs/", "a/b/c"] {
            assert!(
                matches!(parse_repo(&Job::from(bad)), Err(Error::InvalidJob { .. })),
                "accepted `{bad}`"
            );
        }
    }

    #[tokio::test]
    async fn repo_sync_writes_fetched_record() {
        let store = Arc::new(Store::new());
        let handler = RepoSync::new(Echo, Arc::clone(&store), Duration::from_secs(1));

        handler.handle(0, &Job::from("tokio-rs/axum")).await.unwrap();

        let stored = store.get("tokio-rs/axum").unwrap();
        assert_eq!(stored.name, "axum");
        assert_eq!(stored.email, "tokio-rs@example.com");
    }

    #[tokio::test]
    async fn repo_sync_rejects_malformed_jobs_without_touching_store() {
        let store = Arc::new(Store::new());
        let handler = RepoSync::new(Echo, Arc::clone(&store), Duration::from_secs(1));

        let err = handler.handle(0, &Job::from("not-a-repo")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidJob { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn simulated_work_completes() {
        Simulated::new(Duration::from_millis(1))
            .handle(3, &Job::from("a"))
            .await
            .unwrap();
    }
}
