//! Seam for the outbound data-fetch collaborator.
//!
//! A [`Fetcher`] resolves an `(owner, name)` pair into an entity-shaped record,
//! typically by calling a remote repository API. The transport, its retries,
//! and its backoff policy all live behind the trait; this crate only bounds
//! each call with a deadline via [`fetch_with_deadline`].

use crate::{
    entity::NewEntity,
    error::{Error, Result},
};
use core::future::Future;
use core::time::Duration;

/// Resolves remote repository metadata into an entity.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetches the record for `owner/name`.
    ///
    /// Implementations report transport, status, and decode failures as
    /// [`Error::Upstream`].
    fn fetch(&self, owner: &str, name: &str) -> impl Future<Output = Result<NewEntity>> + Send;
}

/// Calls `fetcher`, giving up once `deadline` has elapsed.
///
/// # Errors
///
/// Returns [`Error::DeadlineExceeded`] on timeout, or whatever the fetcher
/// itself returned.
pub async fn fetch_with_deadline<F: Fetcher>(
    fetcher: &F,
    owner: &str,
    name: &str,
    deadline: Duration,
) -> Result<NewEntity> {
    match tokio::time::timeout(deadline, fetcher.fetch(owner, name)).await {
        Ok(res) => res,
        Err(_) => Err(Error::DeadlineExceeded { deadline }),
    }
}
