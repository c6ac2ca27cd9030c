//! Bounded worker pool.
//!
//! - [`manager`] - [`WorkerPool`], spawning and joining workers.
//! - [`worker`] - the per-worker loop and its [`WorkerReport`].

pub mod manager;
pub mod worker;

pub use manager::WorkerPool;
pub use worker::{Exit, WorkerReport};
