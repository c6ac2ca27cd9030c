//! HTTP service and its glue to the worker pool.
//!
//! ## Structure
//!
//! - [`handler`] - axum router and request handlers (`AppState`).
//! - [`envelope`] - JSON response envelope and error-to-status mapping.
//! - [`metered`] - [`roster::JobHandler`] decorator that records job metrics.

pub mod envelope;
pub mod handler;
pub mod metered;
