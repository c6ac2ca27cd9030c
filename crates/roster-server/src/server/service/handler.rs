//! HTTP routes over the entity store and the job queue.
//!
//! ## Routes
//!
//! - `GET /entities` - snapshot of every entity.
//! - `GET /entities/{id}` - a single entity, or 404.
//! - `POST /entities` - insert (or overwrite) an entity.
//! - `POST /jobs` - enqueue a job for the worker pool.
//! - `GET /health` - `serving` until shutdown begins.
//!
//! Every response body is an [`ApiResponse`] envelope.

use super::envelope::{ApiError, ApiResponse};
use crate::server::telemetry::{
    increment_entities_created, increment_http_requests, increment_jobs_submitted,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use roster::{Entity, Job, NewEntity, Producer, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// State shared by every request handler.
///
/// Handlers reach the store only through its accessors and the queue only
/// through a [`Producer`], which can neither close the queue nor keep it open.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    producer: Producer,
    shutdown_token: CancellationToken,
}

impl AppState {
    pub const fn new(
        store: Arc<Store>,
        producer: Producer,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            store,
            producer,
            shutdown_token,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/entities", get(list_entities).post(create_entity))
        .route("/entities/{id}", get(get_entity))
        .route("/jobs", post(submit_job))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiResult<T> = Result<T, ApiError>;

async fn list_entities(State(state): State<AppState>) -> Json<ApiResponse<Vec<Entity>>> {
    increment_http_requests();
    Json(ApiResponse::ok(state.store.list()))
}

#[tracing::instrument(skip(state))]
async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Entity>>> {
    increment_http_requests();
    let entity = state.store.get(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok(entity)))
}

#[tracing::instrument(skip_all, fields(id = %new.id))]
async fn create_entity(
    State(state): State<AppState>,
    Json(new): Json<NewEntity>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Entity>>)> {
    increment_http_requests();
    if new.id.trim().is_empty() {
        return Err(ApiError::BadRequest("id must not be empty".to_string()));
    }

    let entity = state.store.create(new);
    increment_entities_created();
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(entity))))
}

#[derive(Debug, Serialize, Deserialize)]
struct SubmitJob {
    job: Job,
}

/// Enqueues without waiting: a full queue is reported as 503 rather than
/// holding the request open.
#[tracing::instrument(skip_all, fields(job = %body.job))]
async fn submit_job(
    State(state): State<AppState>,
    Json(body): Json<SubmitJob>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SubmitJob>>)> {
    increment_http_requests();
    if body.job.as_str().trim().is_empty() {
        return Err(ApiError::BadRequest("job must not be empty".to_string()));
    }

    state.producer.try_submit(body.job.clone())?;
    increment_jobs_submitted();
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::ok(body))))
}

async fn health(State(state): State<AppState>) -> Response {
    increment_http_requests();
    if state.shutdown_token.is_cancelled() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::failure("not serving")),
        )
            .into_response()
    } else {
        Json(ApiResponse::ok("serving")).into_response()
    }
}
