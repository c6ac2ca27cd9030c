//! JSON envelope shared by every endpoint, and the mapping from
//! [`roster::Error`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{"success": bool, "data": ..., "error": "..."}` with absent fields
/// omitted.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Errors surfaced at the HTTP boundary.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Roster(roster::Error),
}

impl From<roster::Error> for ApiError {
    fn from(err: roster::Error) -> Self {
        Self::Roster(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Roster(err) => match err {
                roster::Error::QueueClosed
                | roster::Error::QueueFull { .. }
                | roster::Error::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
                roster::Error::InvalidJob { .. } => StatusCode::BAD_REQUEST,
                roster::Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
                roster::Error::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
                roster::Error::Processing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::NotFound => "not found".to_string(),
            Self::BadRequest(reason) => reason.clone(),
            Self::Roster(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed with {status}: {}", self.message());
        }
        (status, Json(ApiResponse::failure(self.message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[test]
    fn omits_absent_fields() {
        let ok = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": [1, 2]}));

        let failed = serde_json::to_value(ApiResponse::failure("not found")).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false, "error": "not found"}));
    }

    #[test]
    fn maps_errors_to_status_codes() {
        let cases = [
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (roster::Error::QueueClosed.into(), StatusCode::SERVICE_UNAVAILABLE),
            (
                roster::Error::QueueFull { capacity: 1 }.into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (roster::Error::ShuttingDown.into(), StatusCode::SERVICE_UNAVAILABLE),
            (
                roster::Error::Upstream {
                    context: "reset".into(),
                }
                .into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                roster::Error::DeadlineExceeded {
                    deadline: Duration::from_secs(1),
                }
                .into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
