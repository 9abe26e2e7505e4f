//! API Error Handling
//!
//! Every pipeline failure is answered with `400 Bad Request`. The body
//! carries the error message and the stable error kind so clients can tell
//! a timeout from a configuration problem.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shipwright_builder::BuildError;
use shipwright_core::dto::generate::ErrorBody;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Build(BuildError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::BadRequest(msg) => ErrorBody {
                error: msg,
                kind: None,
            },
            ApiError::Build(err) => {
                if err.is_timeout() {
                    tracing::warn!("Request gave up waiting on CI ({}): {}", err.kind(), err);
                } else {
                    tracing::error!("Request failed ({}): {}", err.kind(), err);
                }
                ErrorBody {
                    error: err.to_string(),
                    kind: Some(err.kind().to_string()),
                }
            }
        };

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl From<BuildError> for ApiError {
    fn from(err: BuildError) -> Self {
        ApiError::Build(err)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
