

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;

use crate::core::error::{PipelineError, PipelineFailure};


#[derive(Debug)]
pub struct ApiError {
    error: PipelineError,
    final_query: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_query: Option<&'a str>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation(message.into()).into()
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        Self {
            error,
            final_query: None,
        }
    }
}

impl From<PipelineFailure> for ApiError {
    fn from(failure: PipelineFailure) -> Self {
        Self {
            error: failure.error,
            final_query: failure.final_statement,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("Request failed ({}): {}", self.error.kind(), self.error);
        let body = ErrorBody {
            error: self.error.to_string(),
            final_query: self.final_query.as_deref(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
