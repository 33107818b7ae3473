// file: src/server/error.rs
// description: maps pipeline errors onto HTTP responses
// reference: https://docs.rs/axum/latest/axum/response/trait.IntoResponse.html

use crate::error::PipelineError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            PipelineError::ParseFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::GenerationFailure(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(PipelineError::Validation(format!(
            "invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self.0);
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
        }

        let body = json!({
            "error": {
                "code": status.as_u16(),
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}
