//! Error types for the server

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::ShopsightError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Experiment failed: {0}")]
    Experiment(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ShopsightError> for ServerError {
    fn from(err: ShopsightError) -> Self {
        match err {
            ShopsightError::ValidationError(msg) => ServerError::BadRequest(msg),
            other => ServerError::Experiment(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Experiment(msg) => {
                tracing::error!(detail = %msg, "experiment failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": true,
                "message": message,
            })),
        )
            .into_response()
    }
}
