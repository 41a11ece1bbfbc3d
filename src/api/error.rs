use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use snafu::Snafu;

use super::MessageResponse;
use crate::model::ValidationError;
use crate::store::{ErrorKind, StoreError};
use crate::Located;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("{source}"))]
    Store { source: StoreError },

    #[snafu(display("{source}"))]
    InvalidQuery { source: ValidationError },

    #[snafu(display("invalid request body: {}", source.body_text()))]
    Body { source: JsonRejection },

    #[snafu(display("invalid query string: {}", source.body_text()))]
    Query { source: QueryRejection },

    #[snafu(display("invalid video id: {}", source.body_text()))]
    Path { source: PathRejection },

    #[snafu(display("store task did not complete: {source}"))]
    BlockingTask { source: tokio::task::JoinError },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store { source } => match source.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidQuery { .. }
            | ApiError::Body { .. }
            | ApiError::Query { .. }
            | ApiError::Path { .. } => StatusCode::BAD_REQUEST,
            ApiError::BlockingTask { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // internal details stay in the log
        let message = if status.is_server_error() {
            match &self {
                ApiError::Store {
                    source: StoreError::Storage { source },
                } => {
                    tracing::error!(error = %source, location = %source.location(), "storage failure")
                }
                _ => tracing::error!(error = %self, "request failed"),
            }

            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
            self.to_string()
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}
