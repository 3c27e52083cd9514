//! Server error types and their HTTP mapping.

use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use timetable_core::ValidationError;
use timetable_feed::FeedError;
use timetable_protocol::ErrorResponse;
use timetable_store::StoreError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Fetching the feed failed. Nothing was written.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Manual event input was rejected. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request body could not be decoded.
    #[error("{message}")]
    BadRequest { message: String },

    /// A feed was fetched but could not be saved. The import was rolled back.
    #[error("Failed to import iCal file.")]
    Import(#[source] StoreError),

    #[error("Failed to save events: {0}")]
    Store(#[from] StoreError),

    /// A blocking database task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Reclassifies a persistence failure as a failed feed import.
    pub fn into_import(self) -> Self {
        match self {
            Self::Store(err) => Self::Import(err),
            other => other,
        }
    }

    /// Caller mistakes and failed feed imports are 400; everything else is 500.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Feed(_) | Self::Import(_) | Self::Validation(_) | Self::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(_) | Self::Task(_) | Self::Io(_) | Self::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Feed(err) => warn!(code = %err.code(), error = %err, "Feed import failed"),
            Self::Import(err) => warn!(error = %err, "Feed import could not be saved"),
            _ if status.is_server_error() => error!(error = %self, "Request failed"),
            _ => warn!(error = %self, "Request rejected"),
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
