use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::entries::repository::EntryRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub entry_repository: Arc<dyn EntryRepository + Send + Sync>,
}

impl AppState {
    pub fn new(entry_repository: Arc<dyn EntryRepository + Send + Sync>) -> Self {
        Self { entry_repository }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unrecognized `method` discriminator. Surfaced as a server error to
    /// match the contract the lambda-era callers already depend on.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for AppError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UnknownMethod(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Method not defined: {}", msg),
            ),
            AppError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Encoding(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Encoding error: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
