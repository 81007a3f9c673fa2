//! Error types for Bookshelf server

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("validation failed")]
    Validation { errors: BTreeMap<String, Vec<String>> },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure on a single field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), vec![message.into()]);
        AppError::Validation { errors }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(source: validator::ValidationErrors) -> Self {
        let mut errors = BTreeMap::new();
        for (field, field_errors) in source.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            errors.insert(field.to_string(), messages);
        }
        AppError::Validation { errors }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    /// Field-level messages, present on validation failures
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                format!("{} {} not found", entity, id),
                BTreeMap::new(),
            ),
            AppError::Validation { errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "The given data was invalid".to_string(),
                errors,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, BTreeMap::new()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, BTreeMap::new()),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                    BTreeMap::new(),
                )
            }
            AppError::Database(e) => {
                if let sqlx::Error::Database(ref db) = e {
                    if db.is_unique_violation() {
                        return (
                            StatusCode::CONFLICT,
                            Json(ErrorResponse {
                                message: "Record already exists".to_string(),
                                errors: BTreeMap::new(),
                            }),
                        )
                            .into_response();
                    }
                }
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    BTreeMap::new(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    BTreeMap::new(),
                )
            }
        };

        let body = Json(ErrorResponse { message, errors });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
