//! Bookshelf Catalog Server
//!
//! A Rust implementation of the Bookshelf catalog server, providing a REST
//! JSON API for managing books, authors, and their many-to-many
//! associations, including cover image uploads.

use std::sync::Arc;

use uuid::Uuid;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: sqlx::PgPool,
}

/// Per-request context handed explicitly to every service call.
///
/// Built by an extractor in the API layer; carries the correlation id used
/// in service-level tracing.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub request_id: Uuid,
}
