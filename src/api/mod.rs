//! API handlers for Bookshelf REST endpoints

pub mod authors;
pub mod books;
pub mod health;
pub mod openapi;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, AppState, RequestContext};

/// Single-entity response envelope
#[derive(Serialize, ToSchema)]
pub struct DataResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub data: T,
}

/// Pagination metadata
#[derive(Serialize, ToSchema)]
pub struct PageMeta {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Paginated collection envelope
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Honor a caller-supplied correlation id, mint one otherwise
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(RequestContext { request_id })
    }
}
