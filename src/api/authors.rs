//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::author::{Author, AuthorPayload, AuthorQuery},
    RequestContext,
};

use super::{DataResponse, PageMeta, PaginatedResponse};

/// List authors with search and pagination
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(
        ("search" = Option<String>, Query, description = "Substring match on first or last name"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)")
    ),
    responses(
        (status = 200, description = "Paginated list of authors", body = PaginatedResponse<Author>)
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Query(query): Query<AuthorQuery>,
) -> AppResult<Json<PaginatedResponse<Author>>> {
    let (authors, total) = state.services.authors.list(&ctx, &query).await?;

    Ok(Json(PaginatedResponse {
        data: authors,
        meta: PageMeta {
            current_page: query.page.unwrap_or(1).max(1),
            per_page: state.config.pagination.per_page,
            total,
        },
    }))
}

/// Get author details by ID
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(
        ("id" = i64, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = DataResponse<Author>),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Json<DataResponse<Author>>> {
    let author = state.services.authors.get(&ctx, id).await?;
    Ok(Json(DataResponse { data: author }))
}

/// Create a new author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    request_body = AuthorPayload,
    responses(
        (status = 201, description = "Author created", body = DataResponse<Author>),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Json(payload): Json<AuthorPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<Author>>)> {
    payload.validate()?;

    let author = state.services.authors.create(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: author })))
}

/// Update an existing author
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    params(
        ("id" = i64, Path, description = "Author ID")
    ),
    request_body = AuthorPayload,
    responses(
        (status = 200, description = "Author updated", body = DataResponse<Author>),
        (status = 404, description = "Author not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Json(payload): Json<AuthorPayload>,
) -> AppResult<Json<DataResponse<Author>>> {
    payload.validate()?;

    let author = state.services.authors.update(&ctx, id, payload).await?;
    Ok(Json(DataResponse { data: author }))
}

/// Delete an author
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    params(
        ("id" = i64, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.authors.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
