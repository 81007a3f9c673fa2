//! Book endpoints
//!
//! Create and update consume `multipart/form-data`: scalar fields plus
//! repeated `author_ids[]` parts and an optional `image` file part.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::multipart::{Field, Multipart};
use chrono::NaiveDate;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{BookPayload, BookQuery, BookResource},
    storage::UploadedImage,
    RequestContext,
};

use super::{DataResponse, PageMeta, PaginatedResponse};

/// List books with filters and pagination, authors embedded
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(
        ("title" = Option<String>, Query, description = "Substring match on title"),
        ("author" = Option<String>, Query, description = "Substring match on any associated author's name"),
        ("search" = Option<String>, Query, description = "Substring match on title or any associated author's name"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)")
    ),
    responses(
        (status = 200, description = "Paginated list of books", body = PaginatedResponse<BookResource>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<BookResource>>> {
    let (books, total) = state.services.books.list(&ctx, &query).await?;

    Ok(Json(PaginatedResponse {
        data: books,
        meta: PageMeta {
            current_page: query.page.unwrap_or(1).max(1),
            per_page: state.config.pagination.per_page,
            total,
        },
    }))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details with authors", body = DataResponse<BookResource>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<Json<DataResponse<BookResource>>> {
    let book = state.services.books.get(&ctx, id).await?;
    Ok(Json(DataResponse { data: book }))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body(content = BookPayload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Book created", body = DataResponse<BookResource>),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<BookResource>>)> {
    let (payload, image) = parse_book_form(multipart).await?;
    payload.validate()?;

    let book = state.services.books.create(&ctx, payload, image).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: book })))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body(content = BookPayload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Book updated", body = DataResponse<BookResource>),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<BookResource>>> {
    let (payload, image) = parse_book_form(multipart).await?;
    payload.validate()?;

    let book = state.services.books.update(&ctx, id, payload, image).await?;
    Ok(Json(DataResponse { data: book }))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.books.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Parse the multipart form shared by create and update. Unknown parts are
/// rejected, mirroring the strict JSON payloads.
async fn parse_book_form(
    mut multipart: Multipart,
) -> AppResult<(BookPayload, Option<UploadedImage>)> {
    let mut title = None;
    let mut description = None;
    let mut publication_date = None;
    let mut author_ids = Vec::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "title" => title = Some(text(field).await?),
            "description" => description = Some(text(field).await?),
            "publication_date" => {
                let raw = text(field).await?;
                if !raw.is_empty() {
                    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                        AppError::validation("publication_date", "expected a YYYY-MM-DD date")
                    })?;
                    publication_date = Some(date);
                }
            }
            "author_ids" | "author_ids[]" => {
                let raw = text(field).await?;
                let id = raw.parse::<i64>().map_err(|_| {
                    AppError::validation(
                        "author_ids",
                        format!("'{}' is not a valid author id", raw),
                    )
                })?;
                author_ids.push(id);
            }
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid image part: {}", e)))?;
                image = Some(UploadedImage {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            other => {
                return Err(AppError::validation(other, "unknown field"));
            }
        }
    }

    let payload = BookPayload {
        title: title.unwrap_or_default(),
        description,
        publication_date,
        author_ids,
    };
    Ok((payload, image))
}

async fn text(field: Field) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart field: {}", e)))
}
