//! Book model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::author::Author;

/// Full book model from database. `image` holds the storage key
/// (e.g. `books/<uuid>.png`), not the public URL.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API response shape for a book: all fields plus the associated authors,
/// with `image` rewritten to its public path.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookResource {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Public path of the stored cover image, e.g. `/storage/books/<uuid>.png`
    pub image: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub authors: Vec<Author>,
}

impl BookResource {
    /// Shape a persisted book and its loaded authors into the response
    /// payload, mapping the stored image key to its public URL.
    pub fn from_parts(book: Book, authors: Vec<Author>, public_url: &str) -> Self {
        let image = book
            .image
            .map(|key| format!("{}/{}", public_url.trim_end_matches('/'), key));
        Self {
            id: book.id,
            title: book.title,
            description: book.description,
            image,
            publication_date: book.publication_date,
            created_at: book.created_at,
            updated_at: book.updated_at,
            authors,
        }
    }
}

/// Create/update book request. Full-field replace; the image file travels
/// as a separate multipart part and is not part of this payload.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BookPayload {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "author_ids must not be empty"))]
    pub author_ids: Vec<i64>,
}

/// Book list query parameters. All present filters are AND'd together.
#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    /// Substring match on title
    pub title: Option<String>,
    /// Substring match against any associated author's first or last name
    pub author: Option<String>,
    /// Substring match on title or any associated author's name
    pub search: Option<String>,
    pub page: Option<i64>,
}
