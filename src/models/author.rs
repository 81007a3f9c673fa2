//! Author model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update author request. Full-field replace; both names required,
/// anything else is rejected.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AuthorPayload {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,
}

/// Author list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct AuthorQuery {
    /// Case-insensitive substring match on first_name or last_name
    pub search: Option<String>,
    pub page: Option<i64>,
}
