//! Authors repository

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorPayload},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search authors with pagination. The search term matches first_name
    /// or last_name as a case-insensitive substring; results are ordered by
    /// last_name.
    pub async fn search(
        &self,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<Author>, i64)> {
        let offset = (page - 1) * per_page;

        let (authors, total) = if let Some(term) = search {
            let pattern = format!("%{}%", term);
            let total: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM authors WHERE first_name ILIKE $1 OR last_name ILIKE $1",
            )
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

            let authors = sqlx::query_as::<_, Author>(
                r#"
                SELECT id, first_name, last_name, created_at, updated_at
                FROM authors
                WHERE first_name ILIKE $1 OR last_name ILIKE $1
                ORDER BY last_name
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(&pattern)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

            (authors, total)
        } else {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
                .fetch_one(&self.pool)
                .await?;

            let authors = sqlx::query_as::<_, Author>(
                r#"
                SELECT id, first_name, last_name, created_at, updated_at
                FROM authors
                ORDER BY last_name
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

            (authors, total)
        };

        Ok((authors, total))
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, created_at, updated_at FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound {
            entity: "Author",
            id,
        })
    }

    /// Create a new author
    pub async fn create(&self, payload: &AuthorPayload) -> AppResult<Author> {
        let now = Utc::now();
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, first_name, last_name, created_at, updated_at
            "#,
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(author)
    }

    /// Update an existing author (full replace of editable fields)
    pub async fn update(&self, id: i64, payload: &AuthorPayload) -> AppResult<Author> {
        let now = Utc::now();
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $1, last_name = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, first_name, last_name, created_at, updated_at
            "#,
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound {
            entity: "Author",
            id,
        })
    }

    /// Delete an author. Association rows go with it via FK cascade.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound {
                entity: "Author",
                id,
            });
        }
        Ok(())
    }
}
