//! Books repository
//!
//! Filtered search, eager author loading, and the pivot-table sync that
//! keeps a book's author set equal to the requested ids.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder, Row, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookPayload, BookQuery},
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Search books with pagination. Filters are AND'd; `author` and
    /// `search` match through the pivot table (any associated author
    /// counts). Each result carries its full author set.
    pub async fn search(
        &self,
        query: &BookQuery,
        per_page: i64,
    ) -> AppResult<(Vec<(Book, Vec<Author>)>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let offset = (page - 1) * per_page;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM books b");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(
            "SELECT b.id, b.title, b.description, b.image, b.publication_date, \
             b.created_at, b.updated_at FROM books b",
        );
        push_filters(&mut select, query);
        select.push(" ORDER BY b.title LIMIT ");
        select.push_bind(per_page);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let books: Vec<Book> = select.build_query_as().fetch_all(&self.pool).await?;

        let ids: Vec<i64> = books.iter().map(|b| b.id).collect();
        let mut authors_by_book = self.authors_for_books(&ids).await?;

        Ok((
            books
                .into_iter()
                .map(|b| {
                    let authors = authors_by_book.remove(&b.id).unwrap_or_default();
                    (b, authors)
                })
                .collect(),
            total,
        ))
    }

    /// Load authors for a set of books in one query, grouped by book id
    async fn authors_for_books(&self, book_ids: &[i64]) -> AppResult<HashMap<i64, Vec<Author>>> {
        if book_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT ba.book_id, a.id, a.first_name, a.last_name, a.created_at, a.updated_at
            FROM book_authors ba
            JOIN authors a ON a.id = ba.author_id
            WHERE ba.book_id = ANY($1)
            ORDER BY a.last_name, a.first_name
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<Author>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.get("book_id"))
                .or_default()
                .push(Author {
                    id: row.get("id"),
                    first_name: row.get("first_name"),
                    last_name: row.get("last_name"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                });
        }
        Ok(grouped)
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID with its authors loaded
    pub async fn get_by_id(&self, id: i64) -> AppResult<(Book, Vec<Author>)> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, description, image, publication_date, created_at, updated_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound { entity: "Book", id })?;

        let authors = self.get_book_authors(id).await?;
        Ok((book, authors))
    }

    /// Load all authors for a book via the book_authors junction table
    async fn get_book_authors(&self, book_id: i64) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.first_name, a.last_name, a.created_at, a.updated_at
            FROM book_authors ba
            JOIN authors a ON a.id = ba.author_id
            WHERE ba.book_id = $1
            ORDER BY a.last_name, a.first_name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Create a new book and synchronize its author set, atomically. A
    /// failed sync (unknown author id) rolls the insert back.
    pub async fn create(
        &self,
        payload: &BookPayload,
        image: Option<&str>,
    ) -> AppResult<(Book, Vec<Author>)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, description, image, publication_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, title, description, image, publication_date, created_at, updated_at
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(image)
        .bind(payload.publication_date)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sync_book_authors(&mut tx, book.id, &payload.author_ids).await?;
        tx.commit().await?;

        let authors = self.get_book_authors(book.id).await?;
        Ok((book, authors))
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Update an existing book (full replace of editable fields) and
    /// re-synchronize its author set in the same transaction. A `None`
    /// image leaves the stored value untouched.
    pub async fn update(
        &self,
        id: i64,
        payload: &BookPayload,
        image: Option<&str>,
    ) -> AppResult<(Book, Vec<Author>)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1,
                description = $2,
                image = COALESCE($3, image),
                publication_date = $4,
                updated_at = $5
            WHERE id = $6
            RETURNING id, title, description, image, publication_date, created_at, updated_at
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(image)
        .bind(payload.publication_date)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound { entity: "Book", id })?;

        sync_book_authors(&mut tx, id, &payload.author_ids).await?;
        tx.commit().await?;

        let authors = self.get_book_authors(id).await?;
        Ok((book, authors))
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Delete a book. Association rows go with it via FK cascade.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { entity: "Book", id });
        }
        Ok(())
    }
}

/// Append the WHERE clause for a book search. Each present filter is one
/// AND'd predicate; OR exists only inside a predicate.
fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a BookQuery) {
    builder.push(" WHERE 1=1");

    if let Some(ref title) = query.title {
        builder.push(" AND b.title ILIKE ");
        builder.push_bind(format!("%{}%", title));
    }

    if let Some(ref author) = query.author {
        let pattern = format!("%{}%", author);
        builder.push(
            " AND EXISTS (SELECT 1 FROM book_authors ba JOIN authors a ON a.id = ba.author_id \
             WHERE ba.book_id = b.id AND (a.first_name ILIKE ",
        );
        builder.push_bind(pattern.clone());
        builder.push(" OR a.last_name ILIKE ");
        builder.push_bind(pattern);
        builder.push("))");
    }

    if let Some(ref search) = query.search {
        let pattern = format!("%{}%", search);
        builder.push(" AND (b.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(
            " OR EXISTS (SELECT 1 FROM book_authors ba JOIN authors a ON a.id = ba.author_id \
             WHERE ba.book_id = b.id AND (a.first_name ILIKE ",
        );
        builder.push_bind(pattern.clone());
        builder.push(" OR a.last_name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")))");
    }
}

/// Replace the author set for a book with exactly `author_ids`: insert the
/// missing links, delete the stale ones, leave the intersection untouched
/// so its timestamps survive. Fails if any id has no author row.
async fn sync_book_authors(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i64,
    author_ids: &[i64],
) -> AppResult<()> {
    let known: Vec<i64> = sqlx::query_scalar("SELECT id FROM authors WHERE id = ANY($1)")
        .bind(author_ids)
        .fetch_all(&mut **tx)
        .await?;
    let known: HashSet<i64> = known.into_iter().collect();

    let mut missing: Vec<i64> = author_ids
        .iter()
        .filter(|id| !known.contains(id))
        .copied()
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        missing.dedup();
        return Err(AppError::validation(
            "author_ids",
            format!(
                "unknown author ids: {}",
                missing
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }

    let current: Vec<i64> =
        sqlx::query_scalar("SELECT author_id FROM book_authors WHERE book_id = $1")
            .bind(book_id)
            .fetch_all(&mut **tx)
            .await?;

    let (added, removed) = diff_ids(&current, author_ids);

    if !removed.is_empty() {
        sqlx::query("DELETE FROM book_authors WHERE book_id = $1 AND author_id = ANY($2)")
            .bind(book_id)
            .bind(&removed)
            .execute(&mut **tx)
            .await?;
    }

    if !added.is_empty() {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO book_authors (book_id, author_id, created_at, updated_at)
            SELECT $1, author_id, $3, $3 FROM UNNEST($2::bigint[]) AS t(author_id)
            "#,
        )
        .bind(book_id)
        .bind(&added)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Set reconciliation between the current and desired id sets: returns
/// (ids to insert, ids to remove), both sorted. Duplicates in the desired
/// list collapse to one link.
fn diff_ids(current: &[i64], desired: &[i64]) -> (Vec<i64>, Vec<i64>) {
    let current_set: HashSet<i64> = current.iter().copied().collect();
    let desired_set: HashSet<i64> = desired.iter().copied().collect();

    let mut added: Vec<i64> = desired_set.difference(&current_set).copied().collect();
    let mut removed: Vec<i64> = current_set.difference(&desired_set).copied().collect();
    added.sort_unstable();
    removed.sort_unstable();

    (added, removed)
}
