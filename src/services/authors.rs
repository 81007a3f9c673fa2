//! Author management service

use crate::{
    error::AppResult,
    models::author::{Author, AuthorPayload, AuthorQuery},
    repository::Repository,
    RequestContext,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
    per_page: i64,
}

impl AuthorsService {
    pub fn new(repository: Repository, per_page: i64) -> Self {
        Self {
            repository,
            per_page,
        }
    }

    /// List authors ordered by last name, optionally filtered by a search
    /// term matching either name
    pub async fn list(
        &self,
        _ctx: &RequestContext,
        query: &AuthorQuery,
    ) -> AppResult<(Vec<Author>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        self.repository
            .authors
            .search(query.search.as_deref(), page, self.per_page)
            .await
    }

    /// Get author by ID
    pub async fn get(&self, _ctx: &RequestContext, id: i64) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    /// Create a new author
    pub async fn create(&self, ctx: &RequestContext, payload: AuthorPayload) -> AppResult<Author> {
        let author = self.repository.authors.create(&payload).await?;
        tracing::info!(
            request_id = %ctx.request_id,
            author_id = author.id,
            "created author"
        );
        Ok(author)
    }

    /// Update an existing author
    pub async fn update(
        &self,
        _ctx: &RequestContext,
        id: i64,
        payload: AuthorPayload,
    ) -> AppResult<Author> {
        self.repository.authors.update(id, &payload).await
    }

    /// Delete an author and its association rows
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(request_id = %ctx.request_id, author_id = id, "deleted author");
        Ok(())
    }
}
