//! Book management service
//!
//! Owns the cover-image lifecycle around record mutation: a new upload is
//! written before the row, a replaced or deleted book's old file is removed
//! from the store, and cleanup failures never abort the CRUD operation.

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::book::{BookPayload, BookQuery, BookResource},
    repository::Repository,
    storage::{image_key, ImageStore, UploadedImage},
    RequestContext,
};

/// Namespace stored cover images live under
const IMAGE_NAMESPACE: &str = "books";

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    images: Arc<dyn ImageStore>,
    public_url: String,
    per_page: i64,
}

impl BooksService {
    pub fn new(
        repository: Repository,
        images: Arc<dyn ImageStore>,
        public_url: String,
        per_page: i64,
    ) -> Self {
        Self {
            repository,
            images,
            public_url,
            per_page,
        }
    }

    /// Search books with filters, authors embedded in every result
    pub async fn list(
        &self,
        _ctx: &RequestContext,
        query: &BookQuery,
    ) -> AppResult<(Vec<BookResource>, i64)> {
        let (rows, total) = self.repository.books.search(query, self.per_page).await?;
        let books = rows
            .into_iter()
            .map(|(book, authors)| BookResource::from_parts(book, authors, &self.public_url))
            .collect();
        Ok((books, total))
    }

    /// Get book by ID with authors embedded
    pub async fn get(&self, _ctx: &RequestContext, id: i64) -> AppResult<BookResource> {
        let (book, authors) = self.repository.books.get_by_id(id).await?;
        Ok(BookResource::from_parts(book, authors, &self.public_url))
    }

    /// Create a new book. The image (if any) is stored first; if the record
    /// insert or association sync then fails, the fresh file is discarded so
    /// nothing points at it.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        payload: BookPayload,
        image: Option<UploadedImage>,
    ) -> AppResult<BookResource> {
        let image_key = match image {
            Some(ref upload) => Some(store_upload(self.images.as_ref(), upload).await?),
            None => None,
        };

        match self
            .repository
            .books
            .create(&payload, image_key.as_deref())
            .await
        {
            Ok((book, authors)) => {
                tracing::info!(
                    request_id = %ctx.request_id,
                    book_id = book.id,
                    "created book"
                );
                Ok(BookResource::from_parts(book, authors, &self.public_url))
            }
            Err(err) => {
                if let Some(ref key) = image_key {
                    self.discard_image(key).await;
                }
                Err(err)
            }
        }
    }

    /// Update an existing book. A new upload replaces the stored file: the
    /// old one is removed first, then the new one written; without an
    /// upload the stored image is left as is.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        payload: BookPayload,
        image: Option<UploadedImage>,
    ) -> AppResult<BookResource> {
        let (existing, _) = self.repository.books.get_by_id(id).await?;

        let image_key = match image {
            Some(ref upload) => {
                if let Some(ref old_key) = existing.image {
                    self.discard_image(old_key).await;
                }
                Some(store_upload(self.images.as_ref(), upload).await?)
            }
            None => None,
        };

        match self
            .repository
            .books
            .update(id, &payload, image_key.as_deref())
            .await
        {
            Ok((book, authors)) => {
                tracing::info!(request_id = %ctx.request_id, book_id = id, "updated book");
                Ok(BookResource::from_parts(book, authors, &self.public_url))
            }
            Err(err) => {
                if let Some(ref key) = image_key {
                    self.discard_image(key).await;
                }
                Err(err)
            }
        }
    }

    /// Delete a book. Its stored image is removed first so a retried delete
    /// cannot leave an orphaned file behind.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> AppResult<()> {
        let (book, _) = self.repository.books.get_by_id(id).await?;

        if let Some(ref key) = book.image {
            self.discard_image(key).await;
        }

        self.repository.books.delete(id).await?;
        tracing::info!(request_id = %ctx.request_id, book_id = id, "deleted book");
        Ok(())
    }

    /// Best-effort removal of a stored file. Cleanup must never fail the
    /// primary operation.
    async fn discard_image(&self, key: &str) {
        if let Err(err) = self.images.delete(key).await {
            tracing::warn!(key, "failed to delete stored image: {}", err);
        }
    }
}

/// Store an upload under the books namespace and return its key
async fn store_upload(store: &dyn ImageStore, upload: &UploadedImage) -> AppResult<String> {
    let key = image_key(IMAGE_NAMESPACE, &upload.filename);
    store.put(&key, &upload.bytes).await?;
    Ok(key)
}
