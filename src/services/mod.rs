//! Business logic services

pub mod authors;
pub mod books;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository, storage::ImageStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
}

impl Services {
    /// Create all services with the given repository and image store
    pub fn new(repository: Repository, images: Arc<dyn ImageStore>, config: &AppConfig) -> Self {
        Self {
            authors: authors::AuthorsService::new(
                repository.clone(),
                config.pagination.per_page,
            ),
            books: books::BooksService::new(
                repository,
                images,
                config.storage.public_url.clone(),
                config.pagination.per_page,
            ),
        }
    }
}
