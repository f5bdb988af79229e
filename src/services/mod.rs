//! Business logic services

pub mod books;
pub mod loans;

use crate::{error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub loans: loans::LoansService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            books: books::BooksService::new(repository.books.clone()),
            loans: loans::LoansService::new(repository.loans.clone()),
            repository,
        }
    }

    /// Check that the backing store is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
