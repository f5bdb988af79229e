//! Book catalog service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Page, PageRequest},
    repository::{BookStore, DUPLICATE_ISBN},
};

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Create a new book. The ISBN must not be used by any other book.
    pub async fn create(&self, book: Book) -> AppResult<Book> {
        if self.store.exists_by_isbn(&book.isbn).await? {
            tracing::warn!("Rejecting book creation: ISBN {} already used", book.isbn);
            return Err(AppError::BusinessRule(DUPLICATE_ISBN.to_string()));
        }

        let created = self.store.insert(&book).await?;
        tracing::info!("Created book id={:?} isbn={}", created.id, created.isbn);
        Ok(created)
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        self.store.get_by_id(id).await
    }

    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.store.get_by_isbn(isbn).await
    }

    /// Overwrite title, author and ISBN of a persisted book
    pub async fn update(&self, book: Book) -> AppResult<Book> {
        let id = book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Can't update book with null id".to_string()))?;
        self.store.update(id, &book).await
    }

    pub async fn delete(&self, book: &Book) -> AppResult<()> {
        let id = book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Can't delete book with null id".to_string()))?;
        self.store.delete(id).await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    /// Search books; see [`BookFilter`] for matching rules
    pub async fn find(&self, filter: &BookFilter, page: PageRequest) -> AppResult<Page<Book>> {
        let (books, total) = self.store.search(filter, page).await?;
        Ok(Page::new(books, total, page))
    }
}
