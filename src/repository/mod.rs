//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Loan, LoanFilter, LoanStatus, PageRequest},
};

/// Book persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book and return it with its assigned id
    async fn insert(&self, book: &Book) -> AppResult<Book>;

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Book>>;

    async fn get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool>;

    /// Overwrite title, author and ISBN of the book with the given id
    async fn update(&self, id: i32, book: &Book) -> AppResult<Book>;

    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Matching books ordered by id, plus the total match count
    async fn search(&self, filter: &BookFilter, page: PageRequest) -> AppResult<(Vec<Book>, i64)>;
}

/// Loan persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Insert a new loan and return it with its assigned id
    async fn insert(&self, loan: &Loan) -> AppResult<Loan>;

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>>;

    /// Whether the book has a loan that has not been returned
    async fn exists_outstanding_for_book(&self, book_id: i32) -> AppResult<bool>;

    async fn update_status(&self, id: i32, status: LoanStatus) -> AppResult<Loan>;

    /// Matching loans ordered by id, plus the total match count
    async fn search(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<(Vec<Loan>, i64)>;
}

/// Main repository struct holding the stores
#[derive(Clone)]
pub struct Repository {
    pool: Option<Pool<Postgres>>,
    pub books: Arc<dyn BookStore>,
    pub loans: Arc<dyn LoanStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            loans: Arc::new(loans::LoansRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository that keeps everything in process memory
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            pool: None,
            books: Arc::new(store.clone()),
            loans: Arc::new(store),
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

pub(crate) const DUPLICATE_ISBN: &str = "ISBN already being used";
pub(crate) const BOOK_ALREADY_LOANED: &str = "Book already loaned";
pub(crate) const BOOK_HAS_LOANS: &str = "Book has loans and cannot be deleted";
pub(crate) const BOOK_NOT_FOUND: &str = "Book not found";

/// Surface constraint violations as business rule errors
pub(crate) fn map_constraint_error(
    err: sqlx::Error,
    unique_message: &str,
    foreign_key_message: &str,
) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::BusinessRule(unique_message.to_string());
        }
        if db.is_foreign_key_violation() {
            return AppError::BusinessRule(foreign_key_message.to_string());
        }
    }
    AppError::Database(err)
}
