//! In-memory stores, used for tests and the `database.in_memory` mode.
//!
//! The same constraints as the PostgreSQL schema are enforced here: unique
//! ISBN, at most one outstanding loan per book, and no deleting a book that
//! has loans.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{
    BookStore, LoanStore, BOOK_ALREADY_LOANED, BOOK_HAS_LOANS, BOOK_NOT_FOUND, DUPLICATE_ISBN,
};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, Loan, LoanFilter, LoanStatus, PageRequest},
};

#[derive(Debug, Clone)]
struct LoanRecord {
    id: i32,
    customer: String,
    book_id: i32,
    loan_date: NaiveDate,
    status: LoanStatus,
}

#[derive(Debug, Default)]
struct State {
    books: BTreeMap<i32, Book>,
    loans: BTreeMap<i32, LoanRecord>,
    next_book_id: i32,
    next_loan_id: i32,
}

impl State {
    fn isbn_taken(&self, isbn: &str, except: Option<i32>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && b.id != except)
    }

    fn has_outstanding(&self, book_id: i32, except: Option<i32>) -> bool {
        self.loans.values().any(|l| {
            l.book_id == book_id && l.status.is_outstanding() && Some(l.id) != except
        })
    }

    fn to_loan(&self, record: &LoanRecord) -> AppResult<Loan> {
        let book = self
            .books
            .get(&record.book_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("Loan {} references a missing book", record.id)))?;
        Ok(Loan {
            id: Some(record.id),
            customer: record.customer.clone(),
            book,
            loan_date: record.loan_date,
            status: record.status,
        })
    }
}

/// Thread-safe in-memory implementation of both stores
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    fn lock(&self) -> AppResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut state = self.lock()?;
        if state.isbn_taken(&book.isbn, None) {
            return Err(AppError::BusinessRule(DUPLICATE_ISBN.to_string()));
        }
        state.next_book_id += 1;
        let id = state.next_book_id;
        let stored = book.clone().with_id(id);
        state.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.lock()?.books.get(&id).cloned())
    }

    async fn get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        Ok(self.lock()?.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        Ok(self.lock()?.isbn_taken(isbn, None))
    }

    async fn update(&self, id: i32, book: &Book) -> AppResult<Book> {
        let mut state = self.lock()?;
        if !state.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        if state.isbn_taken(&book.isbn, Some(id)) {
            return Err(AppError::BusinessRule(DUPLICATE_ISBN.to_string()));
        }
        let stored = book.clone().with_id(id);
        state.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.lock()?;
        if !state.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        if state.loans.values().any(|l| l.book_id == id) {
            return Err(AppError::BusinessRule(BOOK_HAS_LOANS.to_string()));
        }
        state.books.remove(&id);
        Ok(())
    }

    async fn search(&self, filter: &BookFilter, page: PageRequest) -> AppResult<(Vec<Book>, i64)> {
        let state = self.lock()?;
        let matching: Vec<Book> = state
            .books
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        Ok((page.slice(&matching), matching.len() as i64))
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn insert(&self, loan: &Loan) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Can't loan a book with null id".to_string()))?;

        let mut state = self.lock()?;
        if !state.books.contains_key(&book_id) {
            return Err(AppError::BusinessRule(BOOK_NOT_FOUND.to_string()));
        }
        if loan.status.is_outstanding() && state.has_outstanding(book_id, None) {
            return Err(AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string()));
        }

        state.next_loan_id += 1;
        let id = state.next_loan_id;
        let record = LoanRecord {
            id,
            customer: loan.customer.clone(),
            book_id,
            loan_date: loan.loan_date,
            status: loan.status,
        };
        state.loans.insert(record.id, record.clone());
        state.to_loan(&record)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let state = self.lock()?;
        let loan = state.loans.get(&id).map(|r| state.to_loan(r)).transpose()?;
        Ok(loan)
    }

    async fn exists_outstanding_for_book(&self, book_id: i32) -> AppResult<bool> {
        Ok(self.lock()?.has_outstanding(book_id, None))
    }

    async fn update_status(&self, id: i32, status: LoanStatus) -> AppResult<Loan> {
        let mut state = self.lock()?;
        let book_id = state
            .loans
            .get(&id)
            .map(|r| r.book_id)
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))?;

        if status.is_outstanding() && state.has_outstanding(book_id, Some(id)) {
            return Err(AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string()));
        }

        let record = match state.loans.get_mut(&id) {
            Some(record) => {
                record.status = status;
                record.clone()
            }
            None => return Err(AppError::NotFound(format!("Loan {} not found", id))),
        };
        state.to_loan(&record)
    }

    async fn search(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<(Vec<Loan>, i64)> {
        let state = self.lock()?;
        let matching = state
            .loans
            .values()
            .map(|r| state.to_loan(r))
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .filter(|l| filter.matches(l))
            .collect::<Vec<_>>();
        Ok((page.slice(&matching), matching.len() as i64))
    }
}
