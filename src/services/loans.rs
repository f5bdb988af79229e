//! Loan management service

use std::sync::Arc;

use chrono::Local;

use crate::{
    error::{AppError, AppResult},
    models::{Loan, LoanFilter, LoanStatus, NewLoan, Page, PageRequest},
    repository::{LoanStore, BOOK_ALREADY_LOANED},
};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LoanStore>,
}

impl LoansService {
    pub fn new(store: Arc<dyn LoanStore>) -> Self {
        Self { store }
    }

    /// Open a loan dated today. Fails if the book is already out.
    pub async fn save(&self, loan: NewLoan) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Can't loan a book with null id".to_string()))?;

        if self.store.exists_outstanding_for_book(book_id).await? {
            tracing::warn!("Rejecting loan: book id={} is already loaned", book_id);
            return Err(AppError::BusinessRule(BOOK_ALREADY_LOANED.to_string()));
        }

        let loan = Loan {
            id: None,
            customer: loan.customer,
            book: loan.book,
            loan_date: Local::now().date_naive(),
            status: LoanStatus::Outstanding,
        };
        let created = self.store.insert(&loan).await?;
        tracing::info!(
            "Created loan id={:?} book id={} customer={}",
            created.id,
            book_id,
            created.customer
        );
        Ok(created)
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        self.store.get_by_id(id).await
    }

    /// Persist the status of an existing loan
    pub async fn update(&self, loan: Loan) -> AppResult<Loan> {
        let id = loan
            .id
            .ok_or_else(|| AppError::InvalidArgument("Can't update loan with null id".to_string()))?;
        let updated = self.store.update_status(id, loan.status).await?;
        tracing::info!("Loan id={} is now {}", id, updated.status);
        Ok(updated)
    }

    /// Search loans; see [`LoanFilter`] for matching rules
    pub async fn find(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<Page<Loan>> {
        let (loans, total) = self.store.search(filter, page).await?;
        Ok(Page::new(loans, total, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Book, repository::MockLoanStore};
    use mockall::predicate::eq;

    fn book() -> Book {
        Book::new("As aventuras", "Artur", "1234").with_id(1)
    }

    fn new_loan(customer: &str) -> NewLoan {
        NewLoan {
            customer: customer.to_string(),
            book: book(),
        }
    }

    fn service(store: MockLoanStore) -> LoansService {
        LoansService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn save_opens_outstanding_loan_dated_today() {
        let mut store = MockLoanStore::new();
        store
            .expect_exists_outstanding_for_book()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(false));
        store
            .expect_insert()
            .withf(|loan| loan.id.is_none() && loan.status == LoanStatus::Outstanding)
            .times(1)
            .returning(|loan| {
                let mut saved = loan.clone();
                saved.id = Some(1);
                Ok(saved)
            });

        let saved = service(store).save(new_loan("Fulano")).await.unwrap();

        assert_eq!(saved.id, Some(1));
        assert_eq!(saved.customer, "Fulano");
        assert_eq!(saved.book, book());
        assert_eq!(saved.loan_date, Local::now().date_naive());
        assert_eq!(saved.status, LoanStatus::Outstanding);
    }

    #[tokio::test]
    async fn save_rejects_book_already_loaned() {
        let mut store = MockLoanStore::new();
        store
            .expect_exists_outstanding_for_book()
            .returning(|_| Ok(true));
        store.expect_insert().never();

        let err = service(store).save(new_loan("Fulano")).await.unwrap_err();

        assert!(matches!(err, AppError::BusinessRule(ref m) if m == "Book already loaned"));
    }

    #[tokio::test]
    async fn save_requires_persisted_book() {
        let store = MockLoanStore::new();
        let loan = NewLoan {
            customer: "Fulano".to_string(),
            book: Book::new("T", "A", "1234"),
        };

        let err = service(store).save(loan).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn update_persists_status() {
        let mut store = MockLoanStore::new();
        store
            .expect_update_status()
            .with(eq(3), eq(LoanStatus::Returned))
            .times(1)
            .returning(|id, status| {
                Ok(Loan {
                    id: Some(id),
                    customer: "Fulano".to_string(),
                    book: book(),
                    loan_date: Local::now().date_naive(),
                    status,
                })
            });

        let loan = Loan {
            id: Some(3),
            customer: "Fulano".to_string(),
            book: book(),
            loan_date: Local::now().date_naive(),
            status: LoanStatus::Returned,
        };
        let updated = service(store).update(loan).await.unwrap();
        assert_eq!(updated.status, LoanStatus::Returned);
    }

    #[tokio::test]
    async fn update_without_id_is_invalid_argument() {
        let mut store = MockLoanStore::new();
        store.expect_update_status().never();

        let loan = Loan {
            id: None,
            customer: "Fulano".to_string(),
            book: book(),
            loan_date: Local::now().date_naive(),
            status: LoanStatus::Returned,
        };
        let err = service(store).update(loan).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn find_passes_filter_and_page_through() {
        let mut store = MockLoanStore::new();
        store
            .expect_search()
            .withf(|filter, page| {
                filter.isbn() == Some("1234") && filter.customer().is_none() && page.size() == 5
            })
            .returning(|_, _| Ok((vec![], 0)));

        let filter = LoanFilter {
            isbn: Some("1234".into()),
            customer: None,
        };
        let page = service(store)
            .find(&filter, PageRequest::new(0, 5))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_when_absent() {
        let mut store = MockLoanStore::new();
        store.expect_get_by_id().returning(|_| Ok(None));

        assert!(service(store).find_by_id(9).await.unwrap().is_none());
    }
}
