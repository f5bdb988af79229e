//! Loans repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{map_constraint_error, LoanStore, BOOK_ALREADY_LOANED, BOOK_NOT_FOUND};
use crate::{
    error::{AppError, AppResult},
    models::{loan::LoanRow, Loan, LoanFilter, LoanStatus, PageRequest},
};

const LOAN_COLUMNS: &str = r#"
    l.id, l.customer, l.loan_date, l.status,
    b.id AS book_id, b.title AS book_title, b.author AS book_author, b.isbn AS book_isbn
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append `WHERE` conditions for the filter (book ISBN OR customer)
    fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a LoanFilter) {
        let mut has_condition = false;
        if let Some(isbn) = filter.isbn() {
            builder.push(" WHERE b.isbn = ").push_bind(isbn);
            has_condition = true;
        }
        if let Some(customer) = filter.customer() {
            builder
                .push(if has_condition { " OR " } else { " WHERE " })
                .push("l.customer = ")
                .push_bind(customer);
        }
    }
}

#[async_trait]
impl LoanStore for LoansRepository {
    async fn insert(&self, loan: &Loan) -> AppResult<Loan> {
        let book_id = loan
            .book
            .id
            .ok_or_else(|| AppError::InvalidArgument("Can't loan a book with null id".to_string()))?;

        let query = format!(
            r#"
            WITH l AS (
                INSERT INTO loans (customer, book_id, loan_date, status)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {LOAN_COLUMNS}
            FROM l
            JOIN books b ON b.id = l.book_id
            "#
        );

        let row = sqlx::query_as::<_, LoanRow>(&query)
            .bind(&loan.customer)
            .bind(book_id)
            .bind(loan.loan_date)
            .bind(loan.status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, BOOK_ALREADY_LOANED, BOOK_NOT_FOUND))?;

        Ok(row.into())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let query = format!(
            "SELECT {LOAN_COLUMNS} FROM loans l JOIN books b ON b.id = l.book_id WHERE l.id = $1"
        );
        let row = sqlx::query_as::<_, LoanRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Loan::from))
    }

    async fn exists_outstanding_for_book(&self, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND status = $2)",
        )
        .bind(book_id)
        .bind(LoanStatus::Outstanding)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn update_status(&self, id: i32, status: LoanStatus) -> AppResult<Loan> {
        let query = format!(
            r#"
            WITH l AS (
                UPDATE loans SET status = $1
                WHERE id = $2
                RETURNING *
            )
            SELECT {LOAN_COLUMNS}
            FROM l
            JOIN books b ON b.id = l.book_id
            "#
        );

        sqlx::query_as::<_, LoanRow>(&query)
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, BOOK_ALREADY_LOANED, BOOK_NOT_FOUND))?
            .map(Loan::from)
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    async fn search(&self, filter: &LoanFilter, page: PageRequest) -> AppResult<(Vec<Loan>, i64)> {
        let mut count =
            QueryBuilder::new("SELECT COUNT(*) FROM loans l JOIN books b ON b.id = l.book_id");
        Self::push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new(format!(
            "SELECT {LOAN_COLUMNS} FROM loans l JOIN books b ON b.id = l.book_id"
        ));
        Self::push_filter(&mut select, filter);
        select
            .push(" ORDER BY l.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<LoanRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Loan::from).collect(), total))
    }
}
