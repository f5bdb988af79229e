//! Loan model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::Postgres, Decode, Encode, FromRow};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::Book;

/// Loan lifecycle: a loan starts outstanding and ends returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Outstanding,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Outstanding => "outstanding",
            LoanStatus::Returned => "returned",
        }
    }

    /// Map the `returned` flag of the wire format
    pub fn from_returned(returned: bool) -> Self {
        if returned {
            LoanStatus::Returned
        } else {
            LoanStatus::Outstanding
        }
    }

    pub fn is_outstanding(&self) -> bool {
        matches!(self, LoanStatus::Outstanding)
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outstanding" => Ok(LoanStatus::Outstanding),
            "returned" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Loan model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    /// Store-assigned identity; `None` until persisted
    pub id: Option<i32>,
    pub customer: String,
    pub book: Book,
    pub loan_date: NaiveDate,
    pub status: LoanStatus,
}

/// Data needed to open a loan; the date and status are set on save
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub customer: String,
    pub book: Book,
}

/// Flat row of `loans JOIN books`
#[derive(Debug, FromRow)]
pub struct LoanRow {
    pub id: i32,
    pub customer: String,
    pub loan_date: NaiveDate,
    pub status: LoanStatus,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub book_isbn: String,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Self {
            id: Some(row.id),
            customer: row.customer,
            book: Book {
                id: Some(row.book_id),
                title: row.book_title,
                author: row.book_author,
                isbn: row.book_isbn,
            },
            loan_date: row.loan_date,
            status: row.status,
        }
    }
}

/// Loan with its book, for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub customer: String,
    pub loan_date: NaiveDate,
    pub status: LoanStatus,
    pub returned: bool,
    pub book: Book,
}

impl From<Loan> for LoanDetails {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id.unwrap_or_default(),
            customer: loan.customer,
            loan_date: loan.loan_date,
            returned: !loan.status.is_outstanding(),
            status: loan.status,
            book: loan.book,
        }
    }
}

/// Create loan request
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateLoan {
    /// ISBN of the book to lend
    #[serde(default)]
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Customer must not be empty"))]
    pub customer: String,
}

/// Return (or reopen) a loan
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ReturnLoan {
    pub returned: bool,
}

/// Loan search filter. A loan matches when its book ISBN equals `isbn`
/// OR its customer equals `customer`; absent fields take no part.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanFilter {
    /// Exact ISBN of the loaned book
    pub isbn: Option<String>,
    /// Exact customer name
    pub customer: Option<String>,
}

impl LoanFilter {
    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.isbn().is_none() && self.customer().is_none()
    }

    pub fn matches(&self, loan: &Loan) -> bool {
        if self.is_empty() {
            return true;
        }
        self.isbn().is_some_and(|isbn| loan.book.isbn == isbn)
            || self.customer().is_some_and(|customer| loan.customer == customer)
    }
}
