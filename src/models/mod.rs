//! Data models for the library API

pub mod book;
pub mod loan;
pub mod page;

// Re-export commonly used types
pub use book::{Book, BookFilter, BookRequest};
pub use loan::{CreateLoan, Loan, LoanDetails, LoanFilter, LoanStatus, NewLoan, ReturnLoan};
pub use page::{Page, PageQuery, PageRequest};
