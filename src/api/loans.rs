//! Loan management endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::{
        page::LoanPage, CreateLoan, LoanDetails, LoanFilter, LoanStatus, NewLoan, Page, PageQuery,
        ReturnLoan,
    },
    AppState,
};

use super::{AppJson, AppPath, AppQuery, ValidatedJson};

/// Created loan reference
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanCreated {
    /// Loan ID
    pub id: i32,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Loan {} not found", id))
}

/// Lend a book to a customer
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanCreated),
        (status = 400, description = "Invalid input, unknown ISBN or book already loaned", body = ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanCreated>)> {
    let book = state
        .services
        .books
        .find_by_isbn(&request.isbn)
        .await?
        .ok_or_else(|| AppError::BusinessRule("Book not found for passed ISBN".to_string()))?;

    let loan = state
        .services
        .loans
        .save(NewLoan {
            customer: request.customer,
            book,
        })
        .await?;

    let id = loan
        .id
        .ok_or_else(|| AppError::Internal("Saved loan has no id".to_string()))?;
    Ok((StatusCode::CREATED, Json(LoanCreated { id })))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found", body = ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state
        .services
        .loans
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(loan.into()))
}

/// Mark a loan as returned (or outstanding again)
#[utoipa::path(
    patch,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan updated", body = LoanDetails),
        (status = 400, description = "Book already loaned to someone else", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(request): AppJson<ReturnLoan>,
) -> AppResult<Json<LoanDetails>> {
    let mut loan = state
        .services
        .loans
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    loan.status = LoanStatus::from_returned(request.returned);
    let updated = state.services.loans.update(loan).await?;
    Ok(Json(updated.into()))
}

/// List loans by book ISBN or customer, one page at a time
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanFilter, PageQuery),
    responses(
        (status = 200, description = "Page of loans", body = LoanPage)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<LoanFilter>,
    AppQuery(page): AppQuery<PageQuery>,
) -> AppResult<Json<Page<LoanDetails>>> {
    let page = page.resolve(&state.config.pagination);
    let loans = state.services.loans.find(&filter, page).await?;
    Ok(Json(loans.map(LoanDetails::from)))
}
