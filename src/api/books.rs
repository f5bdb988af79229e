//! Book catalog endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::{page::BookPage, Book, BookFilter, BookRequest, Page, PageQuery},
    AppState,
};

use super::{AppPath, AppQuery, ValidatedJson};

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or ISBN already used", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.books.create(request.into_book(None)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .books
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(book))
}

/// List books matching a filter, one page at a time
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookFilter, PageQuery),
    responses(
        (status = 200, description = "Page of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<BookFilter>,
    AppQuery(page): AppQuery<PageQuery>,
) -> AppResult<Json<Page<Book>>> {
    let page = page.resolve(&state.config.pagination);
    let books = state.services.books.find(&filter, page).await?;
    Ok(Json(books))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input or ISBN already used", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> AppResult<Json<Book>> {
    let existing = state
        .services
        .books
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let updated = state.services.books.update(request.into_book(existing.id)).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Book has loans", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<StatusCode> {
    let book = state
        .services
        .books
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    state.services.books.delete(&book).await?;
    Ok(StatusCode::NO_CONTENT)
}
