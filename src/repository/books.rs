//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{map_constraint_error, BookStore, BOOK_HAS_LOANS, DUPLICATE_ISBN};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, PageRequest},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append `WHERE` conditions for the filter (AND of case-insensitive substrings)
    fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a BookFilter) {
        for (i, (field, needle)) in filter.criteria().into_iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            builder
                .push("strpos(lower(")
                .push(field.column())
                .push("), lower(")
                .push_bind(needle)
                .push(")) > 0");
        }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn)
            VALUES ($1, $2, $3)
            RETURNING id, title, author, isbn
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, DUPLICATE_ISBN, BOOK_HAS_LOANS))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn get_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn update(&self, id: i32, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET title = $1, author = $2, isbn = $3
            WHERE id = $4
            RETURNING id, title, author, isbn
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, DUPLICATE_ISBN, BOOK_HAS_LOANS))?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, DUPLICATE_ISBN, BOOK_HAS_LOANS))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }

    async fn search(&self, filter: &BookFilter, page: PageRequest) -> AppResult<(Vec<Book>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM books");
        Self::push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::new("SELECT id, title, author, isbn FROM books");
        Self::push_filter(&mut select, filter);
        select
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let books = select
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }
}
