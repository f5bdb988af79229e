//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model (DB + API)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    /// Store-assigned identity; `None` until persisted
    #[serde(default)]
    pub id: Option<i32>,
    pub title: String,
    pub author: String,
    /// Unique across all books
    pub isbn: String,
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }
}

/// Create / update book request
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct BookRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    pub isbn: String,
}

impl BookRequest {
    pub fn into_book(self, id: Option<i32>) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
        }
    }
}

/// Searchable book columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Isbn,
}

impl BookField {
    pub fn column(&self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Isbn => "isbn",
        }
    }

    fn value<'a>(&self, book: &'a Book) -> &'a str {
        match self {
            BookField::Title => &book.title,
            BookField::Author => &book.author,
            BookField::Isbn => &book.isbn,
        }
    }
}

/// Book search filter. Every present field must be contained,
/// case-insensitively, in the matching book field.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookFilter {
    /// Substring of the title
    pub title: Option<String>,
    /// Substring of the author
    pub author: Option<String>,
    /// Substring of the ISBN
    pub isbn: Option<String>,
}

impl BookFilter {
    /// Fields to filter on, skipping absent and blank values
    pub fn criteria(&self) -> Vec<(BookField, &str)> {
        [
            (BookField::Title, &self.title),
            (BookField::Author, &self.author),
            (BookField::Isbn, &self.isbn),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (field, v))
        })
        .collect()
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.criteria().into_iter().all(|(field, needle)| {
            field
                .value(book)
                .to_lowercase()
                .contains(&needle.to_lowercase())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adventures() -> Book {
        Book::new("As Aventuras", "Artur", "978-001").with_id(1)
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = BookFilter::default();
        assert!(filter.criteria().is_empty());
        assert!(filter.matches(&adventures()));
    }

    #[test]
    fn blank_fields_are_ignored() {
        let filter = BookFilter {
            title: Some("   ".into()),
            author: Some(String::new()),
            isbn: None,
        };
        assert!(filter.criteria().is_empty());
    }

    #[test]
    fn title_matches_as_case_insensitive_substring() {
        let filter = BookFilter {
            title: Some("aVENT".into()),
            ..Default::default()
        };
        assert!(filter.matches(&adventures()));

        let filter = BookFilter {
            title: Some("voyage".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&adventures()));
    }

    #[test]
    fn fields_combine_with_and() {
        let filter = BookFilter {
            title: Some("aventuras".into()),
            author: Some("someone else".into()),
            isbn: None,
        };
        assert!(!filter.matches(&adventures()));

        let filter = BookFilter {
            title: Some("aventuras".into()),
            author: Some("art".into()),
            isbn: Some("001".into()),
        };
        assert!(filter.matches(&adventures()));
    }

    #[test]
    fn empty_request_reports_every_missing_field() {
        let errors = BookRequest::default().validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 3);
    }
}
