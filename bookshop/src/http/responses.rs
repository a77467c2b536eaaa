use serde::Serialize;

use crate::catalog::Book;
use crate::users::UserSummary;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `{summary, details?}` body shared by errors and plain acknowledgements.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl MessageResponse {
    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            details: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub summary: &'static str,
    pub details: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct BooksResponse {
    pub total: usize,
    pub books: Vec<Book>,
}

impl BooksResponse {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            total: books.len(),
            books,
        }
    }
}
