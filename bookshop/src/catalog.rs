//! Books offered by the shop. Listing only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::users::DirectoryError;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// All books, ordered by id.
    async fn list(&self) -> Result<Vec<Book>, DirectoryError>;
}
