//! User records and the directory capability that persists them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Stored user. `password` holds the bcrypt hash, never the plaintext.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub nickname: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user about to be created; `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nickname: String,
    pub password_hash: String,
}

/// Client-safe view of a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            nickname: user.nickname.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Nickname already taken.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Storage(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DirectoryError::Conflict(db.message().to_string())
            }
            _ => DirectoryError::Storage(error.to_string()),
        }
    }
}

/// Persistence for user records, looked up by unique nickname.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, DirectoryError>;

    /// `Ok(None)` when no user has this nickname.
    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DirectoryError>;
}
