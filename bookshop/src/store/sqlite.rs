use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::catalog::{Book, BookCatalog};
use crate::users::{DirectoryError, NewUser, User, UserDirectory};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// SQLite-backed store. The pool is created once at startup and cloned into
/// each handler; one connection serves each in-flight query.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and applies migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        let store = Self::from_pool(pool).await?;
        info!(url = %url, "database ready");
        Ok(store)
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn create(&self, user: NewUser) -> Result<User, DirectoryError> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (nickname, password, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, nickname, password, created_at, updated_at",
        )
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DirectoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, nickname, password, created_at, updated_at
             FROM users WHERE nickname = ?",
        )
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl BookCatalog for SqliteStore {
    async fn list(&self) -> Result<Vec<Book>, DirectoryError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, price, quantity, created_at, updated_at
             FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}
