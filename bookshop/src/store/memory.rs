use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::catalog::{Book, BookCatalog};
use crate::users::{DirectoryError, NewUser, User, UserDirectory};

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, User>>,
    next_id: Arc<AtomicI64>,
    books: Arc<Vec<Book>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books: Arc::new(books),
            ..Self::default()
        }
    }

    /// Deletes a user. Tokens already issued to them stop validating.
    #[cfg(test)]
    pub fn remove_user(&self, nickname: &str) -> Option<User> {
        self.users.remove(nickname).map(|(_, user)| user)
    }

    #[cfg(test)]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, DirectoryError> {
        match self.users.entry(user.nickname.clone()) {
            Entry::Occupied(_) => Err(DirectoryError::Conflict(format!(
                "user {} already exists",
                user.nickname
            ))),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let created = User {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                    nickname: user.nickname,
                    password: user.password_hash,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.get(nickname).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl BookCatalog for MemoryStore {
    async fn list(&self) -> Result<Vec<Book>, DirectoryError> {
        let mut books = self.books.as_ref().clone();
        books.sort_by_key(|book| book.id);
        Ok(books)
    }
}
