//! Backends for [`UserDirectory`](crate::users::UserDirectory) and
//! [`BookCatalog`](crate::catalog::BookCatalog).

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
