/// Persistence layer
///
/// Repository traits for accounts and the message feed, with a Postgres
/// implementation for deployment and an in-memory one for development and
/// tests. Uniqueness of usernames is enforced by the backend itself, never by
/// a check-then-insert in calling code.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StorageError;

pub use memory::{InMemoryAccountRepository, InMemoryMessageRepository};
pub use postgres::{PgAccountRepository, PgMessageRepository};

/// Stored account record. `password_hash` is a bcrypt hash, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
}

/// One entry of the shared message feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StorageError>;

    /// Insert a new account.
    ///
    /// # Errors
    /// `StorageError::UniqueViolation` if `username` is already stored. The
    /// existing record is left untouched.
    async fn insert_account(&self, username: &str, password_hash: &str)
        -> Result<(), StorageError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message, assigning its id and timestamp.
    async fn append(&self, sender: &str, content: &str) -> Result<Message, StorageError>;

    /// All messages, oldest first.
    async fn list(&self) -> Result<Vec<Message>, StorageError>;
}
