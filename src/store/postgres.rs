use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{Account, AccountRepository, Message, MessageRepository};
use crate::error::StorageError;

/// Accounts in the `users` table; `username` carries a UNIQUE constraint.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StorageError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(username, password_hash)| Account {
            username,
            password_hash,
        }))
    }

    async fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Feed entries in the `messages` table.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, sender: &str, content: &str) -> Result<Message, StorageError> {
        let (id, sender, content, timestamp) =
            sqlx::query_as::<_, (i64, String, String, DateTime<Utc>)>(
                r#"
                INSERT INTO messages (sender, content)
                VALUES ($1, $2)
                RETURNING id, sender, content, timestamp
                "#,
            )
            .bind(sender)
            .bind(content)
            .fetch_one(&self.pool)
            .await?;

        Ok(Message {
            id,
            sender,
            content,
            timestamp,
        })
    }

    async fn list(&self) -> Result<Vec<Message>, StorageError> {
        let rows = sqlx::query_as::<_, (i64, String, String, DateTime<Utc>)>(
            "SELECT id, sender, content, timestamp FROM messages ORDER BY timestamp ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, sender, content, timestamp)| Message {
                id,
                sender,
                content,
                timestamp,
            })
            .collect())
    }
}
