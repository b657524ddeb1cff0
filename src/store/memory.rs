use async_trait::async_trait;
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Account, AccountRepository, Message, MessageRepository};
use crate::error::StorageError;

/// Process-local account store.
///
/// The existence check and the insert happen under one lock, so concurrent
/// registrations of the same username see exactly one winner.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<String, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StorageError> {
        let accounts = self.accounts.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(accounts.get(username).cloned())
    }

    async fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StorageError> {
        let mut accounts = self.accounts.lock().map_err(|_| StorageError::LockPoisoned)?;
        match accounts.entry(username.to_string()) {
            Entry::Occupied(_) => Err(StorageError::UniqueViolation(format!(
                "username {} already exists",
                username
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                });
                Ok(())
            }
        }
    }
}

/// Process-local message feed, kept in insertion order.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, sender: &str, content: &str) -> Result<Message, StorageError> {
        let mut messages = self.messages.lock().map_err(|_| StorageError::LockPoisoned)?;
        let message = Message {
            id: messages.len() as i64 + 1,
            sender: sender.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        messages.push(message.clone());
        Ok(message)
    }

    async fn list(&self) -> Result<Vec<Message>, StorageError> {
        let messages = self.messages.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(messages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_then_find() {
        let repo = InMemoryAccountRepository::new();
        repo.insert_account("alice", "$2b$hash").await.unwrap();

        let account = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.password_hash, "$2b$hash");
        assert!(repo.find_by_username("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_keeps_original() {
        let repo = InMemoryAccountRepository::new();
        repo.insert_account("alice", "first").await.unwrap();

        let result = repo.insert_account("alice", "second").await;
        assert!(matches!(result, Err(StorageError::UniqueViolation(_))));

        let account = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(account.password_hash, "first");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_single_winner() {
        let repo = Arc::new(InMemoryAccountRepository::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.insert_account("bob", &format!("hash-{}", i)).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(StorageError::UniqueViolation(_)) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_messages_in_insertion_order() {
        let repo = InMemoryMessageRepository::new();
        repo.append("alice", "first").await.unwrap();
        repo.append("bob", "second").await.unwrap();

        let messages = repo.list().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, 1);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].sender, "bob");
        assert!(messages[0].timestamp <= messages[1].timestamp);
    }
}
