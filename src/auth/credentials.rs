/// Credential Store
///
/// Registration and password checks over an `AccountRepository`. Plaintext
/// passwords go no further than bcrypt.

use std::sync::Arc;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, CredentialError, StorageError};
use crate::store::{Account, AccountRepository};

/// Plaintext behind `CredentialStore::decoy_hash`; never matches a login.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

#[derive(Clone)]
pub struct CredentialStore {
    accounts: Arc<dyn AccountRepository>,
    bcrypt_cost: u32,
    /// Hash at `bcrypt_cost` checked when the account does not exist, so an
    /// unknown username costs the same bcrypt work as a wrong password.
    decoy_hash: Arc<str>,
}

impl CredentialStore {
    /// # Errors
    /// `CredentialError::HashingFailed` if `bcrypt_cost` is out of range.
    pub fn new(accounts: Arc<dyn AccountRepository>, bcrypt_cost: u32) -> Result<Self, AppError> {
        let decoy_hash = hash_password(DECOY_PASSWORD, bcrypt_cost)?;

        Ok(Self {
            accounts,
            bcrypt_cost,
            decoy_hash: decoy_hash.into(),
        })
    }

    /// Register `username` with a freshly salted hash of `password`.
    ///
    /// # Errors
    /// - `CredentialError::AlreadyExists` if the username is taken, including
    ///   when a concurrent registration wins the insert
    /// - `ValidationError::EmptyField` for an empty password
    /// - `CredentialError::HashingFailed` if bcrypt rejects the input
    /// - `StorageError` on lookup or insert failure
    pub async fn create(&self, username: &str, password: &str) -> Result<Account, AppError> {
        if self.accounts.find_by_username(username).await?.is_some() {
            return Err(CredentialError::AlreadyExists(username.to_string()).into());
        }

        let password_hash = hash_password(password, self.bcrypt_cost)?;

        self.accounts
            .insert_account(username, &password_hash)
            .await
            .map_err(|e| match e {
                StorageError::UniqueViolation(_) => {
                    AppError::from(CredentialError::AlreadyExists(username.to_string()))
                }
                other => AppError::from(other),
            })?;

        tracing::info!(username = %username, "Account created");

        Ok(Account {
            username: username.to_string(),
            password_hash,
        })
    }

    /// Check `password` against the stored hash for `username`.
    ///
    /// Returns `Ok(false)` on mismatch. Callers must report `NotFound` and
    /// `false` identically. A missing account still runs one bcrypt check
    /// against the decoy hash before returning.
    ///
    /// # Errors
    /// - `CredentialError::NotFound` if no such account exists
    /// - `StorageError` on lookup failure
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, AppError> {
        match self.accounts.find_by_username(username).await? {
            Some(account) => verify_password(password, &account.password_hash),
            None => {
                let _ = verify_password(password, &self.decoy_hash);
                Err(CredentialError::NotFound.into())
            }
        }
    }

    /// `verify` with `NotFound` and mismatch collapsed into
    /// `CredentialError::InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(), AppError> {
        match self.verify(username, password).await {
            Ok(true) => Ok(()),
            Ok(false) | Err(AppError::Credential(CredentialError::NotFound)) => {
                Err(CredentialError::InvalidCredentials.into())
            }
            Err(other) => Err(other),
        }
    }
}
