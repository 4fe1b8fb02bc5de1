//! Account store for linkshelf.
//!
//! Accounts only carry a username and a salted password hash.

use rusqlite::params;
use std::sync::Arc;

use crate::database::Database;
use crate::services::crypto_service::{CryptoService, CryptoServiceTrait};
use crate::types::account::Account;
use crate::types::errors::AuthError;

/// Account persistence used by the CLI and the token manager.
pub trait AccountStore: Send + Sync {
    /// Creates an account, hashing `password` before it is stored.
    fn create_account(&self, username: &str, password: &str) -> Result<Account, AuthError>;
    /// Lists accounts. With `exact`, `keyword` must equal the username;
    /// otherwise it is a substring filter and an empty keyword lists all.
    fn get_accounts(&self, keyword: &str, exact: bool) -> Result<Vec<Account>, AuthError>;
    /// Removes accounts by username. Returns how many rows were deleted.
    fn delete_accounts(&self, usernames: &[String]) -> Result<usize, AuthError>;
}

pub struct AccountManager {
    db: Arc<Database>,
    crypto: Arc<dyn CryptoServiceTrait>,
}

impl AccountManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_crypto(db, Arc::new(CryptoService::new()))
    }

    /// Uses a caller-provided hasher, e.g. one with fewer iterations in tests.
    pub fn with_crypto(db: Arc<Database>, crypto: Arc<dyn CryptoServiceTrait>) -> Self {
        Self { db, crypto }
    }

    fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
        Ok(Account {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
        })
    }
}

impl AccountStore for AccountManager {
    fn create_account(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::DatabaseError(
                "username and password must not be empty".to_string(),
            ));
        }

        let hash = self
            .crypto
            .hash_password(password)
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO account (username, password) VALUES (?1, ?2)",
            params![username, hash],
        )
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(Account {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password: hash,
        })
    }

    fn get_accounts(&self, keyword: &str, exact: bool) -> Result<Vec<Account>, AuthError> {
        let conn = self.db.connection();
        let (sql, arg) = if exact {
            ("SELECT id, username, password FROM account WHERE username = ?1 ORDER BY username", keyword.to_string())
        } else {
            ("SELECT id, username, password FROM account WHERE username LIKE ?1 ORDER BY username", format!("%{}%", keyword))
        };

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        let accounts = stmt
            .query_map(params![arg], Self::row_to_account)
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        Ok(accounts)
    }

    fn delete_accounts(&self, usernames: &[String]) -> Result<usize, AuthError> {
        let conn = self.db.connection();
        let mut deleted = 0;
        for username in usernames {
            deleted += conn
                .execute("DELETE FROM account WHERE username = ?1", params![username])
                .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        }
        Ok(deleted)
    }
}
