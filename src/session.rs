use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use thiserror::Error;

use crate::models::Session;

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the signed-in user's id
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create session directory: {0}")]
    DirectoryError(String),
}

/// Durable key/value storage for the client session.
///
/// Survives restarts; holds only the `token` and `user_id` keys.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) the session store at `path` and initialize the schema
    pub fn open(path: &Path) -> Result<Self, SessionError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SessionError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        let store = SessionStore { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open a throwaway store that lives only as long as the process
    pub fn open_in_memory() -> Result<Self, SessionError> {
        let conn = Connection::open_in_memory()?;
        let store = SessionStore { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), SessionError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS session (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let value = self
            .conn
            .query_row("SELECT value FROM session WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.conn.execute(
            "INSERT INTO session (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.conn.execute("DELETE FROM session WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Stored token, if any
    pub fn token(&self) -> Result<Option<String>, SessionError> {
        self.get(TOKEN_KEY)
    }

    /// Load the stored session. Both keys must be present.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        match (self.get(TOKEN_KEY)?, self.get(USER_ID_KEY)?) {
            (Some(token), Some(user_id)) if !token.is_empty() && !user_id.is_empty() => {
                Ok(Some(Session { token, user_id }))
            }
            _ => Ok(None),
        }
    }

    /// Persist both keys in one transaction
    pub fn save(&mut self, session: &Session) -> Result<(), SessionError> {
        let tx = self.conn.transaction()?;
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        for (key, value) in [(TOKEN_KEY, &session.token), (USER_ID_KEY, &session.user_id)] {
            tx.execute(
                "INSERT INTO session (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove both keys
    pub fn clear(&self) -> Result<(), SessionError> {
        self.conn.execute(
            "DELETE FROM session WHERE key IN (?1, ?2)",
            params![TOKEN_KEY, USER_ID_KEY],
        )?;
        Ok(())
    }
}
