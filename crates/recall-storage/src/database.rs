// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.

use std::path::Path;

use recall_core::RecallError;
use tracing::debug;

/// Convert a tokio-rusqlite error into a storage connectivity failure.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RecallError {
    RecallError::storage(e)
}

/// An open, migrated SQLite database.
#[derive(Clone, Debug)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    location: String,
}

impl Database {
    /// Open (creating if needed) the database at `path` and apply migrations.
    ///
    /// Parent directories are created. With `wal_mode` the journal is
    /// switched to WAL.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, RecallError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(RecallError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(RecallError::storage)?;
        let db = Self {
            conn,
            location: path.to_string(),
        };
        db.initialize(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with migrations applied.
    pub async fn open_in_memory() -> Result<Self, RecallError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(RecallError::storage)?;
        let db = Self {
            conn,
            location: ":memory:".to_string(),
        };
        db.initialize(false).await?;
        Ok(db)
    }

    async fn initialize(&self, wal_mode: bool) -> Result<(), RecallError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    let mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    debug!(journal_mode = %mode, "journal mode set");
                }
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        // The outer result is the connection, the inner one the migration run.
        self.conn
            .call(|conn| -> Result<Result<(), RecallError>, rusqlite::Error> {
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Path of the database file, or `:memory:`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Flush the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), RecallError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(path = %self.location, "WAL checkpoint complete");
        Ok(())
    }
}
