// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, which
//! serializes writes. Do NOT open additional connections for writes.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use smsrelay_config::model::StorageConfig;
use smsrelay_core::SmsRelayError;
use tracing::{debug, info};

use crate::migrations::run_migrations;

/// Handle to the SQLite message database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    closed: AtomicBool,
}

impl Database {
    /// Open (creating if needed) the database at `config.database_path`,
    /// apply PRAGMAs and run pending migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, SmsRelayError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SmsRelayError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(map_tr_err)?;

        let wal_mode = config.wal_mode;
        let busy_timeout = Duration::from_millis(u64::from(config.busy_timeout_ms));
        let journal_mode = conn
            .call(move |conn| -> Result<String, rusqlite::Error> {
                conn.busy_timeout(busy_timeout)?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                register_unicode_lower(conn)?;
                let mode = if wal_mode { "WAL" } else { "DELETE" };
                conn.pragma_update_and_check(None, "journal_mode", mode, |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        debug!(path = %path, journal_mode = %journal_mode, "database opened");

        conn.call(|conn| -> Result<(), refinery::Error> { run_migrations(conn) })
            .await
            .map_err(map_tr_err)?;
        info!(path = %path, "database migrations applied");

        Ok(Self {
            conn,
            closed: AtomicBool::new(false),
        })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Truncate the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), SmsRelayError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL and close the connection.
    ///
    /// Later calls on this handle fail with a storage error. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), SmsRelayError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.checkpoint().await?;
        self.conn.clone().close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// `unicode_lower(text)`: full Unicode lowercase. SQLite's built-in `lower()`
/// only folds ASCII.
fn register_unicode_lower(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Map a tokio-rusqlite (or wrapped rusqlite/refinery) error to a storage error.
pub fn map_tr_err<E: std::fmt::Display>(err: E) -> SmsRelayError {
    SmsRelayError::Storage {
        source: err.to_string().into(),
    }
}
