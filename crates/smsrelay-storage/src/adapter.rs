// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`MessageStore`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use smsrelay_config::model::StorageConfig;
use smsrelay_core::{
    AdapterType, HealthStatus, Message, MessageDraft, MessageFilter, MessageId, MessageStatus,
    MessageStore, PluginAdapter, SmsRelayError, SortOrder,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed message store.
///
/// The database is opened lazily by [`MessageStore::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteMessageStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteMessageStore {
    /// Create a store for the configured path without opening it.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, SmsRelayError> {
        self.db.get().ok_or_else(|| SmsRelayError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteMessageStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SmsRelayError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmsRelayError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpointed and database closed");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn initialize(&self) -> Result<(), SmsRelayError> {
        let db = Database::open(&self.config).await?;
        self.db.set(db).map_err(|_| SmsRelayError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite message store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), SmsRelayError> {
        self.db()?.close().await?;
        debug!("SQLite message store closed");
        Ok(())
    }

    async fn insert(&self, draft: MessageDraft) -> Result<Message, SmsRelayError> {
        queries::messages::insert_message(self.db()?, draft).await
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, SmsRelayError> {
        queries::messages::get_message(self.db()?, id).await
    }

    async fn update_status(
        &self,
        id: &MessageId,
        status: MessageStatus,
    ) -> Result<Option<Message>, SmsRelayError> {
        queries::messages::update_status(self.db()?, id, status).await
    }

    async fn find_many(
        &self,
        filter: &MessageFilter,
        sort: SortOrder,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<Message>, SmsRelayError> {
        queries::messages::find_messages(self.db()?, filter, sort, skip, limit).await
    }

    async fn count(&self, filter: &MessageFilter) -> Result<u64, SmsRelayError> {
        queries::messages::count_messages(self.db()?, filter).await
    }
}
