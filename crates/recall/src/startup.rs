// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by the CLI commands: opening the configured store.

use std::sync::Arc;

use recall_config::{PersistenceMode, RecallConfig};
use recall_core::RecallError;
use recall_memory::StoreBackend;
use recall_storage::SqliteVectorStore;
use tracing::info;

/// Open the store selected by `memory.persistence`.
pub async fn open_backend(config: &RecallConfig) -> Result<StoreBackend, RecallError> {
    match config.memory.persistence {
        PersistenceMode::Real => Ok(StoreBackend::real(Arc::new(
            open_sqlite(config).await?,
        ))),
        PersistenceMode::Null => {
            info!("persistence disabled, messages leaving active memory are not stored");
            Ok(StoreBackend::null())
        }
    }
}

/// Open the SQLite store directly, regardless of the persistence mode.
pub async fn open_sqlite(config: &RecallConfig) -> Result<SqliteVectorStore, RecallError> {
    let store =
        SqliteVectorStore::from_config(&config.storage, config.embedding.dimensions).await?;
    info!(path = %config.storage.database_path, "vector store opened");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use recall_core::VectorStore;

    use super::*;

    #[tokio::test]
    async fn null_mode_needs_no_database() {
        let mut config = RecallConfig::default();
        config.memory.persistence = PersistenceMode::Null;
        config.storage.database_path = String::new();
        let backend = open_backend(&config).await.unwrap();
        assert!(!backend.is_persistent());
    }

    #[tokio::test]
    async fn real_mode_opens_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RecallConfig::default();
        config.storage.database_path = dir.path().join("r.db").to_string_lossy().to_string();
        let backend = open_backend(&config).await.unwrap();
        assert!(backend.is_persistent());
        assert_eq!(backend.store().dimension(), Some(384));
    }
}
