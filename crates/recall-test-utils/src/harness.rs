// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end session testing.
//!
//! `TestHarness` wires a [`SessionManager`] to mock embedding and
//! generation adapters and a choice of vector store. Provides
//! `send_message()` to drive a full turn in tests.

use std::sync::Arc;

use recall_agent::{CloseHandle, SessionManager, TurnResult};
use recall_config::{PersistenceMode, RecallConfig, RetrievalScope};
use recall_core::{EmbeddingAdapter, RecallError, VectorStore};
use recall_memory::{StoreBackend, verify_dimensions};
use recall_storage::SqliteVectorStore;

use crate::memory_store::InMemoryVectorStore;
use crate::mock_embedder::MockEmbedder;
use crate::mock_generator::MockGenerator;

/// Which vector store the harness session writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessStore {
    /// [`InMemoryVectorStore`], inspectable through [`TestHarness::memory_store`].
    InMemory,
    /// [`SqliteVectorStore`] in a temp directory removed on drop.
    Sqlite,
    /// Persistence disabled.
    Null,
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: RecallConfig,
    store: HarnessStore,
    responses: Vec<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = RecallConfig::default();
        config.embedding.dimensions = 8;
        config.storage.op_timeout_ms = 1_000;
        config.embedding.timeout_ms = 1_000;
        Self {
            config,
            store: HarnessStore::InMemory,
            responses: Vec::new(),
        }
    }

    /// Set the active memory limit.
    pub fn with_active_limit(mut self, limit: usize) -> Self {
        self.config.memory.active_limit = limit;
        self
    }

    /// Set how many recent messages go into context.
    pub fn with_context_messages(mut self, n: usize) -> Self {
        self.config.memory.context_messages = n;
        self
    }

    /// Set how many records retrieval returns.
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.config.memory.top_k = k;
        self
    }

    pub fn with_retrieval_scope(mut self, scope: RetrievalScope) -> Self {
        self.config.memory.retrieval_scope = scope;
        self
    }

    /// Set the embedding dimensionality used by the mock embedder and store.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.config.embedding.dimensions = dimension;
        self
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.agent.system_prompt = Some(prompt.into());
        self
    }

    /// Set mock generator responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Choose the vector store.
    pub fn with_store(mut self, store: HarnessStore) -> Self {
        self.store = store;
        self
    }

    /// Shorthand for `with_store(HarnessStore::Null)`.
    pub fn without_persistence(self) -> Self {
        self.with_store(HarnessStore::Null)
    }

    /// Build the harness. Probes the mock embedder the same way startup does.
    pub async fn build(mut self) -> Result<TestHarness, RecallError> {
        let dimension = self.config.embedding.dimensions;
        let embedder = Arc::new(MockEmbedder::new(dimension));
        let generator = Arc::new(if self.responses.is_empty() {
            MockGenerator::new()
        } else {
            MockGenerator::with_responses(self.responses)
        });

        let mut temp_dir = None;
        let mut memory_store = None;
        let mut sqlite_store = None;
        let backend = match self.store {
            HarnessStore::InMemory => {
                let store = Arc::new(InMemoryVectorStore::new(dimension));
                memory_store = Some(store.clone());
                StoreBackend::real(store)
            }
            HarnessStore::Sqlite => {
                let dir = tempfile::TempDir::new().map_err(RecallError::storage)?;
                self.config.storage.database_path =
                    dir.path().join("recall.db").to_string_lossy().to_string();
                let store =
                    Arc::new(SqliteVectorStore::from_config(&self.config.storage, dimension).await?);
                temp_dir = Some(dir);
                sqlite_store = Some(store.clone());
                StoreBackend::real(store)
            }
            HarnessStore::Null => {
                self.config.memory.persistence = PersistenceMode::Null;
                StoreBackend::null()
            }
        };

        verify_dimensions(embedder.as_ref(), &backend, dimension).await?;

        let session = SessionManager::from_config(
            &self.config,
            backend.clone(),
            embedder.clone() as Arc<dyn EmbeddingAdapter>,
            CloseHandle::new(),
        );

        Ok(TestHarness {
            session,
            embedder,
            generator,
            backend,
            memory_store,
            sqlite_store,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and a chosen store.
pub struct TestHarness {
    /// The session under test.
    pub session: SessionManager,
    /// The mock embedding adapter.
    pub embedder: Arc<MockEmbedder>,
    /// The mock generation adapter.
    pub generator: Arc<MockGenerator>,
    /// The backend shared by every session this harness creates.
    pub backend: StoreBackend,
    memory_store: Option<Arc<InMemoryVectorStore>>,
    sqlite_store: Option<Arc<SqliteVectorStore>>,
    /// Configuration the session was built from.
    pub config: RecallConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one full turn through the session and return its result.
    pub async fn send_message(&mut self, text: &str) -> Result<TurnResult, RecallError> {
        self.session.run_turn(self.generator.as_ref(), text).await
    }

    /// The in-memory store, when the harness was built with one.
    pub fn memory_store(&self) -> Option<&InMemoryVectorStore> {
        self.memory_store.as_deref()
    }

    /// The SQLite store, when the harness was built with one.
    pub fn sqlite_store(&self) -> Option<&SqliteVectorStore> {
        self.sqlite_store.as_deref()
    }

    /// The active store as a trait object.
    pub fn store(&self) -> &dyn VectorStore {
        self.backend.store()
    }

    /// A fresh session over the same store and adapters.
    pub fn new_session(&self) -> SessionManager {
        SessionManager::from_config(
            &self.config,
            self.backend.clone(),
            self.embedder.clone() as Arc<dyn EmbeddingAdapter>,
            CloseHandle::new(),
        )
    }

    /// Texts currently held by the store, newest first.
    pub async fn stored_texts(&self) -> Result<Vec<String>, RecallError> {
        let records = self.store().list(usize::MAX, None).await?;
        Ok(records.iter().map(|r| r.text().to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_harness_runs_a_turn() {
        let mut harness = TestHarness::builder()
            .with_mock_responses(vec!["hello back".into()])
            .build()
            .await
            .unwrap();
        let turn = harness.send_message("hello").await.unwrap();
        assert_eq!(turn.reply, "hello back");
        assert_eq!(harness.session.active_memory().len(), 2);
    }

    #[tokio::test]
    async fn null_harness_has_no_persistent_store() {
        let harness = TestHarness::builder().without_persistence().build().await.unwrap();
        assert!(!harness.backend.is_persistent());
        assert!(harness.memory_store().is_none());
        assert_eq!(harness.config.memory.persistence, PersistenceMode::Null);
    }
}
