// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context assembly: recent active-memory messages plus retrieved records.
//!
//! The assembler is read-only. Retrieval failures degrade the context to
//! recent messages only and are logged; they never fail a turn.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use recall_config::{RecallConfig, RetrievalScope};
use recall_core::{
    ContextEntry, ContextSource, EmbeddingAdapter, EmbeddingInput, GenerationRequest,
    RecallError, RecordFilter, ScoredRecord,
};
use recall_memory::{ActiveMemory, StoreBackend, bounded};
use tracing::{debug, warn};

/// Settings for one assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSettings {
    /// Recent active-memory messages included, oldest to newest.
    pub context_messages: usize,
    /// Retrieved records included after the recent messages.
    pub top_k: usize,
    pub scope: RetrievalScope,
    pub system_prompt: Option<String>,
    pub embed_timeout: Duration,
    pub op_timeout: Duration,
}

impl ContextSettings {
    pub fn from_config(config: &RecallConfig) -> Self {
        Self {
            context_messages: config.memory.context_messages,
            top_k: config.memory.top_k,
            scope: config.memory.retrieval_scope,
            system_prompt: config.agent.system_prompt.clone(),
            embed_timeout: Duration::from_millis(config.embedding.timeout_ms),
            op_timeout: Duration::from_millis(config.storage.op_timeout_ms),
        }
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self::from_config(&RecallConfig::default())
    }
}

/// The context handed to the language model for one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    /// Recent messages, oldest to newest.
    pub recent: Vec<ContextEntry>,
    /// Retrieved records, best match first.
    pub retrieved: Vec<ContextEntry>,
    /// Set when retrieval failed and the context holds recent messages only.
    pub degraded: Option<String>,
}

impl AssembledContext {
    /// All entries in order: recent messages, then retrieved records.
    pub fn entries(&self) -> impl Iterator<Item = &ContextEntry> {
        self.recent.iter().chain(self.retrieved.iter())
    }

    pub fn len(&self) -> usize {
        self.recent.len() + self.retrieved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the request for the generation capability.
    pub fn to_request(&self, system_prompt: Option<String>) -> GenerationRequest {
        GenerationRequest {
            system_prompt,
            entries: self.entries().cloned().collect(),
        }
    }
}

/// Builds model context from active memory and the vector store.
#[derive(Clone)]
pub struct ContextAssembler {
    backend: StoreBackend,
    embedder: Arc<dyn EmbeddingAdapter>,
    settings: ContextSettings,
}

impl ContextAssembler {
    pub fn new(
        backend: StoreBackend,
        embedder: Arc<dyn EmbeddingAdapter>,
        settings: ContextSettings,
    ) -> Self {
        Self {
            backend,
            embedder,
            settings,
        }
    }

    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    /// Assemble context for `query`, the current user message.
    ///
    /// Retrieved records whose text already appears in the recent window
    /// are skipped, so up to `top_k + window` candidates are requested.
    pub async fn assemble(
        &self,
        buffer: &ActiveMemory,
        session_id: &str,
        query: &str,
    ) -> AssembledContext {
        let recent: Vec<ContextEntry> = buffer
            .peek_recent(self.settings.context_messages)
            .into_iter()
            .map(|m| ContextEntry {
                role: m.role(),
                content: m.content().to_string(),
                source: ContextSource::Recent {
                    message_id: m.id().to_string(),
                },
            })
            .collect();

        let mut context = AssembledContext {
            recent,
            ..Default::default()
        };

        // Nothing to retrieve from a null store, so skip the embedding call.
        if self.settings.top_k == 0 || !self.backend.is_persistent() {
            return context;
        }

        match self.retrieve(session_id, query, context.recent.len()).await {
            Ok(records) => {
                let window: HashSet<&str> =
                    context.recent.iter().map(|e| e.content.as_str()).collect();
                let retrieved: Vec<ContextEntry> = records
                    .into_iter()
                    .filter(|s| !window.contains(s.record.text()))
                    .take(self.settings.top_k)
                    .map(|s| ContextEntry {
                        role: s.record.metadata().role,
                        content: s.record.text().to_string(),
                        source: ContextSource::Retrieved {
                            record_id: s.record.id().to_string(),
                            score: s.score,
                        },
                    })
                    .collect();
                debug!(
                    session_id,
                    recent = context.recent.len(),
                    retrieved = retrieved.len(),
                    "context assembled"
                );
                context.retrieved = retrieved;
            }
            Err(e) => {
                warn!(
                    session_id,
                    error_kind = %e.kind(),
                    error = %e,
                    "retrieval failed, using recent messages only"
                );
                context.degraded = Some(e.to_string());
            }
        }
        context
    }

    async fn retrieve(
        &self,
        session_id: &str,
        query: &str,
        window: usize,
    ) -> Result<Vec<ScoredRecord>, RecallError> {
        let input = EmbeddingInput {
            texts: vec![query.to_string()],
        };
        let output = tokio::time::timeout(self.settings.embed_timeout, self.embedder.embed(input))
            .await
            .map_err(|_| RecallError::embedding("query embedding timed out"))??;
        let embedding = output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RecallError::embedding("embedder returned no vector"))?;

        let filter = match self.settings.scope {
            RetrievalScope::All => None,
            RetrievalScope::Session => Some(RecordFilter::session(session_id)),
        };
        let candidates = self.settings.top_k.saturating_add(window);
        bounded(
            self.settings.op_timeout,
            self.backend
                .store()
                .query(&embedding, candidates, filter.as_ref()),
        )
        .await
    }
}

impl std::fmt::Debug for ContextAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAssembler")
            .field("backend", &self.backend)
            .field("embedder", &self.embedder.name())
            .field("settings", &self.settings)
            .finish()
    }
}
