// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spillover of evicted messages from active memory into the vector store.
//!
//! After every append the coordinator evicts the oldest messages until the
//! buffer is back within `active_limit`, then embeds and stores each evicted
//! message in temporal order. A message that cannot be embedded or stored
//! is still removed from the buffer and reported as lost; losses never fail
//! the session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use recall_config::RecallConfig;
use recall_core::{
    EmbeddingAdapter, EmbeddingInput, ErrorKind, Message, NewRecord, RecallError, VectorStore,
};
use tracing::{debug, warn};

use crate::active::ActiveMemory;
use crate::backend::StoreBackend;

/// Limits and failure handling for spillover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpilloverPolicy {
    /// Maximum messages kept in active memory. Zero spills every append.
    pub active_limit: usize,
    /// Upper bound on one store call.
    pub op_timeout: Duration,
    /// Upper bound on one embedding call. Embedding is never retried.
    pub embed_timeout: Duration,
    /// Retry a failed store call once when the failure is transient.
    pub retry_once: bool,
}

impl SpilloverPolicy {
    pub fn from_config(config: &RecallConfig) -> Self {
        Self {
            active_limit: config.memory.active_limit,
            op_timeout: Duration::from_millis(config.storage.op_timeout_ms),
            embed_timeout: Duration::from_millis(config.embedding.timeout_ms),
            retry_once: config.storage.retry_once,
        }
    }
}

impl Default for SpilloverPolicy {
    fn default() -> Self {
        Self::from_config(&RecallConfig::default())
    }
}

/// Why a message did not reach durable storage.
#[derive(Debug, Clone, PartialEq)]
pub enum LossCause {
    /// Embedding or storage failed.
    Failed { kind: ErrorKind, detail: String },
    /// Persistence is disabled, so the evicted message was dropped.
    NotPersisted,
}

impl std::fmt::Display for LossCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LossCause::Failed { kind, detail } => write!(f, "{kind}: {detail}"),
            LossCause::NotPersisted => f.write_str("persistence disabled"),
        }
    }
}

/// A message that left active memory without being stored.
#[derive(Debug, Clone, PartialEq)]
pub struct LostMessage {
    pub message: Message,
    pub cause: LossCause,
}

/// A message that was stored, and the id the store gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub message_id: String,
    pub record_id: String,
}

/// Outcome of one spillover or flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpillReport {
    /// Messages now durable, in temporal order.
    pub stored: Vec<StoredMessage>,
    /// Messages removed from active memory without being stored.
    pub lost: Vec<LostMessage>,
    /// Messages dropped on purpose by a close flush with persistence disabled.
    pub discarded: Vec<Message>,
}

impl SpillReport {
    pub fn is_empty(&self) -> bool {
        self.stored.is_empty() && self.lost.is_empty() && self.discarded.is_empty()
    }

    /// Fold another report into this one, keeping order.
    pub fn merge(&mut self, other: SpillReport) {
        self.stored.extend(other.stored);
        self.lost.extend(other.lost);
        self.discarded.extend(other.discarded);
    }
}

/// Whether messages reach the store by eviction or by a close flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpillKind {
    Eviction,
    Flush,
}

/// Moves messages out of active memory into the vector store.
#[derive(Clone)]
pub struct SpilloverCoordinator {
    backend: StoreBackend,
    embedder: Arc<dyn EmbeddingAdapter>,
    policy: SpilloverPolicy,
}

impl SpilloverCoordinator {
    pub fn new(
        backend: StoreBackend,
        embedder: Arc<dyn EmbeddingAdapter>,
        policy: SpilloverPolicy,
    ) -> Self {
        Self {
            backend,
            embedder,
            policy,
        }
    }

    pub fn policy(&self) -> &SpilloverPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &StoreBackend {
        &self.backend
    }

    /// Enforce the size bound after an append.
    ///
    /// The buffer is back within `active_limit` before the first await, so
    /// the bound holds even while evicted messages are being stored.
    pub async fn after_append(&self, buffer: &mut ActiveMemory) -> SpillReport {
        let evicted = buffer.evict_over(self.policy.active_limit);
        if evicted.is_empty() {
            return SpillReport::default();
        }
        debug!(count = evicted.len(), "spilling evicted messages");
        self.spill(evicted, SpillKind::Eviction).await
    }

    /// Store every message regardless of `active_limit`.
    ///
    /// With persistence disabled the messages are reported as discarded
    /// rather than lost.
    pub async fn flush(&self, messages: Vec<Message>) -> SpillReport {
        self.spill(messages, SpillKind::Flush).await
    }

    async fn spill(&self, messages: Vec<Message>, kind: SpillKind) -> SpillReport {
        let mut report = SpillReport::default();
        for message in messages {
            match &self.backend {
                StoreBackend::Null(_) => {
                    match kind {
                        SpillKind::Eviction => {
                            report_loss(&mut report, message, LossCause::NotPersisted)
                        }
                        SpillKind::Flush => report.discarded.push(message),
                    }
                }
                StoreBackend::Real(_) => match self.persist(&message).await {
                    Ok(record_id) => {
                        debug!(
                            session_id = %message.session_id(),
                            message_id = %message.id(),
                            record_id = %record_id,
                            "message stored"
                        );
                        report.stored.push(StoredMessage {
                            message_id: message.id().to_string(),
                            record_id,
                        });
                    }
                    Err(e) => {
                        let cause = LossCause::Failed {
                            kind: e.kind(),
                            detail: e.to_string(),
                        };
                        report_loss(&mut report, message, cause);
                    }
                },
            }
        }
        report
    }

    /// Embed and store one message.
    ///
    /// The record id is fixed before the first attempt. A write that timed
    /// out may still commit, so the retry and the final lookup address the
    /// same record and can never create a second one.
    async fn persist(&self, message: &Message) -> Result<String, RecallError> {
        let embedding = self.embed(message.content()).await?;
        let record_id = uuid::Uuid::new_v4().to_string();
        let mut record = NewRecord::from_message(message, embedding);
        record.id = Some(record_id.clone());
        let store = self.backend.store();

        let result = match bounded(self.policy.op_timeout, store.store(record.clone())).await {
            Err(e) if self.policy.retry_once && e.is_retryable() => {
                warn!(
                    message_id = %message.id(),
                    record_id = %record_id,
                    error = %e,
                    "store failed, retrying once"
                );
                match bounded(self.policy.op_timeout, store.store(record)).await {
                    // The timed-out first attempt committed after all.
                    Err(RecallError::DuplicateRecord { .. }) => Ok(record_id.clone()),
                    other => other,
                }
            }
            other => other,
        };

        match result {
            Err(e) if e.kind() == ErrorKind::Timeout => self.confirm_written(&record_id, e).await,
            other => other,
        }
    }

    /// After a timeout, check whether the write landed anyway.
    async fn confirm_written(
        &self,
        record_id: &str,
        timeout: RecallError,
    ) -> Result<String, RecallError> {
        let store = self.backend.store();
        match bounded(self.policy.op_timeout, store.get(record_id)).await {
            Ok(Some(_)) => {
                debug!(record_id = %record_id, "timed-out write committed");
                Ok(record_id.to_string())
            }
            Ok(None) => Err(timeout),
            Err(e) => {
                debug!(record_id = %record_id, error = %e, "could not confirm timed-out write");
                Err(timeout)
            }
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RecallError> {
        let input = EmbeddingInput {
            texts: vec![text.to_string()],
        };
        let output = tokio::time::timeout(self.policy.embed_timeout, self.embedder.embed(input))
            .await
            .map_err(|_| {
                RecallError::embedding(format!(
                    "embedding timed out after {:?}",
                    self.policy.embed_timeout
                ))
            })??;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RecallError::embedding("embedder returned no vector"))
    }
}

/// Run a store operation with an upper time bound.
pub async fn bounded<T>(
    limit: Duration,
    op: impl Future<Output = Result<T, RecallError>>,
) -> Result<T, RecallError> {
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| RecallError::Timeout { duration: limit })?
}

fn report_loss(report: &mut SpillReport, message: Message, cause: LossCause) {
    let (error_kind, error) = match &cause {
        LossCause::Failed { kind, detail } => (kind.to_string(), detail.clone()),
        LossCause::NotPersisted => ("not_persisted".to_string(), cause.to_string()),
    };
    warn!(
        session_id = %message.session_id(),
        message_id = %message.id(),
        role = %message.role(),
        error_kind = %error_kind,
        error = %error,
        "message left active memory without being stored"
    );
    report.lost.push(LostMessage { message, cause });
}

impl std::fmt::Debug for SpilloverCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpilloverCoordinator")
            .field("backend", &self.backend)
            .field("embedder", &self.embedder.name())
            .field("policy", &self.policy)
            .finish()
    }
}
