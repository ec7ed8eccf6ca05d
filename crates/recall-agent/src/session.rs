// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session FSM that owns active memory and guarantees a final flush.
//!
//! States: Init -> Active -> Closing -> Terminated. Turns run only while
//! Active. Closing drains active memory into the store exactly once, after
//! which the session is Terminated and refuses further turns.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use recall_config::RecallConfig;
use recall_core::{EmbeddingAdapter, GenerationAdapter, Message, RecallError};
use recall_memory::{
    ActiveMemory, LostMessage, SpillReport, SpilloverCoordinator, SpilloverPolicy, StoreBackend,
};
use tracing::{debug, info, warn};

use crate::context::{AssembledContext, ContextAssembler, ContextSettings};
use crate::shutdown::CloseHandle;

/// States in the session FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no message processed yet.
    Init,
    /// Processing turns.
    Active,
    /// Close requested; flushing active memory.
    Closing,
    /// Flush complete; no further turns.
    Terminated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Init => write!(f, "init"),
            SessionState::Active => write!(f, "active"),
            SessionState::Closing => write!(f, "closing"),
            SessionState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Memory usage counters for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    pub session_id: String,
    pub state: SessionState,
    /// Messages currently in active memory.
    pub active_messages: usize,
    pub active_limit: usize,
    /// Messages this session has written to the store.
    pub stored: usize,
    /// Messages that left active memory without being stored.
    pub lost: usize,
    /// Messages dropped on purpose by the close flush.
    pub discarded: usize,
    /// Whether the store keeps what it is given.
    pub persistent: bool,
}

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub reply: String,
    pub context: AssembledContext,
    /// Spillover caused by appending the user message and the reply.
    pub spill: SpillReport,
}

/// What happened to the session's messages when it closed.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseSummary {
    pub session_id: String,
    pub closed_at: DateTime<Utc>,
    /// Messages stored by the close flush.
    pub flushed: usize,
    /// Messages the close flush dropped because persistence is disabled.
    pub discarded: usize,
    /// Of `lost`, how many were lost during the close flush.
    pub flush_lost: usize,
    /// Every message lost over the session's lifetime.
    pub lost: Vec<LostMessage>,
}

impl CloseSummary {
    /// Number of messages lost over the whole session.
    pub fn lost_count(&self) -> usize {
        self.lost.len()
    }
}

/// Owns one conversation: its active memory, spillover, and lifecycle.
pub struct SessionManager {
    id: String,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    state: SessionState,
    buffer: ActiveMemory,
    coordinator: SpilloverCoordinator,
    assembler: ContextAssembler,
    close: CloseHandle,
    stored: usize,
    discarded: usize,
    lost: Vec<LostMessage>,
    summary: Option<CloseSummary>,
}

impl SessionManager {
    /// Create a session in the Init state.
    pub fn new(
        coordinator: SpilloverCoordinator,
        assembler: ContextAssembler,
        close: CloseHandle,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        debug!(session_id = %id, "session created");
        Self {
            id,
            created_at: Utc::now(),
            closed_at: None,
            state: SessionState::Init,
            buffer: ActiveMemory::new(),
            coordinator,
            assembler,
            close,
            stored: 0,
            discarded: 0,
            lost: Vec::new(),
            summary: None,
        }
    }

    /// Wire a session from configuration and the chosen capabilities.
    pub fn from_config(
        config: &RecallConfig,
        backend: StoreBackend,
        embedder: Arc<dyn EmbeddingAdapter>,
        close: CloseHandle,
    ) -> Self {
        let coordinator = SpilloverCoordinator::new(
            backend.clone(),
            embedder.clone(),
            SpilloverPolicy::from_config(config),
        );
        let assembler =
            ContextAssembler::new(backend, embedder, ContextSettings::from_config(config));
        Self::new(coordinator, assembler, close)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn active_memory(&self) -> &ActiveMemory {
        &self.buffer
    }

    /// A handle that can request this session's close from anywhere.
    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    /// Ask the session to close. Idempotent; the flush itself runs in
    /// [`close`](Self::close).
    pub fn request_close(&self) {
        self.close.request_close();
    }

    /// Append a user message outside of a full turn.
    pub async fn record_user_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<SpillReport, RecallError> {
        self.ensure_accepting()?;
        let message = Message::user(content, self.id.as_str());
        Ok(self.append_and_spill(message).await)
    }

    /// Append an assistant message outside of a full turn.
    pub async fn record_assistant_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<SpillReport, RecallError> {
        self.ensure_accepting()?;
        let message = Message::assistant(content, self.id.as_str());
        Ok(self.append_and_spill(message).await)
    }

    /// Build the model context for `query` from the current state.
    pub async fn assemble_context(&self, query: &str) -> AssembledContext {
        self.assembler.assemble(&self.buffer, &self.id, query).await
    }

    /// Process one user turn: append, assemble context, generate, append
    /// the reply.
    ///
    /// A close request is honoured between steps and cancels an in-flight
    /// generation, returning [`RecallError::Interrupted`]. Messages appended
    /// before the interruption stay in active memory for the close flush.
    pub async fn run_turn(
        &mut self,
        generator: &dyn GenerationAdapter,
        input: &str,
    ) -> Result<TurnResult, RecallError> {
        self.ensure_accepting()?;

        let mut spill = self
            .append_and_spill(Message::user(input, self.id.as_str()))
            .await;

        if self.close.is_close_requested() {
            return Err(RecallError::Interrupted);
        }

        let context = tokio::select! {
            biased;
            _ = self.close.closed() => return Err(RecallError::Interrupted),
            context = self.assembler.assemble(&self.buffer, &self.id, input) => context,
        };

        let request = context.to_request(self.assembler.settings().system_prompt.clone());
        let reply = tokio::select! {
            biased;
            _ = self.close.closed() => {
                info!(session_id = %self.id, "generation cancelled by close request");
                return Err(RecallError::Interrupted);
            }
            result = generator.generate(request) => result?,
        };

        let assistant = Message::assistant(reply.clone(), self.id.as_str());
        spill.merge(self.append_and_spill(assistant).await);

        Ok(TurnResult {
            reply,
            context,
            spill,
        })
    }

    /// Close the session: drain active memory, flush everything to the
    /// store, and terminate.
    ///
    /// The flush runs exactly once. Later calls return the same summary.
    pub async fn close(&mut self) -> CloseSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        self.close.request_close();
        self.state = SessionState::Closing;
        let remaining = self.buffer.drain();
        info!(
            session_id = %self.id,
            remaining = remaining.len(),
            "closing session, flushing active memory"
        );

        let report = self.coordinator.flush(remaining).await;
        let flushed = report.stored.len();
        let discarded = report.discarded.len();
        let flush_lost = report.lost.len();
        self.absorb(&report);

        let closed_at = Utc::now();
        self.closed_at = Some(closed_at);
        self.state = SessionState::Terminated;

        let summary = CloseSummary {
            session_id: self.id.clone(),
            closed_at,
            flushed,
            discarded,
            flush_lost,
            lost: self.lost.clone(),
        };
        if summary.lost_count() > 0 {
            warn!(
                session_id = %self.id,
                lost = summary.lost_count(),
                flush_lost,
                "session closed with lost messages"
            );
        }
        info!(session_id = %self.id, flushed, discarded, "session terminated");
        self.summary = Some(summary.clone());
        summary
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            session_id: self.id.clone(),
            state: self.state,
            active_messages: self.buffer.len(),
            active_limit: self.coordinator.policy().active_limit,
            stored: self.stored,
            lost: self.lost.len(),
            discarded: self.discarded,
            persistent: self.coordinator.backend().is_persistent(),
        }
    }

    fn ensure_accepting(&mut self) -> Result<(), RecallError> {
        match self.state {
            SessionState::Closing | SessionState::Terminated => Err(RecallError::SessionClosed),
            _ if self.close.is_close_requested() => Err(RecallError::SessionClosed),
            SessionState::Init => {
                self.state = SessionState::Active;
                info!(session_id = %self.id, "session active");
                Ok(())
            }
            SessionState::Active => Ok(()),
        }
    }

    async fn append_and_spill(&mut self, message: Message) -> SpillReport {
        self.buffer.append(message);
        let report = self.coordinator.after_append(&mut self.buffer).await;
        self.absorb(&report);
        report
    }

    fn absorb(&mut self, report: &SpillReport) {
        self.stored += report.stored.len();
        self.discarded += report.discarded.len();
        self.lost.extend(report.lost.iter().cloned());
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if self.state != SessionState::Terminated && !self.buffer.is_empty() {
            warn!(
                session_id = %self.id,
                unflushed = self.buffer.len(),
                "session dropped without close, buffered messages were not flushed"
            );
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("active_messages", &self.buffer.len())
            .finish_non_exhaustive()
    }
}
