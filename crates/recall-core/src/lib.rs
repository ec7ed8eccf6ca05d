// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the recall conversation memory system.
//!
//! Provides the capability traits, error types, and conversation types
//! used throughout the workspace. Storage, embedding, and generation
//! backends implement traits defined here.

pub mod error;
pub mod similarity;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, RecallError};
pub use types::{
    AdapterType, ContextEntry, ContextSource, EmbeddingInput, EmbeddingOutput,
    GenerationRequest, HealthStatus, Message, NewRecord, RecordFilter, RecordMetadata, Role,
    ScoredRecord, StoreInfo, VectorRecord,
};

pub use traits::{EmbeddingAdapter, GenerationAdapter, PluginAdapter, VectorStore};
