// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector store trait: durable records ranked by similarity.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NewRecord, RecordFilter, ScoredRecord, StoreInfo, VectorRecord};

/// Persistence backend for embedded conversation records.
///
/// Records are immutable once stored. Implementations reject an id that
/// already exists with [`RecallError::DuplicateRecord`] and an embedding
/// of the wrong dimensionality with [`RecallError::Config`].
#[async_trait]
pub trait VectorStore: PluginAdapter {
    /// Persist a record and return its id.
    async fn store(&self, record: NewRecord) -> Result<String, RecallError>;

    /// Return at most `top_k` records ranked by cosine similarity to
    /// `embedding`. Ties break toward the most recently created record.
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<ScoredRecord>, RecallError>;

    /// Remove a record. Returns `false` when no record had this id.
    async fn delete(&self, id: &str) -> Result<bool, RecallError>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, RecallError>;

    /// List records newest first.
    async fn list(
        &self,
        limit: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<VectorRecord>, RecallError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, RecallError>;

    /// Describe the backend.
    async fn info(&self) -> Result<StoreInfo, RecallError>;

    /// The fixed embedding dimensionality, if one is enforced.
    fn dimension(&self) -> Option<usize>;
}
