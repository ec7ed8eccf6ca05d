// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector store selection: a real backend or the null store.

use std::sync::Arc;

use async_trait::async_trait;
use recall_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, HealthStatus, NewRecord, PluginAdapter,
    RecallError, RecordFilter, ScoredRecord, StoreInfo, VectorRecord, VectorStore,
};
use tracing::info;

/// A store that accepts every record and keeps none of them.
///
/// Used when persistence is disabled. From the caller's side it behaves
/// like a store that is always empty.
#[derive(Debug, Default, Clone)]
pub struct NullStore;

#[async_trait]
impl PluginAdapter for NullStore {
    fn name(&self) -> &str {
        "null"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorStore
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl VectorStore for NullStore {
    async fn store(&self, record: NewRecord) -> Result<String, RecallError> {
        Ok(record
            .id
            .unwrap_or_else(|| format!("null-{}", uuid::Uuid::new_v4())))
    }

    async fn query(
        &self,
        _embedding: &[f32],
        _top_k: usize,
        _filter: Option<&RecordFilter>,
    ) -> Result<Vec<ScoredRecord>, RecallError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _id: &str) -> Result<bool, RecallError> {
        Ok(false)
    }

    async fn get(&self, _id: &str) -> Result<Option<VectorRecord>, RecallError> {
        Ok(None)
    }

    async fn list(
        &self,
        _limit: usize,
        _filter: Option<&RecordFilter>,
    ) -> Result<Vec<VectorRecord>, RecallError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, RecallError> {
        Ok(0)
    }

    async fn info(&self) -> Result<StoreInfo, RecallError> {
        Ok(StoreInfo {
            backend: "null".to_string(),
            location: None,
            dimension: None,
            persistent: false,
        })
    }

    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// The vector store a session writes to, chosen once at startup.
#[derive(Clone)]
pub enum StoreBackend {
    /// A persistent store whose records become queryable.
    Real(Arc<dyn VectorStore>),
    /// Persistence disabled.
    Null(NullStore),
}

impl StoreBackend {
    pub fn real(store: Arc<dyn VectorStore>) -> Self {
        StoreBackend::Real(store)
    }

    pub fn null() -> Self {
        StoreBackend::Null(NullStore)
    }

    /// Whether stored records can ever be retrieved.
    pub fn is_persistent(&self) -> bool {
        matches!(self, StoreBackend::Real(_))
    }

    /// The store behind this backend.
    pub fn store(&self) -> &dyn VectorStore {
        match self {
            StoreBackend::Real(store) => store.as_ref(),
            StoreBackend::Null(null) => null,
        }
    }
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Real(store) => f.debug_tuple("Real").field(&store.name()).finish(),
            StoreBackend::Null(_) => f.write_str("Null"),
        }
    }
}

/// Probe the embedder once and check its dimensionality against the
/// configured value and the store's fixed dimension.
///
/// Any mismatch is a [`RecallError::Config`]. Returns the probed dimension.
pub async fn verify_dimensions(
    embedder: &dyn EmbeddingAdapter,
    backend: &StoreBackend,
    configured: usize,
) -> Result<usize, RecallError> {
    let output = embedder
        .embed(EmbeddingInput {
            texts: vec!["dimension probe".to_string()],
        })
        .await?;
    let probed = output
        .embeddings
        .first()
        .map(Vec::len)
        .ok_or_else(|| RecallError::embedding("embedder returned no vectors for probe"))?;

    if probed != configured {
        return Err(RecallError::Config(format!(
            "embedding model `{}` produces {probed}-dimensional vectors, \
             but embedding.dimensions is {configured}",
            embedder.name()
        )));
    }
    if let Some(fixed) = backend.store().dimension()
        && fixed != probed
    {
        return Err(RecallError::Config(format!(
            "vector store requires {fixed}-dimensional embeddings, \
             embedder produces {probed}"
        )));
    }

    info!(dimension = probed, embedder = embedder.name(), "embedding dimension verified");
    Ok(probed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::Message;

    #[tokio::test]
    async fn null_store_accepts_and_forgets() {
        let store = NullStore;
        let msg = Message::user("hello", "s");
        let a = store
            .store(NewRecord::from_message(&msg, vec![1.0]))
            .await
            .unwrap();
        let b = store
            .store(NewRecord::from_message(&msg, vec![1.0]))
            .await
            .unwrap();
        assert!(a.starts_with("null-"));
        assert_ne!(a, b);
        assert!(store.query(&[1.0], 5, None).await.unwrap().is_empty());
        assert!(store.get(&a).await.unwrap().is_none());
        assert!(!store.delete(&a).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(!store.info().await.unwrap().persistent);
    }

    #[test]
    fn backend_reports_persistence() {
        assert!(!StoreBackend::null().is_persistent());
        assert_eq!(StoreBackend::null().store().name(), "null");
        assert_eq!(format!("{:?}", StoreBackend::null()), "Null");
    }
}
