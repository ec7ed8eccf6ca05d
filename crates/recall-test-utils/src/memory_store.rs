// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vector store with failure injection and a write log.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use recall_core::similarity::{Candidate, rank_candidates};
use recall_core::{
    AdapterType, HealthStatus, NewRecord, PluginAdapter, RecallError, RecordFilter, ScoredRecord,
    StoreInfo, VectorRecord, VectorStore,
};

#[derive(Default)]
struct Inner {
    records: Vec<Candidate>,
    next_seq: i64,
    /// Texts in the order they were stored.
    write_log: Vec<String>,
}

/// A reference [`VectorStore`] kept in process memory.
pub struct InMemoryVectorStore {
    dimension: Option<usize>,
    inner: Mutex<Inner>,
    fail_next_stores: AtomicUsize,
    unavailable: AtomicBool,
    store_delay: Mutex<Option<Duration>>,
    store_attempts: AtomicUsize,
}

impl InMemoryVectorStore {
    /// A store enforcing `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self::build(Some(dimension))
    }

    /// A store accepting any dimensionality.
    pub fn unchecked() -> Self {
        Self::build(None)
    }

    fn build(dimension: Option<usize>) -> Self {
        Self {
            dimension,
            inner: Mutex::new(Inner::default()),
            fail_next_stores: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            store_delay: Mutex::new(None),
            store_attempts: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` store calls with a connectivity error.
    pub fn fail_next_stores(&self, n: usize) {
        self.fail_next_stores.store(n, Ordering::SeqCst);
    }

    /// Make every operation fail with a connectivity error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Sleep this long inside each store call.
    pub fn set_store_delay(&self, delay: Duration) {
        *lock(&self.store_delay) = Some(delay);
    }

    /// Number of `store` calls, including failed ones.
    pub fn store_attempts(&self) -> usize {
        self.store_attempts.load(Ordering::SeqCst)
    }

    /// Texts successfully stored, in write order.
    pub fn written_texts(&self) -> Vec<String> {
        lock(&self.inner).write_log.clone()
    }

    /// Look up a record without going through the async trait or failure injection.
    pub fn get_record(&self, id: &str) -> Option<VectorRecord> {
        lock(&self.inner)
            .records
            .iter()
            .find(|c| c.record.id() == id)
            .map(|c| c.record.clone())
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        lock(&self.inner).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), RecallError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RecallError::storage("in-memory store marked unavailable"));
        }
        Ok(())
    }

    fn check_dimension(&self, len: usize) -> Result<(), RecallError> {
        match self.dimension {
            Some(d) if d != len => Err(RecallError::Config(format!(
                "embedding has {len} dimensions, store requires {d}"
            ))),
            _ => Ok(()),
        }
    }

    fn candidates(&self, filter: Option<&RecordFilter>) -> Vec<Candidate> {
        let inner = lock(&self.inner);
        let mut out: Vec<Candidate> = inner
            .records
            .iter()
            .filter(|c| filter.is_none_or(|f| f.matches(&c.record)))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.record
                .created_at()
                .cmp(&a.record.created_at())
                .then_with(|| b.seq.cmp(&a.seq))
        });
        out
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PluginAdapter for InMemoryVectorStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorStore
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("marked unavailable".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn store(&self, record: NewRecord) -> Result<String, RecallError> {
        self.store_attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *lock(&self.store_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_available()?;
        let scripted = self
            .fail_next_stores
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted {
            return Err(RecallError::storage("scripted store failure"));
        }
        self.check_dimension(record.embedding.len())?;

        let id = record
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut inner = lock(&self.inner);
        if inner.records.iter().any(|c| c.record.id() == id) {
            return Err(RecallError::DuplicateRecord { id });
        }
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.write_log.push(record.text.clone());
        inner.records.push(Candidate {
            record: VectorRecord::from_parts(
                id.clone(),
                record.embedding,
                record.text,
                record.metadata,
                Utc::now(),
            ),
            seq,
        });
        Ok(id)
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<ScoredRecord>, RecallError> {
        self.check_available()?;
        self.check_dimension(embedding.len())?;
        Ok(rank_candidates(self.candidates(filter), embedding, top_k))
    }

    async fn delete(&self, id: &str) -> Result<bool, RecallError> {
        self.check_available()?;
        let mut inner = lock(&self.inner);
        let before = inner.records.len();
        inner.records.retain(|c| c.record.id() != id);
        Ok(inner.records.len() < before)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, RecallError> {
        self.check_available()?;
        Ok(lock(&self.inner)
            .records
            .iter()
            .find(|c| c.record.id() == id)
            .map(|c| c.record.clone()))
    }

    async fn list(
        &self,
        limit: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<VectorRecord>, RecallError> {
        self.check_available()?;
        Ok(self
            .candidates(filter)
            .into_iter()
            .take(limit)
            .map(|c| c.record)
            .collect())
    }

    async fn count(&self) -> Result<usize, RecallError> {
        self.check_available()?;
        Ok(self.len())
    }

    async fn info(&self) -> Result<StoreInfo, RecallError> {
        Ok(StoreInfo {
            backend: "in-memory".to_string(),
            location: None,
            dimension: self.dimension,
            persistent: true,
        })
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}
