// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter for tests.
//!
//! Text maps to a bag-of-words vector, so messages that share words are
//! similar. Specific texts can be pinned to exact vectors, and failures can
//! be scripted.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use recall_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter,
    RecallError,
};

/// A mock embedder producing fixed-dimension vectors without a model.
pub struct MockEmbedder {
    dimension: usize,
    pinned: Mutex<HashMap<String, Vec<f32>>>,
    failing_texts: Mutex<HashSet<String>>,
    fail_next: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            pinned: Mutex::new(HashMap::new()),
            failing_texts: Mutex::new(HashSet::new()),
            fail_next: AtomicUsize::new(0),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always embed `text` as `vector`.
    pub fn pin(&self, text: impl Into<String>, vector: Vec<f32>) {
        lock(&self.pinned).insert(text.into(), vector);
    }

    /// Fail every call that includes `text`.
    pub fn fail_on(&self, text: impl Into<String>) {
        lock(&self.failing_texts).insert(text.into());
    }

    /// Fail the next `n` calls.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Sleep this long before answering each call.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector this embedder produces for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(pinned) = lock(&self.pinned).get(text) {
            return pinned.clone();
        }
        let mut vector = vec![0.0; self.dimension];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            let bucket = fnv1a(word.as_bytes()) as usize % self.dimension.max(1);
            if let Some(slot) = vector.get_mut(bucket) {
                *slot += 1.0;
            }
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(8)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted {
            return Err(RecallError::embedding("scripted embedding failure"));
        }
        {
            let failing = lock(&self.failing_texts);
            if let Some(text) = input.texts.iter().find(|t| failing.contains(*t)) {
                return Err(RecallError::embedding(format!("cannot embed `{text}`")));
            }
        }

        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector_for(t)).collect(),
            dimensions: self.dimension,
        })
    }
}
