// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed vector store with embeddings stored as BLOBs.
//!
//! Similarity ranking runs in Rust over the candidate rows; the store holds
//! at most a few thousand conversation records per user.

use async_trait::async_trait;
use chrono::Utc;
use recall_config::model::StorageConfig;
use recall_core::similarity::{Candidate, blob_to_vec, rank_candidates, vec_to_blob};
use recall_core::types::{format_timestamp, parse_timestamp};
use recall_core::{
    AdapterType, HealthStatus, NewRecord, PluginAdapter, RecallError, RecordFilter,
    RecordMetadata, Role, ScoredRecord, StoreInfo, VectorRecord, VectorStore,
};
use rusqlite::OptionalExtension;
use tracing::{debug, info};

use crate::database::{Database, map_tr_err};

const DIMENSION_KEY: &str = "embedding_dimension";

const SELECT_COLUMNS: &str =
    "seq, id, embedding, text, role, session_id, message_id, timestamp, created_at";

/// Vector store persisted in a SQLite `vector_records` table.
#[derive(Debug)]
pub struct SqliteVectorStore {
    db: Database,
    dimension: usize,
}

impl SqliteVectorStore {
    /// Open a store on an already-migrated database.
    ///
    /// The first open records `dimension` as the store's fixed
    /// dimensionality. Later opens with a different value fail with
    /// [`RecallError::Config`].
    pub async fn open(db: Database, dimension: usize) -> Result<Self, RecallError> {
        if dimension == 0 {
            return Err(RecallError::Config(
                "embedding dimension must be greater than 0".into(),
            ));
        }

        let stored: Option<String> = db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                let existing: Option<String> = conn
                    .query_row(
                        "SELECT value FROM store_meta WHERE key = ?1",
                        rusqlite::params![DIMENSION_KEY],
                        |row| row.get(0),
                    )
                    .optional()?;
                if existing.is_none() {
                    conn.execute(
                        "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
                        rusqlite::params![DIMENSION_KEY, dimension.to_string()],
                    )?;
                }
                Ok(existing)
            })
            .await
            .map_err(map_tr_err)?;

        if let Some(value) = stored {
            let existing: usize = value.parse().map_err(|_| {
                RecallError::Config(format!("stored embedding dimension `{value}` is not a number"))
            })?;
            if existing != dimension {
                return Err(RecallError::Config(format!(
                    "vector store at {} holds {existing}-dimensional embeddings, \
                     but {dimension} were configured",
                    db.location()
                )));
            }
        }

        info!(location = %db.location(), dimension, "vector store opened");
        Ok(Self { db, dimension })
    }

    /// Open the database described by `config` and wrap it in a store.
    pub async fn from_config(config: &StorageConfig, dimension: usize) -> Result<Self, RecallError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Self::open(db, dimension).await
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn check_dimension(&self, len: usize) -> Result<(), RecallError> {
        if len != self.dimension {
            return Err(RecallError::Config(format!(
                "embedding has {len} dimensions, store requires {}",
                self.dimension
            )));
        }
        Ok(())
    }

    /// Load candidate rows matching `filter`, newest first, at most `limit`.
    ///
    /// Every row that is not `user` reads back as assistant output, so the
    /// assistant filter is `role <> 'user'`.
    async fn load_candidates(
        &self,
        filter: Option<&RecordFilter>,
        limit: Option<usize>,
    ) -> Result<Vec<Candidate>, RecallError> {
        let session = filter.and_then(|f| f.session_id.clone());
        let role = filter.and_then(|f| f.role);
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

        self.db
            .connection()
            .call(move |conn| -> Result<Vec<Candidate>, rusqlite::Error> {
                let mut sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM vector_records \
                     WHERE (?1 IS NULL OR session_id = ?1)"
                );
                match role {
                    Some(Role::User) => sql.push_str(" AND role = 'user'"),
                    Some(Role::Assistant) => sql.push_str(" AND role <> 'user'"),
                    None => {}
                }
                sql.push_str(" ORDER BY created_at DESC, seq DESC LIMIT ?2");

                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(rusqlite::params![session, limit], row_to_candidate)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Convert a `vector_records` row into a ranking candidate.
fn row_to_candidate(row: &rusqlite::Row) -> Result<Candidate, rusqlite::Error> {
    let seq: i64 = row.get(0)?;
    let blob: Vec<u8> = row.get(2)?;
    let role: String = row.get(4)?;
    let timestamp: String = row.get(7)?;
    let created_at: String = row.get(8)?;

    let parse = |idx: usize, value: &str| {
        parse_timestamp(value).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                format!("invalid timestamp `{value}`").into(),
            )
        })
    };

    let metadata = RecordMetadata {
        role: Role::from_str_value(&role),
        timestamp: parse(7, &timestamp)?,
        session_id: row.get(5)?,
        message_id: row.get(6)?,
    };

    Ok(Candidate {
        record: VectorRecord::from_parts(
            row.get(1)?,
            blob_to_vec(&blob),
            row.get(3)?,
            metadata,
            parse(8, &created_at)?,
        ),
        seq,
    })
}

#[async_trait]
impl PluginAdapter for SqliteVectorStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorStore
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn store(&self, record: NewRecord) -> Result<String, RecallError> {
        self.check_dimension(record.embedding.len())?;

        let id = record
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let blob = vec_to_blob(&record.embedding);
        let meta = record.metadata;
        let created_at = format_timestamp(&Utc::now());

        let row_id = id.clone();
        let inserted = self
            .db
            .connection()
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                let result = conn.execute(
                    "INSERT INTO vector_records \
                     (id, embedding, text, role, session_id, message_id, timestamp, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        row_id,
                        blob,
                        record.text,
                        meta.role.as_str(),
                        meta.session_id,
                        meta.message_id,
                        format_timestamp(&meta.timestamp),
                        created_at,
                    ],
                );
                match result {
                    Ok(_) => Ok(true),
                    Err(e) if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) => {
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?;

        if !inserted {
            return Err(RecallError::DuplicateRecord { id });
        }
        debug!(record_id = %id, "record stored");
        Ok(id)
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<ScoredRecord>, RecallError> {
        self.check_dimension(embedding.len())?;
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let candidates = self.load_candidates(filter, None).await?;
        Ok(rank_candidates(candidates, embedding, top_k))
    }

    async fn delete(&self, id: &str) -> Result<bool, RecallError> {
        let id = id.to_string();
        let removed = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM vector_records WHERE id = ?1",
                    rusqlite::params![id],
                )
            })
            .await
            .map_err(map_tr_err)?;
        Ok(removed > 0)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, RecallError> {
        let id = id.to_string();
        let candidate = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<Candidate>, rusqlite::Error> {
                conn.query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM vector_records WHERE id = ?1"),
                    rusqlite::params![id],
                    row_to_candidate,
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;
        Ok(candidate.map(|c| c.record))
    }

    async fn list(
        &self,
        limit: usize,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<VectorRecord>, RecallError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let candidates = self.load_candidates(filter, Some(limit)).await?;
        Ok(candidates.into_iter().map(|c| c.record).collect())
    }

    async fn count(&self) -> Result<usize, RecallError> {
        let count = self
            .db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM vector_records", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn info(&self) -> Result<StoreInfo, RecallError> {
        Ok(StoreInfo {
            backend: "sqlite".to_string(),
            location: Some(self.db.location().to_string()),
            dimension: Some(self.dimension),
            persistent: true,
        })
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
