// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall records` command implementation.
//!
//! Lists, shows and forgets records in the long-term store without starting
//! a session or contacting the model server.

use std::io::Write;

use colored::Colorize;
use recall_core::types::format_timestamp;
use recall_core::{RecallError, RecordFilter, VectorRecord, VectorStore};

/// Longest text preview shown by `records list`.
const PREVIEW_CHARS: usize = 72;

/// Print up to `limit` records, newest first.
pub async fn list_records(
    store: &dyn VectorStore,
    session: Option<String>,
    limit: usize,
    out: &mut impl Write,
) -> Result<(), RecallError> {
    let filter = session.map(RecordFilter::session);
    let records = store.list(limit, filter.as_ref()).await?;
    let total = store.count().await?;

    if records.is_empty() {
        writeln!(out, "{}", "no records".dimmed()).map_err(io_err)?;
        return Ok(());
    }
    for record in &records {
        writeln!(out, "{}", summary_line(record)).map_err(io_err)?;
    }
    writeln!(
        out,
        "{}",
        format!("showing {} of {total} records", records.len()).dimmed()
    )
    .map_err(io_err)?;
    Ok(())
}

/// Print one record in full. Missing ids are an error here.
pub async fn show_record(
    store: &dyn VectorStore,
    id: &str,
    out: &mut impl Write,
) -> Result<(), RecallError> {
    let record = store
        .get(id)
        .await?
        .ok_or_else(|| RecallError::NotFound { id: id.to_string() })?;
    let meta = record.metadata();

    writeln!(out, "{}      {}", "id".bold(), record.id()).map_err(io_err)?;
    writeln!(out, "{}    {}", "role".bold(), meta.role).map_err(io_err)?;
    writeln!(out, "{} {}", "session".bold(), meta.session_id).map_err(io_err)?;
    if let Some(message_id) = &meta.message_id {
        writeln!(out, "{} {}", "message".bold(), message_id).map_err(io_err)?;
    }
    writeln!(out, "{}    {}", "sent".bold(), format_timestamp(&meta.timestamp)).map_err(io_err)?;
    writeln!(out, "{}  {}", "stored".bold(), format_timestamp(&record.created_at()))
        .map_err(io_err)?;
    writeln!(out, "{}     {}", "dim".bold(), record.embedding().len()).map_err(io_err)?;
    writeln!(out).map_err(io_err)?;
    writeln!(out, "{}", record.text()).map_err(io_err)?;
    Ok(())
}

/// Delete one record. Forgetting an unknown id is reported, not an error.
pub async fn forget_record(
    store: &dyn VectorStore,
    id: &str,
    out: &mut impl Write,
) -> Result<bool, RecallError> {
    let deleted = store.delete(id).await?;
    if deleted {
        writeln!(out, "forgot {}", id.green()).map_err(io_err)?;
    } else {
        writeln!(out, "{}", format!("no record with id {id}").yellow()).map_err(io_err)?;
    }
    Ok(deleted)
}

/// One-line summary: id, role, timestamp, text preview.
pub fn summary_line(record: &VectorRecord) -> String {
    let meta = record.metadata();
    format!(
        "{}  {:<9}  {}  {}",
        record.id().cyan(),
        meta.role.as_str(),
        meta.timestamp.format("%Y-%m-%d %H:%M:%S"),
        preview(record.text(), PREVIEW_CHARS)
    )
}

/// Collapse whitespace and cut `text` to at most `max` characters.
fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn io_err(e: std::io::Error) -> RecallError {
    RecallError::Internal(format!("failed to write output: {e}"))
}

#[cfg(test)]
mod tests {
    use recall_core::{Message, NewRecord};
    use recall_storage::{Database, SqliteVectorStore};

    use super::*;

    async fn store_with(texts: &[(&str, &str)]) -> SqliteVectorStore {
        let store = SqliteVectorStore::open(Database::open_in_memory().await.unwrap(), 2)
            .await
            .unwrap();
        for (session, text) in texts {
            store
                .store(NewRecord::from_message(&Message::user(*text, *session), vec![1.0, 0.0]))
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("a\n b", 10), "a b");
        let long = "x".repeat(100);
        let p = preview(&long, 10);
        assert_eq!(p.chars().count(), 10);
        assert!(p.ends_with("..."));
    }

    #[tokio::test]
    async fn list_filters_by_session() {
        let store = store_with(&[("s1", "first"), ("s2", "second"), ("s1", "third")]).await;
        let mut out = Vec::new();
        list_records(&store, Some("s1".into()), 10, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("first"));
        assert!(text.contains("third"));
        assert!(!text.contains("second"));
        assert!(text.contains("showing 2 of 3 records"));
    }

    #[tokio::test]
    async fn show_missing_record_is_not_found() {
        let store = store_with(&[]).await;
        let mut out = Vec::new();
        let err = show_record(&store, "nope", &mut out).await.unwrap_err();
        assert!(matches!(err, RecallError::NotFound { .. }));
    }

    #[tokio::test]
    async fn forget_removes_once() {
        let store = store_with(&[("s1", "gone soon")]).await;
        let id = store.list(1, None).await.unwrap()[0].id().to_string();
        let mut out = Vec::new();
        assert!(forget_record(&store, &id, &mut out).await.unwrap());
        assert!(!forget_record(&store, &id, &mut out).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
