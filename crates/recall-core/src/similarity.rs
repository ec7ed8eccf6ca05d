// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector math and ranking shared by every vector store backend.

use crate::types::{ScoredRecord, VectorRecord};

/// Convert f32 vector to bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a BLOB back to an f32 vector. Trailing bytes that do not form a
/// whole f32 are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns `None` when the lengths differ. A zero vector has similarity
/// 0.0 with everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON {
        Some(0.0)
    } else {
        Some(dot / denom)
    }
}

/// A stored record plus its insertion sequence number.
///
/// The sequence is the last tie-breaker so that ranking is a total order
/// even when two records share a score and a `created_at`.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: VectorRecord,
    pub seq: i64,
}

/// Rank candidates against a query embedding and keep the best `top_k`.
///
/// Order: score descending, then most recent `created_at`, then most
/// recent insertion. Candidates whose dimensionality differs from the
/// query are skipped. `top_k == 0` yields an empty result.
pub fn rank_candidates(
    candidates: Vec<Candidate>,
    query: &[f32],
    top_k: usize,
) -> Vec<ScoredRecord> {
    if top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f32, Candidate)> = candidates
        .into_iter()
        .filter_map(|c| cosine_similarity(query, c.record.embedding()).map(|s| (s, c)))
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.total_cmp(sa)
            .then_with(|| b.record.created_at().cmp(&a.record.created_at()))
            .then_with(|| b.seq.cmp(&a.seq))
    });

    scored
        .into_iter()
        .take(top_k)
        .map(|(score, c)| ScoredRecord {
            record: c.record,
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{RecordMetadata, Role};

    fn candidate(id: &str, embedding: Vec<f32>, secs: i64, seq: i64) -> Candidate {
        let created = Utc.timestamp_opt(1_770_000_000 + secs, 0).unwrap();
        Candidate {
            record: VectorRecord::from_parts(
                id.into(),
                embedding,
                format!("text {id}"),
                RecordMetadata {
                    role: Role::User,
                    timestamp: created,
                    session_id: "s".into(),
                    message_id: None,
                },
                created,
            ),
            seq,
        }
    }

    #[test]
    fn blob_roundtrip_keeps_values() {
        let original = vec![0.1_f32, -0.5, 1.0, 3.25];
        let recovered = blob_to_vec(&vec_to_blob(&original));
        assert_eq!(original, recovered);
    }

    #[test]
    fn cosine_is_not_just_dot_product() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.9, 0.1]).unwrap();
        assert!((sim - 0.9939).abs() < 1e-3, "got {sim}");
    }

    #[test]
    fn cosine_handles_zero_and_mismatch() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
    }

    #[test]
    fn ranks_by_score_then_recency() {
        let ranked = rank_candidates(
            vec![
                candidate("a", vec![1.0, 0.0], 0, 1),
                candidate("b", vec![0.0, 1.0], 1, 2),
                candidate("c", vec![0.9, 0.1], 2, 3),
            ],
            &[1.0, 0.0],
            2,
        );
        let ids: Vec<&str> = ranked.iter().map(|s| s.record.id()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!((ranked[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_prefer_newest_created_at_then_latest_insert() {
        let ranked = rank_candidates(
            vec![
                candidate("old", vec![1.0, 0.0], 0, 1),
                candidate("new", vec![2.0, 0.0], 5, 2),
                candidate("same-time-first", vec![1.0, 0.0], 9, 3),
                candidate("same-time-second", vec![1.0, 0.0], 9, 4),
            ],
            &[1.0, 0.0],
            4,
        );
        let ids: Vec<&str> = ranked.iter().map(|s| s.record.id()).collect();
        assert_eq!(ids, vec!["same-time-second", "same-time-first", "new", "old"]);
    }

    #[test]
    fn zero_top_k_is_empty() {
        let ranked = rank_candidates(vec![candidate("a", vec![1.0], 0, 1)], &[1.0], 0);
        assert!(ranked.is_empty());
    }

    #[test]
    fn skips_mismatched_dimensions() {
        let ranked = rank_candidates(
            vec![candidate("short", vec![1.0], 0, 1), candidate("ok", vec![1.0, 0.0], 0, 2)],
            &[1.0, 0.0],
            5,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.id(), "ok");
    }

    mod props {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn ranking_is_deterministic(
                vecs in proptest::collection::vec(
                    proptest::collection::vec(-1.0f32..1.0, 3), 0..20),
                k in 0usize..25,
            ) {
                let build = || vecs.iter().enumerate()
                    .map(|(i, v)| candidate(&format!("r{i}"), v.clone(), (i % 3) as i64, i as i64))
                    .collect::<Vec<_>>();
                let first = rank_candidates(build(), &[0.3, -0.2, 0.9], k);
                let second = rank_candidates(build(), &[0.3, -0.2, 0.9], k);
                let ids = |r: &[ScoredRecord]| r.iter().map(|s| s.record.id().to_string()).collect::<Vec<_>>();
                prop_assert_eq!(ids(&first), ids(&second));
                prop_assert!(first.len() <= k);
                for pair in first.windows(2) {
                    prop_assert!(pair[0].score >= pair[1].score);
                }
            }
        }
    }
}
