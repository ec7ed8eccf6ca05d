// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for context assembly and retrieval.

use recall_config::RetrievalScope;
use recall_core::{ContextSource, Role};
use recall_test_utils::TestHarness;
use tracing_test::traced_test;

fn contents(entries: &[recall_core::ContextEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.content.as_str()).collect()
}

#[tokio::test]
async fn recent_window_is_oldest_to_newest() {
    let mut harness = TestHarness::builder()
        .with_context_messages(2)
        .build()
        .await
        .unwrap();
    for text in ["a", "b", "c"] {
        harness.session.record_user_message(text).await.unwrap();
    }

    let context = harness.session.assemble_context("c").await;

    assert_eq!(contents(&context.recent), vec!["b", "c"]);
    assert!(context.retrieved.is_empty());
    assert!(context.degraded.is_none());
}

#[tokio::test]
async fn spilled_messages_come_back_by_similarity() {
    let mut harness = TestHarness::builder()
        .with_dimension(2)
        .with_active_limit(2)
        .with_context_messages(2)
        .with_top_k(2)
        .build()
        .await
        .unwrap();
    harness.embedder.pin("my cat is called biscuit", vec![1.0, 0.0]);
    harness.embedder.pin("noted", vec![0.0, 1.0]);
    harness.embedder.pin("what is my cat called", vec![0.95, 0.05]);

    harness
        .session
        .record_user_message("my cat is called biscuit")
        .await
        .unwrap();
    harness.session.record_assistant_message("noted").await.unwrap();
    harness.session.record_user_message("nice weather").await.unwrap();
    harness.session.record_assistant_message("indeed").await.unwrap();

    let context = harness
        .session
        .assemble_context("what is my cat called")
        .await;

    assert_eq!(contents(&context.recent), vec!["nice weather", "indeed"]);
    assert_eq!(context.retrieved.len(), 2);
    let best = &context.retrieved[0];
    assert_eq!(best.content, "my cat is called biscuit");
    assert_eq!(best.role, Role::User);
    match &best.source {
        ContextSource::Retrieved { score, .. } => assert!(*score > 0.9),
        other => panic!("expected a retrieved entry, got {other:?}"),
    }
    assert_eq!(context.retrieved[1].role, Role::Assistant);

    // Recent entries come first in the request.
    let request = context.to_request(None);
    assert_eq!(request.entries.len(), 4);
    assert!(!request.entries[1].is_retrieved());
    assert!(request.entries[2].is_retrieved());
}

#[tokio::test]
async fn records_already_in_the_window_are_not_repeated() {
    let mut harness = TestHarness::builder()
        .with_active_limit(1)
        .with_context_messages(1)
        .with_top_k(3)
        .build()
        .await
        .unwrap();
    harness.session.record_user_message("repeat me").await.unwrap();
    harness.session.record_user_message("repeat me").await.unwrap();
    assert_eq!(harness.memory_store().unwrap().len(), 1);

    let context = harness.session.assemble_context("repeat me").await;

    assert_eq!(contents(&context.recent), vec!["repeat me"]);
    assert!(context.retrieved.is_empty());
}

#[tokio::test]
#[traced_test]
async fn retrieval_failure_degrades_to_recent_messages() {
    let mut harness = TestHarness::builder()
        .with_active_limit(1)
        .build()
        .await
        .unwrap();
    harness.session.record_user_message("old").await.unwrap();
    harness.session.record_user_message("new").await.unwrap();
    harness.memory_store().unwrap().set_unavailable(true);

    let context = harness.session.assemble_context("anything").await;

    assert_eq!(contents(&context.recent), vec!["new"]);
    assert!(context.retrieved.is_empty());
    assert!(context.degraded.is_some());
    assert!(logs_contain("retrieval failed, using recent messages only"));
}

#[tokio::test]
async fn failed_retrieval_does_not_fail_the_turn() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["still here".into()])
        .build()
        .await
        .unwrap();
    harness.embedder.fail_on("query that breaks embedding");

    let turn = harness
        .send_message("query that breaks embedding")
        .await
        .unwrap();

    assert_eq!(turn.reply, "still here");
    assert!(turn.context.degraded.is_some());
}

#[tokio::test]
async fn null_store_skips_retrieval() {
    let mut harness = TestHarness::builder()
        .without_persistence()
        .with_active_limit(1)
        .build()
        .await
        .unwrap();
    harness.session.record_user_message("first").await.unwrap();
    harness.session.record_user_message("second").await.unwrap();
    let calls_before = harness.embedder.calls();

    let context = harness.session.assemble_context("first").await;

    assert!(context.retrieved.is_empty());
    assert!(context.degraded.is_none());
    assert_eq!(harness.embedder.calls(), calls_before);
}

#[tokio::test]
async fn zero_top_k_skips_retrieval() {
    let mut harness = TestHarness::builder()
        .with_top_k(0)
        .with_active_limit(0)
        .build()
        .await
        .unwrap();
    harness.session.record_user_message("stored").await.unwrap();
    let calls_before = harness.embedder.calls();

    let context = harness.session.assemble_context("stored").await;

    assert!(context.is_empty());
    assert_eq!(harness.embedder.calls(), calls_before);
}

#[tokio::test]
async fn session_scope_hides_other_sessions() {
    let build = |scope| {
        TestHarness::builder()
            .with_active_limit(0)
            .with_retrieval_scope(scope)
            .build()
    };

    let mut shared = build(RetrievalScope::All).await.unwrap();
    shared.session.record_user_message("alpha fact").await.unwrap();
    let other = shared.new_session();
    let context = other.assemble_context("alpha fact").await;
    assert_eq!(contents(&context.retrieved), vec!["alpha fact"]);

    let mut scoped = build(RetrievalScope::Session).await.unwrap();
    scoped.session.record_user_message("alpha fact").await.unwrap();
    let other = scoped.new_session();
    assert!(other.assemble_context("alpha fact").await.retrieved.is_empty());
    let own = scoped.session.assemble_context("alpha fact").await;
    assert_eq!(contents(&own.retrieved), vec!["alpha fact"]);
}
