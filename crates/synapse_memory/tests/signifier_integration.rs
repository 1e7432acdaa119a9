//! Integration tests for SignifierTracker over SQLite.
//!
//! Uses tempfile::TempDir for isolated databases.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use synapse_core::config::SignifierConfig;
use synapse_memory::{Signifier, SignifierError, SignifierStore, SignifierTracker, SqliteStore};

async fn setup_tracker(dir: &tempfile::TempDir) -> SignifierTracker {
    let db_path = dir.path().join("signifiers.db");
    let store = Arc::new(SqliteStore::new(&db_path).await.unwrap());
    SignifierTracker::new(store, SignifierConfig::default())
}

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(n)
}

#[tokio::test]
async fn test_track_returns_words_and_counts_occurrences() {
    let dir = tempfile::TempDir::new().unwrap();
    let tracker = setup_tracker(&dir).await;

    let words = tracker
        .track_at("u1", "A solidão dói, essa solidão e o medo", day(0))
        .await
        .unwrap();
    assert_eq!(words, vec!["solidão", "solidão", "medo"]);

    // below the key-signifier threshold of three
    assert!(tracker.top_signifiers("u1", 10).await.unwrap().is_empty());

    tracker.track_at("u1", "solidão de novo", day(1)).await.unwrap();
    let top = tracker.top_signifiers("u1", 10).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].word, "solidão");
    assert_eq!(top[0].frequency, 3);
    assert_eq!(top[0].emotional_charge, 1.0);
    assert_eq!(top[0].contexts.len(), 3);
}

#[tokio::test]
async fn test_interpellation_window() {
    let dir = tempfile::TempDir::new().unwrap();
    let tracker = setup_tracker(&dir).await;

    for i in 0..4 {
        tracker.track_at("u1", "sinto saudade", day(i)).await.unwrap();
    }
    assert!(!tracker
        .should_interpellate_signifier_at("u1", "saudade", day(4))
        .await
        .unwrap());

    tracker.track_at("u1", "saudade", day(4)).await.unwrap();
    assert!(tracker
        .should_interpellate_signifier_at("u1", "saudade", day(4))
        .await
        .unwrap());

    tracker.mark_interpellated_at("u1", "saudade", day(5)).await.unwrap();
    assert!(!tracker
        .should_interpellate_signifier_at("u1", "saudade", day(10))
        .await
        .unwrap());
    assert!(!tracker
        .should_interpellate_signifier_at("u1", "saudade", day(12))
        .await
        .unwrap());
    assert!(tracker
        .should_interpellate_signifier_at("u1", "saudade", day(13))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unknown_word_is_never_interpellated() {
    let dir = tempfile::TempDir::new().unwrap();
    let tracker = setup_tracker(&dir).await;
    assert!(!tracker.should_interpellate_signifier("u1", "abandono").await.unwrap());
}

#[tokio::test]
async fn test_top_signifiers_limit() {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let tracker = SignifierTracker::new(store, SignifierConfig::default());
    for _ in 0..3 {
        tracker.track("u1", "medo culpa vazio").await.unwrap();
    }
    assert_eq!(tracker.top_signifiers("u1", 2).await.unwrap().len(), 2);
    assert!(tracker.top_signifiers("u1", 0).await.unwrap().is_empty());
}

struct BrokenStore;

#[async_trait]
impl SignifierStore for BrokenStore {
    async fn upsert(&self, _: &str, _: &str, _: &str, _: DateTime<Utc>) -> Result<()> {
        bail!("disk full")
    }
    async fn top(&self, _: &str, _: u32, _: usize) -> Result<Vec<Signifier>> {
        bail!("disk full")
    }
    async fn lookup(&self, _: &str, _: &str) -> Result<Option<Signifier>> {
        bail!("disk full")
    }
    async fn mark_interpellated(&self, _: &str, _: &str, _: DateTime<Utc>) -> Result<()> {
        bail!("disk full")
    }
}

#[tokio::test]
async fn test_store_failures_are_surfaced() {
    let tracker = SignifierTracker::new(Arc::new(BrokenStore), SignifierConfig::default());

    assert!(matches!(tracker.track("u1", "medo").await, Err(SignifierError::Store(_))));
    assert!(tracker.top_signifiers("u1", 5).await.is_err());
    assert!(tracker.should_interpellate_signifier("u1", "medo").await.is_err());

    // text without signifiers never reaches the store
    assert!(tracker.track("u1", "bom dia").await.unwrap().is_empty());
}
