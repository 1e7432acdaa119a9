//! Per-user frequency tracking of emotionally charged words.
//!
//! Words that keep coming back across conversations ("solidão", "medo")
//! feed the desire rules as history, and once frequent enough they can be
//! surfaced back to the user as a question.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use synapse_core::config::SignifierConfig;
use synapse_core::keywords::tokenize;
use synapse_core::lexicon;

use crate::error::SignifierError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signifier {
    pub word: String,
    pub frequency: u32,
    /// Utterances the word appeared in, oldest first.
    pub contexts: Vec<String>,
    pub emotional_charge: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_interpellated: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SignifierStore: Send + Sync {
    /// Insert with frequency 1, or bump frequency, append `context` and move
    /// `last_seen` forward.
    async fn upsert(&self, user: &str, word: &str, context: &str, at: DateTime<Utc>) -> Result<()>;

    /// Signifiers with `frequency >= min_frequency`, most frequent first,
    /// ties broken by word.
    async fn top(&self, user: &str, min_frequency: u32, limit: usize) -> Result<Vec<Signifier>>;

    async fn lookup(&self, user: &str, word: &str) -> Result<Option<Signifier>>;

    async fn mark_interpellated(&self, user: &str, word: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Lowercased signifiers of `text`, one entry per occurrence.
pub fn extract_signifiers(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .map(str::to_lowercase)
        .filter(|w| lexicon::is_emotional_signifier(w))
        .collect()
}

/// Fixed question surfacing a recurring word back to the user.
pub fn interpellation_phrase(word: &str, frequency: u32) -> String {
    format!(
        "Percebi que você frequentemente menciona a palavra '{}'. \
         Ela apareceu {} vezes em nossas conversas. \
         O que essa palavra representa para você?",
        word, frequency
    )
}

pub struct SignifierTracker {
    store: Arc<dyn SignifierStore>,
    config: SignifierConfig,
}

impl SignifierTracker {
    pub fn new(store: Arc<dyn SignifierStore>, config: SignifierConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SignifierConfig {
        &self.config
    }

    pub async fn track(&self, user: &str, text: &str) -> Result<Vec<String>, SignifierError> {
        self.track_at(user, text, Utc::now()).await
    }

    /// Upsert every signifier occurrence in `text`. Returns the tracked words.
    pub async fn track_at(
        &self,
        user: &str,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<String>, SignifierError> {
        let words = extract_signifiers(text);
        for word in &words {
            self.store.upsert(user, word, text, at).await?;
        }
        if !words.is_empty() {
            tracing::debug!("Tracked {} signifiers for user {}", words.len(), user);
        }
        Ok(words)
    }

    /// Up to `n` key signifiers (frequency at or above `min_key_frequency`).
    pub async fn top_signifiers(&self, user: &str, n: usize) -> Result<Vec<Signifier>, SignifierError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        Ok(self.store.top(user, self.config.min_key_frequency, n).await?)
    }

    pub async fn should_interpellate_signifier(
        &self,
        user: &str,
        word: &str,
    ) -> Result<bool, SignifierError> {
        self.should_interpellate_signifier_at(user, word, Utc::now()).await
    }

    /// Frequent enough, and not interpellated within the cooldown window.
    /// Unknown words are never interpellated.
    pub async fn should_interpellate_signifier_at(
        &self,
        user: &str,
        word: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, SignifierError> {
        let Some(signifier) = self.store.lookup(user, &word.to_lowercase()).await? else {
            return Ok(false);
        };
        if signifier.frequency < self.config.interpellation_frequency {
            return Ok(false);
        }
        let cooldown = Duration::days(self.config.interpellation_cooldown_days);
        Ok(match signifier.last_interpellated {
            None => true,
            Some(last) => now - last > cooldown,
        })
    }

    pub async fn mark_interpellated(&self, user: &str, word: &str) -> Result<(), SignifierError> {
        self.mark_interpellated_at(user, word, Utc::now()).await
    }

    pub async fn mark_interpellated_at(
        &self,
        user: &str,
        word: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SignifierError> {
        self.store
            .mark_interpellated(user, &word.to_lowercase(), at)
            .await?;
        tracing::info!("Signifier '{}' interpellated for user {}", word, user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_counts_every_occurrence() {
        assert_eq!(
            extract_signifiers("Solidão, tanta solidão e medo."),
            vec!["solidão", "solidão", "medo"]
        );
        assert!(extract_signifiers("o tempo está bom").is_empty());
    }

    #[test]
    fn test_phrase_mentions_word_and_count() {
        let phrase = interpellation_phrase("solidão", 7);
        assert!(phrase.contains("'solidão'"));
        assert!(phrase.contains("7 vezes"));
    }
}
