//! Signifier chain analysis.
//!
//! Turns one utterance into a `SignifierChain`: the emotion, negation, modal,
//! temporal and conditional markers it contains, plus two scores.
//!
//! - `intensity`: 0.5 scaled by a running multiplier that every matched
//!   marker updates, clamped to `[0, 1]`
//! - `context_score`: how much situational detail the utterance carries,
//!   in `[0, 1]`
//!
//! Analysis is pure: the same text always yields the same chain.

use crate::keywords::{tokenize, MIN_KEYWORD_CHARS};
use crate::lexicon;
use serde::{Deserialize, Serialize};

const BASE_INTENSITY: f64 = 0.5;
const NEGATION_MULTIPLIER: f64 = 1.2;
const EMOTION_MULTIPLIER: f64 = 1.3;
const ABSOLUTE_TEMPORAL_MULTIPLIER: f64 = 1.4;
const CONDITIONAL_MULTIPLIER: f64 = 0.9;
const NEGATED_MODAL_MULTIPLIER: f64 = 1.5;

const BASE_CONTEXT: f64 = 0.5;
const CONTEXT_PER_EMOTION: f64 = 0.1;
const CONTEXT_MAX_EMOTIONS: usize = 3;
const CONTEXT_TEMPORAL_BONUS: f64 = 0.15;
const CONTEXT_CONDITIONAL_PENALTY: f64 = 0.1;
const CONTEXT_DIMINISHER_BONUS: f64 = 0.05;

/// Intensity above which an emotional utterance counts as "high emotion".
pub const HIGH_INTENSITY: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignifierChain {
    pub raw_text: String,
    /// Content words (not stopwords, at least three characters), input casing.
    pub words: Vec<String>,
    /// Canonical emotion names, one per occurrence.
    pub emotions: Vec<String>,
    pub negations: Vec<String>,
    pub modals: Vec<String>,
    pub temporal_markers: Vec<String>,
    pub conditionals: Vec<String>,
    pub has_diminisher: bool,
    pub intensity: f64,
    pub context_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPattern {
    Negation,
    Modal,
    NegationModal,
    HighEmotion,
}

impl SignifierChain {
    pub fn has_pattern(&self, pattern: ChainPattern) -> bool {
        match pattern {
            ChainPattern::Negation => !self.negations.is_empty(),
            ChainPattern::Modal => !self.modals.is_empty(),
            ChainPattern::NegationModal => !self.negations.is_empty() && !self.modals.is_empty(),
            ChainPattern::HighEmotion => !self.emotions.is_empty() && self.intensity > HIGH_INTENSITY,
        }
    }

    /// The first emotion detected, used to route the personality state.
    pub fn dominant_emotion(&self) -> Option<&str> {
        self.emotions.first().map(String::as_str)
    }

    pub fn has_negative_emotion(&self) -> bool {
        self.emotions.iter().any(|e| lexicon::is_negative_emotion(e))
    }

    /// Evidence tags for downstream probabilistic reasoning.
    pub fn evidences(&self) -> Vec<&'static str> {
        let mut evidences = Vec::new();
        if !self.negations.is_empty() {
            evidences.push("negation_present");
        }
        if !self.modals.is_empty() {
            evidences.push("modal_present");
        }
        if self.has_negative_emotion() {
            evidences.push("negative_emotion");
        }
        if self.intensity > HIGH_INTENSITY {
            evidences.push("high_intensity");
        }
        if self.has_pattern(ChainPattern::NegationModal) {
            evidences.push("negation_modal_pattern");
        }
        evidences
    }
}

/// Extract the signifier chain of an utterance.
pub fn analyze(text: &str) -> SignifierChain {
    let tokens = tokenize(text);
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

    let mut chain = SignifierChain {
        raw_text: text.to_string(),
        words: Vec::new(),
        emotions: Vec::new(),
        negations: Vec::new(),
        modals: Vec::new(),
        temporal_markers: Vec::new(),
        conditionals: Vec::new(),
        has_diminisher: false,
        intensity: BASE_INTENSITY,
        context_score: BASE_CONTEXT,
    };

    let mut multiplier = 1.0;

    for (i, (token, word)) in tokens.iter().zip(&lowered).enumerate() {
        if let Some(m) = lexicon::intensifier(word) {
            multiplier *= m;
        }

        if let Some(m) = lexicon::diminisher(word) {
            multiplier *= m;
            chain.has_diminisher = true;
        }

        if lexicon::is_negation(word) {
            chain.negations.push(token.to_string());
            multiplier *= NEGATION_MULTIPLIER;
        }

        if lexicon::is_modal(word) {
            chain.modals.push(token.to_string());
        }

        if let Some(emotion) = lexicon::emotion_for(word) {
            chain.emotions.push(emotion.to_string());
            multiplier *= EMOTION_MULTIPLIER;
        }

        if let Some(marker) = lexicon::temporal_marker(word) {
            chain.temporal_markers.push(marker.to_string());
            if marker == lexicon::FREQUENCY_HIGH || marker == lexicon::FREQUENCY_NEVER {
                multiplier *= ABSOLUTE_TEMPORAL_MULTIPLIER;
            }
        }

        if lexicon::is_conditional(word) {
            chain.conditionals.push(token.to_string());
            multiplier *= CONDITIONAL_MULTIPLIER;
        }

        if !lexicon::is_stopword(word) && word.chars().count() >= MIN_KEYWORD_CHARS {
            chain.words.push(token.to_string());
        }

        // "não quero", "nunca posso": a negated modal is a strong signal
        if i > 0 && lexicon::is_negation(&lowered[i - 1]) && lexicon::is_modal(word) {
            multiplier *= NEGATED_MODAL_MULTIPLIER;
        }
    }

    // Phrase tables match whole tokens only: " às vezes " not "fàs vezesx"
    let normalized = format!(" {} ", lowered.join(" "));
    for (phrase, marker) in lexicon::TEMPORAL_PHRASES {
        if normalized.contains(&format!(" {} ", phrase)) {
            chain.temporal_markers.push(marker.to_string());
        }
    }
    for phrase in lexicon::CONDITIONAL_PHRASES {
        if normalized.contains(&format!(" {} ", phrase)) {
            chain.conditionals.push(phrase.to_string());
            multiplier *= CONDITIONAL_MULTIPLIER;
        }
    }

    chain.intensity = (BASE_INTENSITY * multiplier).clamp(0.0, 1.0);
    chain.context_score = context_score(&chain);
    chain
}

fn context_score(chain: &SignifierChain) -> f64 {
    let mut score = BASE_CONTEXT;

    let mut distinct: Vec<&str> = chain.emotions.iter().map(String::as_str).collect();
    distinct.sort_unstable();
    distinct.dedup();
    score += CONTEXT_PER_EMOTION * distinct.len().min(CONTEXT_MAX_EMOTIONS) as f64;

    if !chain.temporal_markers.is_empty() {
        score += CONTEXT_TEMPORAL_BONUS;
    }
    if !chain.conditionals.is_empty() {
        score -= CONTEXT_CONDITIONAL_PENALTY;
    }
    if chain.has_diminisher {
        score += CONTEXT_DIMINISHER_BONUS;
    }

    score.clamp(0.0, 1.0)
}
