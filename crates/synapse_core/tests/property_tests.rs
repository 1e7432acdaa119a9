//! Property-based tests for synapse_core.
//!
//! Extraction, analysis and routing are pure functions, so their invariants
//! must hold for any input text, not just the hand-picked sentences in the
//! unit tests.

use proptest::prelude::*;
use synapse_core::lexicon;
use synapse_core::{analyze, extract_keywords, route, EnneagramType, Mode};

// ============================================================================
// Strategies
// ============================================================================

/// Words drawn from the lexicons mixed with arbitrary filler, so generated
/// sentences actually trigger markers.
fn arb_word() -> impl Strategy<Value = String> {
    let lexical: Vec<&'static str> = lexicon::STOPWORDS
        .iter()
        .chain(lexicon::NEGATIONS)
        .chain(lexicon::MODALS)
        .chain(lexicon::CONDITIONALS)
        .chain(lexicon::EMOTION_WORDS.iter().map(|(w, _)| w))
        .chain(lexicon::INTENSIFIERS.iter().map(|(w, _)| w))
        .chain(lexicon::DIMINISHERS.iter().map(|(w, _)| w))
        .chain(lexicon::TEMPORAL_MARKERS.iter().map(|(w, _)| w))
        .copied()
        .collect();
    prop_oneof![
        3 => proptest::sample::select(lexical).prop_map(String::from),
        1 => "[a-zA-Zçãéíóú]{1,10}",
    ]
}

fn arb_sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_word(), 0..20).prop_map(|words| words.join(" "))
}

fn arb_type() -> impl Strategy<Value = EnneagramType> {
    proptest::sample::select(EnneagramType::ALL.to_vec())
}

// ============================================================================
// Keyword extraction
// ============================================================================

proptest! {
    #[test]
    fn keywords_are_long_lowercase_unique_non_stopwords(text in arb_sentence()) {
        let keywords = extract_keywords(&text);
        let mut seen = std::collections::HashSet::new();
        for k in &keywords {
            prop_assert!(k.chars().count() >= 3);
            prop_assert_eq!(k, &k.to_lowercase());
            prop_assert!(!lexicon::is_stopword(k));
            prop_assert!(seen.insert(k.clone()), "duplicate keyword {}", k);
        }
    }

    #[test]
    fn keywords_never_panic_on_arbitrary_unicode(text in "\\PC{0,64}") {
        let _ = extract_keywords(&text);
    }
}

// ============================================================================
// Chain analysis
// ============================================================================

proptest! {
    #[test]
    fn chain_scores_stay_in_unit_interval(text in arb_sentence()) {
        let chain = analyze(&text);
        prop_assert!((0.0..=1.0).contains(&chain.intensity));
        prop_assert!((0.0..=1.0).contains(&chain.context_score));
    }

    #[test]
    fn chain_analysis_is_deterministic(text in arb_sentence()) {
        prop_assert_eq!(analyze(&text), analyze(&text));
    }

    #[test]
    fn chain_emotions_are_canonical(text in arb_sentence()) {
        let chain = analyze(&text);
        for e in &chain.emotions {
            prop_assert!(lexicon::EMOTION_WORDS.iter().any(|(_, canonical)| canonical == e));
        }
    }
}

// ============================================================================
// Personality routing
// ============================================================================

proptest! {
    #[test]
    fn route_keeps_base_and_moves_only_to_neighbors(t in arb_type(), emotion in "[a-zçã]{0,12}") {
        let state = route(t, &emotion);
        prop_assert_eq!(state.base_type, t);
        match state.mode {
            Mode::Balanced => prop_assert_eq!(state.active_type, t),
            Mode::Stress => prop_assert_eq!(state.active_type, t.stress_neighbor()),
            Mode::Growth => prop_assert_eq!(state.active_type, t.growth_neighbor()),
        }
    }

    #[test]
    fn type_names_and_numbers_parse_back(t in arb_type()) {
        prop_assert_eq!(t.name().parse::<EnneagramType>().ok(), Some(t));
        prop_assert_eq!(t.number().to_string().parse::<EnneagramType>().ok(), Some(t));
    }
}
