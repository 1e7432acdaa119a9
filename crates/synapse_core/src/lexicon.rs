//! Fixed Portuguese word lists shared by the extractor, the chain analyzer,
//! the signifier tracker and the desire rules.
//!
//! Every table is an ordered slice so that anything derived from it is
//! deterministic. The two hot lookups (stopwords, emotions) are indexed once.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

pub const STOPWORDS: &[&str] = &[
    "o", "a", "de", "que", "e", "do", "da", "em", "um", "para", "com", "não", "uma", "os", "no",
    "se", "na", "por", "mais", "as", "dos", "como", "mas", "foi", "ao", "ele", "das", "tem", "à",
    "seu", "sua", "ou", "ser", "quando", "muito", "há", "nos", "já", "está", "eu", "também", "só",
    "pelo", "pela", "estou", "estava",
];

/// Emotion word → canonical (English) emotion name.
pub const EMOTION_WORDS: &[(&str, &str)] = &[
    ("medo", "fear"),
    ("ansiedade", "anxiety"),
    ("tristeza", "sadness"),
    ("solidão", "loneliness"),
    ("raiva", "anger"),
    ("ódio", "hate"),
    ("culpa", "guilt"),
    ("vergonha", "shame"),
    ("desespero", "despair"),
    ("angústia", "anguish"),
    ("dor", "pain"),
    ("sofrimento", "suffering"),
    ("alegria", "joy"),
    ("felicidade", "happiness"),
    ("amor", "love"),
    ("paz", "peace"),
    ("esperança", "hope"),
    ("gratidão", "gratitude"),
    ("alívio", "relief"),
    ("confiança", "trust"),
];

pub const NEGATIVE_EMOTIONS: &[&str] = &[
    "fear", "anxiety", "sadness", "loneliness", "anger", "hate", "guilt", "shame", "despair",
    "anguish", "pain", "suffering",
];

pub const FEAR_EMOTIONS: &[&str] = &["fear", "anxiety", "despair", "anguish"];

pub const SADNESS_EMOTIONS: &[&str] = &["sadness", "loneliness", "despair", "suffering"];

pub const NEGATIONS: &[&str] = &[
    "não", "nunca", "jamais", "nada", "nenhum", "nenhuma", "nem", "tampouco",
];

pub const MODALS: &[&str] = &[
    "quero", "queria", "devo", "devia", "preciso", "precisava", "posso", "podia", "tenho",
    "tinha", "vou", "ia",
];

pub const INTENSIFIERS: &[(&str, f64)] = &[
    ("muito", 1.5),
    ("demais", 1.8),
    ("extremamente", 2.0),
    ("bastante", 1.3),
    ("super", 1.6),
    ("horrível", 1.7),
    ("terrível", 1.8),
    ("péssimo", 1.9),
    ("ótimo", 1.5),
];

pub const DIMINISHERS: &[(&str, f64)] = &[("pouco", 0.7), ("meio", 0.8), ("quase", 0.9)];

pub const FREQUENCY_HIGH: &str = "frequency_high";
pub const FREQUENCY_NEVER: &str = "frequency_never";

/// Single-token temporal markers.
pub const TEMPORAL_MARKERS: &[(&str, &str)] = &[
    ("sempre", FREQUENCY_HIGH),
    ("nunca", FREQUENCY_NEVER),
    ("raramente", "frequency_rare"),
];

/// Multi-token temporal markers, matched over the normalized token sequence.
pub const TEMPORAL_PHRASES: &[(&str, &str)] = &[
    ("todo dia", "frequency_daily"),
    ("às vezes", "frequency_sometimes"),
];

pub const CONDITIONALS: &[&str] = &["se", "caso", "talvez"];

pub const CONDITIONAL_PHRASES: &[&str] = &["pode ser", "quem sabe"];

/// Emotionally charged words the signifier tracker records per user.
pub const EMOTIONAL_SIGNIFIERS: &[&str] = &[
    "solidão", "tristeza", "medo", "saudade", "abandono", "dor", "sofrimento", "angústia",
    "ansiedade", "depressão", "alegria", "felicidade", "amor", "morte", "vida", "família",
    "filho", "filha", "esposa", "marido", "vazio", "falta", "perda", "culpa", "raiva", "ódio",
    "perdão", "esperança", "desespero",
];

pub const HIGH_CHARGE_SIGNIFIERS: &[&str] = &[
    "morte", "abandono", "solidão", "desespero", "ódio", "culpa", "vazio", "perda",
];

/// Recurring signifiers that point at fear.
pub const FEAR_SIGNIFIERS: &[&str] = &["medo", "ansiedade", "angústia", "desespero", "morte"];

/// Recurring signifiers that point at loss and absence.
pub const LOSS_SIGNIFIERS: &[&str] = &[
    "solidão", "saudade", "abandono", "vazio", "falta", "perda", "tristeza",
];

pub const LONELINESS_WORDS: &[&str] = &[
    "solidão", "sozinho", "abandono", "ninguém", "isolado", "esquecido",
];

pub const AUTHORITY_WORDS: &[&str] = &["médico", "doutor", "enfermeira", "filho", "filha", "família"];

/// Matched by containment, so the stems also catch inflections (morreria,
/// desistiu).
pub const DEATH_WORDS: &[&str] = &[
    "morrer", "morte", "acabar", "desistir", "fim", "parar", "morr", "desist",
];

pub const HELPLESSNESS_PHRASES: &[&str] = &[
    "não consigo", "não posso", "impossível", "difícil demais", "não aguento",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

static EMOTION_INDEX: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| EMOTION_WORDS.iter().copied().collect());

/// Expects a lowercased token.
pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Canonical emotion name for a lowercased token.
pub fn emotion_for(token: &str) -> Option<&'static str> {
    EMOTION_INDEX.get(token).copied()
}

pub fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token)
}

pub fn is_modal(token: &str) -> bool {
    MODALS.contains(&token)
}

pub fn intensifier(token: &str) -> Option<f64> {
    lookup(INTENSIFIERS, token)
}

pub fn diminisher(token: &str) -> Option<f64> {
    lookup(DIMINISHERS, token)
}

pub fn temporal_marker(token: &str) -> Option<&'static str> {
    lookup(TEMPORAL_MARKERS, token)
}

pub fn is_conditional(token: &str) -> bool {
    CONDITIONALS.contains(&token)
}

pub fn is_negative_emotion(emotion: &str) -> bool {
    NEGATIVE_EMOTIONS.contains(&emotion)
}

pub fn is_fear_emotion(emotion: &str) -> bool {
    FEAR_EMOTIONS.contains(&emotion)
}

pub fn is_sadness_emotion(emotion: &str) -> bool {
    SADNESS_EMOTIONS.contains(&emotion)
}

pub fn is_emotional_signifier(word: &str) -> bool {
    EMOTIONAL_SIGNIFIERS.contains(&word)
}

/// Fixed per-word emotional charge: 1.0 for high-charge words, 0.5 otherwise.
pub fn emotional_charge(word: &str) -> f64 {
    if HIGH_CHARGE_SIGNIFIERS.contains(&word) {
        1.0
    } else {
        0.5
    }
}

fn lookup<V: Copy>(table: &[(&str, V)], token: &str) -> Option<V> {
    table.iter().find(|(w, _)| *w == token).map(|(_, v)| *v)
}
