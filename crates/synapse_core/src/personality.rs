//! Personality routing over the nine enneagram types.
//!
//! A base type shifts toward a fixed neighbor under emotional pressure:
//!
//! - stress (disintegration): 1→4→2→8→5→7→1 and 9→6→3→9
//! - growth (integration): the same cycles walked backwards
//!
//! Everything here is static lookup data. Nothing is learned or mutated.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EnneagramType {
    Reformer = 1,
    Helper = 2,
    Achiever = 3,
    Individualist = 4,
    Investigator = 5,
    Loyalist = 6,
    Enthusiast = 7,
    Challenger = 8,
    Peacemaker = 9,
}

impl EnneagramType {
    pub const ALL: [EnneagramType; 9] = [
        EnneagramType::Reformer,
        EnneagramType::Helper,
        EnneagramType::Achiever,
        EnneagramType::Individualist,
        EnneagramType::Investigator,
        EnneagramType::Loyalist,
        EnneagramType::Enthusiast,
        EnneagramType::Challenger,
        EnneagramType::Peacemaker,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            EnneagramType::Reformer => "reformer",
            EnneagramType::Helper => "helper",
            EnneagramType::Achiever => "achiever",
            EnneagramType::Individualist => "individualist",
            EnneagramType::Investigator => "investigator",
            EnneagramType::Loyalist => "loyalist",
            EnneagramType::Enthusiast => "enthusiast",
            EnneagramType::Challenger => "challenger",
            EnneagramType::Peacemaker => "peacemaker",
        }
    }

    /// Disintegration point.
    pub fn stress_neighbor(self) -> Self {
        use EnneagramType::*;
        match self {
            Reformer => Individualist,
            Individualist => Helper,
            Helper => Challenger,
            Challenger => Investigator,
            Investigator => Enthusiast,
            Enthusiast => Reformer,
            Peacemaker => Loyalist,
            Loyalist => Achiever,
            Achiever => Peacemaker,
        }
    }

    /// Integration point.
    pub fn growth_neighbor(self) -> Self {
        use EnneagramType::*;
        match self {
            Reformer => Enthusiast,
            Enthusiast => Investigator,
            Investigator => Challenger,
            Challenger => Helper,
            Helper => Individualist,
            Individualist => Reformer,
            Peacemaker => Achiever,
            Achiever => Loyalist,
            Loyalist => Peacemaker,
        }
    }
}

impl fmt::Display for EnneagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (type {})", self.name(), self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown personality type: '{0}'")]
pub struct ParseTypeError(pub String);

impl FromStr for EnneagramType {
    type Err = ParseTypeError;

    /// Accepts names ("loyalist"), numbers ("6") and "type6" / "type 6".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let digits = lowered.trim_start_matches("type").trim();
        if let Ok(n) = digits.parse::<u8>() {
            return Self::from_number(n).ok_or_else(|| ParseTypeError(s.to_string()));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == lowered)
            .ok_or_else(|| ParseTypeError(s.to_string()))
    }
}

impl TryFrom<String> for EnneagramType {
    type Error = ParseTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EnneagramType> for String {
    fn from(value: EnneagramType) -> Self {
        value.name().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Balanced,
    Stress,
    Growth,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Balanced => "balanced",
            Mode::Stress => "stress",
            Mode::Growth => "growth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterState {
    pub base_type: EnneagramType,
    pub active_type: EnneagramType,
    pub mode: Mode,
}

/// Emotions (Portuguese and canonical English) that push toward the stress point.
const STRESS_EMOTIONS: &[&str] = &[
    "estresse", "raiva", "medo", "ansiedade", "confusão", "stress", "anger", "fear", "anxiety",
    "confusion",
];

/// Emotions that pull toward the growth point.
const GROWTH_EMOTIONS: &[&str] = &[
    "alegria", "gratidão", "paz", "esperança", "joy", "gratitude", "peace", "hope",
];

/// Shift a base type according to the detected emotion.
pub fn route(base_type: EnneagramType, emotion: &str) -> RouterState {
    let emotion = emotion.trim().to_lowercase();
    let (active_type, mode) = if STRESS_EMOTIONS.contains(&emotion.as_str()) {
        (base_type.stress_neighbor(), Mode::Stress)
    } else if GROWTH_EMOTIONS.contains(&emotion.as_str()) {
        (base_type.growth_neighbor(), Mode::Growth)
    } else {
        (base_type, Mode::Balanced)
    };

    RouterState {
        base_type,
        active_type,
        mode,
    }
}

/// Per-type concept multipliers: >1 amplifies a concept, <1 dampens it.
const ATTENTION_TABLE: &[(EnneagramType, &[(&str, f64)])] = &[
    (
        EnneagramType::Reformer,
        &[("DEVER", 1.8), ("PROTOCOLO", 1.6), ("ÉTICO", 1.7), ("CORREÇÃO", 1.9), ("EMOCIONAL", 0.6)],
    ),
    (
        EnneagramType::Helper,
        &[("AFETO", 2.0), ("NECESSIDADE", 1.8), ("CUIDADO", 1.9), ("VÍNCULO", 1.85), ("DADO_TÉCNICO", 0.7)],
    ),
    (
        EnneagramType::Achiever,
        &[("SUCESSO", 1.9), ("META", 1.8), ("EFICIÊNCIA", 1.7), ("IMAGEM", 1.6), ("SENTIMENTO", 0.5)],
    ),
    (
        EnneagramType::Individualist,
        &[("SENTIMENTO", 2.1), ("SIGNIFICADO", 1.9), ("AUTENTICIDADE", 2.0), ("COMUM", 0.4)],
    ),
    (
        EnneagramType::Investigator,
        &[("EVIDÊNCIA", 2.0), ("LÓGICA", 1.9), ("ANÁLISE", 1.95), ("DADOS", 1.85), ("EMOCIONAL", 0.6)],
    ),
    (
        EnneagramType::Loyalist,
        &[("RISCO", 2.2), ("SEGURANÇA", 2.0), ("PROTOCOLO", 1.8), ("PERIGO", 2.1), ("AMBIGUIDADE", 0.5)],
    ),
    (
        EnneagramType::Enthusiast,
        &[("NOVIDADE", 2.0), ("PRAZER", 1.9), ("FUTURO", 1.8), ("DOR", 0.3), ("ROTINA", 0.4)],
    ),
    (
        EnneagramType::Challenger,
        &[("PODER", 1.9), ("CONTROLE", 1.8), ("JUSTIÇA", 1.8), ("FRAQUEZA", 0.2), ("AÇÃO", 1.7)],
    ),
    (
        EnneagramType::Peacemaker,
        &[("HARMONIA", 1.9), ("PAZ", 1.85), ("UNIÃO", 1.8), ("CONFLITO", 0.5)],
    ),
];

pub type AttentionWeights = HashMap<&'static str, f64>;

static ATTENTION_WEIGHTS: Lazy<HashMap<EnneagramType, AttentionWeights>> = Lazy::new(|| {
    ATTENTION_TABLE
        .iter()
        .map(|(t, weights)| (*t, weights.iter().copied().collect()))
        .collect()
});

static EMPTY_WEIGHTS: Lazy<AttentionWeights> = Lazy::new(HashMap::new);

pub fn attention_weights(t: EnneagramType) -> &'static AttentionWeights {
    ATTENTION_WEIGHTS.get(&t).unwrap_or(&EMPTY_WEIGHTS)
}

/// The weights in table order, for stable rendering.
fn ordered_weights(t: EnneagramType) -> &'static [(&'static str, f64)] {
    ATTENTION_TABLE
        .iter()
        .find(|(ty, _)| *ty == t)
        .map(|(_, w)| *w)
        .unwrap_or(&[])
}

fn stance(t: EnneagramType) -> &'static str {
    match t {
        EnneagramType::Reformer => "You are in REFORMER mode (type 1). Be correct, precise and structured. Keep order and clarity.",
        EnneagramType::Helper => "You are in HELPER mode (type 2). Be warm, empathetic and attentive to emotional needs. Prioritize connection and care.",
        EnneagramType::Achiever => "You are in ACHIEVER mode (type 3). Be efficient, motivating and focused on results. Encourage action.",
        EnneagramType::Individualist => "You are in INDIVIDUALIST mode (type 4). Be deep, sensitive and authentic. Validate the uniqueness of feelings.",
        EnneagramType::Investigator => "You are in INVESTIGATOR mode (type 5). Be observant, logical and analytical. Give clear, objective information.",
        EnneagramType::Loyalist => "You are in LOYALIST mode (type 6). Be attentive and vigilant, and convey safety. Show you are there to protect and prevent risks.",
        EnneagramType::Enthusiast => "You are in ENTHUSIAST mode (type 7). Be optimistic, light and spontaneous. Bring new perspectives.",
        EnneagramType::Challenger => "You are in CHALLENGER mode (type 8). Be direct, protective and assertive. Convey strength and take charge if needed.",
        EnneagramType::Peacemaker => "You are in PEACEMAKER mode (type 9). Be calm, accepting and harmonious. Avoid conflict and bring stability.",
    }
}

/// Stance instruction plus the attention lines derived from the weights.
pub fn prompt_fragment(t: EnneagramType) -> String {
    let mut fragment = String::from(stance(t));
    fragment.push_str("\n\n[COGNITIVE ATTENTION]:");
    for (concept, weight) in ordered_weights(t) {
        if *weight > 1.0 {
            fragment.push_str(&format!("\n- AMPLIFY focus on '{}' ({:.1}x)", concept, weight));
        } else if *weight < 1.0 {
            fragment.push_str(&format!("\n- DAMPEN focus on '{}' ({:.1}x)", concept, weight));
        }
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_never_self_and_total() {
        for t in EnneagramType::ALL {
            assert_ne!(t.stress_neighbor(), t);
            assert_ne!(t.growth_neighbor(), t);
        }
        let mut stress: Vec<_> = EnneagramType::ALL.iter().map(|t| t.stress_neighbor()).collect();
        stress.sort();
        assert_eq!(stress, EnneagramType::ALL.to_vec(), "stress map is a permutation");
        let mut growth: Vec<_> = EnneagramType::ALL.iter().map(|t| t.growth_neighbor()).collect();
        growth.sort();
        assert_eq!(growth, EnneagramType::ALL.to_vec(), "growth map is a permutation");
    }

    #[test]
    fn test_growth_mirrors_stress() {
        for t in EnneagramType::ALL {
            assert_eq!(t.stress_neighbor().growth_neighbor(), t);
        }
    }

    #[test]
    fn test_stress_cycles() {
        // outer cycle has length 6, inner triangle length 3
        let mut t = EnneagramType::Reformer;
        for _ in 0..6 {
            t = t.stress_neighbor();
        }
        assert_eq!(t, EnneagramType::Reformer);

        let mut t = EnneagramType::Peacemaker;
        for _ in 0..3 {
            t = t.stress_neighbor();
        }
        assert_eq!(t, EnneagramType::Peacemaker);
    }

    #[test]
    fn test_route_examples() {
        let s = route(EnneagramType::Peacemaker, "anxiety");
        assert_eq!((s.active_type, s.mode), (EnneagramType::Loyalist, Mode::Stress));

        let s = route(EnneagramType::Peacemaker, "joy");
        assert_eq!((s.active_type, s.mode), (EnneagramType::Achiever, Mode::Growth));

        let s = route(EnneagramType::Peacemaker, "neutral");
        assert_eq!((s.active_type, s.mode), (EnneagramType::Peacemaker, Mode::Balanced));
        assert_eq!(s.base_type, EnneagramType::Peacemaker);
    }

    #[test]
    fn test_route_portuguese_and_case() {
        let s = route(EnneagramType::Helper, "Medo");
        assert_eq!((s.active_type, s.mode), (EnneagramType::Challenger, Mode::Stress));
        let s = route(EnneagramType::Helper, "gratidão");
        assert_eq!((s.active_type, s.mode), (EnneagramType::Individualist, Mode::Growth));
        let s = route(EnneagramType::Helper, "");
        assert_eq!(s.mode, Mode::Balanced);
    }

    #[test]
    fn test_loyalist_weights() {
        let w = attention_weights(EnneagramType::Loyalist);
        assert!(w["RISCO"] > 2.0);
        assert!((w["RISCO"] - 2.2).abs() < 1e-9);
        assert!(w["AMBIGUIDADE"] < 1.0);
        assert!((w["AMBIGUIDADE"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_every_type_has_weights() {
        for t in EnneagramType::ALL {
            let w = attention_weights(t);
            assert!(!w.is_empty());
            assert!(w.values().any(|v| *v > 1.0));
            assert!(w.values().any(|v| *v < 1.0));
        }
    }

    #[test]
    fn test_parse_type() {
        assert_eq!("loyalist".parse::<EnneagramType>(), Ok(EnneagramType::Loyalist));
        assert_eq!("Peacemaker".parse::<EnneagramType>(), Ok(EnneagramType::Peacemaker));
        assert_eq!("6".parse::<EnneagramType>(), Ok(EnneagramType::Loyalist));
        assert_eq!("Type9".parse::<EnneagramType>(), Ok(EnneagramType::Peacemaker));
        assert!("10".parse::<EnneagramType>().is_err());
        assert!("0".parse::<EnneagramType>().is_err());
        assert!("wizard".parse::<EnneagramType>().is_err());
    }

    #[test]
    fn test_serde_roundtrip_by_name() {
        let json = serde_json::to_string(&EnneagramType::Challenger).unwrap();
        assert_eq!(json, "\"challenger\"");
        let back: EnneagramType = serde_json::from_str("\"8\"").unwrap();
        assert_eq!(back, EnneagramType::Challenger);
    }

    #[test]
    fn test_prompt_fragment_lists_weights_in_order() {
        let fragment = prompt_fragment(EnneagramType::Loyalist);
        assert!(fragment.starts_with("You are in LOYALIST mode"));
        let risk = fragment.find("AMPLIFY focus on 'RISCO' (2.2x)").unwrap();
        let ambiguity = fragment.find("DAMPEN focus on 'AMBIGUIDADE' (0.5x)").unwrap();
        assert!(risk < ambiguity);
    }
}
