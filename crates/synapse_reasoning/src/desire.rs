//! Latent desire inference.
//!
//! A fixed table of rules looks at the signifier chain of one utterance, the
//! user's recurring signifiers and the active personality type. Every rule
//! that fires lends support to one desire; the best-supported desire wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use synapse_core::lexicon;
use synapse_core::{EnneagramType, SignifierChain};
use synapse_memory::Signifier;

/// Historical signifiers at or above this frequency count as recurring.
pub const RECURRING_FREQUENCY: u32 = 3;

/// Confidence lost for every other desire that also received support.
const AMBIGUITY_PENALTY: f64 = 0.05;

const INTERPELLATION_THRESHOLD: f64 = 0.65;
const RELIEF_THRESHOLD: f64 = 0.5;

// ============================================================================
// Desire
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Desire {
    Security,
    Connection,
    Autonomy,
    Recognition,
    Relief,
    Unknown,
}

impl Desire {
    /// Tie-break order when two desires have the same support.
    const PRIORITY: [Desire; 5] = [
        Desire::Relief,
        Desire::Security,
        Desire::Connection,
        Desire::Recognition,
        Desire::Autonomy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Desire::Security => "security",
            Desire::Connection => "connection",
            Desire::Autonomy => "autonomy",
            Desire::Recognition => "recognition",
            Desire::Relief => "relief",
            Desire::Unknown => "unknown",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Desire::Security => "Need for safety and protection",
            Desire::Connection => "Need for connection and belonging",
            Desire::Autonomy => "Need for autonomy and control over one's own life",
            Desire::Recognition => "Need to be recognized and valued",
            Desire::Relief => "Need for relief from suffering",
            Desire::Unknown => "No latent desire identified",
        }
    }

    /// Response strategy line for the prompt composer.
    pub fn focus(self) -> Option<&'static str> {
        match self {
            Desire::Security => Some("Convey safety and explore the source of the fear."),
            Desire::Connection => Some("Validate the feeling of loneliness and offer presence."),
            Desire::Autonomy => Some("Respect their autonomy while keeping safety limits."),
            Desire::Recognition => Some("Recognize the person's worth without reinforcing dependence."),
            Desire::Relief => Some("Offer emotional relief and validate the suffering."),
            Desire::Unknown => None,
        }
    }
}

impl fmt::Display for Desire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesireInference {
    pub desire: Desire,
    pub confidence: f64,
    pub reasoning: String,
    /// Names of the rules that fired, in table order.
    pub fired_rules: Vec<String>,
    /// Normalized share of every desire that received support.
    pub alternatives: BTreeMap<Desire, f64>,
}

impl DesireInference {
    pub fn unknown() -> Self {
        Self {
            desire: Desire::Unknown,
            confidence: 0.0,
            reasoning: "No latent-desire pattern matched".to_string(),
            fired_rules: Vec::new(),
            alternatives: BTreeMap::new(),
        }
    }

    pub fn should_interpellate(&self) -> bool {
        should_interpellate(self)
    }
}

/// Relief is surfaced at a lower confidence than any other desire.
pub fn should_interpellate(inference: &DesireInference) -> bool {
    match inference.desire {
        Desire::Relief => inference.confidence > RELIEF_THRESHOLD,
        Desire::Unknown => false,
        _ => inference.confidence >= INTERPELLATION_THRESHOLD,
    }
}

/// Response-strategy block for an inference worth surfacing.
pub fn interpellation_prompt(inference: &DesireInference) -> String {
    let mut prompt = format!(
        "[LATENT DESIRE DETECTED]\n\
         Inferred desire: {} ({})\n\
         Confidence: {:.0}%\n\
         Reasoning: {}\n\n\
         RESPONSE INSTRUCTIONS:\n\
         1. Do not answer only the explicit request\n\
         2. Address the latent desire identified above\n\
         3. Ask about the repeated word, mirror the underlying emotion, or give meaning to what was said\n\
         4. Be empathetic without flattering",
        inference.desire.description(),
        inference.desire,
        inference.confidence * 100.0,
        inference.reasoning,
    );
    if let Some(focus) = inference.desire.focus() {
        prompt.push_str("\n\nFOCUS: ");
        prompt.push_str(focus);
    }
    prompt
}

// ============================================================================
// Rules
// ============================================================================

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub chain: &'a SignifierChain,
    pub history: &'a [Signifier],
    pub active_type: EnneagramType,
    words: Vec<String>,
}

impl<'a> RuleContext<'a> {
    pub fn new(chain: &'a SignifierChain, history: &'a [Signifier], active_type: EnneagramType) -> Self {
        Self {
            chain,
            history,
            active_type,
            words: chain.words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Lowercased content words.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Some content word contains an entry of `list` (filhos, médicos).
    fn has_word_in(&self, list: &[&str]) -> bool {
        self.words
            .iter()
            .any(|w| list.iter().any(|entry| w.contains(entry)))
    }

    fn has_emotion(&self, pred: fn(&str) -> bool) -> bool {
        self.chain.emotions.iter().any(|e| pred(e))
    }

    fn recurring(&self) -> impl Iterator<Item = &Signifier> {
        self.history
            .iter()
            .filter(|s| s.frequency >= RECURRING_FREQUENCY)
    }

    fn has_recurring_in(&self, list: &[&str]) -> bool {
        self.recurring().any(|s| list.contains(&s.word.as_str()))
    }
}

pub trait DesireRule: Send + Sync {
    /// Name for logging and `fired_rules`.
    fn name(&self) -> &str;
    fn desire(&self) -> Desire;
    fn confidence(&self) -> f64;
    /// Human-readable evidence line for the reasoning string.
    fn description(&self) -> &str;
    fn fires(&self, ctx: &RuleContext<'_>) -> bool;
}

/// A rule defined by a static predicate.
pub struct TableRule {
    pub name: &'static str,
    pub desire: Desire,
    pub confidence: f64,
    pub description: &'static str,
    pub predicate: fn(&RuleContext<'_>) -> bool,
}

impl DesireRule for TableRule {
    fn name(&self) -> &str {
        self.name
    }
    fn desire(&self) -> Desire {
        self.desire
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn description(&self) -> &str {
        self.description
    }
    fn fires(&self, ctx: &RuleContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

pub fn default_rules() -> Vec<TableRule> {
    vec![
        TableRule {
            name: "negation_modal_reversal",
            desire: Desire::Security,
            confidence: 0.75,
            description: "Negated modal verb: refusal masking fear",
            predicate: |ctx| !ctx.chain.negations.is_empty() && !ctx.chain.modals.is_empty(),
        },
        TableRule {
            name: "signifier_repetition",
            desire: Desire::Connection,
            confidence: 0.85,
            description: "Repeats a recurring signifier from earlier conversations",
            predicate: |ctx| {
                ctx.words()
                    .iter()
                    .any(|w| ctx.recurring().any(|s| s.word.contains(w.as_str())))
            },
        },
        TableRule {
            name: "recurrent_fear_signifier",
            desire: Desire::Security,
            confidence: 0.80,
            description: "Recurring fear signifier with a fear emotion present",
            predicate: |ctx| {
                ctx.has_recurring_in(lexicon::FEAR_SIGNIFIERS)
                    && ctx.has_emotion(lexicon::is_fear_emotion)
            },
        },
        TableRule {
            name: "recurrent_loss_signifier",
            desire: Desire::Connection,
            confidence: 0.80,
            description: "Recurring loss signifier with sadness or loneliness present",
            predicate: |ctx| {
                ctx.has_recurring_in(lexicon::LOSS_SIGNIFIERS)
                    && ctx.has_emotion(lexicon::is_sadness_emotion)
            },
        },
        TableRule {
            name: "loyalist_fear",
            desire: Desire::Security,
            confidence: 0.88,
            description: "Loyalist mode under fear seeks safety",
            predicate: |ctx| {
                ctx.active_type == EnneagramType::Loyalist && ctx.has_emotion(lexicon::is_fear_emotion)
            },
        },
        TableRule {
            name: "want_negation",
            desire: Desire::Autonomy,
            confidence: 0.70,
            description: "Negated wanting: asserting control over own choices",
            predicate: |ctx| {
                !ctx.chain.negations.is_empty()
                    && ctx.chain.modals.iter().any(|m| m.to_lowercase().starts_with("quer"))
            },
        },
        TableRule {
            name: "loneliness_signifier",
            desire: Desire::Connection,
            confidence: 0.92,
            description: "Explicit loneliness signifier",
            predicate: |ctx| ctx.has_word_in(lexicon::LONELINESS_WORDS),
        },
        TableRule {
            name: "helper_negation",
            desire: Desire::Recognition,
            confidence: 0.78,
            description: "Helper mode refusing: wants to be valued",
            predicate: |ctx| {
                ctx.active_type == EnneagramType::Helper && !ctx.chain.negations.is_empty()
            },
        },
        TableRule {
            name: "verbal_resistance",
            desire: Desire::Autonomy,
            confidence: 0.82,
            description: "Repeated negations: verbal resistance",
            predicate: |ctx| ctx.chain.negations.len() >= 2,
        },
        TableRule {
            name: "authority_transference",
            desire: Desire::Security,
            confidence: 0.68,
            description: "Mentions an authority or caregiver figure",
            predicate: |ctx| ctx.has_word_in(lexicon::AUTHORITY_WORDS),
        },
        TableRule {
            name: "death_drive",
            desire: Desire::Relief,
            confidence: 0.95,
            description: "Death or ending signifier: possible wish to stop suffering",
            predicate: |ctx| ctx.has_word_in(lexicon::DEATH_WORDS),
        },
        TableRule {
            name: "learned_helplessness",
            desire: Desire::Recognition,
            confidence: 0.80,
            description: "Expression of helplessness",
            predicate: |ctx| {
                let text = ctx.chain.raw_text.to_lowercase();
                lexicon::HELPLESSNESS_PHRASES.iter().any(|p| text.contains(p))
            },
        },
    ]
}

// ============================================================================
// Detector
// ============================================================================

pub struct DesireDetector {
    rules: Vec<Box<dyn DesireRule>>,
}

impl Default for DesireDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DesireDetector {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_defaults() -> Self {
        let mut detector = Self::new();
        for rule in default_rules() {
            detector.add_rule(Box::new(rule));
        }
        detector
    }

    pub fn add_rule(&mut self, rule: Box<dyn DesireRule>) {
        self.rules.push(rule);
    }

    pub fn detect(
        &self,
        chain: &SignifierChain,
        history: &[Signifier],
        active_type: EnneagramType,
    ) -> DesireInference {
        let ctx = RuleContext::new(chain, history, active_type);

        let mut support: BTreeMap<Desire, f64> = BTreeMap::new();
        let mut fired_rules = Vec::new();
        let mut evidence = Vec::new();

        for rule in &self.rules {
            if !rule.fires(&ctx) {
                continue;
            }
            tracing::debug!("Desire rule '{}' fired → {}", rule.name(), rule.desire());
            // noisy-OR: independent corroborating signals
            let s = support.entry(rule.desire()).or_insert(0.0);
            *s = 1.0 - (1.0 - *s) * (1.0 - rule.confidence().clamp(0.0, 1.0));
            fired_rules.push(rule.name().to_string());
            evidence.push(rule.description().to_string());
        }

        support.remove(&Desire::Unknown);
        let Some(desire) = select(&support) else {
            return DesireInference::unknown();
        };

        let competitors = support.len().saturating_sub(1) as f64;
        let confidence = (support[&desire] - AMBIGUITY_PENALTY * competitors).clamp(0.0, 1.0);

        let total: f64 = support.values().sum();
        let alternatives = support
            .iter()
            .map(|(d, s)| (*d, s / total))
            .collect();

        DesireInference {
            desire,
            confidence,
            reasoning: evidence.join("; "),
            fired_rules,
            alternatives,
        }
    }
}

/// Relief takes precedence whenever it has any support. Otherwise the
/// strongest support wins, ties going to the earlier desire in `PRIORITY`.
fn select(support: &BTreeMap<Desire, f64>) -> Option<Desire> {
    if support.contains_key(&Desire::Relief) {
        return Some(Desire::Relief);
    }
    let mut best: Option<(Desire, f64)> = None;
    for desire in Desire::PRIORITY {
        if let Some(&s) = support.get(&desire) {
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((desire, s));
            }
        }
    }
    best.map(|(d, _)| d)
}
