use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use synapse_core::personality::AttentionWeights;
use synapse_core::{attention_weights, extract_keywords, prompt_fragment, EnneagramType, SynapseConfig};
use synapse_memory::{
    interpellation_phrase, ActivationEngine, DistributedCache, GraphStore, PrimeReport,
    SignifierError, SignifierTracker, SqliteStore, SubgraphActivation,
};
use tokio::task::JoinHandle;

use crate::desire::{interpellation_prompt, DesireDetector};
use crate::pipeline::{InferenceOutcome, InferencePipeline};

/// What the speech pipeline talks to: priming per transcript fragment,
/// context lookup and desire inference per finished utterance, and the
/// guidance block handed to the response composer.
pub struct Cortex {
    engine: ActivationEngine,
    pipeline: Arc<InferencePipeline>,
    base_type: EnneagramType,
}

impl Cortex {
    pub fn new(engine: ActivationEngine, pipeline: InferencePipeline, base_type: EnneagramType) -> Self {
        Self {
            engine,
            pipeline: Arc::new(pipeline),
            base_type,
        }
    }

    /// Wire everything from config: SQLite at `storage.db_path` backs the
    /// signifier history and, when enabled, the distributed cache tier.
    pub async fn from_config(config: &SynapseConfig, graph: Arc<dyn GraphStore>) -> Result<Self> {
        let store = Arc::new(
            SqliteStore::new(&config.storage.db_path)
                .await
                .with_context(|| format!("Failed to open store at {}", config.storage.db_path))?,
        );
        let distributed: Option<Arc<dyn DistributedCache>> = if config.storage.distributed_cache {
            Some(store.clone())
        } else {
            None
        };
        let engine = ActivationEngine::new(graph, distributed, config.activation.clone(), &config.cache);
        let tracker = Arc::new(SignifierTracker::new(store, config.signifiers.clone()));
        let pipeline = InferencePipeline::new(DesireDetector::with_defaults(), tracker);
        Ok(Self::new(engine, pipeline, config.persona.base_type))
    }

    pub fn base_type(&self) -> EnneagramType {
        self.base_type
    }

    pub fn engine(&self) -> &ActivationEngine {
        &self.engine
    }

    /// Fire-and-forget priming. The handle may be dropped; awaiting it is
    /// only useful to observe the report.
    pub fn prime(&self, user: &str, text: &str) -> JoinHandle<PrimeReport> {
        let engine = self.engine.clone();
        let user = user.to_string();
        let text = text.to_string();
        tokio::spawn(async move {
            let report = engine.prime(&user, &text).await;
            if report.failed > 0 {
                tracing::warn!(
                    "Priming for user {} finished with {} failed keywords",
                    user,
                    report.failed
                );
            }
            report
        })
    }

    pub async fn get_context(
        &self,
        user: &str,
        keywords: &[String],
    ) -> HashMap<String, Arc<SubgraphActivation>> {
        self.engine.get_context(user, keywords).await
    }

    pub async fn infer(&self, user: &str, text: &str) -> Result<InferenceOutcome, SignifierError> {
        self.pipeline.infer(user, text, self.base_type).await
    }

    pub fn attention_weights(&self, t: EnneagramType) -> &'static AttentionWeights {
        attention_weights(t)
    }

    /// Guidance block for the next response: personality stance, primed
    /// context for the utterance's keywords, the latent-desire strategy when
    /// it is worth surfacing, and at most one recurring-signifier question.
    pub async fn compose_guidance(
        &self,
        user: &str,
        text: &str,
        outcome: &InferenceOutcome,
    ) -> Result<String, SignifierError> {
        let mut sections = vec![prompt_fragment(outcome.router.active_type)];

        let keywords = extract_keywords(text);
        let contexts = self.engine.get_context(user, &keywords).await;
        let mut roots = HashSet::new();
        for keyword in &keywords {
            if let Some(context) = contexts.get(keyword) {
                if roots.insert(context.root.clone()) {
                    sections.push(context.format_for_prompt().trim_end().to_string());
                }
            }
        }

        if outcome.interpellate {
            sections.push(interpellation_prompt(&outcome.inference));
        }

        if let Some(question) = self.signifier_question(user, outcome).await? {
            sections.push(format!("[RECURRING SIGNIFIER]\n{}", question));
        }

        Ok(sections.join("\n\n"))
    }

    /// First historical signifier due for interpellation, marked as asked.
    async fn signifier_question(
        &self,
        user: &str,
        outcome: &InferenceOutcome,
    ) -> Result<Option<String>, SignifierError> {
        let tracker = self.pipeline.tracker();
        for signifier in &outcome.history {
            if tracker.should_interpellate_signifier(user, &signifier.word).await? {
                tracker.mark_interpellated(user, &signifier.word).await?;
                return Ok(Some(interpellation_phrase(&signifier.word, signifier.frequency)));
            }
        }
        Ok(None)
    }
}
