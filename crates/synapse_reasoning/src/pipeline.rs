use std::sync::Arc;
use synapse_core::{analyze, route, EnneagramType, RouterState, SignifierChain};
use synapse_memory::{Signifier, SignifierError, SignifierTracker};

use crate::desire::{DesireDetector, DesireInference};

/// Everything one utterance produced on the inference side.
#[derive(Debug)]
pub struct InferenceOutcome {
    pub chain: SignifierChain,
    pub router: RouterState,
    pub history: Vec<Signifier>,
    pub inference: DesireInference,
    pub interpellate: bool,
    /// Signifiers recorded from this utterance. A failed write leaves the
    /// inference above intact.
    pub tracked: Result<Vec<String>, SignifierError>,
}

/// Chain analysis → personality routing → desire detection, with the
/// user's signifier history read before and updated after.
pub struct InferencePipeline {
    detector: DesireDetector,
    tracker: Arc<SignifierTracker>,
}

impl InferencePipeline {
    pub fn new(detector: DesireDetector, tracker: Arc<SignifierTracker>) -> Self {
        Self { detector, tracker }
    }

    pub fn tracker(&self) -> &Arc<SignifierTracker> {
        &self.tracker
    }

    /// History is read before tracking, so an utterance never corroborates
    /// itself.
    pub async fn infer(
        &self,
        user: &str,
        text: &str,
        base_type: EnneagramType,
    ) -> Result<InferenceOutcome, SignifierError> {
        let chain = analyze(text);
        let router = route(base_type, chain.dominant_emotion().unwrap_or_default());

        let limit = self.tracker.config().history_limit;
        let history = self.tracker.top_signifiers(user, limit).await?;

        let inference = self.detector.detect(&chain, &history, router.active_type);
        let interpellate = inference.should_interpellate();
        tracing::debug!(
            "Inferred {} ({:.2}) for user {} in {} mode as {}",
            inference.desire,
            inference.confidence,
            user,
            router.mode.as_str(),
            router.active_type.name()
        );

        let tracked = self.tracker.track(user, text).await;
        if let Err(e) = &tracked {
            tracing::warn!("Failed to track signifiers for user {}: {}", user, e);
        }

        Ok(InferenceOutcome {
            chain,
            router,
            history,
            inference,
            interpellate,
            tracked,
        })
    }
}
