pub mod cortex;
pub mod desire;
pub mod pipeline;

pub use cortex::Cortex;
pub use desire::{
    interpellation_prompt, should_interpellate, Desire, DesireDetector, DesireInference,
    DesireRule, RuleContext,
};
pub use pipeline::{InferenceOutcome, InferencePipeline};
