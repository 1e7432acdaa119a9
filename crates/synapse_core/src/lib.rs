//! Pure, synchronous building blocks of the priming layer.
//!
//! Nothing in this crate touches I/O: keyword extraction, signifier chain
//! analysis and personality routing are deterministic functions of their
//! inputs and are cheap enough to run on every partial transcript.

pub mod chain;
pub mod config;
pub mod keywords;
pub mod lexicon;
pub mod personality;

pub use chain::{analyze, ChainPattern, SignifierChain};
pub use config::SynapseConfig;
pub use keywords::extract_keywords;
pub use personality::{
    attention_weights, prompt_fragment, route, EnneagramType, Mode, RouterState,
};
