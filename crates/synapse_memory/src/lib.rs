//! Stateful side of the priming layer: the knowledge-graph collaborator,
//! the spreading activation engine with its two cache tiers, and the
//! per-user signifier tracker with its SQLite persistence.

pub mod activation;
pub mod cache;
pub mod error;
pub mod graph;
#[cfg(feature = "neo4j")]
pub mod neo4j;
pub mod signifiers;
pub mod sqlite;

pub use activation::{ActivatedNode, ActivationEngine, PrimeReport, SubgraphActivation};
pub use cache::{cache_key, DistributedCache, LocalCache};
pub use error::{ActivationError, SignifierError};
pub use graph::{GraphNode, GraphPath, GraphStore, MemoryGraph, RootExpansion};
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraph;
pub use signifiers::{
    extract_signifiers, interpellation_phrase, Signifier, SignifierStore, SignifierTracker,
};
pub use sqlite::SqliteStore;
