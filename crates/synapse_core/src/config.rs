use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::personality::EnneagramType;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SynapseConfig {
    pub activation: ActivationConfig,
    pub cache: CacheConfig,
    pub signifiers: SignifierConfig,
    pub storage: StorageConfig,
    pub persona: PersonaConfig,
}

impl SynapseConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SynapseConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SYNAPSE_MAX_DEPTH") {
            if let Ok(n) = v.parse() {
                self.activation.max_depth = n;
            }
        }
        if let Ok(v) = std::env::var("SYNAPSE_ACTIVATION_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.activation.threshold = n;
            }
        }
        if let Ok(v) = std::env::var("SYNAPSE_MAX_CONCURRENCY") {
            if let Ok(n) = v.parse() {
                self.activation.max_concurrency = n;
            }
        }
        if let Ok(v) = std::env::var("SYNAPSE_DISTRIBUTED_TTL_SECS") {
            if let Ok(n) = v.parse() {
                self.cache.distributed_ttl_secs = n;
            }
        }
        if let Ok(v) = std::env::var("SYNAPSE_DB_PATH") {
            self.storage.db_path = v;
        }
        if let Ok(v) = std::env::var("SYNAPSE_BASE_TYPE") {
            match v.parse() {
                Ok(t) => self.persona.base_type = t,
                Err(e) => tracing::warn!("Ignoring SYNAPSE_BASE_TYPE: {}", e),
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

/// Spreading activation tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Maximum path length explored from a root node.
    pub max_depth: usize,
    /// Multiplicative decay applied per hop.
    pub decay: f64,
    /// Activations below this are discarded before the entropy filter.
    pub threshold: f64,
    /// Entropy filter keeps nodes with activation >= ratio * max.
    pub entropy_ratio: f64,
    /// Result sets smaller than this bypass the entropy filter.
    pub entropy_min_nodes: usize,
    /// In-flight graph queries allowed per engine instance.
    pub max_concurrency: usize,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            decay: 0.85,
            threshold: 0.3,
            entropy_ratio: 0.2,
            entropy_min_nodes: 3,
            max_concurrency: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries held in the in-process tier (LRU eviction).
    pub local_capacity: usize,
    /// Age after which a local entry is treated as absent. 0 disables expiry.
    pub local_ttl_secs: u64,
    /// Expiry handed to the distributed tier on every write.
    pub distributed_ttl_secs: u64,
}

impl CacheConfig {
    pub fn local_ttl(&self) -> Option<Duration> {
        (self.local_ttl_secs > 0).then(|| Duration::from_secs(self.local_ttl_secs))
    }

    pub fn distributed_ttl(&self) -> Duration {
        Duration::from_secs(self.distributed_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_capacity: 10_000,
            local_ttl_secs: 1800,
            distributed_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignifierConfig {
    /// Minimum frequency for a signifier to count as "key".
    pub min_key_frequency: u32,
    /// Frequency at which a signifier becomes eligible for interpellation.
    pub interpellation_frequency: u32,
    /// Days that must pass before the same signifier is interpellated again.
    pub interpellation_cooldown_days: i64,
    /// How many key signifiers the inference pipeline pulls per utterance.
    pub history_limit: usize,
}

impl Default for SignifierConfig {
    fn default() -> Self {
        Self {
            min_key_frequency: 3,
            interpellation_frequency: 5,
            interpellation_cooldown_days: 7,
            history_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// Use the SQLite key/value table as the distributed cache tier.
    pub distributed_cache: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "synapse.db".to_string(),
            distributed_cache: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Base personality type used when the caller does not supply one.
    pub base_type: EnneagramType,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            base_type: EnneagramType::Peacemaker,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SynapseConfig::default();
        assert_eq!(cfg.activation.max_depth, 3);
        assert!((cfg.activation.decay - 0.85).abs() < f64::EPSILON);
        assert_eq!(cfg.activation.max_concurrency, 10);
        assert_eq!(cfg.cache.distributed_ttl(), Duration::from_secs(300));
        assert_eq!(cfg.persona.base_type, EnneagramType::Peacemaker);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[activation]
max_depth = 2
"#;
        let cfg: SynapseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.activation.max_depth, 2);
        // Defaults for unspecified fields
        assert!((cfg.activation.threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(cfg.signifiers.interpellation_frequency, 5);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[activation]
max_depth = 4
decay = 0.9
threshold = 0.25
entropy_ratio = 0.3
entropy_min_nodes = 4
max_concurrency = 16

[cache]
local_capacity = 256
local_ttl_secs = 0
distributed_ttl_secs = 120

[signifiers]
min_key_frequency = 2
interpellation_frequency = 6
interpellation_cooldown_days = 14
history_limit = 5

[storage]
db_path = "data/synapse.db"
distributed_cache = false

[persona]
base_type = "loyalist"
"#;
        let cfg: SynapseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.activation.max_depth, 4);
        assert_eq!(cfg.activation.max_concurrency, 16);
        assert_eq!(cfg.cache.local_capacity, 256);
        assert!(cfg.cache.local_ttl().is_none());
        assert_eq!(cfg.signifiers.interpellation_cooldown_days, 14);
        assert_eq!(cfg.storage.db_path, "data/synapse.db");
        assert!(!cfg.storage.distributed_cache);
        assert_eq!(cfg.persona.base_type, EnneagramType::Loyalist);
    }

    #[test]
    fn test_base_type_accepts_number() {
        let cfg: SynapseConfig = toml::from_str("[persona]\nbase_type = \"2\"\n").unwrap();
        assert_eq!(cfg.persona.base_type, EnneagramType::Helper);
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("SYNAPSE_MAX_DEPTH", "5");
        std::env::set_var("SYNAPSE_BASE_TYPE", "challenger");

        let mut cfg = SynapseConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.activation.max_depth, 5);
        assert_eq!(cfg.persona.base_type, EnneagramType::Challenger);

        // Clean up env vars before testing defaults
        std::env::remove_var("SYNAPSE_MAX_DEPTH");
        std::env::remove_var("SYNAPSE_BASE_TYPE");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = SynapseConfig::load_or_default("/nonexistent/path.toml");
        assert_eq!(cfg.activation.max_depth, 3);
    }
}
