//! Spreading activation over the knowledge graph.
//!
//! Every keyword of a transcript fragment is expanded from its root node,
//! scored with a per-hop decay, thresholded, filtered for noise relative to
//! the strongest node, and cached under `user:keyword` so the prompt composer
//! can pick it up with `get_context` a few hundred milliseconds later.
//!
//! Keywords run as independent tasks. An engine-wide semaphore bounds how
//! many graph queries are in flight; excess keywords wait for a permit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use synapse_core::config::{ActivationConfig, CacheConfig};
use synapse_core::keywords::extract_keywords;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::cache::{cache_key, DistributedCache, LocalCache};
use crate::error::ActivationError;
use crate::graph::{GraphStore, RootExpansion};

/// Batches slower than this get a stats line in the debug log.
const SLOW_BATCH: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatedNode {
    pub id: String,
    pub name: String,
    pub label: String,
    pub activation: f64,
    pub hop_level: usize,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphActivation {
    pub root: String,
    /// Strongest first; equal activations keep discovery order.
    pub nodes: Vec<ActivatedNode>,
    pub created_at: DateTime<Utc>,
    /// Sum of activations that passed the threshold, before noise filtering.
    pub energy: f64,
    pub depth: usize,
}

impl SubgraphActivation {
    /// Context block for prompt assembly.
    pub fn format_for_prompt(&self) -> String {
        let mut output = format!("== CONTEXT: {} ==\n", self.root);
        for node in &self.nodes {
            if node.label.is_empty() {
                output.push_str(&format!("- {} ({:.2})\n", node.name, node.activation));
            } else {
                output.push_str(&format!(
                    "- {} [{}] ({:.2})\n",
                    node.name, node.label, node.activation
                ));
            }
        }
        output
    }
}

/// Score a root expansion: one entry per reached node on its strongest path,
/// root excluded, threshold applied, then the noise filter.
pub fn activate(expansion: &RootExpansion, config: &ActivationConfig) -> SubgraphActivation {
    let mut nodes: Vec<ActivatedNode> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for path in &expansion.paths {
        if path.node.id == expansion.root.id || path.hops() == 0 {
            continue;
        }
        let activation = decayed(config.decay, path.hops());
        match position.get(path.node.id.as_str()) {
            Some(&i) => {
                if activation > nodes[i].activation {
                    nodes[i].activation = activation;
                    nodes[i].hop_level = path.hops();
                }
            }
            None => {
                position.insert(path.node.id.as_str(), nodes.len());
                let mut properties = path.node.properties.clone();
                if let Some(content) = &path.node.content {
                    properties
                        .entry("content")
                        .or_insert_with(|| serde_json::Value::String(content.clone()));
                }
                nodes.push(ActivatedNode {
                    id: path.node.id.clone(),
                    name: path.node.name.clone(),
                    label: path.node.label.clone(),
                    activation,
                    hop_level: path.hops(),
                    properties,
                });
            }
        }
    }

    nodes.retain(|n| n.activation >= config.threshold);
    let energy = nodes.iter().map(|n| n.activation).sum();

    let mut nodes = entropy_filter(nodes, config.entropy_ratio, config.entropy_min_nodes);
    // stable: equal activations stay in discovery order
    nodes.sort_by(|a, b| b.activation.total_cmp(&a.activation));

    SubgraphActivation {
        root: expansion.root.name.clone(),
        nodes,
        created_at: Utc::now(),
        energy,
        depth: config.max_depth,
    }
}

/// Activation after `hops` steps of multiplicative decay.
pub fn decayed(decay: f64, hops: usize) -> f64 {
    decay.powi(hops.min(i32::MAX as usize) as i32)
}

/// Keep nodes with activation >= `ratio` × max. Sets smaller than
/// `min_nodes` pass through untouched.
pub fn entropy_filter(nodes: Vec<ActivatedNode>, ratio: f64, min_nodes: usize) -> Vec<ActivatedNode> {
    if nodes.len() < min_nodes {
        return nodes;
    }
    let max = nodes
        .iter()
        .map(|n| n.activation)
        .fold(f64::NEG_INFINITY, f64::max);
    let cutoff = ratio * max;
    nodes.into_iter().filter(|n| n.activation >= cutoff).collect()
}

/// Outcome of one `prime` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimeReport {
    /// Unique keywords extracted from the fragment.
    pub requested: usize,
    /// Skipped because the local tier already held them.
    pub already_cached: usize,
    pub activated: usize,
    /// No root matched.
    pub empty: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

struct EngineInner {
    graph: Arc<dyn GraphStore>,
    local: LocalCache,
    distributed: Option<Arc<dyn DistributedCache>>,
    permits: Semaphore,
    config: ActivationConfig,
    distributed_ttl: Duration,
}

#[derive(Clone)]
pub struct ActivationEngine {
    inner: Arc<EngineInner>,
}

impl ActivationEngine {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        distributed: Option<Arc<dyn DistributedCache>>,
        config: ActivationConfig,
        cache: &CacheConfig,
    ) -> Self {
        let permits = Semaphore::new(config.max_concurrency.max(1));
        Self {
            inner: Arc::new(EngineInner {
                graph,
                local: LocalCache::new(cache.local_capacity, cache.local_ttl()),
                distributed,
                permits,
                config,
                distributed_ttl: cache.distributed_ttl(),
            }),
        }
    }

    /// Activate and cache every keyword of `text` not already held locally.
    ///
    /// Waits for the whole batch. Each keyword's cache write is visible as
    /// soon as its own task completes. Dropping the returned future aborts
    /// the tasks still running; entries already written stay valid.
    pub async fn prime(&self, user: &str, text: &str) -> PrimeReport {
        let start = Instant::now();
        let keywords = extract_keywords(text);
        let mut report = PrimeReport {
            requested: keywords.len(),
            ..Default::default()
        };

        let mut tasks = JoinSet::new();
        for keyword in keywords {
            let key = cache_key(user, &keyword);
            if self.inner.local.contains(&key) {
                report.already_cached += 1;
                continue;
            }
            let inner = self.inner.clone();
            tasks.spawn(async move { inner.activate_keyword(key, keyword).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Some(_))) => report.activated += 1,
                Ok(Ok(None)) => report.empty += 1,
                Ok(Err(e)) => {
                    tracing::warn!("Activation skipped: {}", e);
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::warn!("Activation task failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        report.elapsed = start.elapsed();
        if report.elapsed > SLOW_BATCH {
            tracing::debug!(
                "Priming for user {} took {:?}: {} keywords, {} cached, {} activated, {} empty, {} failed",
                user,
                report.elapsed,
                report.requested,
                report.already_cached,
                report.activated,
                report.empty,
                report.failed
            );
        }
        report
    }

    /// `prime` bounded by a deadline. On expiry the in-flight tasks are
    /// aborted and `DeadlineExceeded` is returned.
    pub async fn prime_until(
        &self,
        user: &str,
        text: &str,
        deadline: Instant,
    ) -> Result<PrimeReport, ActivationError> {
        tokio::time::timeout_at(deadline, self.prime(user, text))
            .await
            .map_err(|_| ActivationError::DeadlineExceeded)
    }

    /// Cached activations for `keywords`: local tier first, then the
    /// distributed tier (hits are promoted). Misses are left out.
    pub async fn get_context(
        &self,
        user: &str,
        keywords: &[String],
    ) -> HashMap<String, Arc<SubgraphActivation>> {
        let mut found = HashMap::new();
        for keyword in keywords {
            if found.contains_key(keyword) {
                continue;
            }
            let key = cache_key(user, keyword);
            if let Some(hit) = self.inner.local.get(&key) {
                found.insert(keyword.clone(), hit);
                continue;
            }
            match self.inner.fetch_distributed(&key).await {
                Ok(Some(hit)) => {
                    let hit = Arc::new(hit);
                    self.inner.local.insert(key, hit.clone());
                    found.insert(keyword.clone(), hit);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Context lookup skipped: {}", e),
            }
        }
        found
    }

    /// Drop a user's local entries, e.g. when their session ends.
    pub fn invalidate_user(&self, user: &str) -> usize {
        self.inner.local.invalidate_user(user)
    }

    pub fn config(&self) -> &ActivationConfig {
        &self.inner.config
    }

    pub fn local_len(&self) -> usize {
        self.inner.local.len()
    }
}

impl EngineInner {
    async fn activate_keyword(
        &self,
        key: String,
        keyword: String,
    ) -> Result<Option<Arc<SubgraphActivation>>, ActivationError> {
        let expansion = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| ActivationError::Graph {
                    keyword: keyword.clone(),
                    source: e.into(),
                })?;
            self.graph
                .expand(&keyword, self.config.max_depth)
                .await
                .map_err(|source| ActivationError::Graph {
                    keyword: keyword.clone(),
                    source,
                })?
        };

        let Some(expansion) = expansion else {
            return Ok(None);
        };

        let activation = Arc::new(activate(&expansion, &self.config));
        self.local.insert(key.clone(), activation.clone());

        if let Some(distributed) = &self.distributed {
            let encoded = serde_json::to_string(activation.as_ref())?;
            if let Err(source) = distributed.set(&key, &encoded, self.distributed_ttl).await {
                // local copy is already in place
                tracing::warn!("{}", ActivationError::Cache { key, source });
            }
        }

        Ok(Some(activation))
    }

    async fn fetch_distributed(
        &self,
        key: &str,
    ) -> Result<Option<SubgraphActivation>, ActivationError> {
        let Some(distributed) = &self.distributed else {
            return Ok(None);
        };
        let raw = distributed
            .get(key)
            .await
            .map_err(|source| ActivationError::Cache {
                key: key.to_string(),
                source,
            })?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphNode, GraphPath};

    fn node(id: &str, activation: f64) -> ActivatedNode {
        ActivatedNode {
            id: id.to_string(),
            name: id.to_string(),
            label: String::new(),
            activation,
            hop_level: 1,
            properties: serde_json::Map::new(),
        }
    }

    fn path(id: &str, hops: usize) -> GraphPath {
        GraphPath {
            node: GraphNode::new(id, id.to_uppercase(), "Concept"),
            relationships: vec!["R".to_string(); hops],
        }
    }

    #[test]
    fn test_entropy_filter_drops_weak_nodes() {
        let nodes = vec![node("a", 1.0), node("b", 0.5), node("c", 0.19), node("d", 0.8)];
        let kept: Vec<_> = entropy_filter(nodes, 0.2, 3).into_iter().map(|n| n.id).collect();
        assert_eq!(kept, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_entropy_filter_noop_below_three() {
        let nodes = vec![node("a", 1.0), node("b", 0.01)];
        assert_eq!(entropy_filter(nodes.clone(), 0.2, 3), nodes);
        assert!(entropy_filter(Vec::new(), 0.2, 3).is_empty());
    }

    #[test]
    fn test_entropy_filter_keeps_max() {
        let nodes = vec![node("a", 0.31), node("b", 0.31), node("c", 0.31)];
        assert_eq!(entropy_filter(nodes, 0.2, 3).len(), 3);
    }

    #[test]
    fn test_decay_per_hop() {
        let mut previous = 1.0;
        for d in 1..=6 {
            let a = decayed(0.85, d);
            assert!((a - 0.85f64.powi(d as i32)).abs() < 1e-12);
            assert!(a < previous);
            previous = a;
        }
    }

    #[test]
    fn test_activate_strongest_path_wins_and_root_excluded() {
        let expansion = RootExpansion {
            root: GraphNode::new("root", "Dor", "Symptom"),
            paths: vec![
                path("b", 1),
                path("c", 2),
                path("c", 1),
                path("root", 2),
                path("d", 3),
            ],
        };
        let act = activate(&expansion, &ActivationConfig::default());
        assert_eq!(act.root, "Dor");
        let got: Vec<_> = act.nodes.iter().map(|n| (n.id.as_str(), n.hop_level)).collect();
        // b and c both at one hop keep discovery order, d follows
        assert_eq!(got, vec![("b", 1), ("c", 1), ("d", 3)]);
        let expected_energy = 0.85 + 0.85 + 0.85f64.powi(3);
        assert!((act.energy - expected_energy).abs() < 1e-12);
        assert_eq!(act.depth, 3);
    }

    #[test]
    fn test_activate_applies_threshold_before_energy() {
        let config = ActivationConfig {
            max_depth: 10,
            ..Default::default()
        };
        // 0.85^7 ≈ 0.32 passes, 0.85^8 ≈ 0.27 does not
        let expansion = RootExpansion {
            root: GraphNode::new("r", "R", ""),
            paths: vec![path("seven", 7), path("eight", 8)],
        };
        let act = activate(&expansion, &config);
        assert_eq!(act.nodes.len(), 1);
        assert_eq!(act.nodes[0].id, "seven");
        assert!((act.energy - 0.85f64.powi(7)).abs() < 1e-12);
    }

    #[test]
    fn test_activate_carries_content_into_properties() {
        let mut target = GraphNode::new("m", "Losartana", "Medication").with_content("08:00");
        target.properties.insert("dose".into(), serde_json::json!("50mg"));
        let expansion = RootExpansion {
            root: GraphNode::new("r", "Pressão", "Condition"),
            paths: vec![GraphPath {
                node: target,
                relationships: vec!["TREATED_BY".into()],
            }],
        };
        let act = activate(&expansion, &ActivationConfig::default());
        let props = &act.nodes[0].properties;
        assert_eq!(props["dose"], "50mg");
        assert_eq!(props["content"], "08:00");
    }

    #[test]
    fn test_format_for_prompt() {
        let act = SubgraphActivation {
            root: "Medo".into(),
            nodes: vec![ActivatedNode {
                label: "Context".into(),
                ..node("Noite", 0.85)
            }],
            created_at: Utc::now(),
            energy: 0.85,
            depth: 3,
        };
        let text = act.format_for_prompt();
        assert!(text.starts_with("== CONTEXT: Medo =="));
        assert!(text.contains("- Noite [Context] (0.85)"));
    }
}
