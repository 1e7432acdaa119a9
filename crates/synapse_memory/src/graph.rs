//! Knowledge-graph collaborator.
//!
//! The activation engine only needs one query shape: find a root node whose
//! name or content contains a keyword, then return every path of 1..=N hops
//! from it together with the relationship chain of each path.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            label: label.into(),
            content: None,
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Case-insensitive substring match on name or content. `keyword` must
    /// already be lowercase.
    pub fn matches(&self, keyword: &str) -> bool {
        self.name.to_lowercase().contains(keyword)
            || self
                .content
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(keyword))
    }
}

/// One path out of the root: the node it ends at and the relationship types
/// walked to get there. Hop count is `relationships.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub node: GraphNode,
    pub relationships: Vec<String>,
}

impl GraphPath {
    pub fn hops(&self) -> usize {
        self.relationships.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootExpansion {
    pub root: GraphNode,
    pub paths: Vec<GraphPath>,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Expand the first node matching `keyword`. `Ok(None)` when nothing matches.
    async fn expand(&self, keyword: &str, max_depth: usize) -> Result<Option<RootExpansion>>;
}

// ============================================================================
// In-memory graph
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub relation: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphSnapshot {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

/// Undirected property graph held in memory, loadable from a JSON snapshot
/// of the form `{"nodes": [...], "edges": [{"from", "to", "type"}]}`.
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<(usize, String)>>,
    edge_count: usize,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: GraphSnapshot =
            serde_json::from_str(json).context("Failed to parse graph snapshot")?;
        let mut graph = Self::new();
        for node in snapshot.nodes {
            graph.add_node(node);
        }
        for edge in snapshot.edges {
            graph.add_edge(&edge.from, &edge.to, &edge.relation)?;
        }
        Ok(graph)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read graph snapshot: {}", path.as_ref().display())
        })?;
        Self::from_json(&content)
    }

    /// Insert a node, replacing any node with the same id.
    pub fn add_node(&mut self, node: GraphNode) {
        if let Some(&idx) = self.index.get(&node.id) {
            self.nodes[idx] = node;
            return;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
    }

    pub fn add_edge(&mut self, from: &str, to: &str, relation: &str) -> Result<()> {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            bail!("edge {} -[{}]- {} references an unknown node", from, relation, to);
        };
        self.adjacency[a].push((b, relation.to_string()));
        if a != b {
            self.adjacency[b].push((a, relation.to_string()));
        }
        self.edge_count += 1;
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn find_root(&self, keyword: &str) -> Option<usize> {
        let keyword = keyword.to_lowercase();
        self.nodes.iter().position(|n| n.matches(&keyword))
    }

    /// Every simple path of 1..=max_depth hops from `root`, depth-first.
    fn paths_from(&self, root: usize, max_depth: usize) -> Vec<GraphPath> {
        let mut paths = Vec::new();
        let mut visited = vec![root];
        let mut relationships = Vec::new();
        self.walk(root, max_depth, &mut visited, &mut relationships, &mut paths);
        paths
    }

    fn walk(
        &self,
        at: usize,
        remaining: usize,
        visited: &mut Vec<usize>,
        relationships: &mut Vec<String>,
        paths: &mut Vec<GraphPath>,
    ) {
        if remaining == 0 {
            return;
        }
        for (next, relation) in &self.adjacency[at] {
            if visited.contains(next) {
                continue;
            }
            visited.push(*next);
            relationships.push(relation.clone());
            paths.push(GraphPath {
                node: self.nodes[*next].clone(),
                relationships: relationships.clone(),
            });
            self.walk(*next, remaining - 1, visited, relationships, paths);
            relationships.pop();
            visited.pop();
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn expand(&self, keyword: &str, max_depth: usize) -> Result<Option<RootExpansion>> {
        let Some(root) = self.find_root(keyword) else {
            return Ok(None);
        };
        Ok(Some(RootExpansion {
            root: self.nodes[root].clone(),
            paths: self.paths_from(root, max_depth),
        }))
    }
}
