//! Neo4j-backed graph store (feature `neo4j`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{query, Graph};
use serde_json::{Map, Value};

use crate::graph::{GraphNode, GraphPath, GraphStore, RootExpansion};

pub struct Neo4jGraph {
    graph: Graph,
}

impl Neo4jGraph {
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .with_context(|| format!("Failed to connect to Neo4j at {}", uri))?;
        Ok(Self { graph })
    }

    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }
}

/// Variable-length bounds cannot be parameters in Cypher, so the depth is
/// formatted into the query text.
fn expansion_query(max_depth: usize) -> String {
    format!(
        "MATCH (root) \
         WHERE toLower(root.name) CONTAINS $keyword \
            OR toLower(coalesce(root.content, '')) CONTAINS $keyword \
         WITH root LIMIT 1 \
         OPTIONAL MATCH p = (root)-[*1..{}]-(m) \
         RETURN toString(id(root)) AS root_id, root.name AS root_name, \
                head(labels(root)) AS root_label, root.content AS root_content, \
                toString(id(m)) AS id, m.name AS name, head(labels(m)) AS label, \
                m.content AS content, properties(m) AS props, \
                [r IN relationships(p) | type(r)] AS rels",
        max_depth.max(1)
    )
}

/// Node properties minus the ones already mapped onto `GraphNode` fields.
fn extra_properties(props: Option<Map<String, Value>>) -> Map<String, Value> {
    let mut props = props.unwrap_or_default();
    props.remove("name");
    props.remove("content");
    props
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    async fn expand(&self, keyword: &str, max_depth: usize) -> Result<Option<RootExpansion>> {
        if max_depth == 0 {
            return Ok(None);
        }
        let mut rows = self
            .graph
            .execute(query(&expansion_query(max_depth)).param("keyword", keyword.to_lowercase()))
            .await
            .context("Neo4j expansion query failed")?;

        let mut root: Option<GraphNode> = None;
        let mut paths = Vec::new();

        while let Some(row) = rows.next().await.context("Failed to read Neo4j row")? {
            if root.is_none() {
                let mut node = GraphNode::new(
                    row.get::<String>("root_id")?,
                    row.get::<Option<String>>("root_name")?.unwrap_or_default(),
                    row.get::<Option<String>>("root_label")?.unwrap_or_default(),
                );
                node.content = row.get::<Option<String>>("root_content")?;
                root = Some(node);
            }

            // OPTIONAL MATCH yields a single null row for an isolated root
            let Some(id) = row.get::<Option<String>>("id")? else {
                continue;
            };
            let mut node = GraphNode::new(
                id,
                row.get::<Option<String>>("name")?.unwrap_or_default(),
                row.get::<Option<String>>("label")?.unwrap_or_default(),
            );
            node.content = row.get::<Option<String>>("content")?;
            node.properties = extra_properties(row.get::<Option<Map<String, Value>>>("props")?);
            paths.push(GraphPath {
                node,
                relationships: row.get::<Vec<String>>("rels")?,
            });
        }

        Ok(root.map(|root| RootExpansion { root, paths }))
    }
}
