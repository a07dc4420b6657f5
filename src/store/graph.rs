use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GraphError;

/// A single topic in the curriculum graph. `confidence` always stays inside
/// [0,1]; `times_reviewed` only moves through `GraphStore::log_review`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub times_reviewed: u32,
    #[serde(default)]
    pub mastered: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub resources: Vec<String>,
    // Informational only; the authoritative relationship data lives in edges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtopics: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_topics: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Prerequisite,
    Related,
    Subtopic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relationship: Relationship,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub last_updated: DateTime<Utc>,
    pub total_topics: usize,
    pub average_confidence: f64,
    pub mastered_count: usize,
}

/// Immutable snapshot handed to the derivation services. Metadata is a cached
/// aggregate recomputed after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraph {
    pub nodes: Vec<TopicNode>,
    pub edges: Vec<GraphEdge>,
    pub metadata: GraphMetadata,
}

/// Creation payload for `add_node`. Missing id gets a fresh UUID, missing
/// confidence defaults to 0.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTopic {
    pub id: Option<String>,
    pub label: String,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default)]
    pub parent_topics: Vec<String>,
}

/// Result of a cascading delete: the removed node plus the ids of every edge
/// that referenced it, so callers can clear any focus/selection state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedTopic {
    pub node: TopicNode,
    pub removed_edge_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDocument {
    #[serde(default)]
    nodes: Vec<TopicNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

/// Single authoritative owner of the node/edge collections. Every mutation
/// funnels through here so metadata and all derived views stay consistent.
#[derive(Debug)]
pub struct GraphStore {
    nodes: Vec<TopicNode>,
    edges: Vec<GraphEdge>,
    metadata: GraphMetadata,
    path: Option<PathBuf>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: compute_metadata(&[]),
            path: None,
        }
    }

    /// Loads the graph document from disk. A missing or malformed file is a
    /// `Fetch` failure: callers must treat it as "state unknown", never as an
    /// empty graph.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Fetch(format!("read {}: {e}", path.display())))?;
        let doc: GraphDocument = serde_json::from_str(&raw)
            .map_err(|e| GraphError::Fetch(format!("parse {}: {e}", path.display())))?;

        let mut store = Self {
            metadata: compute_metadata(&doc.nodes),
            nodes: doc.nodes,
            edges: doc.edges,
            path: Some(path.to_path_buf()),
        };
        store.check_edge_integrity();
        Ok(store)
    }

    /// Loads from `path` when it exists, otherwise starts empty and persists
    /// there. Only an unreadable or malformed existing file is an error.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        let mut store = Self::new();
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Adopts a snapshot fetched from the remote backend, recomputing the
    /// cached metadata rather than trusting the remote's copy.
    pub fn from_snapshot(snapshot: KnowledgeGraph, path: Option<PathBuf>) -> Self {
        let store = Self {
            metadata: compute_metadata(&snapshot.nodes),
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            path,
        };
        store.check_edge_integrity();
        store
    }

    pub fn snapshot(&self) -> KnowledgeGraph {
        KnowledgeGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn nodes(&self) -> &[TopicNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn get_node(&self, node_id: &str) -> Option<&TopicNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Sets a topic's confidence. The sole writer of `last_reviewed`. An
    /// out-of-range value fails validation and leaves the node unchanged.
    pub fn update_confidence(
        &mut self,
        node_id: &str,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<TopicNode, GraphError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(GraphError::Validation(format!(
                "confidence must be within [0, 1], got {value}"
            )));
        }

        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| GraphError::NotFound(format!("topic {node_id}")))?;

        node.confidence = value;
        node.last_reviewed = Some(now);
        let updated = node.clone();

        self.after_mutation(now);
        Ok(updated)
    }

    /// Records one completed review. The only mutation that increments
    /// `times_reviewed`; it never touches `last_reviewed`.
    pub fn log_review(&mut self, node_id: &str, now: DateTime<Utc>) -> Result<TopicNode, GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| GraphError::NotFound(format!("topic {node_id}")))?;

        node.times_reviewed += 1;
        let updated = node.clone();

        self.after_mutation(now);
        Ok(updated)
    }

    pub fn add_node(&mut self, new: NewTopic, now: DateTime<Utc>) -> Result<TopicNode, GraphError> {
        let confidence = new.confidence.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&confidence) {
            return Err(GraphError::Validation(format!(
                "confidence must be within [0, 1], got {confidence}"
            )));
        }
        if new.label.trim().is_empty() {
            return Err(GraphError::Validation("label must not be empty".into()));
        }

        let id = match new.id {
            Some(id) if !id.trim().is_empty() => {
                if self.nodes.iter().any(|n| n.id == id) {
                    return Err(GraphError::Validation(format!("topic id {id} already exists")));
                }
                id
            }
            _ => Uuid::new_v4().to_string(),
        };

        let node = TopicNode {
            id,
            label: new.label,
            confidence,
            last_reviewed: None,
            times_reviewed: 0,
            mastered: false,
            notes: new.notes.unwrap_or_default(),
            resources: new.resources,
            subtopics: new.subtopics,
            parent_topics: new.parent_topics,
        };

        self.nodes.push(node.clone());
        self.after_mutation(now);
        Ok(node)
    }

    /// Removes the node and cascades: every edge whose source or target is
    /// `node_id` goes with it. No dangling edge survives.
    pub fn delete_node(
        &mut self,
        node_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DeletedTopic, GraphError> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| GraphError::NotFound(format!("topic {node_id}")))?;
        let node = self.nodes.remove(pos);

        let mut removed_edge_ids = Vec::new();
        self.edges.retain(|edge| {
            if edge.source == node_id || edge.target == node_id {
                removed_edge_ids.push(edge.id.clone());
                false
            } else {
                true
            }
        });

        self.after_mutation(now);
        Ok(DeletedTopic { node, removed_edge_ids })
    }

    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        relationship: Relationship,
        weight: f64,
        now: DateTime<Utc>,
    ) -> Result<GraphEdge, GraphError> {
        if self.get_node(source).is_none() {
            return Err(GraphError::NotFound(format!("topic {source}")));
        }
        if self.get_node(target).is_none() {
            return Err(GraphError::NotFound(format!("topic {target}")));
        }

        let edge = GraphEdge {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            target: target.to_string(),
            relationship,
            weight,
        };
        self.edges.push(edge.clone());
        self.after_mutation(now);
        Ok(edge)
    }

    pub fn set_mastered(
        &mut self,
        node_id: &str,
        mastered: bool,
        now: DateTime<Utc>,
    ) -> Result<TopicNode, GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| GraphError::NotFound(format!("topic {node_id}")))?;
        node.mastered = mastered;
        let updated = node.clone();
        self.after_mutation(now);
        Ok(updated)
    }

    /// Writes the current graph document back to the backing file, when one
    /// is configured. Blocking; for startup and tests. Request handlers go
    /// through `flush_plan` instead.
    pub fn persist(&self) -> Result<(), GraphError> {
        match self.flush_plan()? {
            Some(plan) => plan.write_blocking(),
            None => Ok(()),
        }
    }

    /// Captures the backing path and serialized document so the disk write
    /// can happen after the store's lock is released. `None` when no backing
    /// file is configured.
    pub fn flush_plan(&self) -> Result<Option<FlushPlan>, GraphError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let doc = GraphDocument {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        };
        let raw = serde_json::to_string_pretty(&doc)
            .map_err(|e| GraphError::Fetch(format!("serialize graph: {e}")))?;
        Ok(Some(FlushPlan {
            path: path.clone(),
            raw,
        }))
    }

    fn after_mutation(&mut self, now: DateTime<Utc>) {
        self.metadata = compute_metadata(&self.nodes);
        self.metadata.last_updated = now;
    }

    fn check_edge_integrity(&self) {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &self.edges {
            if !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()) {
                tracing::warn!(
                    edge = %edge.id,
                    source = %edge.source,
                    target = %edge.target,
                    "edge references a missing topic"
                );
            }
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A pending disk write captured while the store's lock was held.
#[derive(Debug)]
pub struct FlushPlan {
    path: PathBuf,
    raw: String,
}

impl FlushPlan {
    pub async fn write(self) -> Result<(), GraphError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GraphError::Fetch(format!("create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&self.path, self.raw)
            .await
            .map_err(|e| GraphError::Fetch(format!("write {}: {e}", self.path.display())))
    }

    fn write_blocking(self) -> Result<(), GraphError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GraphError::Fetch(format!("create {}: {e}", parent.display())))?;
        }
        std::fs::write(&self.path, self.raw)
            .map_err(|e| GraphError::Fetch(format!("write {}: {e}", self.path.display())))
    }
}

fn compute_metadata(nodes: &[TopicNode]) -> GraphMetadata {
    let total_topics = nodes.len();
    let average_confidence = if total_topics == 0 {
        0.0
    } else {
        nodes.iter().map(|n| n.confidence).sum::<f64>() / total_topics as f64
    };
    GraphMetadata {
        last_updated: Utc::now(),
        total_topics,
        average_confidence,
        mastered_count: nodes.iter().filter(|n| n.mastered).count(),
    }
}
