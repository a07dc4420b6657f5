pub mod graph;
pub mod kv;

pub use graph::{
    GraphEdge, GraphMetadata, GraphStore, KnowledgeGraph, NewTopic, Relationship, TopicNode,
};
pub use kv::PrefsStore;

/// Error taxonomy for the graph core. Transient variants are the only ones a
/// caller may retry; everything else is surfaced immediately.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("timed out after {0}ms")]
    Timeout(u64),
    #[error("network error: {0}")]
    Network(String),
    #[error("consistency violation: {0}")]
    Consistency(String),
}

impl GraphError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GraphError::Fetch(_) | GraphError::Timeout(_) | GraphError::Network(_)
        )
    }
}
