use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLockWriteGuard;

use super::success;
use crate::response::graph_error_response;
use crate::services::{filter::GraphFilter, relations, stats};
use crate::state::AppState;
use crate::store::{GraphEdge, GraphError, GraphStore, NewTopic, Relationship, TopicNode};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceUpdate {
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteredUpdate {
    pub mastered: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEdge {
    pub source: String,
    pub target: String,
    pub relationship: Relationship,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetails {
    pub topic: TopicNode,
    pub prerequisites: Vec<TopicNode>,
    pub dependents: Vec<TopicNode>,
    pub related: Vec<TopicNode>,
    pub edges: Vec<GraphEdge>,
}

pub async fn get_graph(State(state): State<AppState>) -> Response {
    let snapshot = state.graph().read().await.snapshot();
    success(snapshot)
}

pub async fn filter_graph(
    State(state): State<AppState>,
    Json(filter): Json<GraphFilter>,
) -> Response {
    if let (Some(min), Some(max)) = (filter.min_confidence, filter.max_confidence) {
        if min > max {
            return graph_error_response(GraphError::Validation(format!(
                "minConfidence {min} exceeds maxConfidence {max}"
            )));
        }
    }
    let graph = state.graph();
    let guard = graph.read().await;
    success(filter.apply(guard.nodes()))
}

pub async fn statistics(State(state): State<AppState>) -> Response {
    let graph = state.graph();
    let guard = graph.read().await;
    success(stats::compute(guard.nodes(), Utc::now()))
}

pub async fn topic_details(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let graph = state.graph();
    let guard = graph.read().await;
    let Some(topic) = guard.get_node(&id) else {
        return graph_error_response(GraphError::NotFound(format!("topic {id}")));
    };
    let nodes = guard.nodes();
    let edges = guard.edges();
    success(TopicDetails {
        topic: topic.clone(),
        prerequisites: clone_all(relations::prerequisites(nodes, edges, &id)),
        dependents: clone_all(relations::dependents(nodes, edges, &id)),
        related: clone_all(relations::related_nodes(nodes, edges, &id)),
        edges: relations::edges_of(edges, &id).into_iter().cloned().collect(),
    })
}

pub async fn create_topic(
    State(state): State<AppState>,
    Json(new): Json<NewTopic>,
) -> Response {
    let graph = state.graph();
    let mut guard = graph.write().await;
    match guard.add_node(new, Utc::now()) {
        Ok(node) => persist_and(guard, success(node)).await,
        Err(err) => graph_error_response(err),
    }
}

pub async fn delete_topic(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let graph = state.graph();
    let mut guard = graph.write().await;
    match guard.delete_node(&id, Utc::now()) {
        Ok(deleted) => {
            tracing::info!(
                topic = %id,
                removed_edges = deleted.removed_edge_ids.len(),
                "topic deleted"
            );
            persist_and(guard, success(deleted)).await
        }
        Err(err) => graph_error_response(err),
    }
}

pub async fn update_confidence(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ConfidenceUpdate>,
) -> Response {
    let graph = state.graph();
    let mut guard = graph.write().await;
    match guard.update_confidence(&id, update.confidence, Utc::now()) {
        Ok(node) => persist_and(guard, success(node)).await,
        Err(err) => graph_error_response(err),
    }
}

pub async fn log_review(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let graph = state.graph();
    let mut guard = graph.write().await;
    match guard.log_review(&id, Utc::now()) {
        Ok(node) => persist_and(guard, success(node)).await,
        Err(err) => graph_error_response(err),
    }
}

pub async fn set_mastered(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<MasteredUpdate>,
) -> Response {
    let graph = state.graph();
    let mut guard = graph.write().await;
    match guard.set_mastered(&id, update.mastered, Utc::now()) {
        Ok(node) => persist_and(guard, success(node)).await,
        Err(err) => graph_error_response(err),
    }
}

pub async fn create_edge(State(state): State<AppState>, Json(new): Json<NewEdge>) -> Response {
    let graph = state.graph();
    let mut guard = graph.write().await;
    match guard.add_edge(&new.source, &new.target, new.relationship, new.weight, Utc::now()) {
        Ok(edge) => persist_and(guard, success(edge)).await,
        Err(err) => graph_error_response(err),
    }
}

pub async fn prerequisites(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    traversal(state, id, relations::prerequisites).await
}

pub async fn dependents(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    traversal(state, id, relations::dependents).await
}

pub async fn related(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    traversal(state, id, relations::related_nodes).await
}

pub async fn learning_path(
    State(state): State<AppState>,
    Path((id, target)): Path<(String, String)>,
) -> Response {
    let graph = state.graph();
    let guard = graph.read().await;
    match relations::learning_path(guard.nodes(), guard.edges(), &id, &target) {
        Some(path) => success(clone_all(path)),
        None => graph_error_response(GraphError::NotFound(format!(
            "no learning path from {id} to {target}"
        ))),
    }
}

pub async fn next_topics(State(state): State<AppState>) -> Response {
    let graph = state.graph();
    let guard = graph.read().await;
    success(clone_all(relations::next_topics(guard.nodes(), guard.edges())))
}

async fn traversal(
    state: AppState,
    id: String,
    query: for<'a> fn(&'a [TopicNode], &[GraphEdge], &str) -> Vec<&'a TopicNode>,
) -> Response {
    let graph = state.graph();
    let guard = graph.read().await;
    if guard.get_node(&id).is_none() {
        return graph_error_response(GraphError::NotFound(format!("topic {id}")));
    }
    success(clone_all(query(guard.nodes(), guard.edges(), &id)))
}

fn clone_all(nodes: Vec<&TopicNode>) -> Vec<TopicNode> {
    nodes.into_iter().cloned().collect()
}

/// Flushes the graph after a successful mutation. Memory is authoritative
/// once the mutation lands: a failed flush is logged, not surfaced, and the
/// next flush rewrites the whole document. The serialized plan is captured
/// under the lock; the disk write happens after the lock is released.
async fn persist_and(guard: RwLockWriteGuard<'_, GraphStore>, response: Response) -> Response {
    let plan = guard.flush_plan();
    drop(guard);
    match plan {
        Ok(Some(plan)) => {
            if let Err(err) = plan.write().await {
                tracing::error!(error = %err, "graph flush failed, disk is behind memory");
            }
        }
        Ok(None) => {}
        Err(err) => tracing::error!(error = %err, "graph flush failed, disk is behind memory"),
    }
    response
}
