use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::success;
use crate::response::graph_error_response;
use crate::services::{retention, review};
use crate::state::AppState;
use crate::store::{GraphError, TopicNode};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueParams {
    // Truncation is presentation-only; the engine always ranks the full set.
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueResponse {
    total_due: usize,
    topics: Vec<TopicNode>,
}

pub async fn queue(State(state): State<AppState>, Query(params): Query<QueueParams>) -> Response {
    let graph = state.graph();
    let guard = graph.read().await;
    let mut due = review::review_queue(guard.nodes(), Utc::now());
    let total_due = due.len();
    if let Some(limit) = params.limit {
        due.truncate(limit);
    }
    success(QueueResponse {
        total_due,
        topics: due,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionParams {
    pub desired_retention: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetentionResponse {
    current: Option<retention::TopicRetention>,
    predictions: Vec<retention::ReviewPrediction>,
}

pub async fn topic_retention(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<RetentionParams>,
) -> Response {
    let desired = params.desired_retention.unwrap_or(0.9);
    if !(0.0..1.0).contains(&desired) {
        return graph_error_response(GraphError::Validation(format!(
            "desiredRetention must be within [0, 1), got {desired}"
        )));
    }

    let graph = state.graph();
    let guard = graph.read().await;
    let Some(node) = guard.get_node(&id) else {
        return graph_error_response(GraphError::NotFound(format!("topic {id}")));
    };

    success(RetentionResponse {
        current: retention::topic_retention(node, Utc::now()),
        predictions: retention::predict_review_dates(node, desired),
    })
}
