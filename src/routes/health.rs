use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use super::success;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfo {
    status: &'static str,
    uptime_seconds: u64,
    total_topics: usize,
}

pub async fn health(State(state): State<AppState>) -> Response {
    let total_topics = state.graph().read().await.metadata().total_topics;
    success(HealthInfo {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        total_topics,
    })
}
