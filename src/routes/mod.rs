mod graph;
mod health;
mod progress;
mod review;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use serde::Serialize;

use crate::response::json_error;
use crate::state::AppState;

#[derive(Serialize)]
pub(crate) struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

pub(crate) fn success<T: Serialize>(data: T) -> Response {
    axum::Json(SuccessResponse { success: true, data }).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/graph", get(graph::get_graph))
        .route("/api/graph/filter", post(graph::filter_graph))
        .route("/api/graph/statistics", get(graph::statistics))
        .route("/api/graph/topics", post(graph::create_topic))
        .route("/api/graph/topics/:id", get(graph::topic_details))
        .route("/api/graph/topics/:id", delete(graph::delete_topic))
        .route(
            "/api/graph/topics/:id/confidence",
            patch(graph::update_confidence),
        )
        .route("/api/graph/topics/:id/review", post(graph::log_review))
        .route("/api/graph/topics/:id/mastered", put(graph::set_mastered))
        .route(
            "/api/graph/topics/:id/prerequisites",
            get(graph::prerequisites),
        )
        .route("/api/graph/topics/:id/dependents", get(graph::dependents))
        .route("/api/graph/topics/:id/related", get(graph::related))
        .route(
            "/api/graph/topics/:id/path/:target",
            get(graph::learning_path),
        )
        .route("/api/graph/next", get(graph::next_topics))
        .route("/api/graph/edges", post(graph::create_edge))
        .route("/api/review/queue", get(review::queue))
        .route("/api/review/retention/:id", get(review::topic_retention))
        .route("/api/progress", get(progress::get_progress))
        .route("/api/progress/goals", put(progress::set_goals))
        .route("/api/progress/topics", post(progress::increment_topics))
        .route("/api/progress/quizzes", post(progress::increment_quizzes))
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route not found").into_response()
}
