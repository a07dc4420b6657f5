use axum::extract::State;
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::success;
use crate::response::graph_error_response;
use crate::services::goals::ProgressState;
use crate::state::AppState;
use crate::store::GraphError;

/// Callers supply their local calendar day; without one we fall back to the
/// UTC date. Calendar-date comparison is the contract, never instants.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBody {
    pub today: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsBody {
    pub daily_goal_topics: u32,
    pub daily_goal_quizzes: u32,
}

pub async fn get_progress(State(state): State<AppState>) -> Response {
    let progress = state.progress();
    let guard = progress.read().await;
    success(guard.state().clone())
}

pub async fn set_goals(State(state): State<AppState>, Json(body): Json<GoalsBody>) -> Response {
    mutate(&state, move |s| {
        s.set_goals(body.daily_goal_topics, body.daily_goal_quizzes)
    })
    .await
}

pub async fn increment_topics(
    State(state): State<AppState>,
    body: Option<Json<ActivityBody>>,
) -> Response {
    let today = match resolve_today(body) {
        Ok(date) => date,
        Err(response) => return response,
    };
    mutate(&state, move |s| s.increment_topics_reviewed(today)).await
}

pub async fn increment_quizzes(
    State(state): State<AppState>,
    body: Option<Json<ActivityBody>>,
) -> Response {
    let today = match resolve_today(body) {
        Ok(date) => date,
        Err(response) => return response,
    };
    mutate(&state, move |s| s.increment_quizzes_completed(today)).await
}

async fn mutate<F>(state: &AppState, mutation: F) -> Response
where
    F: FnOnce(&mut ProgressState),
{
    let progress = state.progress();
    let mut guard = progress.write().await;
    match guard.apply(&state.prefs(), mutation).await {
        Ok(updated) => success(updated),
        Err(err) => graph_error_response(err),
    }
}

fn resolve_today(body: Option<Json<ActivityBody>>) -> Result<NaiveDate, Response> {
    let raw = body.and_then(|Json(b)| b.today);
    match raw {
        None => Ok(Utc::now().date_naive()),
        Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
            graph_error_response(GraphError::Validation(format!(
                "today must be an ISO calendar date, got {value:?}"
            )))
        }),
    }
}
