use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_topic_count() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["totalTopics"], 3);
}

#[tokio::test]
async fn get_graph_returns_nodes_edges_and_metadata() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/api/graph").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["edges"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["metadata"]["totalTopics"], 3);
}

#[tokio::test]
async fn unknown_topic_is_404() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/graph/topics/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn out_of_range_confidence_is_rejected() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/graph/topics/algebra/confidence",
            json!({ "confidence": 1.5 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn confidence_update_sets_last_reviewed() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/graph/topics/calculus/confidence",
            json!({ "confidence": 0.7 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["confidence"], 0.7);
    assert!(body["data"]["lastReviewed"].is_string());
}

#[tokio::test]
async fn review_log_increments_times_reviewed() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/graph/topics/algebra/review",
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["timesReviewed"], 1);
}

#[tokio::test]
async fn create_and_delete_topic_cascades_edges() {
    let (app, _dir) = common::create_test_app();

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/graph/topics",
            json!({ "label": "Topology" }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let body = read_json(created).await;
    assert!(body["data"]["id"].is_string());
    assert_eq!(body["data"]["confidence"], 0.0);

    // calculus sits in the middle of the prerequisite chain
    let deleted = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/graph/topics/calculus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    let body = read_json(deleted).await;
    assert_eq!(body["data"]["removedEdgeIds"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn review_queue_orders_by_ascending_confidence() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/review/queue")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let topics = body["data"]["topics"].as_array().unwrap();
    let ids: Vec<&str> = topics.iter().map(|t| t["id"].as_str().unwrap()).collect();
    // calculus is weak, analysis is stale; algebra was reviewed yesterday
    assert_eq!(ids, ["calculus", "analysis"]);
    assert_eq!(body["data"]["totalDue"], 2);
}

#[tokio::test]
async fn review_queue_limit_truncates_only_the_payload() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/review/queue?limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["data"]["topics"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["totalDue"], 2);
}

#[tokio::test]
async fn filter_composes_confidence_and_mastered_clauses() {
    let (app, _dir) = common::create_test_app();

    let marked = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/graph/topics/algebra/mastered",
            json!({ "mastered": true }),
        ))
        .await
        .unwrap();
    assert_eq!(marked.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/graph/filter",
            json!({ "minConfidence": 0.5, "showMastered": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let visible = body["data"].as_array().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["id"], "analysis");
}

#[tokio::test]
async fn prerequisites_walk_the_chain() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/graph/topics/analysis/prerequisites")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["algebra", "calculus"]);
}

#[tokio::test]
async fn mutation_succeeds_even_when_the_disk_flush_fails() {
    use mindgraph_backend::state::AppState;
    use mindgraph_backend::store::{GraphStore, PrefsStore};

    let dir = tempfile::tempdir().unwrap();
    let graph_path = dir.path().join("graph.json");
    let store = GraphStore::load_or_create(&graph_path).unwrap();
    let prefs = PrefsStore::open(dir.path().join("preferences.json")).unwrap();
    let app = mindgraph_backend::create_app(AppState::new(store, prefs));

    // a directory at the backing path makes every flush fail
    std::fs::create_dir(&graph_path).unwrap();

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/graph/topics",
            json!({ "label": "Topology" }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);

    // the in-memory store is authoritative: the topic is visible afterwards
    let response = app
        .oneshot(Request::builder().uri("/api/graph").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"]["nodes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn learning_path_spans_the_prerequisite_chain() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/graph/topics/algebra/path/analysis")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["algebra", "calculus", "analysis"]);

    // edges run algebra -> analysis only
    let reverse = app
        .oneshot(
            Request::builder()
                .uri("/api/graph/topics/analysis/path/algebra")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(reverse.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn next_topics_track_the_mastered_frontier() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/graph/next")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["algebra"]);

    // mastering algebra unlocks calculus, analysis stays blocked
    let marked = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/graph/topics/algebra/mastered",
            json!({ "mastered": true }),
        ))
        .await
        .unwrap();
    assert_eq!(marked.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/graph/next")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = read_json(response).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["calculus"]);
}

#[tokio::test]
async fn progress_increment_resets_counters_on_a_new_day() {
    let (app, _dir) = common::create_test_app();

    for _ in 0..4 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/progress/topics",
                json!({ "today": "2024-01-01" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/progress/topics",
            json!({ "today": "2024-01-02" }),
        ))
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["data"]["topicsReviewedToday"], 1);
    assert_eq!(body["data"]["lastGoalResetDate"], "2024-01-02");
    assert_eq!(body["data"]["currentStreak"], 2);
}

#[tokio::test]
async fn same_day_activity_does_not_double_count_streak() {
    let (app, _dir) = common::create_test_app();

    for uri in ["/api/progress/topics", "/api/progress/quizzes"] {
        let response = app
            .clone()
            .oneshot(json_request("POST", uri, json!({ "today": "2024-01-01" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/progress")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["data"]["topicsReviewedToday"], 1);
    assert_eq!(body["data"]["quizzesCompletedToday"], 1);
    assert_eq!(body["data"]["currentStreak"], 1);
}

#[tokio::test]
async fn malformed_today_is_rejected() {
    let (app, _dir) = common::create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/progress/topics",
            json!({ "today": "01/02/2024" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
