use chrono::{Duration, Utc};
use tempfile::TempDir;

use mindgraph_backend::state::AppState;
use mindgraph_backend::store::{GraphStore, NewTopic, PrefsStore, Relationship};

/// Builds the app over a seeded temp-file store. Keep the returned TempDir
/// alive for the duration of the test.
pub fn create_test_app() -> (axum::Router, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let graph_path = dir.path().join("graph.json");
    let prefs_path = dir.path().join("preferences.json");

    let mut store = GraphStore::load_or_create(&graph_path).expect("create graph store");
    let now = Utc::now();

    for (id, label, confidence) in [
        ("algebra", "Algebra", 0.9),
        ("calculus", "Calculus", 0.2),
        ("analysis", "Real Analysis", 0.5),
    ] {
        store
            .add_node(
                NewTopic {
                    id: Some(id.to_string()),
                    label: label.to_string(),
                    confidence: Some(confidence),
                    ..Default::default()
                },
                now,
            )
            .expect("seed node");
    }

    // algebra is fresh, calculus is weak, analysis is stale
    store
        .update_confidence("algebra", 0.9, now - Duration::days(1))
        .expect("seed review");
    store
        .update_confidence("analysis", 0.5, now - Duration::days(5))
        .expect("seed review");

    store
        .add_edge("algebra", "calculus", Relationship::Prerequisite, 1.0, now)
        .expect("seed edge");
    store
        .add_edge("calculus", "analysis", Relationship::Prerequisite, 1.0, now)
        .expect("seed edge");
    store.persist().expect("persist seed graph");

    let prefs = PrefsStore::open(&prefs_path).expect("open prefs store");
    let state = AppState::new(store, prefs);
    (mindgraph_backend::create_app(state), dir)
}
