use chrono::Utc;
use proptest::prelude::*;

use mindgraph_backend::services::review;
use mindgraph_backend::store::{GraphStore, NewTopic, Relationship};

fn seeded_store(count: usize) -> GraphStore {
    let mut store = GraphStore::new();
    let now = Utc::now();
    for i in 0..count {
        store
            .add_node(
                NewTopic {
                    id: Some(format!("t{i}")),
                    label: format!("Topic {i}"),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
    }
    for i in 1..count {
        store
            .add_edge(
                &format!("t{}", i - 1),
                &format!("t{i}"),
                Relationship::Prerequisite,
                1.0,
                now,
            )
            .unwrap();
    }
    store
}

proptest! {
    #[test]
    fn confidence_stays_in_bounds_under_any_update_sequence(
        updates in proptest::collection::vec((0usize..5, -1.0f64..2.0), 1..40)
    ) {
        let mut store = seeded_store(5);
        let now = Utc::now();

        for (idx, value) in updates {
            let id = format!("t{idx}");
            let before = store.get_node(&id).unwrap().confidence;
            let result = store.update_confidence(&id, value, now);
            let node = store.get_node(&id).unwrap();
            if (0.0..=1.0).contains(&value) {
                prop_assert!(result.is_ok());
                prop_assert_eq!(node.confidence, value);
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(node.confidence, before);
            }
            prop_assert!((0.0..=1.0).contains(&node.confidence));
        }
    }

    #[test]
    fn deletion_never_leaves_dangling_edges(
        deletions in proptest::collection::vec(0usize..8, 1..8)
    ) {
        let mut store = seeded_store(8);
        let now = Utc::now();

        for idx in deletions {
            let id = format!("t{idx}");
            let _ = store.delete_node(&id, now);
            for edge in store.edges() {
                prop_assert!(store.get_node(&edge.source).is_some());
                prop_assert!(store.get_node(&edge.target).is_some());
            }
        }
    }

    #[test]
    fn review_queue_is_sorted_and_complete(
        confidences in proptest::collection::vec(0.0f64..=1.0, 1..30)
    ) {
        let mut store = seeded_store(confidences.len());
        let now = Utc::now();
        for (i, value) in confidences.iter().enumerate() {
            store.update_confidence(&format!("t{i}"), *value, now).unwrap();
        }

        let queue = review::review_queue(store.nodes(), now);
        for pair in queue.windows(2) {
            prop_assert!(pair[0].confidence <= pair[1].confidence);
        }
        let due_count = store
            .nodes()
            .iter()
            .filter(|n| review::needs_review(n, now))
            .count();
        prop_assert_eq!(queue.len(), due_count);
    }
}
