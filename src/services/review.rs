use chrono::{DateTime, Utc};

use crate::store::TopicNode;

/// Below this confidence a topic always needs attention, reviewed or not.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.4;

/// Days a review is trusted before the topic is considered stale. High
/// confidence buys a longer grace period.
pub fn decay_threshold_days(confidence: f64) -> f64 {
    if confidence > 0.7 {
        7.0
    } else {
        3.0
    }
}

pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_seconds() as f64 / 86_400.0
}

/// The decay rule. A topic needs review when its confidence is low outright,
/// or when its last review has aged past the decay threshold. A topic that
/// was never reviewed but sits at >= 0.4 confidence is deliberately left
/// alone until its confidence itself signals risk.
pub fn needs_review(node: &TopicNode, now: DateTime<Utc>) -> bool {
    if node.confidence < LOW_CONFIDENCE_THRESHOLD {
        return true;
    }
    match node.last_reviewed {
        Some(last) => days_since(last, now) > decay_threshold_days(node.confidence),
        None => false,
    }
}

/// Urgency-ordered review list: every topic that needs review, most at-risk
/// first. Sort is stable, so ties keep original collection order. Returns the
/// full set; truncation is a presentation concern.
pub fn review_queue(nodes: &[TopicNode], now: DateTime<Utc>) -> Vec<TopicNode> {
    let mut due: Vec<TopicNode> = nodes
        .iter()
        .filter(|node| needs_review(node, now))
        .cloned()
        .collect();
    // Vec::sort_by is a stable sort; equal confidences preserve input order.
    due.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn topic(id: &str, confidence: f64, reviewed_days_ago: Option<i64>) -> TopicNode {
        let now = Utc::now();
        TopicNode {
            id: id.to_string(),
            label: id.to_string(),
            confidence,
            last_reviewed: reviewed_days_ago.map(|d| now - Duration::days(d)),
            times_reviewed: if reviewed_days_ago.is_some() { 1 } else { 0 },
            mastered: false,
            notes: String::new(),
            resources: Vec::new(),
            subtopics: Vec::new(),
            parent_topics: Vec::new(),
        }
    }

    #[test]
    fn low_confidence_always_needs_review() {
        let now = Utc::now();
        assert!(needs_review(&topic("a", 0.35, None), now));
        assert!(needs_review(&topic("b", 0.0, Some(0)), now));
        assert!(needs_review(&topic("c", 0.39, Some(1)), now));
    }

    #[test]
    fn unreviewed_confident_topic_is_left_alone() {
        let now = Utc::now();
        assert!(!needs_review(&topic("a", 0.4, None), now));
        assert!(!needs_review(&topic("b", 0.9, None), now));
    }

    #[test]
    fn high_confidence_decays_after_seven_days() {
        let now = Utc::now();
        assert!(!needs_review(&topic("a", 0.8, Some(6)), now));
        assert!(needs_review(&topic("b", 0.8, Some(8)), now));
    }

    #[test]
    fn mid_confidence_decays_after_three_days() {
        let now = Utc::now();
        assert!(!needs_review(&topic("a", 0.5, Some(2)), now));
        assert!(needs_review(&topic("b", 0.5, Some(4)), now));
        // 0.7 sits in the short tier; the long tier starts strictly above it.
        assert!(needs_review(&topic("c", 0.7, Some(4)), now));
        assert!(!needs_review(&topic("d", 0.71, Some(4)), now));
    }

    #[test]
    fn queue_orders_most_at_risk_first() {
        let now = Utc::now();
        let nodes = vec![
            topic("a", 0.9, Some(10)),
            topic("b", 0.2, None),
            topic("c", 0.5, Some(5)),
        ];
        let queue = review_queue(&nodes, now);
        let order: Vec<&str> = queue.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_collection_order() {
        let now = Utc::now();
        let nodes = vec![
            topic("first", 0.2, None),
            topic("second", 0.2, None),
            topic("third", 0.2, None),
        ];
        let queue = review_queue(&nodes, now);
        let order: Vec<&str> = queue.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
    }

    #[test]
    fn queue_excludes_fresh_topics() {
        let now = Utc::now();
        let nodes = vec![topic("a", 0.8, Some(1)), topic("b", 0.45, Some(1))];
        assert!(review_queue(&nodes, now).is_empty());
    }
}
