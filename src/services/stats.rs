use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::review;
use crate::store::TopicNode;

const WEAK_THRESHOLD: f64 = 0.3;
const EXTREMES_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicConfidence {
    pub topic_id: String,
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStatistics {
    pub total_topics: usize,
    pub average_confidence: f64,
    pub topics_studied: usize,
    pub topics_mastered: usize,
    pub topics_weak: usize,
    pub topics_needing_review: usize,
    pub most_confident: Vec<TopicConfidence>,
    pub least_confident: Vec<TopicConfidence>,
}

/// Derived counts and averages over a node snapshot. Recomputed fresh on
/// every call; nothing here caches or mutates.
pub fn compute(nodes: &[TopicNode], now: DateTime<Utc>) -> GraphStatistics {
    let total_topics = nodes.len();
    let average_confidence = if total_topics == 0 {
        0.0
    } else {
        nodes.iter().map(|n| n.confidence).sum::<f64>() / total_topics as f64
    };

    let mut pairs: Vec<TopicConfidence> = nodes
        .iter()
        .map(|n| TopicConfidence {
            topic_id: n.id.clone(),
            label: n.label.clone(),
            confidence: n.confidence,
        })
        .collect();
    pairs.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));

    let least_confident: Vec<TopicConfidence> =
        pairs.iter().take(EXTREMES_LIMIT).cloned().collect();
    let most_confident: Vec<TopicConfidence> =
        pairs.iter().rev().take(EXTREMES_LIMIT).cloned().collect();

    GraphStatistics {
        total_topics,
        average_confidence,
        topics_studied: nodes.iter().filter(|n| n.times_reviewed > 0).count(),
        topics_mastered: nodes.iter().filter(|n| n.mastered).count(),
        topics_weak: nodes.iter().filter(|n| n.confidence < WEAK_THRESHOLD).count(),
        topics_needing_review: nodes.iter().filter(|n| review::needs_review(n, now)).count(),
        most_confident,
        least_confident,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: &str, confidence: f64, times_reviewed: u32, mastered: bool) -> TopicNode {
        TopicNode {
            id: id.to_string(),
            label: id.to_string(),
            confidence,
            last_reviewed: None,
            times_reviewed,
            mastered,
            notes: String::new(),
            resources: Vec::new(),
            subtopics: Vec::new(),
            parent_topics: Vec::new(),
        }
    }

    #[test]
    fn empty_graph_yields_zeroes() {
        let stats = compute(&[], Utc::now());
        assert_eq!(stats.total_topics, 0);
        assert_eq!(stats.average_confidence, 0.0);
        assert!(stats.most_confident.is_empty());
    }

    #[test]
    fn counts_and_average() {
        let nodes = vec![
            topic("a", 0.2, 3, false),
            topic("b", 0.6, 0, false),
            topic("c", 1.0, 5, true),
        ];
        let stats = compute(&nodes, Utc::now());
        assert_eq!(stats.total_topics, 3);
        assert!((stats.average_confidence - 0.6).abs() < 1e-9);
        assert_eq!(stats.topics_studied, 2);
        assert_eq!(stats.topics_mastered, 1);
        assert_eq!(stats.topics_weak, 1);
        // only "a" trips the low-confidence rule; b and c were never reviewed
        assert_eq!(stats.topics_needing_review, 1);
    }

    #[test]
    fn extremes_are_ordered_and_capped() {
        let nodes: Vec<TopicNode> = (0..8)
            .map(|i| topic(&format!("t{i}"), i as f64 / 10.0, 0, false))
            .collect();
        let stats = compute(&nodes, Utc::now());
        assert_eq!(stats.least_confident.len(), 5);
        assert_eq!(stats.most_confident.len(), 5);
        assert_eq!(stats.least_confident[0].topic_id, "t0");
        assert_eq!(stats.most_confident[0].topic_id, "t7");
    }
}
