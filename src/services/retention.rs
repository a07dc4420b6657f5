use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::store::TopicNode;

const STABILITY_BASE: f64 = 1.5;
const MAX_COUNTED_REVIEWS: u32 = 10;
const POST_REVIEW_GROWTH: f64 = 1.5;
const PREDICTION_STEPS: usize = 5;

/// Probability the learner still recalls a topic after `elapsed_days`, given
/// a memory stability measured in days: R = (1 + t / (9 S))^-1.
pub fn retention(stability: f64, elapsed_days: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let r = (1.0 + elapsed_days.max(0.0) / (9.0 * stability)).powi(-1);
    r.clamp(0.0, 1.0)
}

/// Interval that keeps retention at `desired_retention`, solved from the
/// retention curve: t = 9 S (R^-1 - 1).
pub fn optimal_interval(stability: f64, desired_retention: f64) -> f64 {
    if desired_retention >= 1.0 {
        return 0.0;
    }
    let interval = 9.0 * stability * (desired_retention.max(1e-4).powi(-1) - 1.0);
    interval.max(0.0)
}

/// Rough stability estimate from what the node model carries: review count
/// compounds the base, confidence scales it.
pub fn estimate_stability(node: &TopicNode) -> f64 {
    let counted = node.times_reviewed.min(MAX_COUNTED_REVIEWS);
    let base = STABILITY_BASE.powi(counted as i32);
    let confidence_multiplier = 0.5 + node.confidence;
    (base * confidence_multiplier).max(1.0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRetention {
    pub topic_id: String,
    pub retention: f64,
    pub stability_days: f64,
    pub days_since_review: f64,
}

/// Current retention for a reviewed topic; `None` when it was never reviewed.
pub fn topic_retention(node: &TopicNode, now: DateTime<Utc>) -> Option<TopicRetention> {
    let last = node.last_reviewed?;
    let elapsed = (now - last).num_seconds() as f64 / 86_400.0;
    let stability = estimate_stability(node);
    Some(TopicRetention {
        topic_id: node.id.clone(),
        retention: retention(stability, elapsed),
        stability_days: stability,
        days_since_review: elapsed,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPrediction {
    pub review_number: usize,
    pub date: DateTime<Utc>,
    pub interval_days: f64,
    pub predicted_retention: f64,
    pub stability_days: f64,
}

/// Projects the next five review dates, assuming each review succeeds and
/// grows stability by a fixed factor.
pub fn predict_review_dates(
    node: &TopicNode,
    desired_retention: f64,
) -> Vec<ReviewPrediction> {
    let Some(last_reviewed) = node.last_reviewed else {
        return Vec::new();
    };

    let mut predictions = Vec::with_capacity(PREDICTION_STEPS);
    let mut current_date = last_reviewed;
    let mut stability = estimate_stability(node);

    for step in 0..PREDICTION_STEPS {
        let interval = optimal_interval(stability, desired_retention);
        let next_date = current_date + Duration::seconds((interval * 86_400.0) as i64);
        predictions.push(ReviewPrediction {
            review_number: step + 1,
            date: next_date,
            interval_days: interval,
            predicted_retention: retention(stability, interval),
            stability_days: stability,
        });
        current_date = next_date;
        stability *= POST_REVIEW_GROWTH;
    }

    predictions
}
