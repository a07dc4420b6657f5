use serde::{Deserialize, Serialize};

use crate::store::TopicNode;

/// Composable node predicates. Every field is optional; an absent field means
/// "no constraint", never "false". Present clauses AND together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_mastered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_unreviewed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl GraphFilter {
    pub fn matches(&self, node: &TopicNode) -> bool {
        if let Some(min) = self.min_confidence {
            if node.confidence < min {
                return false;
            }
        }
        if let Some(max) = self.max_confidence {
            if node.confidence > max {
                return false;
            }
        }
        if self.show_mastered == Some(false) && node.mastered {
            return false;
        }
        if self.show_unreviewed == Some(false) && node.last_reviewed.is_none() {
            return false;
        }
        if let Some(query) = &self.search_query {
            let query = query.trim().to_lowercase();
            if !query.is_empty()
                && !node.label.to_lowercase().contains(&query)
                && !node.notes.to_lowercase().contains(&query)
            {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, nodes: &[TopicNode]) -> Vec<TopicNode> {
        nodes.iter().filter(|n| self.matches(n)).cloned().collect()
    }
}
