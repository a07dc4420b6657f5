use std::collections::{HashMap, HashSet, VecDeque};

use crate::store::{GraphEdge, Relationship, TopicNode};

/// Every topic adjacent to `node_id`, regardless of edge direction or type.
/// Edge endpoints that no longer resolve to a node are skipped and logged
/// rather than failing the query; a dangling reference means the store's
/// cascade invariant was violated upstream.
pub fn related_nodes<'a>(
    nodes: &'a [TopicNode],
    edges: &[GraphEdge],
    node_id: &str,
) -> Vec<&'a TopicNode> {
    let mut neighbor_ids: HashSet<&str> = HashSet::new();
    for edge in edges {
        if edge.source == node_id && edge.target != node_id {
            neighbor_ids.insert(edge.target.as_str());
        } else if edge.target == node_id && edge.source != node_id {
            neighbor_ids.insert(edge.source.as_str());
        }
    }

    let mut resolved = Vec::new();
    for node in nodes {
        if neighbor_ids.remove(node.id.as_str()) {
            resolved.push(node);
        }
    }
    for dangling in neighbor_ids {
        tracing::warn!(topic = %node_id, missing = %dangling, "skipping dangling edge reference");
    }
    resolved
}

/// All prerequisite topics of `node_id`, direct and transitive. Prerequisite
/// edges point from the prerequisite to the topic that requires it.
pub fn prerequisites<'a>(
    nodes: &'a [TopicNode],
    edges: &[GraphEdge],
    node_id: &str,
) -> Vec<&'a TopicNode> {
    let mut prereq_ids: HashSet<&str> = HashSet::new();
    let mut to_visit = vec![node_id];

    while let Some(current) = to_visit.pop() {
        for edge in edges {
            if edge.relationship == Relationship::Prerequisite
                && edge.target == current
                && !prereq_ids.contains(edge.source.as_str())
            {
                prereq_ids.insert(edge.source.as_str());
                to_visit.push(edge.source.as_str());
            }
        }
    }

    resolve_in_order(nodes, node_id, prereq_ids)
}

/// Topics that directly require `node_id` as a prerequisite.
pub fn dependents<'a>(
    nodes: &'a [TopicNode],
    edges: &[GraphEdge],
    node_id: &str,
) -> Vec<&'a TopicNode> {
    let dependent_ids: HashSet<&str> = edges
        .iter()
        .filter(|e| e.relationship == Relationship::Prerequisite && e.source == node_id)
        .map(|e| e.target.as_str())
        .collect();

    resolve_in_order(nodes, node_id, dependent_ids)
}

/// Shortest directed path from `start` to `end`, following edges of any
/// relationship type. `None` when either endpoint is missing or no path
/// exists. Edge targets that no longer resolve are skipped and logged.
pub fn learning_path<'a>(
    nodes: &'a [TopicNode],
    edges: &[GraphEdge],
    start: &str,
    end: &str,
) -> Option<Vec<&'a TopicNode>> {
    let by_id: HashMap<&str, &'a TopicNode> =
        nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    if !by_id.contains_key(start) || !by_id.contains_key(end) {
        return None;
    }
    if start == end {
        return by_id.get(start).map(|node| vec![*node]);
    }

    let mut came_from: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for edge in edges {
            if edge.source != current {
                continue;
            }
            let next = edge.target.as_str();
            if next == start || came_from.contains_key(next) {
                continue;
            }
            if !by_id.contains_key(next) {
                tracing::warn!(topic = %current, missing = %next, "skipping dangling edge reference");
                continue;
            }
            came_from.insert(next, current);
            if next == end {
                let mut ids = vec![next];
                let mut cursor = next;
                while let Some(&prev) = came_from.get(cursor) {
                    ids.push(prev);
                    cursor = prev;
                }
                ids.reverse();
                return Some(ids.into_iter().filter_map(|id| by_id.get(id).copied()).collect());
            }
            queue.push_back(next);
        }
    }
    None
}

/// Unmastered topics whose direct prerequisites are all mastered: the
/// frontier a learner is ready to start on. A prerequisite that no longer
/// resolves to a node blocks its dependents rather than counting as met.
pub fn next_topics<'a>(nodes: &'a [TopicNode], edges: &[GraphEdge]) -> Vec<&'a TopicNode> {
    let mastered: HashSet<&str> = nodes
        .iter()
        .filter(|n| n.mastered)
        .map(|n| n.id.as_str())
        .collect();

    nodes
        .iter()
        .filter(|node| !node.mastered)
        .filter(|node| {
            edges
                .iter()
                .filter(|e| e.relationship == Relationship::Prerequisite && e.target == node.id)
                .all(|e| mastered.contains(e.source.as_str()))
        })
        .collect()
}

/// Edges touching `node_id`, for callers that want to distinguish
/// relationship type and direction.
pub fn edges_of<'a>(edges: &'a [GraphEdge], node_id: &str) -> Vec<&'a GraphEdge> {
    edges
        .iter()
        .filter(|e| e.source == node_id || e.target == node_id)
        .collect()
}

fn resolve_in_order<'a>(
    nodes: &'a [TopicNode],
    origin: &str,
    mut ids: HashSet<&str>,
) -> Vec<&'a TopicNode> {
    let mut resolved = Vec::new();
    for node in nodes {
        if ids.remove(node.id.as_str()) {
            resolved.push(node);
        }
    }
    for dangling in ids {
        tracing::warn!(topic = %origin, missing = %dangling, "skipping dangling edge reference");
    }
    resolved
}
