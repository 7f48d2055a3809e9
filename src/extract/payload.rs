//! Serialized-payload extraction.
//!
//! The third state encoding is a flat JSON array serializing a deduplicated
//! object graph: each unique value is stored once, and containers refer to
//! their children by integer index. The resolver is iterative (bounded stack
//! depth regardless of graph shape), memoizes resolved nodes, and marks
//! in-progress nodes so reference cycles fail the strategy instead of
//! looping.

use serde_json::{Map, Value};

use crate::extract::hydration::collect_channels;
use crate::models::LinksData;

/// Applies the serialized-payload strategy to a script body.
///
/// The script content must be a flat JSON array; element 0 is the graph root.
pub fn extract_payload(content: &str) -> Option<LinksData> {
    let trimmed = content.trim();
    if !trimmed.starts_with('[') {
        return None;
    }
    let nodes: Vec<Value> = serde_json::from_str(trimmed).ok()?;
    if nodes.is_empty() {
        return None;
    }

    let root = resolve_graph(&nodes)?;
    let mut links = Vec::new();
    collect_channels(&root, &mut links);
    if links.is_empty() {
        return None;
    }
    Some(LinksData { links })
}

#[derive(Clone, Copy, PartialEq)]
enum NodeState {
    Unresolved,
    InProgress,
    Done,
}

/// Resolves node 0 of a reference-graph payload.
///
/// Explicit post-order traversal: a node is pushed once for expansion and
/// once for assembly, with children resolved in between. Popping a node for
/// expansion while it is already in progress means it is its own ancestor,
/// which is a cycle.
fn resolve_graph(nodes: &[Value]) -> Option<Value> {
    let mut state = vec![NodeState::Unresolved; nodes.len()];
    let mut memo: Vec<Option<Value>> = vec![None; nodes.len()];
    let mut stack: Vec<(usize, bool)> = vec![(0, false)];

    while let Some((idx, assemble)) = stack.pop() {
        if state[idx] == NodeState::Done {
            continue;
        }
        if assemble {
            let resolved = assemble_node(&nodes[idx], &memo)?;
            memo[idx] = Some(resolved);
            state[idx] = NodeState::Done;
            continue;
        }
        if state[idx] == NodeState::InProgress {
            log::debug!("Reference cycle through payload node {idx}");
            return None;
        }
        state[idx] = NodeState::InProgress;
        stack.push((idx, true));
        for child in child_refs(&nodes[idx]) {
            if child >= nodes.len() {
                return None;
            }
            if state[child] != NodeState::Done {
                stack.push((child, false));
            }
        }
    }

    memo[0].take()
}

/// Child node indices referenced by a container node.
fn child_refs(node: &Value) -> Vec<usize> {
    match node {
        Value::Object(map) => map.values().filter_map(node_index).collect(),
        Value::Array(items) => items.iter().filter_map(node_index).collect(),
        _ => Vec::new(),
    }
}

/// Inside containers, non-negative integers are node references.
fn node_index(value: &Value) -> Option<usize> {
    value.as_u64().map(|i| i as usize)
}

/// Rebuilds one node from its already-resolved children.
fn assemble_node(node: &Value, memo: &[Option<Value>]) -> Option<Value> {
    match node {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                out.insert(key.clone(), resolve_ref(value, memo)?);
            }
            Some(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve_ref(item, memo)?);
            }
            Some(Value::Array(out))
        }
        leaf => Some(leaf.clone()),
    }
}

fn resolve_ref(value: &Value, memo: &[Option<Value>]) -> Option<Value> {
    match node_index(value) {
        Some(idx) => memo.get(idx)?.clone(),
        // Negative integers are serializer sentinels (undefined and friends)
        None if value.is_i64() => Some(Value::Null),
        None => Some(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChannelLink;

    // Graph: root {channels: -> [ -> {name,url}, -> {name,url} ]}
    const PAYLOAD: &str = r#"[
        {"channels": 1},
        [2, 4],
        {"name": 3, "url": 5},
        "Ch1",
        {"name": 6, "url": 7},
        "acestream://a",
        "Ch2",
        "acestream://b"
    ]"#;

    #[test]
    fn test_resolves_indexed_graph() {
        let data = extract_payload(PAYLOAD).unwrap();
        assert_eq!(
            data.links,
            vec![
                ChannelLink {
                    name: "Ch1".into(),
                    url: "acestream://a".into()
                },
                ChannelLink {
                    name: "Ch2".into(),
                    url: "acestream://b".into()
                },
            ]
        );
    }

    #[test]
    fn test_shared_nodes_resolve_once() {
        // Both channels reference the same name node (diamond, not a cycle)
        let payload = r#"[
            {"channels": 1},
            [2, 3],
            {"name": 4, "url": 5},
            {"name": 4, "url": 6},
            "Shared",
            "acestream://a",
            "acestream://b"
        ]"#;
        let data = extract_payload(payload).unwrap();
        assert_eq!(data.links.len(), 2);
        assert_eq!(data.links[0].name, "Shared");
        assert_eq!(data.links[1].name, "Shared");
    }

    #[test]
    fn test_cycle_fails_strategy() {
        let payload = r#"[{"channels": 1}, [2], {"name": 3, "self": 2, "url": 4}, "Ch", "u"]"#;
        assert!(extract_payload(payload).is_none());
    }

    #[test]
    fn test_out_of_range_reference_fails() {
        let payload = r#"[{"channels": 9}]"#;
        assert!(extract_payload(payload).is_none());
    }

    #[test]
    fn test_non_array_is_no_match() {
        assert!(extract_payload("{\"channels\": []}").is_none());
        assert!(extract_payload("var x = 1;").is_none());
    }

    #[test]
    fn test_array_without_channels_is_no_match() {
        assert!(extract_payload("[1, 2, 3]").is_none());
    }
}
