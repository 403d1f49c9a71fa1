//! Framework context introspection.

use std::collections::HashSet;

use tracing::debug;

use crate::label::{Provenance, SourceLabel};
use crate::page::{ContextGraph, ContextValue, ElementSnapshot, NodeId, Page};

/// Property names that may hold a source name, in preference order.
pub const SOURCE_PROPERTIES: &[&str] = &[
    "source",
    "sourceTitle",
    "fileName",
    "filename",
    "title",
    "name",
];

pub(super) async fn resolve(
    page: &dyn Page,
    element: &ElementSnapshot,
    depth_limit: usize,
) -> Option<SourceLabel> {
    let graph = match page.framework_context(&element.handle).await {
        Ok(Some(graph)) => graph,
        Ok(None) => return None,
        Err(e) => {
            debug!("Framework context unavailable for {:?}: {}", element.handle, e);
            return None;
        }
    };

    find_source_property(&graph, depth_limit)
        .map(|name| SourceLabel::exact(name, Provenance::Introspection))
}

/// Depth-first search for the first non-empty source-like string property.
///
/// Nodes are visited at most once, and nothing deeper than `depth_limit`
/// levels below the root is inspected.
pub fn find_source_property(graph: &ContextGraph, depth_limit: usize) -> Option<String> {
    let mut visited = HashSet::new();
    search(graph, graph.root, 0, depth_limit, &mut visited)
}

fn search(
    graph: &ContextGraph,
    id: NodeId,
    depth: usize,
    depth_limit: usize,
    visited: &mut HashSet<NodeId>,
) -> Option<String> {
    if depth > depth_limit || !visited.insert(id) {
        return None;
    }
    let node = graph.nodes.get(id)?;

    for property in SOURCE_PROPERTIES {
        let hit = node.fields.iter().find_map(|(name, value)| match value {
            ContextValue::String(s) if name == property && !s.trim().is_empty() => {
                Some(s.trim().to_string())
            }
            _ => None,
        });
        if hit.is_some() {
            return hit;
        }
    }

    node.fields.iter().find_map(|(_, value)| match value {
        ContextValue::Ref(child) => search(graph, *child, depth + 1, depth_limit, visited),
        _ => None,
    })
}
