//! Presentation pipeline (spec §4.6): a pure, total function of
//! `(nodes, edges) -> {processed_nodes, processed_edges, edge_remap}`. Four
//! deterministic stages run in order: collapsed set, hidden descendants,
//! edge remap to topmost collapsed ancestor, and edge aggregation with
//! bundle counts and self-loop elimination.

use crate::ids::{EdgeId, NodeId};
use crate::model::edge::Edge;
use crate::model::node::Node;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::VecDeque;

use crate::hierarchy::MAX_NESTING_DEPTH;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedNode {
    pub id: NodeId,
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedEdge {
    pub source: NodeId,
    pub target: NodeId,
    /// Ids of the original edges this processed edge represents; `len() > 1`
    /// iff this edge is an aggregate of edges that remapped to the same
    /// `(source, target)` pair across containers.
    pub member_edge_ids: Vec<EdgeId>,
    pub bundle_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationResult {
    pub processed_nodes: Vec<ProcessedNode>,
    pub processed_edges: Vec<ProcessedEdge>,
    /// Effective endpoint for every node, hidden or not (hidden nodes map to
    /// their topmost collapsed ancestor; everything else maps to itself).
    pub edge_remap: FxHashMap<NodeId, NodeId>,
}

/// Runs the four-stage pipeline. `selected` lists nodes the caller wants
/// "unwrapped" — their own id is used as the remap target instead of any
/// collapsed ancestor, so a user actively working inside a collapsed
/// organizer still sees the real edges of what they selected (spec §4.6).
pub fn compute_presentation(nodes: &[Node], edges: &[Edge], selected: &FxHashSet<NodeId>) -> PresentationResult {
    let by_id: FxHashMap<NodeId, &Node> = nodes.iter().map(|n| (n.id.clone(), n)).collect();
    let children_by_parent = group_by_parent(nodes);

    // Stage 1: collapsed set.
    let collapsed: FxHashSet<NodeId> = nodes
        .iter()
        .filter(|n| n.data.as_organizer().is_some_and(|o| o.collapsed))
        .map(|n| n.id.clone())
        .collect();

    // Stage 2: hidden descendants, BFS per collapsed organizer, depth-bound 20.
    let mut hidden: FxHashSet<NodeId> = FxHashSet::default();
    for root in &collapsed {
        bfs_mark_descendants(root, &children_by_parent, &mut hidden);
    }

    // Stage 3: edge remap — every node maps to itself unless hidden, in
    // which case it maps to the topmost collapsed ancestor on its chain.
    let mut edge_remap: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    for node in nodes {
        let target = if selected.contains(&node.id) {
            node.id.clone()
        } else if hidden.contains(&node.id) {
            topmost_collapsed_ancestor(&node.id, &by_id, &collapsed).unwrap_or_else(|| node.id.clone())
        } else {
            node.id.clone()
        };
        edge_remap.insert(node.id.clone(), target);
    }

    let processed_nodes = nodes
        .iter()
        .map(|n| ProcessedNode { id: n.id.clone(), hidden: hidden.contains(&n.id) && !selected.contains(&n.id) })
        .collect();

    // Stage 4: edge aggregation. An edge whose endpoints both remap to
    // themselves never left its original container, so it is emitted on its
    // own regardless of how many other edges happen to share the same pair
    // (spec §4.6: "Within the same container, keep individual"). Only edges
    // that actually crossed a collapsed boundary (at least one endpoint
    // remapped to something other than itself) are grouped by their
    // remapped `(source', target')` pair and bundled.
    let mut groups: FxHashMap<(NodeId, NodeId), Vec<EdgeId>> = FxHashMap::default();
    let mut order: Vec<(NodeId, NodeId)> = Vec::new();
    let mut individual: Vec<ProcessedEdge> = Vec::new();

    for edge in edges {
        let Some(source) = edge_remap.get(&edge.source) else { continue };
        let Some(target) = edge_remap.get(&edge.target) else { continue };
        if source == target {
            continue; // self-loop after remap, dropped.
        }
        if source == &edge.source && target == &edge.target {
            individual.push(ProcessedEdge {
                source: source.clone(),
                target: target.clone(),
                bundle_count: 1,
                member_edge_ids: vec![edge.id.clone()],
            });
            continue;
        }
        let key = (source.clone(), target.clone());
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(edge.id.clone());
    }

    let mut processed_edges = individual;
    processed_edges.extend(order.into_iter().map(|key @ (ref source, ref target)| {
        let members = groups.remove(&key).unwrap_or_default();
        ProcessedEdge {
            source: source.clone(),
            target: target.clone(),
            bundle_count: members.len(),
            member_edge_ids: members,
        }
    }));

    PresentationResult { processed_nodes, processed_edges, edge_remap }
}

fn group_by_parent(nodes: &[Node]) -> FxHashMap<NodeId, Vec<NodeId>> {
    let mut map: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for node in nodes {
        if let Some(parent) = &node.parent_id {
            map.entry(parent.clone()).or_default().push(node.id.clone());
        }
    }
    map
}

fn bfs_mark_descendants(root: &NodeId, children_by_parent: &FxHashMap<NodeId, Vec<NodeId>>, hidden: &mut FxHashSet<NodeId>) {
    let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
    queue.push_back((root.clone(), 0));
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    visited.insert(root.clone());

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= MAX_NESTING_DEPTH {
            continue;
        }
        let Some(children) = children_by_parent.get(&current) else { continue };
        for child in children {
            if visited.insert(child.clone()) {
                hidden.insert(child.clone());
                queue.push_back((child.clone(), depth + 1));
            }
        }
    }
}

/// Walks `node_id`'s ancestor chain, remembering the highest collapsed
/// organizer seen (spec §4.6, scenario 4: nested collapsed organizers remap
/// to the outermost one).
fn topmost_collapsed_ancestor(node_id: &NodeId, by_id: &FxHashMap<NodeId, &Node>, collapsed: &FxHashSet<NodeId>) -> Option<NodeId> {
    let mut current = by_id.get(node_id)?.parent_id.clone();
    let mut topmost = None;
    for _ in 0..MAX_NESTING_DEPTH {
        let Some(parent_id) = current else { break };
        if collapsed.contains(&parent_id) {
            topmost = Some(parent_id.clone());
        }
        current = by_id.get(&parent_id).and_then(|n| n.parent_id.clone());
    }
    topmost
}

/// `traceGraph` (spec §4.6): shortest-path distances from `start` via BFS
/// over `edges`, treated as directed; cycles are naturally handled by the
/// visited set. Returns per-node distance and the max distance reached.
pub struct GraphTrace {
    pub distances: FxHashMap<NodeId, usize>,
    pub max_depth: usize,
}

pub fn trace_graph(start: &NodeId, edges: &[(NodeId, NodeId)]) -> GraphTrace {
    let mut adjacency: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for (source, target) in edges {
        adjacency.entry(source.clone()).or_default().push(target.clone());
    }

    let mut distances: FxHashMap<NodeId, usize> = FxHashMap::default();
    distances.insert(start.clone(), 0);
    let mut queue = VecDeque::new();
    queue.push_back(start.clone());
    let mut max_depth = 0;

    while let Some(current) = queue.pop_front() {
        let depth = distances[&current];
        let Some(neighbors) = adjacency.get(&current) else { continue };
        for neighbor in neighbors {
            if !distances.contains_key(neighbor) {
                distances.insert(neighbor.clone(), depth + 1);
                max_depth = max_depth.max(depth + 1);
                queue.push_back(neighbor.clone());
            }
        }
    }

    GraphTrace { distances, max_depth }
}

/// Per-edge distance: the distance of the edge's target from `start`, per a
/// prior [`trace_graph`] call (spec §4.6 "per-edge distances equal to the
/// distance of their target").
pub fn edge_distance(trace: &GraphTrace, edge: &(NodeId, NodeId)) -> Option<usize> {
    trace.distances.get(&edge.1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{ConstructData, NodeData, OrganizerData, OrganizerLayout};
    use crate::model::geometry::Point;

    fn construct(id: &str, parent: Option<&str>) -> Node {
        Node {
            id: NodeId::new(id),
            position: Point::ZERO,
            parent_id: parent.map(NodeId::new),
            width: None,
            height: None,
            style_size: None,
            measured: None,
            data: NodeData::Construct(ConstructData {
                construct_type: "service".into(),
                semantic_id: id.into(),
                values: Default::default(),
                connections: Vec::new(),
                deployable_id: None,
            }),
        }
    }

    fn organizer(id: &str, parent: Option<&str>, collapsed: bool) -> Node {
        Node {
            id: NodeId::new(id),
            position: Point::ZERO,
            parent_id: parent.map(NodeId::new),
            width: None,
            height: None,
            style_size: None,
            measured: None,
            data: NodeData::Organizer(OrganizerData {
                name: id.into(),
                color: "#fff".into(),
                collapsed,
                layout: OrganizerLayout::Freeform,
                attached_to_semantic_id: None,
            }),
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge {
            id: EdgeId::new(id),
            source: NodeId::new(source),
            target: NodeId::new(target),
            source_handle: None,
            target_handle: None,
            data: Default::default(),
        }
    }

    #[test]
    fn aggregates_edges_across_collapsed_organizers_with_bundle_count() {
        // Organizer O1 collapsed containing a1, a2; organizer O2 collapsed containing b1.
        let nodes = vec![
            organizer("o1", None, true),
            construct("a1", Some("o1")),
            construct("a2", Some("o1")),
            organizer("o2", None, true),
            construct("b1", Some("o2")),
        ];
        let edges = vec![edge("e1", "a1", "b1"), edge("e2", "a2", "b1")];
        let result = compute_presentation(&nodes, &edges, &FxHashSet::default());
        assert_eq!(result.processed_edges.len(), 1);
        let e = &result.processed_edges[0];
        assert_eq!(e.source, NodeId::new("o1"));
        assert_eq!(e.target, NodeId::new("o2"));
        assert_eq!(e.bundle_count, 2);
    }

    #[test]
    fn remaps_to_topmost_collapsed_ancestor() {
        // outer collapsed containing inner (also collapsed) containing deep.
        let nodes = vec![
            organizer("outer", None, true),
            organizer("inner", Some("outer"), true),
            construct("deep", Some("inner")),
        ];
        let result = compute_presentation(&nodes, &[], &FxHashSet::default());
        assert_eq!(result.edge_remap[&NodeId::new("deep")], NodeId::new("outer"));
        assert_eq!(result.edge_remap[&NodeId::new("inner")], NodeId::new("outer"));
        let deep = result.processed_nodes.iter().find(|n| n.id == NodeId::new("deep")).unwrap();
        let inner = result.processed_nodes.iter().find(|n| n.id == NodeId::new("inner")).unwrap();
        assert!(deep.hidden);
        assert!(inner.hidden);
    }

    #[test]
    fn self_loops_after_remap_are_dropped() {
        let nodes = vec![organizer("o1", None, true), construct("a1", Some("o1")), construct("a2", Some("o1"))];
        let edges = vec![edge("e1", "a1", "a2")];
        let result = compute_presentation(&nodes, &edges, &FxHashSet::default());
        assert!(result.processed_edges.is_empty());
    }

    #[test]
    fn within_same_container_edges_stay_individual() {
        let nodes = vec![construct("a", None), construct("b", None)];
        let edges = vec![edge("e1", "a", "b"), edge("e2", "a", "b")];
        let result = compute_presentation(&nodes, &edges, &FxHashSet::default());
        // Neither endpoint is remapped, so both edges keep their own
        // individual identity -- aggregation only groups edges that actually
        // crossed a collapsed boundary.
        assert_eq!(result.processed_edges.len(), 2);
        assert!(result.processed_edges.iter().all(|e| e.bundle_count == 1));
    }

    #[test]
    fn selected_nodes_are_unwrapped_even_if_hidden() {
        let nodes = vec![organizer("o1", None, true), construct("a1", Some("o1")), construct("b", None)];
        let edges = vec![edge("e1", "a1", "b")];
        let mut selected = FxHashSet::default();
        selected.insert(NodeId::new("a1"));
        let result = compute_presentation(&nodes, &edges, &selected);
        assert_eq!(result.processed_edges[0].source, NodeId::new("a1"));
        let a1 = result.processed_nodes.iter().find(|n| n.id == NodeId::new("a1")).unwrap();
        assert!(!a1.hidden);
    }

    #[test]
    fn trace_graph_computes_bfs_distances_and_max_depth() {
        let edges = vec![
            (NodeId::new("a"), NodeId::new("b")),
            (NodeId::new("b"), NodeId::new("c")),
            (NodeId::new("a"), NodeId::new("c")),
        ];
        let trace = trace_graph(&NodeId::new("a"), &edges);
        assert_eq!(trace.distances[&NodeId::new("a")], 0);
        assert_eq!(trace.distances[&NodeId::new("b")], 1);
        assert_eq!(trace.distances[&NodeId::new("c")], 1);
        assert_eq!(trace.max_depth, 1);
    }

    #[test]
    fn trace_graph_handles_cycles_without_hanging() {
        let edges = vec![(NodeId::new("a"), NodeId::new("b")), (NodeId::new("b"), NodeId::new("a"))];
        let trace = trace_graph(&NodeId::new("a"), &edges);
        assert_eq!(trace.distances.len(), 2);
    }
}
