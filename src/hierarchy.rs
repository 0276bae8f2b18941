//! Hierarchy helpers (spec §4.2): absolute/relative position resolution,
//! nesting rules, and the depth-20 guard used everywhere an ancestor chain
//! or descendant tree is walked (spec §9).

use crate::ids::NodeId;
use crate::model::geometry::Point;
use crate::model::node::Node;
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;

/// Ancestor-chain and descendant-tree walks never go deeper than this
/// (spec §3, §9) — a real cycle is refused at write time, so this bound
/// only protects against already-malformed data.
pub const MAX_NESTING_DEPTH: usize = 20;

/// Walks the `parent_id` chain from `node_id`, summing relative positions,
/// bounded to [`MAX_NESTING_DEPTH`]. Beyond the bound this returns the
/// best-effort partial sum rather than throwing (spec §4.2).
pub fn resolve_absolute(node_id: &NodeId, nodes: &HashMap<NodeId, &Node>) -> Point {
    let mut total = Point::ZERO;
    let mut current = match nodes.get(node_id) {
        Some(node) => *node,
        None => return total,
    };
    total = total + current.position;

    for _ in 0..MAX_NESTING_DEPTH {
        let Some(parent_id) = &current.parent_id else { break };
        let Some(parent) = nodes.get(parent_id) else { break };
        current = *parent;
        total = total + current.position;
    }
    total
}

/// Simple subtraction (spec §4.2).
pub fn to_relative(absolute: Point, parent_absolute: Point) -> Point {
    absolute - parent_absolute
}

/// `canNestInOrganizer` (spec §4.2): true iff `node` is a construct, or
/// `node` is a wagon whose owner construct already has
/// `parent_id == target_organizer.id`. Non-wagon organizers can never nest
/// inside another organizer.
pub fn can_nest_in_organizer(node: &Node, target_organizer: &Node, nodes: &HashMap<NodeId, &Node>) -> bool {
    if node.is_construct() {
        return true;
    }
    let Some(organizer) = node.data.as_organizer() else { return false };
    let Some(owner_semantic_id) = &organizer.attached_to_semantic_id else {
        // Non-wagon organizer.
        return false;
    };
    nodes
        .values()
        .find(|n| n.data.as_construct().is_some_and(|c| &c.semantic_id == owner_semantic_id))
        .is_some_and(|owner| owner.parent_id.as_ref() == Some(&target_organizer.id))
}

/// Builds the `NodeId -> &Node` lookup table [`resolve_absolute`] and
/// [`can_nest_in_organizer`] expect, from a page's node collection.
pub fn index_by_id(nodes: &[Node]) -> HashMap<NodeId, &Node> {
    nodes.iter().map(|n| (n.id.clone(), n)).collect()
}

/// True iff setting `node_id`'s parent to `new_parent_id` would close a
/// `parentId` cycle (spec §3, §7: "writes that would violate a structural
/// invariant (cycle, dangling parent) throw InvariantViolation"). Builds a
/// `petgraph::graphmap::DiGraphMap` of the page's current child->parent
/// edges and checks whether `node_id` is already an ancestor of
/// `new_parent_id` — the adapter rejects the write at that point rather
/// than relying on the depth guard above to mask it.
pub fn would_create_cycle(node_id: &NodeId, new_parent_id: &NodeId, nodes: &HashMap<NodeId, &Node>) -> bool {
    if node_id == new_parent_id {
        return true;
    }
    let index_of: HashMap<&NodeId, usize> = nodes.keys().enumerate().map(|(i, id)| (id, i)).collect();
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    for &index in index_of.values() {
        graph.add_node(index);
    }
    for (id, node) in nodes {
        let Some(parent_id) = &node.parent_id else { continue };
        if let (Some(&child_idx), Some(&parent_idx)) = (index_of.get(id), index_of.get(parent_id)) {
            graph.add_edge(child_idx, parent_idx, ());
        }
    }
    let (Some(&new_parent_idx), Some(&node_idx)) = (index_of.get(new_parent_id), index_of.get(node_id)) else {
        return false;
    };
    has_path_connecting(&graph, new_parent_idx, node_idx, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{ConstructData, NodeData, OrganizerData, OrganizerLayout};

    fn construct(id: &str, parent: Option<&str>, x: f64, y: f64) -> Node {
        Node {
            id: NodeId::new(id),
            position: Point::new(x, y),
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

    fn organizer(id: &str, parent: Option<&str>, x: f64, y: f64, wagon_of: Option<&str>) -> Node {
        Node {
            id: NodeId::new(id),
            position: Point::new(x, y),
            parent_id: parent.map(NodeId::new),
            width: None,
            height: None,
            style_size: None,
            measured: None,
            data: NodeData::Organizer(OrganizerData {
                name: id.into(),
                color: "#fff".into(),
                collapsed: false,
                layout: OrganizerLayout::Freeform,
                attached_to_semantic_id: wagon_of.map(str::to_string),
            }),
        }
    }

    #[test]
    fn resolves_nested_absolute_position() {
        let nodes = vec![organizer("org", None, 100.0, 100.0), construct("n", Some("org"), 50.0, 50.0)];
        let by_id = index_by_id(&nodes);
        let abs = resolve_absolute(&NodeId::new("n"), &by_id);
        assert_eq!(abs, Point::new(150.0, 150.0));
    }

    #[test]
    fn bounds_depth_without_throwing() {
        let mut nodes = Vec::new();
        for i in 0..30 {
            let parent = if i == 0 { None } else { Some(format!("o{}", i - 1)) };
            nodes.push(organizer(&format!("o{i}"), parent.as_deref(), 1.0, 1.0, None));
        }
        let by_id = index_by_id(&nodes);
        // 30 levels deep, but the walk stops after MAX_NESTING_DEPTH hops.
        let abs = resolve_absolute(&NodeId::new("o29"), &by_id);
        assert!(abs.x <= (MAX_NESTING_DEPTH as f64) + 1.0);
    }

    #[test]
    fn wagon_nests_only_under_owner_constructs_parent() {
        let nodes = vec![
            organizer("target", None, 0.0, 0.0, None),
            construct("owner", Some("target"), 0.0, 0.0),
            organizer("wagon", Some("owner"), 0.0, 0.0, Some("owner")),
            organizer("other", None, 0.0, 0.0, None),
        ];
        let by_id = index_by_id(&nodes);
        let wagon = by_id.get(&NodeId::new("wagon")).unwrap();
        let target = by_id.get(&NodeId::new("target")).unwrap();
        let other = by_id.get(&NodeId::new("other")).unwrap();
        assert!(can_nest_in_organizer(wagon, target, &by_id));
        assert!(!can_nest_in_organizer(wagon, other, &by_id));
    }

    #[test]
    fn non_wagon_organizer_never_nests() {
        let nodes = vec![organizer("a", None, 0.0, 0.0, None), organizer("b", None, 0.0, 0.0, None)];
        let by_id = index_by_id(&nodes);
        let a = by_id.get(&NodeId::new("a")).unwrap();
        let b = by_id.get(&NodeId::new("b")).unwrap();
        assert!(!can_nest_in_organizer(a, b, &by_id));
    }

    #[test]
    fn reparenting_under_own_descendant_is_a_cycle() {
        // org -> a -> b (b's parent is a)
        let nodes = vec![
            organizer("org", None, 0.0, 0.0, None),
            organizer("a", Some("org"), 0.0, 0.0, None),
            organizer("b", Some("a"), 0.0, 0.0, None),
        ];
        let by_id = index_by_id(&nodes);
        // Reparenting "a" under its own child "b" would close a loop.
        assert!(would_create_cycle(&NodeId::new("a"), &NodeId::new("b"), &by_id));
        // Reparenting "b" under "org" (an existing ancestor) is not a cycle.
        assert!(!would_create_cycle(&NodeId::new("b"), &NodeId::new("org"), &by_id));
    }

    #[test]
    fn reparenting_under_self_is_a_cycle() {
        let nodes = vec![organizer("a", None, 0.0, 0.0, None)];
        let by_id = index_by_id(&nodes);
        assert!(would_create_cycle(&NodeId::new("a"), &NodeId::new("a"), &by_id));
    }
}
