//! Layout actions façade (spec §4.5): orchestrates the pure geometry
//! primitives, the wagon-aware glue, and adapter patches under the
//! **three-layer sync discipline** — read a geometry snapshot, run the
//! relevant primitive, commit `{id, position?/style?}` patches as one
//! transaction under `Origin::Layout` so they never pollute undo history.
//!
//! Every action here reads its geometry snapshot from the adapter's own
//! stored node positions rather than a live view's measured DOM rects —
//! this crate has no view layer (spec §1 non-goal), so the adapter's
//! current state stands in for "the view's current measured state".

use crate::adapter::{DocumentAdapter, EdgeDataPatch, NodePositionStylePatch};
use crate::error::{CoreError, CoreResult, PinWarning};
use crate::glue;
use crate::hierarchy;
use crate::ids::NodeId;
use crate::layout::{self, compact, deoverlap, grid, hierarchical, pin_resolver, router, LayoutConfig, LayoutItem, Positions};
use crate::model::geometry::Point;
use crate::model::node::Node;
use crate::origin::Origin;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignAxis {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributeAxis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    Lr,
    Rl,
    Tb,
    Bt,
}

fn index_of(nodes: &[Node]) -> HashMap<NodeId, &Node> {
    hierarchy::index_by_id(nodes)
}

/// Commits `positions` (keyed by node id, parent-relative) through
/// `patch_nodes_with_origin` under `Origin::Layout`.
fn write_positions(adapter: &DocumentAdapter, positions: &Positions) {
    let patches = positions.iter().map(|(id, pos)| NodePositionStylePatch { id: id.clone(), position: Some(*pos), style_size: None }).collect();
    adapter.patch_nodes_with_origin(Origin::Layout, patches);
}

// ---- organizer-scoped actions (spec §4.5) ----

pub fn spread_children(adapter: &DocumentAdapter, organizer_id: &NodeId, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let units = glue::get_child_layout_units(&nodes, Some(organizer_id));
    let positions = deoverlap::deoverlap(&units.items, cfg);
    write_positions(adapter, &glue::convert_to_construct_positions(&positions, &units.offsets));
    fit_to_children(adapter, organizer_id, cfg);
}

pub fn grid_layout_children(adapter: &DocumentAdapter, organizer_id: &NodeId, columns: Option<usize>, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let units = glue::get_child_layout_units(&nodes, Some(organizer_id));
    let origin = Point::new(cfg.container_padding, cfg.container_padding + cfg.organizer_header_height);
    let positions = grid::layout_grid(&units.items, columns, origin, cfg);
    write_positions(adapter, &glue::convert_to_construct_positions(&positions, &units.offsets));
    fit_to_children(adapter, organizer_id, cfg);
}

/// `flowLayoutChildren` (spec §4.5): hierarchical layout restricted to this
/// organizer's own children and the edges directly between them, same idea
/// as the top-level `flowLayout` toolbar action (hierarchical + coordinate
/// transform) but scoped to one container and always top-to-bottom.
pub fn flow_layout_children(adapter: &DocumentAdapter, organizer_id: &NodeId, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let edges = adapter.get_edges();
    let units = glue::get_child_layout_units(&nodes, Some(organizer_id));
    let child_ids: FxHashSet<NodeId> = units.items.iter().map(|i| i.id.clone()).collect();
    let internal_edges: Vec<(NodeId, NodeId)> = edges
        .iter()
        .filter(|e| child_ids.contains(&e.source) && child_ids.contains(&e.target))
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    let positions = hierarchical::layout_hierarchical(&units.items, &internal_edges, cfg);
    write_positions(adapter, &glue::convert_to_construct_positions(&positions, &units.offsets));
    fit_to_children(adapter, organizer_id, cfg);
}

/// `fitToChildren` (spec §4.5): resizes and repositions `organizer_id` per
/// `computeContainerFit`, then shifts every direct child by the same
/// compensating delta so none of their *absolute* positions move.
pub fn fit_to_children(adapter: &DocumentAdapter, organizer_id: &NodeId, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let Some(organizer) = nodes.iter().find(|n| &n.id == organizer_id) else { return };
    let footprints = glue::get_child_visual_footprints(&nodes, Some(organizer_id));
    if footprints.is_empty() {
        return;
    }
    let rects: Vec<_> = footprints.values().copied().collect();
    let fit = layout::compute_container_fit(&rects, cfg);

    let mut patches = vec![NodePositionStylePatch {
        id: organizer.id.clone(),
        position: Some(organizer.position + fit.position_delta),
        style_size: Some(crate::model::geometry::Size::new(fit.size.width, fit.size.height)),
    }];
    for child in nodes.iter().filter(|n| n.parent_id.as_ref() == Some(organizer_id)) {
        patches.push(NodePositionStylePatch { id: child.id.clone(), position: Some(child.position + fit.child_position_delta), style_size: None });
    }
    adapter.patch_nodes_with_origin(Origin::Layout, patches);
}

// ---- top-level actions (spec §4.5) ----

pub fn spread_selected(adapter: &DocumentAdapter, selected: &FxHashSet<NodeId>, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let units = glue::get_child_layout_units(&nodes, None);
    let items: Vec<LayoutItem> = units.items.iter().filter(|i| selected.contains(&i.id)).cloned().collect();
    if items.is_empty() {
        return;
    }
    let positions = deoverlap::deoverlap(&items, cfg);
    write_positions(adapter, &glue::convert_to_construct_positions(&positions, &units.offsets));
}

/// `spreadAll` (spec §4.5): treats each organizer's children, plus the
/// top-level set itself, as independent groups.
pub fn spread_all(adapter: &DocumentAdapter, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let units = glue::get_child_layout_units(&nodes, None);
    let positions = deoverlap::deoverlap(&units.items, cfg);
    write_positions(adapter, &glue::convert_to_construct_positions(&positions, &units.offsets));

    let organizer_ids: Vec<NodeId> = nodes.iter().filter(|n| n.is_organizer() && !n.is_wagon()).map(|n| n.id.clone()).collect();
    for organizer_id in organizer_ids {
        spread_children(adapter, &organizer_id, cfg);
    }
}

pub fn compact_all(adapter: &DocumentAdapter, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let units = glue::get_child_layout_units(&nodes, None);
    let positions = compact::compact(&units.items, cfg);
    write_positions(adapter, &glue::convert_to_construct_positions(&positions, &units.offsets));
}

/// Builds the id -> top-level-scope-id map used by both `hierarchical_layout`
/// and `route_edges`: every node maps to its topmost ancestor (or itself, if
/// it has none).
fn top_level_scope(nodes: &[Node]) -> FxHashMap<NodeId, NodeId> {
    let by_id = index_of(nodes);
    nodes
        .iter()
        .map(|node| {
            let mut current = node;
            for _ in 0..hierarchy::MAX_NESTING_DEPTH {
                let Some(parent_id) = &current.parent_id else { break };
                let Some(parent) = by_id.get(parent_id) else { break };
                current = parent;
            }
            (node.id.clone(), current.id.clone())
        })
        .collect()
}

/// Cross-scope edge remap rule (spec §4.5): edges whose endpoints are in
/// the same container are dropped; edges crossing container boundaries are
/// remapped to each side's container id; duplicates are deduplicated.
fn remap_cross_scope_edges(edges: &[(NodeId, NodeId)], scope: &FxHashMap<NodeId, NodeId>) -> Vec<(NodeId, NodeId)> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::new();
    for (source, target) in edges {
        let (Some(s), Some(t)) = (scope.get(source), scope.get(target)) else { continue };
        if s == t {
            continue;
        }
        let key = (s.clone(), t.clone());
        if seen.insert(key.clone()) {
            result.push(key);
        }
    }
    result
}

pub fn hierarchical_layout(adapter: &DocumentAdapter, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let edges = adapter.get_edges();
    let units = glue::get_child_layout_units(&nodes, None);
    let scope = top_level_scope(&nodes);
    let raw_edges: Vec<(NodeId, NodeId)> = edges.iter().map(|e| (e.source.clone(), e.target.clone())).collect();
    let cross_edges = remap_cross_scope_edges(&raw_edges, &scope);

    let positions = hierarchical::layout_hierarchical(&units.items, &cross_edges, cfg);
    write_positions(adapter, &glue::convert_to_construct_positions(&positions, &units.offsets));
}

// ---- toolbar actions (spec §4.5) ----

/// `alignNodes` (spec §4.5): requires at least 2 ids; aligns their absolute
/// positions along `axis`.
pub fn align_nodes(adapter: &DocumentAdapter, ids: &[NodeId], axis: AlignAxis, cfg: &LayoutConfig) -> CoreResult<()> {
    if ids.len() < 2 {
        return Err(CoreError::InvalidShape("alignNodes requires at least 2 selected nodes".into()));
    }
    let _ = cfg;
    let nodes = adapter.get_nodes();
    let by_id = index_of(&nodes);

    let rects: Vec<(NodeId, crate::model::geometry::Rect)> = ids
        .iter()
        .filter_map(|id| {
            let node = by_id.get(id)?;
            let absolute = hierarchy::resolve_absolute(id, &by_id);
            Some((id.clone(), crate::model::geometry::Rect::from_point_size(absolute, node.effective_size())))
        })
        .collect();
    if rects.is_empty() {
        return Ok(());
    }

    let target = match axis {
        AlignAxis::Left => rects.iter().map(|(_, r)| r.x).fold(f64::INFINITY, f64::min),
        AlignAxis::Right => rects.iter().map(|(_, r)| r.right()).fold(f64::NEG_INFINITY, f64::max),
        AlignAxis::Center => rects.iter().map(|(_, r)| r.center().x).sum::<f64>() / rects.len() as f64,
        AlignAxis::Top => rects.iter().map(|(_, r)| r.y).fold(f64::INFINITY, f64::min),
        AlignAxis::Bottom => rects.iter().map(|(_, r)| r.bottom()).fold(f64::NEG_INFINITY, f64::max),
        AlignAxis::Middle => rects.iter().map(|(_, r)| r.center().y).sum::<f64>() / rects.len() as f64,
    };

    let mut patches = Vec::new();
    for (id, rect) in &rects {
        let node = by_id[id];
        let new_absolute = match axis {
            AlignAxis::Left => Point::new(target, rect.y),
            AlignAxis::Right => Point::new(target - rect.width, rect.y),
            AlignAxis::Center => Point::new(target - rect.width / 2.0, rect.y),
            AlignAxis::Top => Point::new(rect.x, target),
            AlignAxis::Bottom => Point::new(rect.x, target - rect.height),
            AlignAxis::Middle => Point::new(rect.x, target - rect.height / 2.0),
        };
        let parent_absolute = node.parent_id.as_ref().map(|p| hierarchy::resolve_absolute(p, &by_id)).unwrap_or(Point::ZERO);
        let relative = hierarchy::to_relative(new_absolute, parent_absolute);
        patches.push(NodePositionStylePatch { id: id.clone(), position: Some(relative), style_size: None });
    }
    adapter.patch_nodes_with_origin(Origin::Layout, patches);
    Ok(())
}

/// `distributeNodes` (spec §4.5): requires at least 3 ids; spaces them
/// evenly between the two extremes along `axis`, by left/top edge.
pub fn distribute_nodes(adapter: &DocumentAdapter, ids: &[NodeId], axis: DistributeAxis) -> CoreResult<()> {
    if ids.len() < 3 {
        return Err(CoreError::InvalidShape("distributeNodes requires at least 3 selected nodes".into()));
    }
    let nodes = adapter.get_nodes();
    let by_id = index_of(&nodes);

    let mut entries: Vec<(NodeId, Point)> = ids
        .iter()
        .filter_map(|id| by_id.get(id).map(|_| (id.clone(), hierarchy::resolve_absolute(id, &by_id))))
        .collect();
    let axis_value = |p: Point| match axis {
        DistributeAxis::Horizontal => p.x,
        DistributeAxis::Vertical => p.y,
    };
    entries.sort_by(|a, b| axis_value(a.1).partial_cmp(&axis_value(b.1)).unwrap_or(std::cmp::Ordering::Equal));

    let first = axis_value(entries.first().map(|(_, p)| *p).unwrap_or_default());
    let last = axis_value(entries.last().map(|(_, p)| *p).unwrap_or_default());
    let step = (last - first) / (entries.len() as f64 - 1.0);

    let mut patches = Vec::new();
    for (index, (id, absolute)) in entries.iter().enumerate() {
        let node = by_id[id];
        let new_absolute = match axis {
            DistributeAxis::Horizontal => Point::new(first + step * index as f64, absolute.y),
            DistributeAxis::Vertical => Point::new(absolute.x, first + step * index as f64),
        };
        let parent_absolute = node.parent_id.as_ref().map(|p| hierarchy::resolve_absolute(p, &by_id)).unwrap_or(Point::ZERO);
        let relative = hierarchy::to_relative(new_absolute, parent_absolute);
        patches.push(NodePositionStylePatch { id: id.clone(), position: Some(relative), style_size: None });
    }
    adapter.patch_nodes_with_origin(Origin::Layout, patches);
    Ok(())
}

/// `flowLayout` (spec §4.5): hierarchical layout plus a coordinate
/// transform for the requested reading direction. `Tb` (top-to-bottom) is
/// the identity; `Bt` mirrors y; `Lr`/`Rl` swap the axes (optionally
/// mirrored) so layers read left-to-right or right-to-left instead.
pub fn flow_layout(adapter: &DocumentAdapter, direction: FlowDirection, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let edges = adapter.get_edges();
    let units = glue::get_child_layout_units(&nodes, None);
    let scope = top_level_scope(&nodes);
    let raw_edges: Vec<(NodeId, NodeId)> = edges.iter().map(|e| (e.source.clone(), e.target.clone())).collect();
    let cross_edges = remap_cross_scope_edges(&raw_edges, &scope);

    let positions = hierarchical::layout_hierarchical(&units.items, &cross_edges, cfg);
    let transformed: Positions = positions
        .into_iter()
        .map(|(id, p)| {
            let transformed = match direction {
                FlowDirection::Tb => p,
                FlowDirection::Bt => Point::new(p.x, -p.y),
                FlowDirection::Lr => Point::new(p.y, p.x),
                FlowDirection::Rl => Point::new(-p.y, p.x),
            };
            (id, transformed)
        })
        .collect();
    write_positions(adapter, &glue::convert_to_construct_positions(&transformed, &units.offsets));
}

// ---- membership actions (spec §4.5) ----

/// `attachNodeToOrganizer`: re-parents `node_id` under `organizer_id`,
/// preserving its absolute position exactly, then fits the organizer around
/// its (possibly now one-larger) child set.
pub fn attach_node_to_organizer(adapter: &DocumentAdapter, node_id: &NodeId, organizer_id: &NodeId, cfg: &LayoutConfig) -> CoreResult<()> {
    let nodes = adapter.get_nodes();
    let by_id = index_of(&nodes);
    let node = by_id.get(node_id).ok_or_else(|| CoreError::UnknownId { kind: "node", id: node_id.0.clone() })?;
    let organizer = by_id.get(organizer_id).ok_or_else(|| CoreError::UnknownId { kind: "node", id: organizer_id.0.clone() })?;

    if !hierarchy::can_nest_in_organizer(node, organizer, &by_id) {
        let error = CoreError::InvariantViolation(format!("{node_id} cannot nest inside {organizer_id}"));
        tracing::error!(node_id = %node_id, organizer_id = %organizer_id, "{error}");
        return Err(error);
    }

    let absolute = hierarchy::resolve_absolute(node_id, &by_id);
    let organizer_absolute = hierarchy::resolve_absolute(organizer_id, &by_id);
    let relative = hierarchy::to_relative(absolute, organizer_absolute);

    adapter.update_node(
        node_id,
        crate::adapter::NodePatch { parent_id: Some(Some(organizer_id.clone())), position: Some(relative), ..Default::default() },
    )?;
    fit_to_children(adapter, organizer_id, cfg);
    Ok(())
}

/// `detachNodeFromOrganizer`: clears `node_id`'s parent, preserving its
/// absolute position, then fits the (former) parent organizer around its
/// remaining children.
pub fn detach_node_from_organizer(adapter: &DocumentAdapter, node_id: &NodeId, cfg: &LayoutConfig) -> CoreResult<()> {
    let nodes = adapter.get_nodes();
    let by_id = index_of(&nodes);
    let node = by_id.get(node_id).ok_or_else(|| CoreError::UnknownId { kind: "node", id: node_id.0.clone() })?;
    let former_parent = node.parent_id.clone();
    let absolute = hierarchy::resolve_absolute(node_id, &by_id);

    adapter.update_node(node_id, crate::adapter::NodePatch { parent_id: Some(None), position: Some(absolute), ..Default::default() })?;

    if let Some(former_parent) = former_parent {
        fit_to_children(adapter, &former_parent, cfg);
    }
    Ok(())
}

// ---- edge-route actions (spec §4.5) ----

/// `routeEdges`: every edge whose endpoints resolve to different top-level
/// rectangles gets axis-aligned waypoints; child-of-organizer edges
/// collapse to the organizer's rectangle; self-loops (after collapse) are
/// skipped, per spec §4.5.
pub fn route_edges(adapter: &DocumentAdapter, cfg: &LayoutConfig) {
    let nodes = adapter.get_nodes();
    let edges = adapter.get_edges();
    let by_id = index_of(&nodes);
    let scope = top_level_scope(&nodes);

    let rects: FxHashMap<NodeId, crate::model::geometry::Rect> = scope
        .values()
        .collect::<FxHashSet<_>>()
        .into_iter()
        .filter_map(|top_id| {
            let node = by_id.get(top_id)?;
            let absolute = hierarchy::resolve_absolute(top_id, &by_id);
            Some((top_id.clone(), crate::model::geometry::Rect::from_point_size(absolute, node.effective_size())))
        })
        .collect();
    let obstacles: Vec<_> = rects.values().copied().collect();

    let mut patches = Vec::new();
    for edge in &edges {
        let (Some(source_scope), Some(target_scope)) = (scope.get(&edge.source), scope.get(&edge.target)) else { continue };
        if source_scope == target_scope {
            continue;
        }
        let routes = router::route_edges(&[(source_scope.clone(), target_scope.clone())], &rects, &obstacles, cfg);
        let Some(waypoints) = routes.get(&(source_scope.clone(), target_scope.clone())) else { continue };
        let mut data = serde_json::Map::new();
        data.insert("waypoints".to_string(), Some(serde_json::to_value(waypoints).expect("Point serializes infallibly")));
        patches.push(EdgeDataPatch { id: edge.id.clone(), data });
    }
    adapter.patch_edge_data_with_origin(Origin::Layout, patches);
}

/// `clearRoutes`: wipes every edge's stored waypoints.
pub fn clear_routes(adapter: &DocumentAdapter) {
    let edges = adapter.get_edges();
    let patches = edges
        .into_iter()
        .map(|edge| {
            let mut data = serde_json::Map::new();
            data.insert("waypoints".to_string(), None);
            EdgeDataPatch { id: edge.id, data }
        })
        .collect();
    adapter.patch_edge_data_with_origin(Origin::Layout, patches);
}

// ---- pin layout action (spec §4.5) ----

/// `applyPinLayout`: resolves every pin constraint on the active page,
/// writes the resolved organizer positions back, then de-overlaps the
/// remaining free top-level nodes against the now-fixed constrained ones
/// (the constrained rects are restored to their resolved position after
/// de-overlap runs, so they act as anchors rather than movable items).
pub fn apply_pin_layout(adapter: &DocumentAdapter, cfg: &LayoutConfig) -> Vec<PinWarning> {
    let Some(page_id) = adapter.active_page_id() else { return Vec::new() };
    let constraints = adapter.list_pin_constraints(&page_id);
    if constraints.is_empty() {
        return Vec::new();
    }

    let nodes = adapter.get_nodes();
    let units = glue::get_child_layout_units(&nodes, None);
    let (pinned_positions, warnings) = pin_resolver::resolve_pins(&units.items, &constraints, cfg);

    let constrained: FxHashSet<NodeId> =
        constraints.iter().flat_map(|c| [c.source_organizer_id.clone(), c.target_organizer_id.clone()]).collect();

    let pinned_items: Vec<LayoutItem> = units
        .items
        .iter()
        .map(|item| {
            let position = pinned_positions.get(&item.id).copied().unwrap_or(item.rect.position());
            LayoutItem::new(item.id.clone(), crate::model::geometry::Rect::from_point_size(position, item.rect.size()))
        })
        .collect();

    let mut final_positions = deoverlap::deoverlap(&pinned_items, cfg);
    for id in &constrained {
        if let Some(&position) = pinned_positions.get(id) {
            final_positions.insert(id.clone(), position);
        }
    }

    write_positions(adapter, &glue::convert_to_construct_positions(&final_positions, &units.offsets));
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{ConstructData, NodeData, OrganizerData, OrganizerLayout};
    use crate::model::geometry::{Point, Size};

    fn construct_node(id: &str, parent: Option<&str>, x: f64, y: f64) -> Node {
        Node {
            id: NodeId::new(id),
            position: Point::new(x, y),
            parent_id: parent.map(NodeId::new),
            width: None,
            height: None,
            style_size: Some(Size::new(200.0, 100.0)),
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

    fn organizer_node(id: &str, x: f64, y: f64) -> Node {
        Node {
            id: NodeId::new(id),
            position: Point::new(x, y),
            parent_id: None,
            width: None,
            height: None,
            style_size: None,
            measured: None,
            data: NodeData::Organizer(OrganizerData {
                name: id.into(),
                color: "#fff".into(),
                collapsed: false,
                layout: OrganizerLayout::Freeform,
                attached_to_semantic_id: None,
            }),
        }
    }

    fn setup(nodes: Vec<Node>) -> DocumentAdapter {
        let adapter = DocumentAdapter::new("doc");
        let page = adapter.create_page("main");
        adapter.set_active_page(&page.id).unwrap();
        adapter.set_nodes(nodes);
        adapter
    }

    #[test]
    fn attach_then_detach_round_trips_absolute_position() {
        let cfg = LayoutConfig::default();
        let adapter = setup(vec![organizer_node("org", 100.0, 100.0), construct_node("n", None, 250.0, 300.0)]);

        attach_node_to_organizer(&adapter, &NodeId::new("n"), &NodeId::new("org"), &cfg).unwrap();
        let attached = adapter.get_nodes().into_iter().find(|n| n.id == NodeId::new("n")).unwrap();
        assert_eq!(attached.parent_id, Some(NodeId::new("org")));
        assert_eq!(attached.position, Point::new(150.0, 200.0));

        detach_node_from_organizer(&adapter, &NodeId::new("n"), &cfg).unwrap();
        let detached = adapter.get_nodes().into_iter().find(|n| n.id == NodeId::new("n")).unwrap();
        assert_eq!(detached.parent_id, None);
        assert_eq!(detached.position, Point::new(250.0, 300.0));
    }

    #[test]
    fn align_left_moves_every_node_to_the_leftmost_edge() {
        let cfg = LayoutConfig::default();
        let adapter = setup(vec![construct_node("a", None, 0.0, 0.0), construct_node("b", None, 300.0, 50.0)]);
        align_nodes(&adapter, &[NodeId::new("a"), NodeId::new("b")], AlignAxis::Left, &cfg).unwrap();
        let nodes = adapter.get_nodes();
        for node in &nodes {
            assert_eq!(node.position.x, 0.0);
        }
    }

    #[test]
    fn align_requires_at_least_two_nodes() {
        let cfg = LayoutConfig::default();
        let adapter = setup(vec![construct_node("a", None, 0.0, 0.0)]);
        let err = align_nodes(&adapter, &[NodeId::new("a")], AlignAxis::Left, &cfg).unwrap_err();
        assert!(matches!(err, CoreError::InvalidShape(_)));
    }

    #[test]
    fn distribute_requires_at_least_three_nodes() {
        let adapter = setup(vec![construct_node("a", None, 0.0, 0.0), construct_node("b", None, 100.0, 0.0)]);
        let err = distribute_nodes(&adapter, &[NodeId::new("a"), NodeId::new("b")], DistributeAxis::Horizontal).unwrap_err();
        assert!(matches!(err, CoreError::InvalidShape(_)));
    }

    #[test]
    fn distribute_spaces_nodes_evenly_keeping_extremes_fixed() {
        let adapter = setup(vec![
            construct_node("a", None, 0.0, 0.0),
            construct_node("b", None, 10.0, 0.0),
            construct_node("c", None, 300.0, 0.0),
        ]);
        distribute_nodes(&adapter, &[NodeId::new("a"), NodeId::new("b"), NodeId::new("c")], DistributeAxis::Horizontal).unwrap();
        let nodes = adapter.get_nodes();
        let a = nodes.iter().find(|n| n.id == NodeId::new("a")).unwrap();
        let b = nodes.iter().find(|n| n.id == NodeId::new("b")).unwrap();
        let c = nodes.iter().find(|n| n.id == NodeId::new("c")).unwrap();
        assert_eq!(a.position.x, 0.0);
        assert_eq!(c.position.x, 300.0);
        assert_eq!(b.position.x, 150.0);
    }

    #[test]
    fn fit_to_children_resizes_organizer_and_keeps_child_absolute_position() {
        let cfg = LayoutConfig::default();
        let adapter = setup(vec![organizer_node("org", 0.0, 0.0), construct_node("child", Some("org"), 500.0, 500.0)]);
        fit_to_children(&adapter, &NodeId::new("org"), &cfg);
        let nodes = adapter.get_nodes();
        let org = nodes.iter().find(|n| n.id == NodeId::new("org")).unwrap();
        let child = nodes.iter().find(|n| n.id == NodeId::new("child")).unwrap();
        let by_id = index_of(&nodes);
        let child_absolute = hierarchy::resolve_absolute(&NodeId::new("child"), &by_id);
        assert_eq!(child_absolute, Point::new(500.0, 500.0));
        assert_eq!(org.position, Point::new(500.0 - cfg.container_padding, 500.0 - cfg.container_padding - cfg.organizer_header_height));
    }

    #[test]
    fn route_edges_skips_self_loops_within_the_same_top_level_container() {
        let cfg = LayoutConfig::default();
        let adapter = setup(vec![
            organizer_node("org", 0.0, 0.0),
            construct_node("a", Some("org"), 0.0, 0.0),
            construct_node("b", Some("org"), 300.0, 0.0),
        ]);
        adapter.set_edges(vec![crate::model::edge::Edge {
            id: crate::ids::EdgeId::new("e1"),
            source: NodeId::new("a"),
            target: NodeId::new("b"),
            source_handle: None,
            target_handle: None,
            data: Default::default(),
        }]);
        route_edges(&adapter, &cfg);
        let edges = adapter.get_edges();
        assert!(edges[0].data.waypoints.is_none());
    }
}
