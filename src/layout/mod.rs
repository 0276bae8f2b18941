//! Pure layout geometry primitives (spec §4.3).
//!
//! Every primitive in this module is a deterministic function of its input
//! order and values: no document state, no I/O, no shared mutable state.
//! `glue` (the sibling module, not nested under here since it bridges the
//! document model in rather than staying pure) is what turns a page's
//! nested, wagon-bearing node tree into the flat [`LayoutItem`] lists these
//! primitives expect, and projects results back.

mod spatial_grid;
pub mod compact;
pub mod deoverlap;
pub mod grid;
pub mod hierarchical;
pub mod pin_resolver;
pub mod router;

use crate::ids::NodeId;
use crate::model::geometry::{Point, Rect, Size};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A flat geometry input: an id and its rectangle, in whatever coordinate
/// space the caller has flattened to (organizer-local for an
/// organizer-scoped action, page-absolute for a top-level one).
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutItem {
    pub id: NodeId,
    pub rect: Rect,
}

impl LayoutItem {
    pub fn new(id: NodeId, rect: Rect) -> Self {
        Self { id, rect }
    }
}

/// What every primitive returns: a new top-left position per item id.
pub type Positions = FxHashMap<NodeId, Point>;

/// Tunable constants for the pure layout primitives (SPEC_FULL §7
/// Configuration). `Default` reproduces the literal constants spec §4.3
/// calls out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Grid: added to the widest/tallest item to get column width/row height.
    pub grid_gap: f64,
    /// Hierarchical: vertical gap between layers.
    pub hierarchical_layer_gap: f64,
    /// Hierarchical: horizontal gap between items in the same layer.
    pub hierarchical_intra_layer_gap: f64,
    /// Compact: minimum gap preserved between compacted neighbors.
    pub compact_gap: f64,
    /// Pin resolver: gap left between a pinned target and its source.
    pub pin_gap: f64,
    /// Orthogonal router: clearance kept from an obstacle's edge when a
    /// direct channel is blocked.
    pub router_clearance: f64,
    /// Container-fit: padding kept between a container's edge and its
    /// children's bounding box.
    pub container_padding: f64,
    /// Container-fit: extra padding reserved above children for an
    /// organizer's header/title bar.
    pub organizer_header_height: f64,
    /// De-overlap: bound on the number of push iterations per item, so a
    /// pathological input can't spin forever.
    pub deoverlap_max_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_gap: 30.0,
            hierarchical_layer_gap: 60.0,
            hierarchical_intra_layer_gap: 30.0,
            compact_gap: 20.0,
            pin_gap: 20.0,
            router_clearance: 12.0,
            container_padding: 20.0,
            organizer_header_height: 40.0,
            deoverlap_max_iterations: 64,
        }
    }
}

/// Result of [`compute_container_fit`]: apply `position_delta` to the
/// container and `child_position_delta` to every child so the container's
/// bounding box ends up exactly enclosing its children with padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerFit {
    pub size: Size,
    pub position_delta: Point,
    pub child_position_delta: Point,
}

/// `computeContainerFit` (spec §4.3). `children` are child rectangles in
/// the container's local coordinate space (i.e. already including any
/// wagon-unit expansion from `glue::get_child_visual_footprints`).
pub fn compute_container_fit(children: &[Rect], cfg: &LayoutConfig) -> ContainerFit {
    let header = cfg.organizer_header_height;
    let padding = cfg.container_padding;

    let Some((first, rest)) = children.split_first() else {
        return ContainerFit {
            size: Size::new(0.0, 0.0),
            position_delta: Point::ZERO,
            child_position_delta: Point::ZERO,
        };
    };
    let mut bounds = *first;
    for rect in rest {
        bounds = bounds.union(rect);
    }

    let target_origin = Point::new(bounds.x - padding, bounds.y - padding - header);
    let size = Size::new(bounds.width + 2.0 * padding, bounds.height + 2.0 * padding + header);

    ContainerFit {
        size,
        position_delta: target_origin,
        child_position_delta: Point::new(-target_origin.x, -target_origin.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_fit_is_a_no_op_when_children_already_respect_padding() {
        let cfg = LayoutConfig::default();
        // Children already sit at (padding, header+padding) and below.
        let children = vec![Rect::new(20.0, 60.0, 200.0, 100.0), Rect::new(250.0, 60.0, 200.0, 100.0)];
        let fit = compute_container_fit(&children, &cfg);
        assert_eq!(fit.position_delta, Point::ZERO);
        assert_eq!(fit.child_position_delta, Point::ZERO);
    }

    #[test]
    fn container_fit_shrinks_around_a_single_child() {
        let cfg = LayoutConfig::default();
        let children = vec![Rect::new(100.0, 100.0, 50.0, 50.0)];
        let fit = compute_container_fit(&children, &cfg);
        assert_eq!(fit.position_delta, Point::new(80.0, 40.0));
        assert_eq!(fit.size, Size::new(90.0, 130.0));
    }
}
