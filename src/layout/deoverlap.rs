//! De-overlap primitive (spec §4.3): a non-overlapping placement that
//! minimises movement of the input set, ties broken by input order.

use super::spatial_grid::SpatialGrid;
use super::{LayoutConfig, LayoutItem, Positions};
use crate::model::geometry::{Point, Rect};

/// Places items one at a time in input order; an item that overlaps an
/// already-placed item is nudged along whichever axis has the smaller
/// overlap, repeated (bounded by `cfg.deoverlap_max_iterations`) until it
/// clears every previously placed rectangle. Earlier items in the input
/// never move to make room for later ones, so the first item in a
/// colliding pair always wins the tie.
pub fn deoverlap(items: &[LayoutItem], cfg: &LayoutConfig) -> Positions {
    let mut grid = SpatialGrid::new(largest_dimension(items).max(1.0));
    let mut positions = Positions::default();

    for item in items {
        let mut rect = item.rect;
        for _ in 0..cfg.deoverlap_max_iterations {
            let Some(blocker) = grid.query(&rect).into_iter().find(|b| rect.overlaps(b)) else { break };
            rect = rect.translate(push_delta(&rect, &blocker));
        }
        grid.insert(rect);
        positions.insert(item.id.clone(), rect.position());
    }
    positions
}

fn largest_dimension(items: &[LayoutItem]) -> f64 {
    items.iter().fold(0.0_f64, |acc, i| acc.max(i.rect.width).max(i.rect.height))
}

/// The smaller of the two axis-overlaps decides which way to push, so the
/// item takes the shortest path out of the collision.
fn push_delta(rect: &Rect, blocker: &Rect) -> Point {
    let overlap_x = rect.right().min(blocker.right()) - rect.x.max(blocker.x);
    let overlap_y = rect.bottom().min(blocker.bottom()) - rect.y.max(blocker.y);

    if overlap_x <= overlap_y {
        let dir = if rect.center().x < blocker.center().x { -1.0 } else { 1.0 };
        Point::new(dir * overlap_x, 0.0)
    } else {
        let dir = if rect.center().y < blocker.center().y { -1.0 } else { 1.0 };
        Point::new(0.0, dir * overlap_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;

    fn item(id: &str, x: f64, y: f64, w: f64, h: f64) -> LayoutItem {
        LayoutItem::new(NodeId::new(id), Rect::new(x, y, w, h))
    }

    #[test]
    fn non_overlapping_input_is_left_untouched() {
        let cfg = LayoutConfig::default();
        let items = vec![item("a", 0.0, 0.0, 50.0, 50.0), item("b", 100.0, 0.0, 50.0, 50.0)];
        let positions = deoverlap(&items, &cfg);
        assert_eq!(positions[&NodeId::new("a")], Point::new(0.0, 0.0));
        assert_eq!(positions[&NodeId::new("b")], Point::new(100.0, 0.0));
    }

    #[test]
    fn earlier_item_in_input_order_keeps_its_position() {
        let cfg = LayoutConfig::default();
        let items = vec![item("a", 0.0, 0.0, 50.0, 50.0), item("b", 25.0, 0.0, 50.0, 50.0)];
        let positions = deoverlap(&items, &cfg);
        assert_eq!(positions[&NodeId::new("a")], Point::new(0.0, 0.0));
        let b = positions[&NodeId::new("b")];
        let resolved = Rect::from_point_size(b, crate::model::geometry::Size::new(50.0, 50.0));
        assert!(!resolved.overlaps(&Rect::new(0.0, 0.0, 50.0, 50.0)));
    }
}
