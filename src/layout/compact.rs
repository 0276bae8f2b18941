//! Compact primitive (spec §4.3): removes whitespace between top-level
//! items while preserving spatial order along both axes.
//!
//! Each axis is compacted independently: items are walked in ascending
//! order of their position on that axis, and any gap larger than
//! `cfg.compact_gap` between one item's trailing edge and the next item's
//! leading edge is shrunk down to exactly `cfg.compact_gap`. Gaps already
//! at or below that are left alone — compact only removes *excess*
//! whitespace, it never pushes items further apart and never resolves a
//! pre-existing overlap (that's `deoverlap`'s job).

use super::{LayoutConfig, LayoutItem, Positions};
use crate::ids::NodeId;
use crate::model::geometry::Point;
use rustc_hash::FxHashMap;

pub fn compact(items: &[LayoutItem], cfg: &LayoutConfig) -> Positions {
    let xs = compact_axis(items, cfg.compact_gap, Axis::X);
    let ys = compact_axis(items, cfg.compact_gap, Axis::Y);

    items
        .iter()
        .map(|item| (item.id.clone(), Point::new(xs[&item.id], ys[&item.id])))
        .collect()
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn compact_axis(items: &[LayoutItem], gap: f64, axis: Axis) -> FxHashMap<NodeId, f64> {
    let (pos_of, size_of): (fn(&LayoutItem) -> f64, fn(&LayoutItem) -> f64) = match axis {
        Axis::X => (|i| i.rect.x, |i| i.rect.width),
        Axis::Y => (|i| i.rect.y, |i| i.rect.height),
    };

    let mut ordered: Vec<&LayoutItem> = items.iter().collect();
    ordered.sort_by(|a, b| pos_of(a).partial_cmp(&pos_of(b)).unwrap_or(std::cmp::Ordering::Equal));

    let mut result = FxHashMap::default();
    let mut previous_end: Option<f64> = None;
    for item in ordered {
        let original = pos_of(item);
        let new_pos = match previous_end {
            Some(end) => original.min(end + gap),
            None => original,
        };
        result.insert(item.id.clone(), new_pos);
        previous_end = Some(new_pos + size_of(item));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geometry::Rect;

    fn item(id: &str, x: f64, y: f64) -> LayoutItem {
        LayoutItem::new(NodeId::new(id), Rect::new(x, y, 50.0, 50.0))
    }

    #[test]
    fn pulls_in_excess_whitespace() {
        let cfg = LayoutConfig::default();
        let items = vec![item("a", 0.0, 0.0), item("b", 500.0, 0.0)];
        let positions = compact(&items, &cfg);
        assert_eq!(positions[&NodeId::new("a")].x, 0.0);
        assert_eq!(positions[&NodeId::new("b")].x, 50.0 + cfg.compact_gap);
    }

    #[test]
    fn preserves_spatial_order() {
        let cfg = LayoutConfig::default();
        let items = vec![item("a", 0.0, 0.0), item("b", 40.0, 0.0), item("c", 300.0, 0.0)];
        let positions = compact(&items, &cfg);
        let xa = positions[&NodeId::new("a")].x;
        let xb = positions[&NodeId::new("b")].x;
        let xc = positions[&NodeId::new("c")].x;
        assert!(xa < xb);
        assert!(xb < xc);
    }

    #[test]
    fn does_not_widen_a_tight_gap() {
        let cfg = LayoutConfig::default();
        let items = vec![item("a", 0.0, 0.0), item("b", 40.0, 0.0)];
        let positions = compact(&items, &cfg);
        // Gap (40 - 50 = -10, i.e. already overlapping) is left untouched.
        assert_eq!(positions[&NodeId::new("b")].x, 40.0);
    }
}
