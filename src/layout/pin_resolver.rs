//! Pin-constraint resolver (spec §4.3, §4.5): anchors `source` organizers
//! first, then positions each `target` on `source`'s side `direction`
//! touching edge-to-edge with a configurable gap. Conflicting constraints
//! (a target pinned by more than one source) are reported as warnings; the
//! first-seen constraint for a given target wins.

use super::{LayoutConfig, LayoutItem, Positions};
use crate::error::PinWarning;
use crate::ids::NodeId;
use crate::model::geometry::{Point, Rect};
use crate::model::pin::{Direction, PinConstraint};
use rustc_hash::{FxHashMap, FxHashSet};

pub fn resolve_pins(
    items: &[LayoutItem],
    constraints: &[PinConstraint],
    cfg: &LayoutConfig,
) -> (Positions, Vec<PinWarning>) {
    let mut rects: FxHashMap<NodeId, Rect> = items.iter().map(|i| (i.id.clone(), i.rect)).collect();
    let mut pinned_targets: FxHashSet<NodeId> = FxHashSet::default();
    let mut warnings = Vec::new();

    for constraint in constraints {
        if pinned_targets.contains(&constraint.target_organizer_id) {
            let warning =
                PinWarning { constraint_id: constraint.id.clone(), reason: "target already pinned by an earlier constraint".to_string() };
            tracing::warn!(constraint_id = %warning.constraint_id, "{}", warning.reason);
            warnings.push(warning);
            continue;
        }
        let (Some(&source_rect), Some(&target_rect)) =
            (rects.get(&constraint.source_organizer_id), rects.get(&constraint.target_organizer_id))
        else {
            let warning = PinWarning {
                constraint_id: constraint.id.clone(),
                reason: "source or target not present in this layout pass".to_string(),
            };
            tracing::warn!(constraint_id = %warning.constraint_id, "{}", warning.reason);
            warnings.push(warning);
            continue;
        };

        let new_origin = pinned_position(source_rect, target_rect, constraint.direction, cfg.pin_gap);
        if let Some(rect) = rects.get_mut(&constraint.target_organizer_id) {
            rect.x = new_origin.x;
            rect.y = new_origin.y;
        }
        pinned_targets.insert(constraint.target_organizer_id.clone());
    }

    let positions = rects.into_iter().map(|(id, rect)| (id, rect.position())).collect();
    (positions, warnings)
}

/// `target` positioned edge-to-edge touching `source`'s side `direction`.
fn pinned_position(source: Rect, target: Rect, direction: Direction, gap: f64) -> Point {
    match direction {
        Direction::N => Point::new(source.x, source.y - gap - target.height),
        Direction::S => Point::new(source.x, source.bottom() + gap),
        Direction::E => Point::new(source.right() + gap, source.y),
        Direction::W => Point::new(source.x - gap - target.width, source.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PinConstraintId;

    fn item(id: &str, x: f64, y: f64, w: f64, h: f64) -> LayoutItem {
        LayoutItem::new(NodeId::new(id), Rect::new(x, y, w, h))
    }

    fn pin(id: &str, source: &str, target: &str, direction: Direction) -> PinConstraint {
        PinConstraint {
            id: PinConstraintId::new(id),
            source_organizer_id: NodeId::new(source),
            target_organizer_id: NodeId::new(target),
            direction,
        }
    }

    #[test]
    fn places_target_touching_sources_east_side() {
        let cfg = LayoutConfig::default();
        let items = vec![item("src", 0.0, 0.0, 100.0, 100.0), item("tgt", 500.0, 500.0, 50.0, 50.0)];
        let constraints = vec![pin("p1", "src", "tgt", Direction::E)];
        let (positions, warnings) = resolve_pins(&items, &constraints, &cfg);
        assert!(warnings.is_empty());
        assert_eq!(positions[&NodeId::new("tgt")], Point::new(100.0 + cfg.pin_gap, 0.0));
        // Source never moves.
        assert_eq!(positions[&NodeId::new("src")], Point::new(0.0, 0.0));
    }

    #[test]
    fn conflicting_pins_on_same_target_warn_and_first_wins() {
        let cfg = LayoutConfig::default();
        let items = vec![
            item("src1", 0.0, 0.0, 100.0, 100.0),
            item("src2", 0.0, 300.0, 100.0, 100.0),
            item("tgt", 500.0, 500.0, 50.0, 50.0),
        ];
        let constraints =
            vec![pin("p1", "src1", "tgt", Direction::E), pin("p2", "src2", "tgt", Direction::S)];
        let (positions, warnings) = resolve_pins(&items, &constraints, &cfg);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].constraint_id, PinConstraintId::new("p2"));
        assert_eq!(positions[&NodeId::new("tgt")], Point::new(100.0 + cfg.pin_gap, 0.0));
    }
}
