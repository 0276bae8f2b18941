//! Orthogonal edge routing primitive (spec §4.3): given edge endpoints and
//! rectangular obstacles, produces for each edge a sequence of waypoints
//! with only axis-aligned segments that avoid all obstacle interiors
//! except the endpoint rectangles themselves. Deterministic: same inputs,
//! same order, in, same routes out.

use super::LayoutConfig;
use crate::ids::NodeId;
use crate::model::geometry::{Point, Rect};
use rustc_hash::FxHashMap;

/// Routes every `(source, target)` pair whose endpoints are present in
/// `rects`. Callers are expected to have already dropped self-loops (spec
/// §4.5: "self-loops are skipped").
pub fn route_edges(
    edges: &[(NodeId, NodeId)],
    rects: &FxHashMap<NodeId, Rect>,
    obstacles: &[Rect],
    cfg: &LayoutConfig,
) -> FxHashMap<(NodeId, NodeId), Vec<Point>> {
    let mut routes = FxHashMap::default();
    for (source, target) in edges {
        if source == target {
            continue;
        }
        let (Some(&src_rect), Some(&tgt_rect)) = (rects.get(source), rects.get(target)) else { continue };
        let route = route_one(src_rect, tgt_rect, obstacles, cfg);
        routes.insert((source.clone(), target.clone()), route);
    }
    routes
}

fn route_one(source: Rect, target: Rect, obstacles: &[Rect], cfg: &LayoutConfig) -> Vec<Point> {
    let start = exit_point(source, target.center());
    let end = exit_point(target, source.center());
    let endpoints = [source, target];

    let via_vertical_first = {
        let mid_x = (start.x + end.x) / 2.0;
        vec![start, Point::new(mid_x, start.y), Point::new(mid_x, end.y), end]
    };
    let via_horizontal_first = {
        let mid_y = (start.y + end.y) / 2.0;
        vec![start, Point::new(start.x, mid_y), Point::new(end.x, mid_y), end]
    };

    for candidate in [&via_vertical_first, &via_horizontal_first] {
        if !path_crosses_obstacles(candidate, &endpoints, obstacles) {
            return candidate.clone();
        }
    }

    // Both direct channels are blocked: bypass clear of every obstacle's
    // right edge. Deterministic because it's a fold over the whole
    // (ordered) obstacle slice, not a search.
    let clearance = cfg.router_clearance;
    let bypass_x = obstacles.iter().fold(start.x.max(end.x), |acc, o| acc.max(o.right() + clearance));
    vec![start, Point::new(bypass_x, start.y), Point::new(bypass_x, end.y), end]
}

/// The point on `rect`'s boundary closest to `towards`, exiting from
/// whichever side the target mostly lies on.
fn exit_point(rect: Rect, towards: Point) -> Point {
    let center = rect.center();
    let dx = towards.x - center.x;
    let dy = towards.y - center.y;
    if dx.abs() >= dy.abs() {
        let x = if dx >= 0.0 { rect.right() } else { rect.x };
        Point::new(x, center.y)
    } else {
        let y = if dy >= 0.0 { rect.bottom() } else { rect.y };
        Point::new(center.x, y)
    }
}

fn path_crosses_obstacles(path: &[Point], endpoints: &[Rect; 2], obstacles: &[Rect]) -> bool {
    path.windows(2).any(|segment| {
        let seg_rect = segment_rect(segment[0], segment[1]);
        obstacles.iter().any(|obstacle| !endpoints.contains(obstacle) && seg_rect.overlaps(obstacle))
    })
}

/// A zero-width/zero-height axis-aligned segment given a hairline
/// thickness so `Rect::overlaps` (which tests open intervals) still
/// detects it crossing an obstacle.
fn segment_rect(a: Point, b: Point) -> Rect {
    let x0 = a.x.min(b.x);
    let y0 = a.y.min(b.y);
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    Rect::new(x0, y0, (x1 - x0).max(0.01), (y1 - y0).max(0.01))
}
