//! A spatial hash grid for approximate overlap queries, the f64/`Rect`
//! counterpart of the teacher's integer `RectI` grid
//! (`trident-core/src/layout/spatial_grid.rs`) — used by [`super::deoverlap`]
//! and [`super::router`] so neither does an O(n) scan against every placed
//! rectangle or obstacle.

use crate::model::geometry::Rect;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: FxHashMap<(i64, i64), Vec<Rect>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self { cell_size: cell_size.max(1.0), cells: FxHashMap::default() }
    }

    fn cell_range(&self, rect: &Rect) -> Vec<(i64, i64)> {
        let min_x = (rect.x / self.cell_size).floor() as i64;
        let max_x = ((rect.right() - 0.001) / self.cell_size).floor() as i64;
        let min_y = (rect.y / self.cell_size).floor() as i64;
        let max_y = ((rect.bottom() - 0.001) / self.cell_size).floor() as i64;

        let mut cells = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                cells.push((cx, cy));
            }
        }
        cells
    }

    pub fn insert(&mut self, rect: Rect) {
        for cell in self.cell_range(&rect) {
            self.cells.entry(cell).or_default().push(rect);
        }
    }

    pub fn query(&self, rect: &Rect) -> Vec<Rect> {
        let mut seen: Vec<Rect> = Vec::new();
        for cell in self.cell_range(rect) {
            if let Some(rects) = self.cells.get(&cell) {
                for r in rects {
                    if !seen.contains(r) {
                        seen.push(*r);
                    }
                }
            }
        }
        seen
    }

    pub fn overlaps_any(&self, rect: &Rect) -> bool {
        self.query(rect).iter().any(|candidate| rect.overlaps(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nearby_rect_only() {
        let mut grid = SpatialGrid::new(100.0);
        let r1 = Rect::new(0.0, 0.0, 50.0, 50.0);
        let r2 = Rect::new(200.0, 200.0, 50.0, 50.0);
        grid.insert(r1);
        grid.insert(r2);
        let nearby = grid.query(&Rect::new(10.0, 10.0, 20.0, 20.0));
        assert!(nearby.contains(&r1));
        assert!(!nearby.contains(&r2));
    }

    #[test]
    fn overlaps_any_detects_true_overlap() {
        let mut grid = SpatialGrid::new(100.0);
        grid.insert(Rect::new(0.0, 0.0, 50.0, 50.0));
        assert!(grid.overlaps_any(&Rect::new(25.0, 25.0, 50.0, 50.0)));
        assert!(!grid.overlaps_any(&Rect::new(100.0, 100.0, 50.0, 50.0)));
    }
}
