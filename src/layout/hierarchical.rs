//! Hierarchical (Sugiyama-style) layout primitive (spec §4.3): layers by
//! longest-path from source-free nodes; within-layer order is input order;
//! layer gap and intra-layer gap configurable. Produces a top-to-bottom
//! layout with `y` strictly increasing per layer.
//!
//! Layering uses `petgraph`'s topological sort rather than a hand-rolled
//! BFS (SPEC_FULL §9 design note) — grounded in `AiricDev-context-footprint`,
//! which already reaches for `petgraph::graphmap` to analyze a node graph.
//! A cyclic edge set (which should already have been refused at write time
//! per spec §3, but pure primitives still must not hang on malformed input)
//! falls back to the original input order instead of failing.

use super::{LayoutConfig, LayoutItem, Positions};
use crate::ids::NodeId;
use crate::model::geometry::Point;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use rustc_hash::FxHashMap;

pub fn layout_hierarchical(items: &[LayoutItem], edges: &[(NodeId, NodeId)], cfg: &LayoutConfig) -> Positions {
    let mut positions = Positions::default();
    if items.is_empty() {
        return positions;
    }

    let index_of: FxHashMap<NodeId, usize> = items.iter().enumerate().map(|(i, it)| (it.id.clone(), i)).collect();

    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    for index in 0..items.len() {
        graph.add_node(index);
    }
    for (source, target) in edges {
        if let (Some(&s), Some(&t)) = (index_of.get(source), index_of.get(target)) {
            if s != t {
                graph.add_edge(s, t, ());
            }
        }
    }

    let order = toposort(&graph, None).unwrap_or_else(|_| (0..items.len()).collect());

    let mut layer = vec![0usize; items.len()];
    for node in &order {
        let mut max_parent = None;
        for pred in graph.neighbors_directed(*node, Direction::Incoming) {
            let candidate = layer[pred] + 1;
            max_parent = Some(max_parent.map_or(candidate, |m: usize| m.max(candidate)));
        }
        layer[*node] = max_parent.unwrap_or(0);
    }

    let max_layer = layer.iter().copied().max().unwrap_or(0);
    let mut by_layer: Vec<Vec<usize>> = vec![Vec::new(); max_layer + 1];
    // Input order, not topological order, decides within-layer placement.
    for (index, &l) in layer.iter().enumerate() {
        by_layer[l].push(index);
    }

    let mut y = 0.0;
    for layer_indices in &by_layer {
        let row_height = layer_indices.iter().fold(0.0_f64, |acc, &i| acc.max(items[i].rect.height));
        let mut x = 0.0;
        for &index in layer_indices {
            positions.insert(items[index].id.clone(), Point::new(x, y));
            x += items[index].rect.width + cfg.hierarchical_intra_layer_gap;
        }
        y += row_height + cfg.hierarchical_layer_gap;
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geometry::Rect;

    fn item(id: &str) -> LayoutItem {
        LayoutItem::new(NodeId::new(id), Rect::new(0.0, 0.0, 100.0, 50.0))
    }

    #[test]
    fn layers_by_longest_path_with_increasing_y() {
        let cfg = LayoutConfig::default();
        let items = vec![item("a"), item("b"), item("c")];
        let edges = vec![(NodeId::new("a"), NodeId::new("b")), (NodeId::new("b"), NodeId::new("c"))];
        let positions = layout_hierarchical(&items, &edges, &cfg);
        assert_eq!(positions[&NodeId::new("a")].y, 0.0);
        assert_eq!(positions[&NodeId::new("b")].y, 50.0 + cfg.hierarchical_layer_gap);
        assert_eq!(positions[&NodeId::new("c")].y, 2.0 * (50.0 + cfg.hierarchical_layer_gap));
    }

    #[test]
    fn source_free_nodes_share_layer_zero() {
        let cfg = LayoutConfig::default();
        let items = vec![item("a"), item("b"), item("c")];
        let edges = vec![(NodeId::new("a"), NodeId::new("c")), (NodeId::new("b"), NodeId::new("c"))];
        let positions = layout_hierarchical(&items, &edges, &cfg);
        assert_eq!(positions[&NodeId::new("a")].y, positions[&NodeId::new("b")].y);
        assert!(positions[&NodeId::new("c")].y > positions[&NodeId::new("a")].y);
    }

    #[test]
    fn cycles_fall_back_to_input_order_without_hanging() {
        let cfg = LayoutConfig::default();
        let items = vec![item("a"), item("b")];
        let edges = vec![(NodeId::new("a"), NodeId::new("b")), (NodeId::new("b"), NodeId::new("a"))];
        let positions = layout_hierarchical(&items, &edges, &cfg);
        assert_eq!(positions.len(), 2);
    }
}
