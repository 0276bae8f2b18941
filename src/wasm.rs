//! WASM bindings for the document core.
//!
//! Thin wrapper functions that call into the plain-Rust `adapter`/`actions`/
//! `presentation`/`serialization` API and hand JSON strings across the
//! boundary, mirroring the teacher's `wasm.rs` — the host (the node-graph
//! view, the sync transport) never touches `yrs` or `DocumentAdapter`
//! directly. Failures are logged via `tracing` rather than the teacher's
//! raw `console_error` calls, and surfaced to JS as a thrown string.

use wasm_bindgen::prelude::*;

use crate::actions::{self, AlignAxis, DistributeAxis, FlowDirection};
use crate::adapter::{DocumentAdapter, EdgeDataPatch, NodePatch, NodePositionStylePatch};
use crate::error::CoreError;
use crate::ids::{NodeId, PageId};
use crate::layout::LayoutConfig;
use crate::model::edge::Edge;
use crate::model::node::Node;
use crate::presentation;
use crate::serialization;

fn ensure_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    });
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, JsValue> {
    serde_json::from_str(raw).map_err(js_err)
}

fn to_json_string<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_err)
}

/// The handle JS holds onto; wraps a [`DocumentAdapter`].
#[wasm_bindgen]
pub struct CartaDocument {
    adapter: DocumentAdapter,
}

#[wasm_bindgen]
impl CartaDocument {
    #[wasm_bindgen(constructor)]
    pub fn new(title: &str) -> CartaDocument {
        ensure_logging();
        CartaDocument { adapter: DocumentAdapter::new(title) }
    }

    /// Parses a canonical snapshot (spec §6) into a fresh document, running
    /// any pending migrations before handing it back.
    #[wasm_bindgen(js_name = fromSnapshot)]
    pub fn from_snapshot(json: &str) -> Result<CartaDocument, JsValue> {
        ensure_logging();
        let value: serde_json::Value = serde_json::from_str(json).map_err(js_err)?;
        let doc = serialization::parse_json(value).map_err(js_err)?;
        let adapter = DocumentAdapter::from_document(doc);
        crate::migrations::run_pending(&adapter).map_err(js_err)?;
        Ok(CartaDocument { adapter })
    }

    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> String {
        serialization::to_json(&self.adapter.snapshot()).to_string()
    }

    #[wasm_bindgen(js_name = getTitle)]
    pub fn get_title(&self) -> String {
        self.adapter.get_title()
    }

    #[wasm_bindgen(js_name = setTitle)]
    pub fn set_title(&self, title: &str) {
        self.adapter.set_title(title);
    }

    #[wasm_bindgen(js_name = createPage)]
    pub fn create_page(&self, name: &str) -> Result<String, JsValue> {
        to_json_string(&self.adapter.create_page(name))
    }

    #[wasm_bindgen(js_name = deletePage)]
    pub fn delete_page(&self, id: &str) -> bool {
        self.adapter.delete_page(&PageId::new(id))
    }

    #[wasm_bindgen(js_name = setActivePage)]
    pub fn set_active_page(&self, id: &str) -> Result<(), JsValue> {
        self.adapter.set_active_page(&PageId::new(id)).map_err(js_err)
    }

    #[wasm_bindgen(js_name = getNodes)]
    pub fn get_nodes(&self) -> Result<String, JsValue> {
        to_json_string(&self.adapter.get_nodes())
    }

    #[wasm_bindgen(js_name = setNodes)]
    pub fn set_nodes(&self, nodes_json: &str) -> Result<(), JsValue> {
        let nodes: Vec<Node> = parse_json(nodes_json)?;
        self.adapter.set_nodes(nodes);
        Ok(())
    }

    #[wasm_bindgen(js_name = updateNode)]
    pub fn update_node(&self, id: &str, patch_json: &str) -> Result<(), JsValue> {
        let patch: NodePatch = parse_json(patch_json)?;
        self.adapter.update_node(&NodeId::new(id), patch).map_err(js_err)
    }

    #[wasm_bindgen(js_name = patchNodes)]
    pub fn patch_nodes(&self, patches_json: &str) -> Result<(), JsValue> {
        let patches: Vec<NodePositionStylePatch> = parse_json(patches_json)?;
        self.adapter.patch_nodes(patches);
        Ok(())
    }

    #[wasm_bindgen(js_name = getEdges)]
    pub fn get_edges(&self) -> Result<String, JsValue> {
        to_json_string(&self.adapter.get_edges())
    }

    #[wasm_bindgen(js_name = setEdges)]
    pub fn set_edges(&self, edges_json: &str) -> Result<(), JsValue> {
        let edges: Vec<Edge> = parse_json(edges_json)?;
        self.adapter.set_edges(edges);
        Ok(())
    }

    #[wasm_bindgen(js_name = patchEdgeData)]
    pub fn patch_edge_data(&self, patches_json: &str) -> Result<(), JsValue> {
        let patches: Vec<EdgeDataPatch> = parse_json(patches_json)?;
        self.adapter.patch_edge_data(patches);
        Ok(())
    }

    /// Runs the presentation pipeline (spec §4.6) over the active page's
    /// current nodes/edges and hands back `{processedNodes, processedEdges}`.
    #[wasm_bindgen(js_name = computePresentation)]
    pub fn compute_presentation(&self, selected_json: &str) -> Result<String, JsValue> {
        let selected: Vec<NodeId> = parse_json(selected_json)?;
        let nodes = self.adapter.get_nodes();
        let edges = self.adapter.get_edges();
        let result = presentation::compute_presentation(&nodes, &edges, &selected.into_iter().collect());
        to_json_string(&result)
    }

    #[wasm_bindgen(js_name = gridLayoutChildren)]
    pub fn grid_layout_children(&self, organizer_id: &str, columns: Option<u32>) {
        let columns = columns.map(|c| c as usize);
        actions::grid_layout_children(&self.adapter, &NodeId::new(organizer_id), columns, &LayoutConfig::default());
    }

    #[wasm_bindgen(js_name = flowLayoutChildren)]
    pub fn flow_layout_children(&self, organizer_id: &str) {
        actions::flow_layout_children(&self.adapter, &NodeId::new(organizer_id), &LayoutConfig::default());
    }

    #[wasm_bindgen(js_name = spreadChildren)]
    pub fn spread_children(&self, organizer_id: &str) {
        actions::spread_children(&self.adapter, &NodeId::new(organizer_id), &LayoutConfig::default());
    }

    #[wasm_bindgen(js_name = fitToChildren)]
    pub fn fit_to_children(&self, organizer_id: &str) {
        actions::fit_to_children(&self.adapter, &NodeId::new(organizer_id), &LayoutConfig::default());
    }

    #[wasm_bindgen(js_name = spreadAll)]
    pub fn spread_all(&self) {
        actions::spread_all(&self.adapter, &LayoutConfig::default());
    }

    #[wasm_bindgen(js_name = compactAll)]
    pub fn compact_all(&self) {
        actions::compact_all(&self.adapter, &LayoutConfig::default());
    }

    #[wasm_bindgen(js_name = hierarchicalLayout)]
    pub fn hierarchical_layout(&self) {
        actions::hierarchical_layout(&self.adapter, &LayoutConfig::default());
    }

    /// `axis` is one of `left`/`center`/`right`/`top`/`middle`/`bottom`.
    #[wasm_bindgen(js_name = alignNodes)]
    pub fn align_nodes(&self, ids_json: &str, axis: &str) -> Result<(), JsValue> {
        let ids: Vec<NodeId> = parse_json(ids_json)?;
        let axis = parse_align_axis(axis).map_err(js_err)?;
        actions::align_nodes(&self.adapter, &ids, axis, &LayoutConfig::default()).map_err(js_err)
    }

    /// `axis` is one of `horizontal`/`vertical`.
    #[wasm_bindgen(js_name = distributeNodes)]
    pub fn distribute_nodes(&self, ids_json: &str, axis: &str) -> Result<(), JsValue> {
        let ids: Vec<NodeId> = parse_json(ids_json)?;
        let axis = match axis {
            "horizontal" => DistributeAxis::Horizontal,
            "vertical" => DistributeAxis::Vertical,
            other => return Err(js_err(CoreError::InvalidShape(format!("unknown distribute axis: {other}")))),
        };
        actions::distribute_nodes(&self.adapter, &ids, axis).map_err(js_err)
    }

    /// `direction` is one of `LR`/`RL`/`TB`/`BT`.
    #[wasm_bindgen(js_name = flowLayout)]
    pub fn flow_layout(&self, direction: &str) -> Result<(), JsValue> {
        let direction = parse_flow_direction(direction).map_err(js_err)?;
        actions::flow_layout(&self.adapter, direction, &LayoutConfig::default());
        Ok(())
    }

    #[wasm_bindgen(js_name = attachNodeToOrganizer)]
    pub fn attach_node_to_organizer(&self, node_id: &str, organizer_id: &str) -> Result<(), JsValue> {
        actions::attach_node_to_organizer(&self.adapter, &NodeId::new(node_id), &NodeId::new(organizer_id), &LayoutConfig::default())
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = detachNodeFromOrganizer)]
    pub fn detach_node_from_organizer(&self, node_id: &str) -> Result<(), JsValue> {
        actions::detach_node_from_organizer(&self.adapter, &NodeId::new(node_id), &LayoutConfig::default()).map_err(js_err)
    }

    #[wasm_bindgen(js_name = routeEdges)]
    pub fn route_edges(&self) {
        actions::route_edges(&self.adapter, &LayoutConfig::default());
    }

    #[wasm_bindgen(js_name = clearRoutes)]
    pub fn clear_routes(&self) {
        actions::clear_routes(&self.adapter);
    }

    /// Returns the `Vec<PinWarning>` collected while resolving pin
    /// constraints for the active page (spec §4.5 `applyPinLayout`).
    #[wasm_bindgen(js_name = applyPinLayout)]
    pub fn apply_pin_layout(&self) -> Result<String, JsValue> {
        let warnings = actions::apply_pin_layout(&self.adapter, &LayoutConfig::default());
        to_json_string(&warnings)
    }

    #[wasm_bindgen(js_name = runPendingMigrations)]
    pub fn run_pending_migrations(&self) -> Result<(), JsValue> {
        crate::migrations::run_pending(&self.adapter).map_err(js_err)
    }

    #[wasm_bindgen(js_name = importSchemaLibrary)]
    pub fn import_schema_library(raw: &str) -> Result<String, JsValue> {
        let file = serialization::import_schema_library(raw).map_err(js_err)?;
        to_json_string(&file)
    }
}

fn parse_align_axis(axis: &str) -> Result<AlignAxis, CoreError> {
    match axis {
        "left" => Ok(AlignAxis::Left),
        "center" => Ok(AlignAxis::Center),
        "right" => Ok(AlignAxis::Right),
        "top" => Ok(AlignAxis::Top),
        "middle" => Ok(AlignAxis::Middle),
        "bottom" => Ok(AlignAxis::Bottom),
        other => Err(CoreError::InvalidShape(format!("unknown align axis: {other}"))),
    }
}

fn parse_flow_direction(direction: &str) -> Result<FlowDirection, CoreError> {
    match direction {
        "LR" => Ok(FlowDirection::Lr),
        "RL" => Ok(FlowDirection::Rl),
        "TB" => Ok(FlowDirection::Tb),
        "BT" => Ok(FlowDirection::Bt),
        other => Err(CoreError::InvalidShape(format!("unknown flow direction: {other}"))),
    }
}
