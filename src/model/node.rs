//! Node variants: constructs, organizers, and the wagon special case of an
//! organizer (spec §3, §9 "dynamic dispatch on node variant").

use crate::ids::{DeployableId, NodeId};
use crate::model::geometry::{Point, Size};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONSTRUCT_SIZE: Size = Size { width: 200.0, height: 100.0 };
pub const DEFAULT_ORGANIZER_SIZE: Size = Size { width: 400.0, height: 300.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizerLayout {
    Freeform,
    Grid,
    Flow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructData {
    pub construct_type: String,
    /// Unique per page; distinct from the node's opaque id.
    pub semantic_id: String,
    #[serde(default)]
    pub values: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployable_id: Option<DeployableId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerData {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub collapsed: bool,
    pub layout: OrganizerLayout,
    /// Present iff this organizer is a wagon tethered to the construct
    /// whose `data.semantic_id` matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_to_semantic_id: Option<String>,
}

impl OrganizerData {
    pub fn is_wagon(&self) -> bool {
        self.attached_to_semantic_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NodeData {
    Construct(ConstructData),
    Organizer(OrganizerData),
}

impl NodeData {
    pub fn as_organizer(&self) -> Option<&OrganizerData> {
        match self {
            NodeData::Organizer(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_organizer_mut(&mut self) -> Option<&mut OrganizerData> {
        match self {
            NodeData::Organizer(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_construct(&self) -> Option<&ConstructData> {
        match self {
            NodeData::Construct(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_construct_mut(&mut self) -> Option<&mut ConstructData> {
        match self {
            NodeData::Construct(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_wagon(&self) -> bool {
        self.as_organizer().is_some_and(|o| o.is_wagon())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    /// Relative to `parent_id` if set, otherwise absolute canvas coordinates.
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Authoritative over `measured` when set (manual resize).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_size: Option<Size>,
    /// Advisory size reported back by the view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Size>,
    pub data: NodeData,
}

impl Node {
    pub fn is_construct(&self) -> bool {
        matches!(self.data, NodeData::Construct(_))
    }

    pub fn is_organizer(&self) -> bool {
        matches!(self.data, NodeData::Organizer(_))
    }

    pub fn is_wagon(&self) -> bool {
        self.data.is_wagon()
    }

    /// Effective size per the precedence in spec §3: style > measured >
    /// explicit width/height > type default.
    pub fn effective_size(&self) -> Size {
        if let Some(s) = self.style_size {
            return s;
        }
        if let Some(m) = self.measured {
            return m;
        }
        if self.width.is_some() || self.height.is_some() {
            let default = self.type_default_size();
            return Size::new(self.width.unwrap_or(default.width), self.height.unwrap_or(default.height));
        }
        self.type_default_size()
    }

    fn type_default_size(&self) -> Size {
        match &self.data {
            NodeData::Construct(_) => DEFAULT_CONSTRUCT_SIZE,
            NodeData::Organizer(_) => DEFAULT_ORGANIZER_SIZE,
        }
    }
}
