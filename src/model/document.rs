//! `Document` and `Page` (spec §3).
//!
//! These are plain, serializable snapshots of what the CRDT store holds at
//! a moment in time — the `adapter` reads/writes through `store`, and
//! reconstructs values of these types for callers and for `toJSON`. They
//! are not themselves the source of truth (the CRDT document is).

use crate::ids::{DeployableId, NodeId, PageId};
use crate::model::edge::Edge;
use crate::model::node::Node;
use crate::model::pin::PinConstraint;
use crate::model::schema::{
    Deployable, PackageManifestEntry, PortSchema, Schema, SchemaGroup, SchemaPackage, SchemaRelationship,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const CURRENT_VERSION: u32 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub name: String,
    /// Insertion order preserved (spec §3: "parent-before-children order in
    /// the page's insertion sequence").
    pub nodes: IndexMap<NodeId, Node>,
    pub edges: IndexMap<crate::ids::EdgeId, Edge>,
    pub pin_constraints: Vec<PinConstraint>,
    /// Deployables are scoped per-page (spec §3: "`deployables` (per-page)").
    #[serde(default)]
    pub deployables: IndexMap<DeployableId, Deployable>,
}

impl Page {
    pub fn new(id: PageId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            pin_constraints: Vec::new(),
            deployables: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_page_id: Option<PageId>,
    pub schemas: IndexMap<crate::ids::SchemaId, Schema>,
    pub port_schemas: IndexMap<crate::ids::PortSchemaId, PortSchema>,
    pub schema_groups: IndexMap<crate::ids::SchemaGroupId, SchemaGroup>,
    pub schema_packages: IndexMap<crate::ids::SchemaPackageId, SchemaPackage>,
    pub schema_relationships: IndexMap<crate::ids::SchemaRelationshipId, SchemaRelationship>,
    pub package_manifest: Vec<PackageManifestEntry>,
    /// Forward-only migration cursor (spec §4.7). Not part of the public
    /// snapshot contract (§6 lists the fields that are); tracked alongside
    /// the document purely so migrations know where to resume.
    #[serde(default)]
    pub migration_version: u32,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            title: title.into(),
            description: None,
            pages: Vec::new(),
            active_page_id: None,
            schemas: IndexMap::new(),
            port_schemas: IndexMap::new(),
            schema_groups: IndexMap::new(),
            schema_packages: IndexMap::new(),
            schema_relationships: IndexMap::new(),
            package_manifest: Vec::new(),
            migration_version: crate::migrations::LATEST_MIGRATION_VERSION,
        }
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|p| &p.id == id)
    }

    pub fn page_mut(&mut self, id: &PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| &p.id == id)
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.active_page_id.as_ref().and_then(|id| self.page(id))
    }
}
