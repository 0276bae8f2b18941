//! Registry entries: schemas, ports, groups, packages, relationships, and
//! deployables. Shape is opaque to the core except for the fields called
//! out in spec §3 (`polarity` on `PortSchema`, membership back-references on
//! `SchemaGroup`) — everything else round-trips through `extra`.

use crate::ids::{DeployableId, PortSchemaId, SchemaGroupId, SchemaId, SchemaPackageId, SchemaRelationshipId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Source,
    Sink,
    Bidirectional,
    Relay,
    Intercept,
}

impl Polarity {
    pub fn is_source_like(self) -> bool {
        matches!(self, Polarity::Source | Polarity::Relay | Polarity::Bidirectional)
    }

    pub fn is_sink_like(self) -> bool {
        matches!(self, Polarity::Sink | Polarity::Intercept | Polarity::Bidirectional)
    }
}

/// Required shape: `{type, displayName, color, fields, compilation}` (spec
/// §6). `fields`/`compilation` are host-defined templates the core never
/// interprets, so they live in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: SchemaId,
    #[serde(rename = "type")]
    pub schema_type: String,
    pub display_name: String,
    pub color: String,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Required shape: `{id, displayName, semanticDescription, polarity,
/// compatibleWith, color}` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSchema {
    pub id: PortSchemaId,
    pub display_name: String,
    pub semantic_description: String,
    pub polarity: Polarity,
    #[serde(default)]
    pub compatible_with: Vec<String>,
    pub color: String,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Required shape: `{id, name}` (spec §6), plus membership back-references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaGroup {
    pub id: SchemaGroupId,
    pub name: String,
    #[serde(default)]
    pub member_schema_ids: Vec<SchemaId>,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaPackage {
    pub id: SchemaPackageId,
    pub name: String,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRelationship {
    pub id: SchemaRelationshipId,
    pub from_schema_id: SchemaId,
    pub to_schema_id: SchemaId,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployable {
    pub id: DeployableId,
    pub name: String,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An entry in the document's `packageManifest` list (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifestEntry {
    pub package_id: SchemaPackageId,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The wildcard that makes `compatible_with` match any id (spec §6).
pub const WILDCARD: &str = "*";
