//! Canonical document snapshot and schema-library file format (spec §6).
//!
//! The adapter's [`crate::adapter::DocumentAdapter::snapshot`] already
//! reconstructs a [`crate::model::Document`] from the CRDT store; this
//! module is the thin wire layer on top of it — reshaping maps into the
//! ordered arrays the snapshot contract promises, and validating
//! `.carta-schemas` imports before any state is touched.

use crate::error::{CoreError, CoreResult};
use crate::ids::PageId;
use crate::model::edge::Edge;
use crate::model::node::Node;
use crate::model::schema::{PortSchema, Schema, SchemaGroup, SchemaPackage, SchemaRelationship};
use crate::model::{Document, PackageManifestEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page within the canonical snapshot: `nodes`/`edges` as ordered
/// arrays rather than the `IndexMap`s `Document`/`Page` use internally
/// (spec §6: `pages: [ { id, name, nodes: [...], edges: [...] } ]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPage {
    pub id: PageId,
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// The canonical document snapshot, version 4 (spec §6). All listed fields
/// are always present — empty arrays rather than omitted — except
/// `description`/`active_page`, which are omitted when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pages: Vec<SnapshotPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_page: Option<PageId>,
    pub schemas: Vec<Schema>,
    pub port_schemas: Vec<PortSchema>,
    pub schema_groups: Vec<SchemaGroup>,
    pub schema_packages: Vec<SchemaPackage>,
    pub schema_relationships: Vec<SchemaRelationship>,
    pub package_manifest: Vec<PackageManifestEntry>,
}

/// `toJSON` (spec §4.1, §6): reshapes a [`Document`] into the wire-contract
/// snapshot. Property order is not part of the contract, but field
/// presence and array-vs-map shape are.
pub fn to_snapshot(doc: &Document) -> Snapshot {
    Snapshot {
        version: doc.version,
        title: doc.title.clone(),
        description: doc.description.clone(),
        pages: doc
            .pages
            .iter()
            .map(|p| SnapshotPage {
                id: p.id.clone(),
                name: p.name.clone(),
                nodes: p.nodes.values().cloned().collect(),
                edges: p.edges.values().cloned().collect(),
            })
            .collect(),
        active_page: doc.active_page_id.clone(),
        schemas: doc.schemas.values().cloned().collect(),
        port_schemas: doc.port_schemas.values().cloned().collect(),
        schema_groups: doc.schema_groups.values().cloned().collect(),
        schema_packages: doc.schema_packages.values().cloned().collect(),
        schema_relationships: doc.schema_relationships.values().cloned().collect(),
        package_manifest: doc.package_manifest.clone(),
    }
}

pub fn to_json(doc: &Document) -> serde_json::Value {
    serde_json::to_value(to_snapshot(doc)).expect("Snapshot serialization is infallible for in-memory documents")
}

/// Inverse of [`to_snapshot`]: rebuilds a [`Document`] from a parsed
/// snapshot. `migration_version` is not part of the wire contract (spec
/// §6), so a document parsed this way is treated as already current —
/// callers that load from an external snapshot rather than the live store
/// should run [`crate::migrations::run_pending`] against the resulting
/// adapter state if they cannot otherwise guarantee that.
pub fn from_snapshot(snapshot: Snapshot) -> Document {
    use crate::model::document::Page;
    use indexmap::IndexMap;

    Document {
        version: snapshot.version,
        title: snapshot.title,
        description: snapshot.description,
        pages: snapshot
            .pages
            .into_iter()
            .map(|p| Page {
                id: p.id,
                name: p.name,
                nodes: p.nodes.into_iter().map(|n| (n.id.clone(), n)).collect::<IndexMap<_, _>>(),
                edges: p.edges.into_iter().map(|e| (e.id.clone(), e)).collect::<IndexMap<_, _>>(),
                pin_constraints: Vec::new(),
                deployables: IndexMap::new(),
            })
            .collect(),
        active_page_id: snapshot.active_page,
        schemas: snapshot.schemas.into_iter().map(|s| (s.id.clone(), s)).collect(),
        port_schemas: snapshot.port_schemas.into_iter().map(|p| (p.id.clone(), p)).collect(),
        schema_groups: snapshot.schema_groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
        schema_packages: snapshot.schema_packages.into_iter().map(|p| (p.id.clone(), p)).collect(),
        schema_relationships: snapshot.schema_relationships.into_iter().map(|r| (r.id.clone(), r)).collect(),
        package_manifest: snapshot.package_manifest,
        migration_version: crate::migrations::LATEST_MIGRATION_VERSION,
    }
}

pub fn parse_json(value: serde_json::Value) -> CoreResult<Document> {
    let snapshot: Snapshot =
        serde_json::from_value(value).map_err(|e| CoreError::InvalidShape(format!("malformed document snapshot: {e}")))?;
    Ok(from_snapshot(snapshot))
}

/// `.carta-schemas` file (spec §6): a portable bundle of schema registry
/// entries, independent of any one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaLibraryFile {
    pub format_version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    pub schemas: Vec<Schema>,
    pub port_schemas: Vec<PortSchema>,
    pub schema_groups: Vec<SchemaGroup>,
    pub exported_at: DateTime<Utc>,
}

const CURRENT_LIBRARY_FORMAT_VERSION: u64 = 1;

const REQUIRED_SCHEMA_FIELDS: &[&str] = &["type", "displayName", "color", "fields", "compilation"];
const REQUIRED_PORT_SCHEMA_FIELDS: &[&str] =
    &["id", "displayName", "semanticDescription", "polarity", "compatibleWith", "color"];
const REQUIRED_SCHEMA_GROUP_FIELDS: &[&str] = &["id", "name"];
const VALID_POLARITIES: &[&str] = &["source", "sink", "bidirectional", "relay", "intercept"];

/// Validates and parses a `.carta-schemas` payload (spec §6): object shape,
/// `formatVersion === 1`, and every required field on each schema/port
/// schema/schema group entry, rejected before any document state is
/// touched.
pub fn import_schema_library(raw: &str) -> CoreResult<SchemaLibraryFile> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| CoreError::InvalidShape(format!("not valid JSON: {e}")))?;

    let object = value.as_object().ok_or_else(|| CoreError::InvalidShape("schema library must be a JSON object".into()))?;

    let format_version = object
        .get("formatVersion")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| CoreError::InvalidShape("missing or non-numeric formatVersion".into()))?;
    if format_version != CURRENT_LIBRARY_FORMAT_VERSION {
        return Err(CoreError::InvalidShape(format!("unsupported formatVersion {format_version}, expected 1")));
    }

    validate_entries(object, "schemas", REQUIRED_SCHEMA_FIELDS)?;
    validate_entries(object, "portSchemas", REQUIRED_PORT_SCHEMA_FIELDS)?;
    validate_entries(object, "schemaGroups", REQUIRED_SCHEMA_GROUP_FIELDS)?;

    for entry in object.get("portSchemas").and_then(serde_json::Value::as_array).into_iter().flatten() {
        let polarity = entry.get("polarity").and_then(serde_json::Value::as_str).unwrap_or_default();
        if !VALID_POLARITIES.contains(&polarity) {
            return Err(CoreError::InvalidShape(format!("portSchema has invalid polarity {polarity:?}")));
        }
    }

    serde_json::from_value(value).map_err(|e| CoreError::InvalidShape(format!("malformed schema library: {e}")))
}

fn validate_entries(object: &serde_json::Map<String, serde_json::Value>, key: &str, required: &[&str]) -> CoreResult<()> {
    let entries = object
        .get(key)
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::InvalidShape(format!("missing or non-array {key}")))?;

    for (index, entry) in entries.iter().enumerate() {
        let fields = entry.as_object().ok_or_else(|| CoreError::InvalidShape(format!("{key}[{index}] is not an object")))?;
        for field in required {
            if !fields.contains_key(*field) {
                return Err(CoreError::InvalidShape(format!("{key}[{index}] missing required field {field:?}")));
            }
        }
    }
    Ok(())
}

pub fn export_schema_library(
    name: impl Into<String>,
    description: Option<String>,
    version: impl Into<String>,
    changelog: Option<String>,
    schemas: Vec<Schema>,
    port_schemas: Vec<PortSchema>,
    schema_groups: Vec<SchemaGroup>,
    exported_at: DateTime<Utc>,
) -> SchemaLibraryFile {
    SchemaLibraryFile {
        format_version: CURRENT_LIBRARY_FORMAT_VERSION as u32,
        name: name.into(),
        description,
        version: version.into(),
        changelog,
        schemas,
        port_schemas,
        schema_groups,
        exported_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{PageId, PortSchemaId, SchemaId};
    use crate::model::document::Page;
    use crate::model::schema::Polarity;

    fn sample_document() -> Document {
        let mut doc = Document::new("My Document");
        doc.pages.push(Page::new(PageId::new("p1"), "Main"));
        doc.schemas.insert(
            SchemaId::new("s1"),
            Schema { id: SchemaId::new("s1"), schema_type: "service".into(), display_name: "Service".into(), color: "#fff".into(), extra: Default::default() },
        );
        doc
    }

    #[test]
    fn round_trips_through_json() {
        let doc = sample_document();
        let json = to_json(&doc);
        let parsed = parse_json(json).unwrap();
        assert_eq!(parsed.version, doc.version);
        assert_eq!(parsed.title, doc.title);
        assert_eq!(parsed.pages.len(), doc.pages.len());
        assert_eq!(parsed.schemas.len(), doc.schemas.len());
    }

    #[test]
    fn snapshot_always_has_all_listed_fields_even_when_empty() {
        let doc = Document::new("Empty");
        let json = to_json(&doc);
        let object = json.as_object().unwrap();
        for field in ["version", "title", "pages", "schemas", "portSchemas", "schemaGroups", "schemaPackages", "schemaRelationships", "packageManifest"] {
            assert!(object.contains_key(field), "missing field {field}");
        }
        assert!(!object.contains_key("activePage"));
    }

    fn valid_library_json() -> serde_json::Value {
        serde_json::json!({
            "formatVersion": 1,
            "name": "Core Library",
            "version": "1.0.0",
            "exportedAt": "2026-01-01T00:00:00Z",
            "schemas": [{"type": "service", "displayName": "Service", "color": "#fff", "fields": [], "compilation": {}}],
            "portSchemas": [{"id": "data-out", "displayName": "Data Out", "semanticDescription": "", "polarity": "source", "compatibleWith": ["data-in"], "color": "#fff"}],
            "schemaGroups": [{"id": "g1", "name": "Group"}],
        })
    }

    #[test]
    fn imports_a_valid_library() {
        let raw = valid_library_json().to_string();
        let library = import_schema_library(&raw).unwrap();
        assert_eq!(library.format_version, 1);
        assert_eq!(library.port_schemas[0].id, PortSchemaId::new("data-out"));
    }

    #[test]
    fn rejects_wrong_format_version_before_touching_state() {
        let mut value = valid_library_json();
        value["formatVersion"] = serde_json::json!(2);
        let err = import_schema_library(&value.to_string()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidShape(_)));
    }

    #[test]
    fn rejects_schema_missing_a_required_field() {
        let mut value = valid_library_json();
        value["schemas"][0].as_object_mut().unwrap().remove("compilation");
        let err = import_schema_library(&value.to_string()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidShape(_)));
    }

    #[test]
    fn rejects_port_schema_with_invalid_polarity() {
        let mut value = valid_library_json();
        value["portSchemas"][0]["polarity"] = serde_json::json!("forward");
        let err = import_schema_library(&value.to_string()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidShape(_)));
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = import_schema_library("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, CoreError::InvalidShape(_)));
    }
}
