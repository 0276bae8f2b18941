//! Forward-only, numbered migrations (spec §4.7), run transactionally on
//! load under `Origin::Migration` so they never pollute undo history.
//!
//! Each [`Migration`] transforms an in-memory [`Document`] snapshot, not the
//! live store directly. `run_pending` reads the document once, runs every
//! pending transform against that copy, and only calls
//! [`DocumentAdapter::load_document`] -- a single store write -- once every
//! transform up to [`LATEST_MIGRATION_VERSION`] has succeeded. A failing
//! transform returns before that write ever happens, so "the document is
//! left at its pre-migration version" (spec §7 `MigrationFailed`) is
//! genuinely atomic rather than a partially-applied sequence of adapter
//! writes.

use crate::adapter::DocumentAdapter;
use crate::error::{CoreError, CoreResult};
use crate::model::schema::{PortSchema, WILDCARD};
use crate::model::Document;
use crate::origin::Origin;
use tracing::info;

/// Bump this, and push a new [`Migration`] onto [`all_migrations`], whenever
/// a forward transform is added. Nothing else needs to change at call sites.
pub const LATEST_MIGRATION_VERSION: u32 = 2;

trait Migration {
    fn version(&self) -> u32;
    fn apply(&self, document: &mut Document) -> anyhow::Result<()>;
}

/// Runs every migration between the document's current `migrationVersion`
/// and [`LATEST_MIGRATION_VERSION`], in order, against an in-memory copy of
/// the document. A no-op if the document is already current (migration
/// monotonicity, spec §8). The copy is only written back -- in one
/// transaction, under `Origin::Migration` -- once every pending transform
/// has succeeded; a failed transform leaves the live store untouched.
pub fn run_pending(adapter: &DocumentAdapter) -> CoreResult<()> {
    let current = adapter.migration_version();
    if current >= LATEST_MIGRATION_VERSION {
        return Ok(());
    }

    let mut document = adapter.snapshot();
    for migration in all_migrations() {
        if migration.version() <= current {
            continue;
        }
        info!(version = migration.version(), "running migration");
        migration.apply(&mut document).map_err(|source| {
            let error = CoreError::MigrationFailed { version: migration.version(), source };
            tracing::error!("{error}");
            error
        })?;
        document.migration_version = migration.version();
    }

    adapter.load_document(&document, Origin::Migration);
    Ok(())
}

fn all_migrations() -> Vec<Box<dyn Migration>> {
    vec![Box::new(V1RelayRename), Box::new(V2WildcardCleanup)]
}

/// v1: the legacy port id `"forward"` is renamed to `"relay"` (spec §8
/// scenario 6), and every reference to it — in other port schemas'
/// `compatible_with` lists and in construct `connections` lists, across
/// every page — is rewritten to match.
struct V1RelayRename;

const LEGACY_FORWARD_PORT_ID: &str = "forward";
const RELAY_PORT_ID: &str = "relay";

impl Migration for V1RelayRename {
    fn version(&self) -> u32 {
        1
    }

    fn apply(&self, document: &mut Document) -> anyhow::Result<()> {
        let renamed = document.port_schemas.values().any(|p| p.id.as_str() == LEGACY_FORWARD_PORT_ID);
        if !renamed {
            return Ok(());
        }

        let mut port_schemas: Vec<PortSchema> = document.port_schemas.values().cloned().collect();
        for port in &mut port_schemas {
            if port.id.as_str() == LEGACY_FORWARD_PORT_ID {
                port.id = crate::ids::PortSchemaId::new(RELAY_PORT_ID);
            }
            for reference in &mut port.compatible_with {
                if reference == LEGACY_FORWARD_PORT_ID {
                    *reference = RELAY_PORT_ID.to_string();
                }
            }
        }
        document.port_schemas = port_schemas.into_iter().map(|p| (p.id.clone(), p)).collect();

        for page in &mut document.pages {
            for node in page.nodes.values_mut() {
                let Some(construct) = node.data.as_construct_mut() else { continue };
                for connection in &mut construct.connections {
                    if connection == LEGACY_FORWARD_PORT_ID {
                        *connection = RELAY_PORT_ID.to_string();
                    }
                }
            }
        }

        Ok(())
    }
}

/// v2: normalizes stale wildcard spellings (`"any"`, `"ALL"`, empty string)
/// to the canonical [`WILDCARD`], and drops now-redundant specific entries
/// once a list carries the wildcard (spec §4.7 "adjust compatibility lists
/// to drop stale wildcard forms").
struct V2WildcardCleanup;

const LEGACY_WILDCARD_SPELLINGS: &[&str] = &["any", "ALL", ""];

impl Migration for V2WildcardCleanup {
    fn version(&self) -> u32 {
        2
    }

    fn apply(&self, document: &mut Document) -> anyhow::Result<()> {
        for port in document.port_schemas.values_mut() {
            normalize_compatible_with(port);
        }
        Ok(())
    }
}

fn normalize_compatible_with(port: &mut PortSchema) -> bool {
    let before = port.compatible_with.clone();

    for entry in &mut port.compatible_with {
        if LEGACY_WILDCARD_SPELLINGS.contains(&entry.as_str()) {
            *entry = WILDCARD.to_string();
        }
    }

    if port.compatible_with.iter().any(|e| e == WILDCARD) {
        port.compatible_with = vec![WILDCARD.to_string()];
    } else {
        let mut seen = std::collections::HashSet::new();
        port.compatible_with.retain(|e| seen.insert(e.clone()));
    }

    port.compatible_with != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PortSchemaId;
    use crate::model::schema::Polarity;

    fn port(id: &str, compatible_with: Vec<&str>) -> PortSchema {
        PortSchema {
            id: PortSchemaId::new(id),
            display_name: id.to_string(),
            semantic_description: String::new(),
            polarity: Polarity::Source,
            compatible_with: compatible_with.into_iter().map(str::to_string).collect(),
            color: "#000".to_string(),
            extra: Default::default(),
        }
    }

    #[test]
    fn renames_forward_port_and_rewrites_connections() {
        let adapter = DocumentAdapter::new("doc");
        adapter.set_port_schemas(vec![port(LEGACY_FORWARD_PORT_ID, vec!["data-in"]), port("other", vec!["forward"])]);
        let page = adapter.create_page("main");
        adapter.set_active_page(&page.id).unwrap();
        adapter.set_nodes(vec![crate::model::node::Node {
            id: crate::ids::NodeId::new("n1"),
            position: crate::model::geometry::Point::ZERO,
            parent_id: None,
            width: None,
            height: None,
            style_size: None,
            measured: None,
            data: crate::model::node::NodeData::Construct(crate::model::node::ConstructData {
                construct_type: "service".into(),
                semantic_id: "s1".into(),
                values: Default::default(),
                connections: vec!["forward".to_string()],
                deployable_id: None,
            }),
        }]);

        assert_eq!(adapter.migration_version(), 0);
        run_pending(&adapter).unwrap();
        assert_eq!(adapter.migration_version(), LATEST_MIGRATION_VERSION);

        let ports = adapter.get_port_schemas();
        assert!(ports.iter().any(|p| p.id.as_str() == RELAY_PORT_ID));
        assert!(!ports.iter().any(|p| p.id.as_str() == LEGACY_FORWARD_PORT_ID));
        let other = ports.iter().find(|p| p.id.as_str() == "other").unwrap();
        assert_eq!(other.compatible_with, vec![RELAY_PORT_ID.to_string()]);

        let nodes = adapter.get_nodes();
        let connections = &nodes[0].data.as_construct().unwrap().connections;
        assert_eq!(connections, &vec![RELAY_PORT_ID.to_string()]);
    }

    #[test]
    fn is_a_fixed_point_once_current() {
        let adapter = DocumentAdapter::new("doc");
        run_pending(&adapter).unwrap();
        let version_after_first_run = adapter.migration_version();
        run_pending(&adapter).unwrap();
        assert_eq!(adapter.migration_version(), version_after_first_run);
    }

    #[test]
    fn wildcard_cleanup_drops_redundant_specific_entries() {
        let adapter = DocumentAdapter::new("doc");
        adapter.set_port_schemas(vec![port("p1", vec!["data-in", "any", "data-out"])]);
        run_pending(&adapter).unwrap();
        let ports = adapter.get_port_schemas();
        assert_eq!(ports[0].compatible_with, vec![WILDCARD.to_string()]);
    }
}
