//! The document model (spec §3): versioned documents, pages, nodes, edges,
//! pin constraints, and the schema/port/group/package/relationship/deployable
//! registries.

pub mod document;
pub mod edge;
pub mod geometry;
pub mod node;
pub mod pin;
pub mod schema;

pub use document::{Document, Page, CURRENT_VERSION};
pub use edge::{Edge, EdgeData};
pub use geometry::{Point, Rect, Size};
pub use node::{ConstructData, Node, NodeData, OrganizerData, OrganizerLayout};
pub use pin::{Direction, PinConstraint};
pub use schema::{
    Deployable, PackageManifestEntry, PortSchema, Schema, SchemaGroup, SchemaPackage, SchemaRelationship, WILDCARD,
};
