//! Newtype identifiers used across the document model.
//!
//! All ids are opaque strings. `NodeId`s are minted by the adapter with
//! `ulid`; the others are supplied by callers (schema ids, for instance,
//! are author-chosen and must stay stable across exports).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_type!(PageId);
id_type!(NodeId);
id_type!(EdgeId);
id_type!(SchemaId);
id_type!(PortSchemaId);
id_type!(SchemaGroupId);
id_type!(SchemaPackageId);
id_type!(SchemaRelationshipId);
id_type!(DeployableId);
id_type!(PinConstraintId);

/// Mint a fresh node id. Exposed as its own function (rather than inlined at
/// call sites) because it is the one place in the crate that needs entropy.
pub fn generate_node_id() -> NodeId {
    NodeId(ulid::Ulid::new().to_string())
}

pub fn generate_pin_constraint_id() -> PinConstraintId {
    PinConstraintId(ulid::Ulid::new().to_string())
}

pub fn generate_page_id() -> PageId {
    PageId(ulid::Ulid::new().to_string())
}
