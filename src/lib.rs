//! Document core for a collaborative visual architecture editor.
//!
//! This crate is the engine underneath the node-graph view, not the view
//! itself (spec §1): a CRDT-backed document model (`model`, `adapter`,
//! `store`), pure layout geometry (`layout`, `glue`, `hierarchy`), the
//! presentation pipeline (`presentation`), forward-only migrations
//! (`migrations`), and canonical serialization (`serialization`). `actions`
//! is the façade that glues layout and the adapter together under the
//! three-layer sync discipline (spec §4.5). Everything above `store` is
//! plain, host-agnostic Rust; the only place `target_arch = "wasm32"`
//! matters is the `wasm` boundary.

pub mod actions;
pub mod adapter;
pub mod diagnostics;
pub mod error;
pub mod glue;
pub mod hierarchy;
pub mod ids;
pub mod layout;
pub mod migrations;
pub mod model;
pub mod origin;
pub mod presentation;
pub mod registry;
pub mod serialization;
pub mod store;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use adapter::DocumentAdapter;
pub use error::{CoreError, CoreResult, PinWarning};
pub use model::Document;
pub use origin::Origin;
