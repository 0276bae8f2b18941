//! Error taxonomy (spec §7).
//!
//! `CoreError` covers the two fatal categories the adapter can raise
//! synchronously. `UnknownId`-style failures are intentionally *not* part of
//! this enum's happy path for patch/remove operations: those are swallowed
//! at the call site and logged via `tracing::debug!`, per §7's propagation
//! policy. The variant still exists here for operations that the spec does
//! treat as fatal on a missing id (`setActivePage`, `deletePage` callers that
//! want to know whether anything happened, etc.).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("unknown {kind} id: {id}")]
    UnknownId { kind: &'static str, id: String },

    #[error("migration to version {version} failed: {source}")]
    MigrationFailed {
        version: u32,
        #[source]
        source: anyhow::Error,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;

/// A non-fatal pin-constraint conflict, collected rather than thrown (§7, §4.3).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinWarning {
    pub constraint_id: crate::ids::PinConstraintId,
    pub reason: String,
}
