//! Transaction origins (spec §4.1, §5, §9).
//!
//! Every top-level `adapter::transaction` call is tagged with one of these.
//! The core itself never inspects the undo stack (that's host-owned glue,
//! an explicit non-goal in spec §1) — it only guarantees `get_last_origin()`
//! reflects the most recently committed transaction so a host-side undo
//! manager can filter by it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Default; the only origin a host-side undo manager tracks.
    User,
    /// External agent (e.g. an MCP tool call); not undo-tracked.
    AiMcp,
    Migration,
    Layout,
    Sync,
}

impl Origin {
    pub fn is_undo_tracked(self) -> bool {
        matches!(self, Origin::User)
    }
}

impl Default for Origin {
    fn default() -> Self {
        Origin::User
    }
}
