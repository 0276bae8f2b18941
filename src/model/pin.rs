//! Pin constraints (spec §3, §4.3, §4.5).

use crate::ids::{NodeId, PinConstraintId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    N,
    S,
    E,
    W,
}

impl Direction {
    /// Unit vector pointing from the pinned target towards the side of the
    /// source it touches. Used by the pin resolver (`layout::pin_resolver`)
    /// to place the target edge-to-edge with `source`.
    pub fn unit_vector(self) -> (f64, f64) {
        match self {
            Direction::N => (0.0, -1.0),
            Direction::S => (0.0, 1.0),
            Direction::E => (1.0, 0.0),
            Direction::W => (-1.0, 0.0),
        }
    }
}

/// "target pins to source on side direction".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinConstraint {
    pub id: PinConstraintId,
    pub source_organizer_id: NodeId,
    pub target_organizer_id: NodeId,
    pub direction: Direction,
}
