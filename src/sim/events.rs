//! Outcomes of one update pass, consumed by the game loop

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A crumbling or dissolving platform ran out of time
    PlatformCrumbled { index: Option<u32> },
    /// A non-safety platform left play (level progress)
    PlatformExited { index: u32 },
    /// A magnetized collectible reached the player
    Collected {
        kind: EntityKind,
        value: u32,
        pos: Vec2,
    },
    /// A collectible's magnet ran out before it was collected
    MagnetExpired,
    /// Oldest entries dropped to respect a budget
    ParticlesEvicted { kind: EntityKind, count: usize },
}
