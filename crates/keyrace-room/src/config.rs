//! Room configuration and the race phase state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a race room.
///
/// Every room spawned by one [`crate::RoomRegistry`] shares the
/// registry's config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum players for the countdown to arm. A solo room never
    /// starts, however ready its one player is.
    pub min_racers: usize,

    /// First countdown value broadcast; ticks descend from here to 0.
    pub countdown_from: u8,

    /// Delay before the first countdown tick and between ticks.
    pub countdown_interval: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_racers: 2,
            countdown_from: 3,
            countdown_interval: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// RacePhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// Transitions are monotonic and one-directional:
///
/// ```text
/// Lobby → Starting → Racing → Finished
/// ```
///
/// - **Lobby**: accepting players, collecting ready reports.
/// - **Starting**: everyone is ready, the countdown is running. Still
///   accepting players.
/// - **Racing**: the countdown is exhausted; progress reports flow.
/// - **Finished**: named for completeness of the lifecycle. Winner
///   determination leaves the phase at `Racing` so the rest of the field
///   can keep finishing; a room ends by emptying out, not by entering
///   this phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    Lobby,
    Starting,
    Racing,
    Finished,
}

impl RacePhase {
    /// Returns `true` if the room is accepting new players.
    ///
    /// Admission stays open through the countdown; it closes when the
    /// race begins.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby | Self::Starting)
    }

    /// Returns `true` if progress reports are accepted.
    pub fn is_racing(&self) -> bool {
        matches!(self, Self::Racing)
    }

    /// The next phase in the strict ordering, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::Starting),
            Self::Starting => Some(Self::Racing),
            Self::Racing => Some(Self::Finished),
            Self::Finished => None,
        }
    }
}

impl std::fmt::Display for RacePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Starting => write!(f, "Starting"),
            Self::Racing => write!(f, "Racing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
