//! Error types for the room layer.

use keyrace_protocol::RoomId;
use keyrace_transport::ConnectionId;

use crate::RacePhase;

/// Errors that can occur during room operations.
///
/// Only admission paths ever surface one of these to a client (as a
/// targeted error notice); every other path absorbs them as a no-op.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this id. The expected answer to a stale or
    /// mistyped identifier, not a fault.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is past admission; the race has already begun.
    #[error("room {0} is not accepting players while {1}")]
    NotJoinable(RoomId, RacePhase),

    /// This connection already backs a player in the room.
    #[error("connection {0} already joined room {1}")]
    AlreadyJoined(ConnectionId, RoomId),

    /// The room's command channel is gone (room shutting down).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
