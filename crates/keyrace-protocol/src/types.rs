//! Core protocol types for Keyrace's wire format.
//!
//! Every message is a flat, internally tagged JSON object: the `type`
//! field names the event, the remaining fields are its payload. Tags and
//! fields are camelCase on the wire, so a progress report looks like
//! `{"type":"progressUpdate","roomId":"x7Qa2k","username":"alice",...}`.
//!
//! Payload fields are deliberately unvalidated beyond shape: progress
//! fractions, speeds, and character counts are relayed as the client
//! reported them.

use std::fmt;

use keyrace_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a room.
///
/// A short printable token, opaque to clients: the only guarantees are
/// uniqueness among live rooms and that echoing it back addresses the
/// same room. Serializes as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a token in a `RoomId`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// One participant in the roster broadcast of [`ServerMessage::StartGame`].
///
/// Carries both the display name and the connection identifier so every
/// client converges on identical session state regardless of join order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Display name supplied at join time.
    pub username: String,
    /// The connection backing this participant.
    pub id: ConnectionId,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Open a new room; the sender becomes its first player.
    CreateRoom { username: String },

    /// Join an existing room by id.
    JoinRoom { room_id: RoomId, username: String },

    /// Signal readiness for the countdown. There is no un-ready.
    PlayerReady { room_id: RoomId, username: String },

    /// Report typing progress mid-race.
    ProgressUpdate {
        room_id: RoomId,
        username: String,
        progress: f64,
        wpm: f64,
        correct_chars: u32,
    },

    /// Report having finished the passage.
    FinishedGame {
        room_id: RoomId,
        username: String,
        wpm: f64,
    },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// To the creator only: the new room's id, passage, and echo of the
    /// creator's username.
    RoomCreated {
        room_id: RoomId,
        text: String,
        username: String,
    },

    /// To the requester only, when an admission request fails.
    ErrorMsg { message: String },

    /// Broadcast on every join: the passage and the full current roster,
    /// including the player who just joined.
    StartGame {
        text: String,
        players: Vec<RosterEntry>,
    },

    /// Broadcast whenever a player reports ready.
    PlayerReadyStatus {
        username: String,
        ready: bool,
        ready_players: usize,
        total_players: usize,
    },

    /// One tick of the pre-race countdown, descending to 0.
    Countdown { value: u8 },

    /// The countdown is exhausted; typing counts from now.
    RaceStart,

    /// One player's progress, relayed to everyone else in the room.
    OpponentProgress {
        username: String,
        progress: f64,
        wpm: f64,
        correct_chars: u32,
    },

    /// Broadcast once per room when the first finish report arrives.
    GameOver { winner: String, wpm: f64 },

    /// Broadcast to the remaining players when someone drops.
    PlayerDisconnected { username: String },
}

// =========================================================================
// Tests
// =========================================================================
