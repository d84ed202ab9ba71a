//! Room registry: owns the id → room mapping.

use std::collections::HashMap;

use keyrace_protocol::RoomId;
use keyrace_transport::ConnectionId;
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::room::spawn_room;
use crate::{
    PlayerSender, RoomConfig, RoomError, RoomHandle, RoomSnapshot,
};

/// Length of generated room tokens.
const ROOM_ID_LEN: usize = 6;

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns every live room: creates them, resolves identifiers to handles,
/// and deletes rooms that report themselves empty.
///
/// The registry never mutates room contents; all race state lives with
/// the room actors. It tracks no per-connection room affinity either: a
/// departing connection is swept against every live room.
pub struct RoomRegistry {
    config: RoomConfig,
    rooms: HashMap<RoomId, RoomHandle>,
}

impl RoomRegistry {
    /// Creates an empty registry with default room settings.
    pub fn new() -> Self {
        Self::with_config(RoomConfig::default())
    }

    /// Creates an empty registry; every room it spawns uses `config`.
    pub fn with_config(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
        }
    }

    /// Creates a room around its first player and returns the new id.
    ///
    /// The token is regenerated until it matches no live room, so ids
    /// are unique among rooms that currently exist.
    pub fn create(
        &mut self,
        text: String,
        conn: ConnectionId,
        username: String,
        sender: PlayerSender,
    ) -> RoomId {
        let room_id = self.unused_id();
        let handle = spawn_room(
            room_id.clone(),
            text,
            self.config.clone(),
            conn,
            username,
            sender,
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(room_id.clone(), handle);
        tracing::info!(room_id = %room_id, "room created");
        room_id
    }

    /// Resolves a room id to its handle.
    ///
    /// `NotFound` is the expected answer to a stale or mistyped id, not
    /// a fault; callers turn it into a targeted notice or a no-op.
    pub fn get(&self, room_id: &RoomId) -> Result<&RoomHandle, RoomError> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Removes a connection from every room it appears in, deleting the
    /// rooms left empty.
    ///
    /// Each affected room broadcasts the departure to its remaining
    /// players before this returns, so no later event for the departed
    /// connection can be processed ahead of the removal.
    pub async fn disconnect(&mut self, conn: ConnectionId) {
        let ids: Vec<RoomId> = self.rooms.keys().cloned().collect();
        for room_id in ids {
            let Some(handle) = self.rooms.get(&room_id) else {
                continue;
            };
            match handle.depart(conn).await {
                Ok(outcome) => {
                    if let Some(username) = &outcome.username {
                        tracing::debug!(
                            room_id = %room_id,
                            %conn,
                            %username,
                            "connection swept from room"
                        );
                    }
                    if outcome.empty {
                        self.remove(&room_id).await;
                    }
                }
                Err(_) => {
                    // Actor already gone; drop the stale entry.
                    self.rooms.remove(&room_id);
                }
            }
        }
    }

    /// Requests a state snapshot from a room.
    pub async fn snapshot(
        &self,
        room_id: &RoomId,
    ) -> Result<RoomSnapshot, RoomError> {
        self.get(room_id)?.snapshot().await
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all live room ids.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    /// Deletes a room and stops its actor, cancelling any countdown
    /// still running. Invoked exactly once per room, when a departure
    /// empties it.
    async fn remove(&mut self, room_id: &RoomId) {
        if let Some(handle) = self.rooms.remove(room_id) {
            let _ = handle.shutdown().await;
            tracing::info!(room_id = %room_id, "room deleted");
        }
    }

    /// Generates a short token not used by any live room.
    fn unused_id(&self) -> RoomId {
        loop {
            let token: String = rand::rng()
                .sample_iter(Alphanumeric)
                .take(ROOM_ID_LEN)
                .map(char::from)
                .collect();
            let id = RoomId::new(token);
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
