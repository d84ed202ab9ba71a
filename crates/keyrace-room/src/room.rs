//! Room actor: an isolated Tokio task that owns one race.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Admission, readiness, progress, finish, and
//! departure events against the same room serialize through that
//! channel; no two of them can interleave at the field level.

use std::collections::HashMap;

use keyrace_protocol::{RoomId, RosterEntry, ServerMessage};
use keyrace_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::countdown::Countdown;
use crate::{Player, RacePhase, RoomConfig, RoomError};

/// Channel sender for delivering outbound messages to one participant.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/response: the
/// caller sends the command and awaits the outcome. The rest are
/// fire-and-forget, matching the protocol paths that absorb failures
/// silently.
pub(crate) enum RoomCommand {
    /// Admit a player and broadcast the updated roster.
    Join {
        conn: ConnectionId,
        username: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Mark the named player ready; may arm the countdown.
    Ready { username: String },

    /// Store a progress report and relay it to the other participants.
    Progress {
        conn: ConnectionId,
        username: String,
        progress: f64,
        wpm: f64,
        correct_chars: u32,
    },

    /// Record a finish; the first report decides the winner.
    Finish { username: String, wpm: f64 },

    /// Remove the player backed by this connection.
    Depart {
        conn: ConnectionId,
        reply: oneshot::Sender<Departure>,
    },

    /// Request a state snapshot.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    /// Shut down the room, cancelling any armed countdown.
    Shutdown,
}

/// Outcome of a departure, reported back to the registry.
#[derive(Debug)]
pub(crate) struct Departure {
    /// Username of the removed player, if this connection had one here.
    pub(crate) username: Option<String>,
    /// Whether the room is now empty and should be deleted.
    pub(crate) empty: bool,
}

/// A snapshot of room state, for tests and operators.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    /// The room's unique id.
    pub room_id: RoomId,
    /// Current lifecycle phase.
    pub phase: RacePhase,
    /// Number of players currently in the room.
    pub players: usize,
    /// How many of them have reported ready.
    pub ready: usize,
    /// The winner's username, once the first finish report lands.
    pub winner: Option<String>,
}

/// Handle to a running room actor. Used to send events to it.
///
/// Cheap to clone: it wraps an `mpsc::Sender`. The
/// [`crate::RoomRegistry`] holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Admits a player. On success the actor has already broadcast the
    /// updated roster to everyone, the new player included.
    pub async fn join(
        &self,
        conn: ConnectionId,
        username: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                conn,
                username,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Reports the named player ready (fire-and-forget).
    pub async fn ready(&self, username: String) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Ready { username })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Delivers a progress report (fire-and-forget).
    pub async fn progress(
        &self,
        conn: ConnectionId,
        username: String,
        progress: f64,
        wpm: f64,
        correct_chars: u32,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Progress {
                conn,
                username,
                progress,
                wpm,
                correct_chars,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Delivers a finish report (fire-and-forget).
    pub async fn finish(
        &self,
        username: String,
        wpm: f64,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Finish { username, wpm })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Removes the player backed by this connection, if any.
    pub(crate) async fn depart(
        &self,
        conn: ConnectionId,
    ) -> Result<Departure, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Depart {
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Requests a snapshot of the room's current state.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Tells the room to shut down.
    pub(crate) async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    /// The race passage, assigned once at creation.
    text: String,
    phase: RacePhase,
    config: RoomConfig,
    /// Participants in join order.
    players: Vec<Player>,
    /// Per-player outbound channels.
    senders: HashMap<ConnectionId, PlayerSender>,
    /// First finisher's username; set at most once, never reassigned.
    winner: Option<String>,
    countdown: Countdown,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands and countdown ticks
    /// until shutdown.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Join { conn, username, sender, reply }) => {
                        let result = self.handle_join(conn, username, sender);
                        let _ = reply.send(result);
                    }
                    Some(RoomCommand::Ready { username }) => {
                        self.handle_ready(&username);
                    }
                    Some(RoomCommand::Progress {
                        conn,
                        username,
                        progress,
                        wpm,
                        correct_chars,
                    }) => {
                        self.handle_progress(
                            conn, &username, progress, wpm, correct_chars,
                        );
                    }
                    Some(RoomCommand::Finish { username, wpm }) => {
                        self.handle_finish(username, wpm);
                    }
                    Some(RoomCommand::Depart { conn, reply }) => {
                        let outcome = self.handle_depart(conn);
                        let _ = reply.send(outcome);
                    }
                    Some(RoomCommand::Snapshot { reply }) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(RoomCommand::Shutdown) | None => break,
                },
                value = self.countdown.wait() => {
                    self.handle_countdown_tick(value);
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        username: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if !self.phase.is_joinable() {
            return Err(RoomError::NotJoinable(
                self.room_id.clone(),
                self.phase,
            ));
        }
        if self.players.iter().any(|p| p.conn == conn) {
            return Err(RoomError::AlreadyJoined(
                conn,
                self.room_id.clone(),
            ));
        }

        self.players.push(Player::new(conn, username));
        self.senders.insert(conn, sender);
        tracing::info!(
            room_id = %self.room_id,
            %conn,
            players = self.players.len(),
            "player joined"
        );

        // Everyone converges on the same passage and roster, whatever
        // the join order.
        self.broadcast(ServerMessage::StartGame {
            text: self.text.clone(),
            players: self.roster(),
        });

        Ok(())
    }

    fn handle_ready(&mut self, username: &str) {
        if !self.phase.is_joinable() {
            // Stale ready after the race began; a running countdown
            // never restarts.
            return;
        }

        let Some(player) =
            self.players.iter_mut().find(|p| p.username == username)
        else {
            // Benign race between a departure and its ready report.
            tracing::trace!(
                room_id = %self.room_id,
                username,
                "ready for unknown player ignored"
            );
            return;
        };
        player.ready = true;

        let ready = self.ready_count();
        let total = self.players.len();
        self.broadcast(ServerMessage::PlayerReadyStatus {
            username: username.to_string(),
            ready: true,
            ready_players: ready,
            total_players: total,
        });
        tracing::info!(
            room_id = %self.room_id,
            username,
            ready,
            total,
            "player ready"
        );

        if self.phase == RacePhase::Lobby
            && ready == total
            && total >= self.config.min_racers
        {
            self.phase = RacePhase::Starting;
            self.countdown.arm(self.config.countdown_from);
            tracing::info!(
                room_id = %self.room_id,
                from = self.config.countdown_from,
                "all players ready, countdown armed"
            );
        }
    }

    fn handle_countdown_tick(&mut self, value: u8) {
        self.broadcast(ServerMessage::Countdown { value });
        if value == 0 {
            self.broadcast(ServerMessage::RaceStart);
            self.phase = RacePhase::Racing;
            tracing::info!(room_id = %self.room_id, "race started");
        }
    }

    fn handle_progress(
        &mut self,
        conn: ConnectionId,
        username: &str,
        progress: f64,
        wpm: f64,
        correct_chars: u32,
    ) {
        if !self.phase.is_racing() {
            return;
        }

        if let Some(player) =
            self.players.iter_mut().find(|p| p.username == username)
        {
            player.progress = progress;
            player.wpm = wpm;
            player.correct_chars = correct_chars;
        }

        // The relay mirrors the report as supplied, to everyone but the
        // reporting connection.
        self.send_to_others(
            conn,
            ServerMessage::OpponentProgress {
                username: username.to_string(),
                progress,
                wpm,
                correct_chars,
            },
        );
    }

    fn handle_finish(&mut self, username: String, wpm: f64) {
        if let Some(player) =
            self.players.iter_mut().find(|p| p.username == username)
        {
            player.finished = true;
        }

        // First-writer-wins: receipt order at this actor decides.
        if self.winner.is_none() {
            self.winner = Some(username.clone());
            tracing::info!(
                room_id = %self.room_id,
                winner = %username,
                wpm,
                "race won"
            );
            self.broadcast(ServerMessage::GameOver {
                winner: username,
                wpm,
            });
        }
    }

    fn handle_depart(&mut self, conn: ConnectionId) -> Departure {
        let Some(pos) =
            self.players.iter().position(|p| p.conn == conn)
        else {
            return Departure {
                username: None,
                empty: self.players.is_empty(),
            };
        };

        let player = self.players.remove(pos);
        self.senders.remove(&conn);
        tracing::info!(
            room_id = %self.room_id,
            %conn,
            username = %player.username,
            players = self.players.len(),
            "player departed"
        );

        self.broadcast(ServerMessage::PlayerDisconnected {
            username: player.username.clone(),
        });

        Departure {
            username: Some(player.username),
            empty: self.players.is_empty(),
        }
    }

    fn roster(&self) -> Vec<RosterEntry> {
        self.players
            .iter()
            .map(|p| RosterEntry {
                username: p.username.clone(),
                id: p.conn,
            })
            .collect()
    }

    fn ready_count(&self) -> usize {
        self.players.iter().filter(|p| p.ready).count()
    }

    fn broadcast(&self, msg: ServerMessage) {
        for player in &self.players {
            self.send_to(player.conn, msg.clone());
        }
    }

    fn send_to_others(&self, excluded: ConnectionId, msg: ServerMessage) {
        for player in &self.players {
            if player.conn != excluded {
                self.send_to(player.conn, msg.clone());
            }
        }
    }

    /// Sends an outbound message to a single participant. Silently drops
    /// if the receiver is gone (participant mid-disconnect).
    fn send_to(&self, conn: ConnectionId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(msg);
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id.clone(),
            phase: self.phase,
            players: self.players.len(),
            ready: self.ready_count(),
            winner: self.winner.clone(),
        }
    }
}

/// Spawns a room actor seeded with its creator and returns a handle.
///
/// Creating a room admits the creator in the same step, so a room is
/// never observable without at least one player. The creator's implicit
/// join broadcasts no roster; the creation reply covers it.
///
/// `channel_size` bounds the command channel; senders wait when it fills.
pub(crate) fn spawn_room(
    room_id: RoomId,
    text: String,
    config: RoomConfig,
    creator: ConnectionId,
    creator_username: String,
    creator_sender: PlayerSender,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let countdown = Countdown::new(config.countdown_interval);
    let mut senders = HashMap::new();
    senders.insert(creator, creator_sender);

    let actor = RoomActor {
        room_id: room_id.clone(),
        text,
        phase: RacePhase::Lobby,
        config,
        players: vec![Player::new(creator, creator_username)],
        senders,
        winner: None,
        countdown,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
