//! Per-player race state.

use keyrace_transport::ConnectionId;

/// One participant in a room.
///
/// Reported figures (progress, speed, correct characters) are stored as
/// the client supplied them: no range checks, no monotonicity
/// enforcement. A later report may overwrite an earlier one with a lower
/// value if the sender says so.
#[derive(Debug, Clone)]
pub struct Player {
    /// The transport connection backing this participant. Also the key
    /// for targeting messages and detecting departure.
    pub conn: ConnectionId,
    /// Display name supplied at join time. Not checked for uniqueness
    /// or emptiness.
    pub username: String,
    /// Last-reported fraction of the passage completed.
    pub progress: f64,
    /// Last-reported words per minute.
    pub wpm: f64,
    /// Last-reported count of correctly typed characters.
    pub correct_chars: u32,
    /// Set on the first finish report, never cleared.
    pub finished: bool,
    /// Set on the first ready report, never cleared (no un-ready).
    pub ready: bool,
}

impl Player {
    /// A freshly admitted player: no progress, not ready, not finished.
    pub(crate) fn new(conn: ConnectionId, username: String) -> Self {
        Self {
            conn,
            username,
            progress: 0.0,
            wpm: 0.0,
            correct_chars: 0,
            finished: false,
            ready: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_starts_blank() {
        let p = Player::new(ConnectionId::new(1), "alice".into());
        assert_eq!(p.username, "alice");
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.wpm, 0.0);
        assert_eq!(p.correct_chars, 0);
        assert!(!p.finished);
        assert!(!p.ready);
    }
}
