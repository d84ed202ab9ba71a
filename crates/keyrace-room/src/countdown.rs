//! Pre-race countdown driver.
//!
//! Designed to sit inside the room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = self.receiver.recv() => { /* handle commands */ }
//!         value = self.countdown.wait() => { /* broadcast the tick */ }
//!     }
//! }
//! ```
//!
//! While disarmed, [`Countdown::wait`] pends forever, so the loop keeps
//! serving commands. Once armed it yields the descending values at a
//! fixed interval and disarms itself after yielding 0. Dropping the
//! actor drops the countdown: deleting a room cancels its countdown
//! rather than leaving a timer aimed at a dead room.

use std::time::Duration;

use tokio::time::{self, Instant};

pub(crate) struct Countdown {
    interval: Duration,
    /// Value to yield at the next fire; `None` while disarmed.
    next_value: Option<u8>,
    /// Deadline of the next fire; `None` while disarmed.
    next_fire: Option<Instant>,
}

impl Countdown {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_value: None,
            next_fire: None,
        }
    }

    /// Arms the countdown; the first tick fires one interval from now.
    ///
    /// A no-op while already armed; a running countdown never restarts.
    pub(crate) fn arm(&mut self, from: u8) {
        if self.next_value.is_some() {
            return;
        }
        self.next_value = Some(from);
        self.next_fire = Some(Instant::now() + self.interval);
    }

    /// Waits for the next tick and returns its value.
    ///
    /// Pends forever while disarmed; `select!` still serves the other
    /// branches. After yielding 0 the countdown disarms itself.
    pub(crate) async fn wait(&mut self) -> u8 {
        let (value, at) = match (self.next_value, self.next_fire) {
            (Some(value), Some(at)) => (value, at),
            _ => {
                // Never completes; the actor loop's other branches run.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(at).await;

        if value == 0 {
            self.next_value = None;
            self.next_fire = None;
        } else {
            self.next_value = Some(value - 1);
            self.next_fire = Some(at + self.interval);
        }

        value
    }
}
