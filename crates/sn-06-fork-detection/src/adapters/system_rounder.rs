//! Wall-clock round index derived from the genesis time.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::ports::Rounder;

/// Rounds of fixed length counted from a genesis timestamp.
#[derive(Debug, Clone)]
pub struct SystemRounder {
    genesis: SystemTime,
    round_duration: Duration,
}

impl SystemRounder {
    /// Clock starting at `genesis_unix_secs`.
    pub fn new(genesis_unix_secs: u64, round_duration: Duration) -> Self {
        Self {
            genesis: UNIX_EPOCH + Duration::from_secs(genesis_unix_secs),
            round_duration,
        }
    }

    /// Length of one round.
    pub fn round_duration(&self) -> Duration {
        self.round_duration
    }

    /// Round index at `now`. Negative before genesis.
    pub fn index_at(&self, now: SystemTime) -> i64 {
        let step = self.round_duration.as_millis().max(1) as i64;
        match now.duration_since(self.genesis) {
            Ok(elapsed) => elapsed.as_millis() as i64 / step,
            Err(before) => -((before.duration().as_millis() as i64 + step - 1) / step),
        }
    }

    /// Time left until the next round starts.
    pub fn time_to_next_round(&self, now: SystemTime) -> Duration {
        let step = self.round_duration.as_millis().max(1);
        let elapsed = now
            .duration_since(self.genesis)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Duration::from_millis((step - elapsed % step) as u64)
    }
}

impl Rounder for SystemRounder {
    fn index(&self) -> i64 {
        self.index_at(SystemTime::now())
    }
}
