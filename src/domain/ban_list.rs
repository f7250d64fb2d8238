//! Temporary host bans with lazy expiry.
//!
//! [`BanList`] is never swept. An expired record is deleted the next time
//! its host tries to connect, which is the only moment the answer matters.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Ban records keyed by remote host.
#[derive(Debug)]
pub struct BanList {
    duration: Duration,
    banned: HashMap<IpAddr, Instant>,
}

impl BanList {
    /// Creates an empty list whose bans last `duration`.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            banned: HashMap::new(),
        }
    }

    /// Bans `host` starting at `now`, replacing any earlier record.
    pub fn ban(&mut self, host: IpAddr, now: Instant) {
        self.banned.insert(host, now);
    }

    /// Returns the time left on `host`'s ban, or `None` if it may connect.
    ///
    /// A record whose age has reached the ban duration is removed here.
    pub fn remaining(&mut self, host: IpAddr, now: Instant) -> Option<Duration> {
        let banned_at = *self.banned.get(&host)?;
        let elapsed = now.saturating_duration_since(banned_at);
        if elapsed >= self.duration {
            self.banned.remove(&host);
            None
        } else {
            Some(self.duration - elapsed)
        }
    }

    /// Number of bans still in force at `now`. Does not delete anything.
    #[must_use]
    pub fn active_count(&self, now: Instant) -> usize {
        self.banned
            .values()
            .filter(|banned_at| now.saturating_duration_since(**banned_at) < self.duration)
            .count()
    }

    /// Number of stored records, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.banned.len()
    }

    /// Returns `true` if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.banned.is_empty()
    }
}
