//! Per-connection bookkeeping held by the hub.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Connection, SessionId};

/// Name used when a client supplies none, or one that is blank or not UTF-8.
pub const PLACEHOLDER_NAME: &str = "anon";

/// Longest display name kept, in characters.
pub const MAX_NAME_CHARS: usize = 16;

/// The hub's record for one admitted connection.
///
/// Created on `Connected`, removed on `Disconnected`, on `/quit`, or when the
/// session earns a ban. The hub is the only writer.
#[derive(Debug)]
pub struct ClientSession {
    /// Identifier used in logs and stats.
    pub id: SessionId,

    /// Shared handle to the transport; the hub does not own its lifecycle.
    pub connection: Arc<dyn Connection>,

    /// Sanitized display name (immutable after admission).
    pub display_name: String,

    /// Wall-clock admission time, for stats.
    pub connected_at: DateTime<Utc>,

    /// Time of the last accepted message (admission time until then).
    pub last_message_at: Instant,

    /// Strikes accumulated since the last accepted message.
    pub strike_count: u32,
}

impl ClientSession {
    /// Creates a fresh session with zero strikes.
    #[must_use]
    pub fn new(connection: Arc<dyn Connection>, raw_name: Option<&[u8]>, now: Instant) -> Self {
        Self {
            id: SessionId::new(),
            connection,
            display_name: sanitize_display_name(raw_name),
            connected_at: Utc::now(),
            last_message_at: now,
            strike_count: 0,
        }
    }

    /// Adds a strike and returns the new count.
    pub fn strike(&mut self) -> u32 {
        self.strike_count = self.strike_count.saturating_add(1);
        self.strike_count
    }

    /// Records an accepted message: strikes reset, interval restarts.
    pub fn accept(&mut self, now: Instant) {
        self.strike_count = 0;
        self.last_message_at = now;
    }
}

/// Trims the raw name and falls back to [`PLACEHOLDER_NAME`] when the
/// result is empty or not valid UTF-8. Control characters are dropped and
/// the name is cut to [`MAX_NAME_CHARS`].
#[must_use]
pub fn sanitize_display_name(raw: Option<&[u8]>) -> String {
    let Some(text) = raw.and_then(|bytes| std::str::from_utf8(bytes).ok()) else {
        return PLACEHOLDER_NAME.to_string();
    };
    let name: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_CHARS)
        .collect();
    let name = name.trim_end();
    if name.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Lightweight summary of a session for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,
    /// Display name.
    pub display_name: String,
    /// Admission timestamp.
    pub connected_at: DateTime<Utc>,
    /// Current strike count.
    pub strike_count: u32,
}

impl From<&ClientSession> for SessionSummary {
    fn from(session: &ClientSession) -> Self {
        Self {
            session_id: session.id,
            display_name: session.display_name.clone(),
            connected_at: session.connected_at,
            strike_count: session.strike_count,
        }
    }
}
