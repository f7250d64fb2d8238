//! Events flowing from the transport into the hub.
//!
//! Every listener and reader task sends [`HubEvent`]s over the one event
//! channel; the hub consumes them strictly in order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

use super::{Connection, SessionSummary};

/// Input of the hub's event loop.
#[derive(Debug)]
pub enum HubEvent {
    /// A stream was accepted (and, if enabled, answered the name prompt).
    Connected {
        /// The new connection.
        connection: Arc<dyn Connection>,
        /// Raw display-name bytes, if the client supplied one.
        display_name: Option<Vec<u8>>,
    },

    /// The connection's reader stopped. Sent exactly once per reader.
    Disconnected {
        /// The connection that went away.
        connection: Arc<dyn Connection>,
    },

    /// One non-empty read from the connection.
    Inbound {
        /// The sending connection.
        connection: Arc<dyn Connection>,
        /// Bytes exactly as read; not yet validated.
        bytes: Vec<u8>,
    },

    /// Read-only query for the admin surface.
    Stats {
        /// Where to send the answer.
        reply: oneshot::Sender<HubStats>,
    },
}

impl HubEvent {
    /// Short tag used in trace output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::Inbound { .. } => "inbound",
            Self::Stats { .. } => "stats",
        }
    }
}

/// Snapshot of hub state answered to [`HubEvent::Stats`].
#[derive(Debug, Clone, Serialize)]
pub struct HubStats {
    /// Number of registered sessions.
    pub session_count: usize,
    /// Bans still in force.
    pub active_bans: usize,
    /// Messages relayed since the hub started.
    pub messages_relayed: u64,
    /// Per-session summaries.
    pub sessions: Vec<SessionSummary>,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
}
