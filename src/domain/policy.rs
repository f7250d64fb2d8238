//! Read-only moderation parameters consumed by the hub.

use std::time::Duration;

use super::Redaction;

/// Policy values fixed at startup. The hub reads them and never changes them.
#[derive(Debug, Clone, Copy)]
pub struct HubPolicy {
    /// Minimum time between two accepted messages from one session.
    pub message_interval: Duration,
    /// How long a ban lasts.
    pub ban_duration: Duration,
    /// A session is banned once its strike count exceeds this.
    pub strike_limit: u32,
    /// Prefix broadcasts with `"<name>: "`.
    pub prefix_display_name: bool,
    /// Treat messages starting with `/` as commands.
    pub commands_enabled: bool,
    /// Log-text redaction toggle.
    pub redaction: Redaction,
}

impl Default for HubPolicy {
    fn default() -> Self {
        Self {
            message_interval: Duration::from_secs(1),
            ban_duration: Duration::from_secs(10 * 60),
            strike_limit: 10,
            prefix_display_name: false,
            commands_enabled: false,
            redaction: Redaction::default(),
        }
    }
}
