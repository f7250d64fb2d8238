//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Policy values are read once at startup
//! and handed to the hub as an immutable [`HubPolicy`].

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::{HubPolicy, Redaction};
use crate::error::RelayError;
use crate::net::TransportSettings;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address the chat listener binds to (e.g. `0.0.0.0:6969`).
    pub listen_addr: SocketAddr,

    /// Socket address for the admin HTTP API. Disabled when `None`.
    pub admin_addr: Option<SocketAddr>,

    /// Minimum time between two accepted messages from one session.
    pub message_interval: Duration,

    /// How long a host stays banned.
    pub ban_duration: Duration,

    /// Strikes tolerated before a ban; the ban fires once the count exceeds it.
    pub strike_limit: u32,

    /// Replace host identities with `[REDACTED]` in log output.
    pub safe_mode: bool,

    /// Ask each client for a display name before admitting it.
    pub name_prompt: bool,

    /// Interpret `/help` and `/quit` instead of relaying them.
    pub commands_enabled: bool,

    /// Size of a single read from a client socket.
    pub read_buffer_size: usize,

    /// Number of payloads that may queue per connection before sends fail.
    pub outbound_buffer: usize,

    /// Upper bound on a single socket write.
    pub write_timeout: Duration,

    /// Time a client has to answer the name prompt.
    pub handshake_timeout: Duration,

    /// Capacity of the hub event channel.
    pub event_channel_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or does not parse.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `LISTEN_ADDR` or `ADMIN_ADDR` is set
    /// but cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] on an unparsable socket address.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = parse_addr(
            "LISTEN_ADDR",
            lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:6969".to_string()),
        )?;
        let admin_addr = lookup("ADMIN_ADDR")
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_addr("ADMIN_ADDR", v))
            .transpose()?;

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            admin_addr,
            message_interval: Duration::from_millis(parse_key(&lookup, "MESSAGE_INTERVAL_MS", 1000)),
            ban_duration: Duration::from_secs(parse_key(&lookup, "BAN_DURATION_SECS", 600)),
            strike_limit: parse_key(&lookup, "STRIKE_LIMIT", 10),
            safe_mode: parse_key_bool(&lookup, "SAFE_MODE", false),
            name_prompt: parse_key_bool(&lookup, "NAME_PROMPT", false),
            commands_enabled: parse_key_bool(&lookup, "COMMANDS_ENABLED", false),
            read_buffer_size: parse_key(&lookup, "READ_BUFFER_SIZE", 64_usize).max(1),
            outbound_buffer: parse_key(&lookup, "OUTBOUND_BUFFER", 64_usize).max(1),
            write_timeout: Duration::from_millis(parse_key(&lookup, "WRITE_TIMEOUT_MS", 5000)),
            handshake_timeout: Duration::from_secs(parse_key(
                &lookup,
                "HANDSHAKE_TIMEOUT_SECS",
                30,
            )),
            event_channel_capacity: parse_key(&lookup, "EVENT_CHANNEL_CAPACITY", 1024_usize)
                .max(1),
            log_format,
        })
    }

    /// Moderation policy consumed by the hub.
    #[must_use]
    pub fn policy(&self) -> HubPolicy {
        HubPolicy {
            message_interval: self.message_interval,
            ban_duration: self.ban_duration,
            strike_limit: self.strike_limit,
            prefix_display_name: self.name_prompt,
            commands_enabled: self.commands_enabled,
            redaction: self.redaction(),
        }
    }

    /// Per-connection I/O settings consumed by the listener and readers.
    #[must_use]
    pub fn transport(&self) -> TransportSettings {
        TransportSettings {
            read_buffer_size: self.read_buffer_size,
            outbound_buffer: self.outbound_buffer,
            write_timeout: self.write_timeout,
            name_prompt: self.name_prompt,
            handshake_timeout: self.handshake_timeout,
            redaction: self.redaction(),
        }
    }

    fn redaction(&self) -> Redaction {
        Redaction::new(self.safe_mode)
    }
}

fn parse_addr(key: &str, value: String) -> Result<SocketAddr, RelayError> {
    value
        .trim()
        .parse()
        .map_err(|err| RelayError::Config(format!("{key}={value}: {err}")))
}

/// Parses a key as `T`, returning `default` on missing or invalid values.
fn parse_key<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a key as a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_key_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<RelayConfig, RelayError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RelayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let Ok(cfg) = load(&[]) else {
            panic!("defaults must load");
        };
        assert_eq!(cfg.listen_addr.port(), 6969);
        assert!(cfg.admin_addr.is_none());
        assert_eq!(cfg.message_interval, Duration::from_secs(1));
        assert_eq!(cfg.ban_duration, Duration::from_secs(600));
        assert_eq!(cfg.strike_limit, 10);
        assert!(!cfg.safe_mode);
        assert!(!cfg.name_prompt);
        assert_eq!(cfg.read_buffer_size, 64);
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_applied() {
        let Ok(cfg) = load(&[
            ("LISTEN_ADDR", "127.0.0.1:7000"),
            ("ADMIN_ADDR", "127.0.0.1:7001"),
            ("MESSAGE_INTERVAL_MS", "250"),
            ("BAN_DURATION_SECS", "10"),
            ("STRIKE_LIMIT", "3"),
            ("SAFE_MODE", "TRUE"),
            ("NAME_PROMPT", "1"),
            ("LOG_FORMAT", "json"),
        ]) else {
            panic!("overrides must load");
        };
        assert_eq!(cfg.listen_addr.port(), 7000);
        assert_eq!(cfg.admin_addr.map(|a| a.port()), Some(7001));
        assert_eq!(cfg.message_interval, Duration::from_millis(250));
        assert_eq!(cfg.ban_duration, Duration::from_secs(10));
        assert_eq!(cfg.strike_limit, 3);
        assert!(cfg.safe_mode);
        assert!(cfg.policy().prefix_display_name);
        assert!(cfg.policy().redaction.is_enabled());
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn garbage_numbers_fall_back_to_defaults() {
        let Ok(cfg) = load(&[("STRIKE_LIMIT", "lots"), ("READ_BUFFER_SIZE", "0")]) else {
            panic!("must load");
        };
        assert_eq!(cfg.strike_limit, 10);
        assert_eq!(cfg.read_buffer_size, 1);
    }

    #[test]
    fn bad_listen_addr_is_an_error() {
        let result = load(&[("LISTEN_ADDR", "not-an-addr")]);
        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[test]
    fn empty_admin_addr_disables_admin_api() {
        let Ok(cfg) = load(&[("ADMIN_ADDR", "  ")]) else {
            panic!("must load");
        };
        assert!(cfg.admin_addr.is_none());
    }
}
