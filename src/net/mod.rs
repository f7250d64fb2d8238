//! Transport layer: TCP listener, per-connection readers and writers.
//!
//! This layer holds no chat state. It turns sockets into [`HubEvent`]s on
//! the hub's channel and turns the hub's writes back into socket writes.
//!
//! [`HubEvent`]: crate::domain::HubEvent

pub mod connection;
pub mod listener;
pub mod reader;

use std::time::Duration;

pub use connection::TcpConnection;
pub use listener::{accept_loop, bind};
pub use reader::run_client;

use crate::domain::Redaction;

/// Per-connection I/O settings.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Bytes requested per read.
    pub read_buffer_size: usize,
    /// Payloads that may queue per connection.
    pub outbound_buffer: usize,
    /// Upper bound on one socket write.
    pub write_timeout: Duration,
    /// Ask for a display name before reporting the connection.
    pub name_prompt: bool,
    /// Time allowed to answer the name prompt.
    pub handshake_timeout: Duration,
    /// Log-text redaction toggle.
    pub redaction: Redaction,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            read_buffer_size: 64,
            outbound_buffer: 64,
            write_timeout: Duration::from_secs(5),
            name_prompt: false,
            handshake_timeout: Duration::from_secs(30),
            redaction: Redaction::default(),
        }
    }
}
