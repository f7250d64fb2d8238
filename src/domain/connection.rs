//! The hub's view of a client connection.
//!
//! The transport layer owns sockets; the hub only ever sees an
//! `Arc<dyn Connection>` and may queue bytes to it or close it.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::error::RelayError;

/// Opaque bidirectional stream handle handed to the hub.
///
/// Implementations must be cheap to call from the hub task: `send` queues
/// and returns, it never waits on the network.
pub trait Connection: fmt::Debug + Send + Sync {
    /// Remote address (host + port). Stable for the life of the connection.
    fn peer_addr(&self) -> SocketAddr;

    /// Remote host without the port, used as the ban key.
    fn peer_host(&self) -> IpAddr {
        self.peer_addr().ip()
    }

    /// Queues `payload` for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DeliveryFailure`] if the connection is closed
    /// or cannot accept more data right now.
    fn send(&self, payload: &[u8]) -> Result<(), RelayError>;

    /// Closes the connection. Idempotent; a closed connection stays closed.
    fn close(&self);
}


#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::testing::RecordingConnection;
    use super::*;

    #[test]
    fn peer_host_strips_port() {
        let conn = RecordingConnection::new("10.0.0.7:51000");
        assert_eq!(conn.peer_host().to_string(), "10.0.0.7");
        assert_eq!(conn.peer_addr().port(), 51000);
    }

    #[test]
    fn closed_connection_rejects_sends() {
        let conn = RecordingConnection::new("10.0.0.7:51000");
        assert!(conn.send(b"hi").is_ok());
        conn.close();
        assert!(conn.send(b"again").is_err());
        assert_eq!(conn.sent().len(), 1);
    }
}
