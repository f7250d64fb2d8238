//! Sending side of the hub's event channel.
//!
//! [`HubHandle`] wraps a bounded [`tokio::sync::mpsc`] channel. Listener,
//! readers and the admin API each hold a clone; the hub holds the only
//! receiver, which makes the channel the single point of serialization.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::domain::{Connection, HubEvent, HubStats};
use crate::error::RelayError;

/// Cloneable handle for submitting events to the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubEvent>,
}

impl HubHandle {
    /// Creates the event channel with the given capacity.
    ///
    /// The receiver goes to [`super::Hub::run`].
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<HubEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueues an event, waiting for room if the channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub has stopped.
    pub async fn send(&self, event: HubEvent) -> Result<(), RelayError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| RelayError::HubUnavailable)
    }

    /// Reports a newly accepted connection.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub has stopped.
    pub async fn connected(
        &self,
        connection: Arc<dyn Connection>,
        display_name: Option<Vec<u8>>,
    ) -> Result<(), RelayError> {
        self.send(HubEvent::Connected {
            connection,
            display_name,
        })
        .await
    }

    /// Reports one read from a connection.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub has stopped.
    pub async fn inbound(
        &self,
        connection: Arc<dyn Connection>,
        bytes: Vec<u8>,
    ) -> Result<(), RelayError> {
        self.send(HubEvent::Inbound { connection, bytes }).await
    }

    /// Reports that a connection's reader has stopped.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub has stopped.
    pub async fn disconnected(&self, connection: Arc<dyn Connection>) -> Result<(), RelayError> {
        self.send(HubEvent::Disconnected { connection }).await
    }

    /// Asks the hub for a state snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubUnavailable`] if the hub has stopped or
    /// dropped the request.
    pub async fn stats(&self) -> Result<HubStats, RelayError> {
        let (reply, answer) = oneshot::channel();
        self.send(HubEvent::Stats { reply }).await?;
        answer.await.map_err(|_| RelayError::HubUnavailable)
    }

    /// Returns `true` once the hub has dropped its receiver.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
