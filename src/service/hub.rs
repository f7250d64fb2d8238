//! The hub: single owner of sessions and bans.
//!
//! One task drains the event channel and applies admission, rate, strike
//! and broadcast policy to each event in turn. Nothing else touches the
//! registry or the ban list, so neither needs a lock.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::domain::{
    BanList, ChatCommand, ClientSession, Connection, HubEvent, HubPolicy, HubStats, SessionId,
    SessionSummary,
};
use crate::error::RelayError;

/// Written to a session right before it is closed for exceeding the strike limit.
pub const BANNED_NOTICE: &[u8] = b"You are banned!\n";

/// Outcome of fanning one message out to the other sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients whose connection accepted the payload.
    pub delivered: usize,
    /// Recipients whose write failed.
    pub failed: usize,
}

/// What an accepted inbound message turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    /// Relayed to every other session.
    Broadcast(Delivery),
    /// Interpreted as a command; nothing was relayed.
    Command(ChatCommand),
}

/// Chat state machine driven by [`HubEvent`]s.
///
/// The `on_*` methods take the current instant explicitly so the policy is
/// deterministic; [`Hub::run`] feeds them `Instant::now()`.
#[derive(Debug)]
pub struct Hub {
    policy: HubPolicy,
    sessions: HashMap<SocketAddr, ClientSession>,
    bans: BanList,
    messages_relayed: u64,
}

impl Hub {
    /// Creates a hub with no sessions and no bans.
    #[must_use]
    pub fn new(policy: HubPolicy) -> Self {
        Self {
            policy,
            sessions: HashMap::new(),
            bans: BanList::new(policy.ban_duration),
            messages_relayed: 0,
        }
    }

    /// Consumes events until every sender is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<HubEvent>) {
        let interval_ms = u64::try_from(self.policy.message_interval.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            interval_ms,
            ban_secs = self.policy.ban_duration.as_secs(),
            strike_limit = self.policy.strike_limit,
            "hub started"
        );
        while let Some(event) = events.recv().await {
            self.handle(event, Instant::now());
        }
        tracing::info!(sessions = self.sessions.len(), "hub stopped");
    }

    /// Applies one event. Refusals are logged; none of them stop the hub.
    pub fn handle(&mut self, event: HubEvent, now: Instant) {
        tracing::trace!(kind = event.kind(), "hub event");
        let result = match event {
            HubEvent::Connected {
                connection,
                display_name,
            } => self
                .on_connected(connection, display_name.as_deref(), now)
                .map(|_| ()),
            HubEvent::Disconnected { connection } => {
                self.on_disconnected(&connection);
                Ok(())
            }
            HubEvent::Inbound { connection, bytes } => {
                self.on_inbound(&connection, &bytes, now).map(|_| ())
            }
            HubEvent::Stats { reply } => {
                let _ = reply.send(self.stats(now));
                Ok(())
            }
        };
        match result {
            Err(err) if err.is_strike() => {
                tracing::info!(code = err.error_code(), error = %err, "strike recorded");
            }
            Err(err) => {
                tracing::debug!(code = err.error_code(), error = %err, "event refused");
            }
            Ok(()) => {}
        }
    }

    /// Admits a connection unless its host is banned.
    ///
    /// An expired ban is deleted here and the host is admitted.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::AdmissionDenied`] if the host is still banned;
    /// the connection has then been sent a notice and closed.
    pub fn on_connected(
        &mut self,
        connection: Arc<dyn Connection>,
        display_name: Option<&[u8]>,
        now: Instant,
    ) -> Result<SessionId, RelayError> {
        let addr = connection.peer_addr();
        let host = addr.ip();

        if let Some(remaining) = self.bans.remaining(host, now) {
            let secs = remaining.as_secs_f64();
            let notice = format!("You are banned: {secs:.2} seconds left\n");
            if let Err(err) = connection.send(notice.as_bytes()) {
                tracing::debug!(error = %err, "could not send ban notice");
            }
            connection.close();
            tracing::info!(
                host = %self.policy.redaction.apply(host),
                remaining_secs = secs,
                "banned client tried to connect"
            );
            return Err(RelayError::AdmissionDenied { remaining });
        }

        let session = ClientSession::new(Arc::clone(&connection), display_name, now);
        let id = session.id;
        tracing::info!(
            session_id = %id,
            name = %session.display_name,
            host = %self.policy.redaction.apply(host),
            "client connected"
        );
        if let Some(stale) = self.sessions.insert(addr, session)
            && !Arc::ptr_eq(&stale.connection, &connection)
        {
            tracing::warn!(session_id = %stale.id, "replaced session with the same address");
            stale.connection.close();
        }
        Ok(id)
    }

    /// Forgets the session for `connection`. Returns its ID if there was one.
    ///
    /// Disconnects for connections the hub already dropped (banned, quit,
    /// replaced) are expected and ignored.
    pub fn on_disconnected(&mut self, connection: &Arc<dyn Connection>) -> Option<SessionId> {
        let addr = connection.peer_addr();
        let registered = self
            .sessions
            .get(&addr)
            .is_some_and(|s| Arc::ptr_eq(&s.connection, connection));
        if !registered {
            tracing::debug!(
                peer = %self.policy.redaction.apply(addr),
                "disconnect for unregistered connection"
            );
            return None;
        }
        let session = self.sessions.remove(&addr)?;
        tracing::info!(
            session_id = %session.id,
            peer = %self.policy.redaction.apply(addr),
            "client disconnected"
        );
        Some(session.id)
    }

    /// Applies rate, validity and strike policy to one read, then relays it.
    ///
    /// The rate check comes first: a message inside the interval is a
    /// strike whatever its content.
    ///
    /// # Errors
    ///
    /// - [`RelayError::ProtocolViolation`] if `connection` has no session; it is closed.
    /// - [`RelayError::RateViolation`] if the interval has not elapsed.
    /// - [`RelayError::MalformedPayload`] if the bytes are not UTF-8.
    /// - [`RelayError::Banned`] if either violation pushed the session over the
    ///   strike limit; the host is banned and the session closed and removed.
    pub fn on_inbound(
        &mut self,
        connection: &Arc<dyn Connection>,
        bytes: &[u8],
        now: Instant,
    ) -> Result<Accepted, RelayError> {
        let addr = connection.peer_addr();
        let Some(session) = self.sessions.get_mut(&addr) else {
            connection.close();
            return Err(RelayError::ProtocolViolation(addr));
        };

        let elapsed = now.saturating_duration_since(session.last_message_at);
        if elapsed < self.policy.message_interval {
            let strikes = session.strike();
            return Err(self.enforce_strike_limit(addr, strikes, now)
                .unwrap_or(RelayError::RateViolation { strikes }));
        }

        let Ok(text) = std::str::from_utf8(bytes) else {
            let strikes = session.strike();
            return Err(self.enforce_strike_limit(addr, strikes, now)
                .unwrap_or(RelayError::MalformedPayload { strikes }));
        };

        session.accept(now);
        let sender_id = session.id;

        if self.policy.commands_enabled
            && let Some(command) = ChatCommand::parse(text)
        {
            self.run_command(addr, &command);
            return Ok(Accepted::Command(command));
        }

        let payload = if self.policy.prefix_display_name {
            format!("{}: {text}", session.display_name).into_bytes()
        } else {
            bytes.to_vec()
        };
        let delivery = self.broadcast(addr, &payload);
        tracing::debug!(
            session_id = %sender_id,
            bytes = payload.len(),
            delivered = delivery.delivered,
            failed = delivery.failed,
            "message relayed"
        );
        Ok(Accepted::Broadcast(delivery))
    }

    /// Bans and drops the session at `addr` once `strikes` exceeds the limit.
    ///
    /// Returns the error describing the ban, or `None` if the session stays.
    fn enforce_strike_limit(
        &mut self,
        addr: SocketAddr,
        strikes: u32,
        now: Instant,
    ) -> Option<RelayError> {
        if strikes <= self.policy.strike_limit {
            return None;
        }
        let session = self.sessions.remove(&addr)?;
        let host = session.connection.peer_host();
        self.bans.ban(host, now);
        if let Err(err) = session.connection.send(BANNED_NOTICE) {
            tracing::debug!(error = %err, "could not send ban notice");
        }
        session.connection.close();
        tracing::warn!(
            session_id = %session.id,
            host = %self.policy.redaction.apply(host),
            strikes,
            "client banned"
        );
        Some(RelayError::Banned { strikes })
    }

    /// Writes `payload` to every session except `sender`.
    ///
    /// A failed write is logged and skipped; the failing connection is left
    /// for its own reader to report.
    fn broadcast(&mut self, sender: SocketAddr, payload: &[u8]) -> Delivery {
        let mut delivery = Delivery::default();
        for (addr, session) in &self.sessions {
            if *addr == sender {
                continue;
            }
            match session.connection.send(payload) {
                Ok(()) => delivery.delivered += 1,
                Err(err) => {
                    delivery.failed += 1;
                    tracing::warn!(
                        session_id = %session.id,
                        peer = %self.policy.redaction.apply(addr),
                        error = %err,
                        "could not deliver message"
                    );
                }
            }
        }
        self.messages_relayed = self.messages_relayed.saturating_add(1);
        delivery
    }

    fn run_command(&mut self, addr: SocketAddr, command: &ChatCommand) {
        let reply = match command {
            ChatCommand::Help => ChatCommand::help_text(),
            ChatCommand::Unknown(name) => format!("Unknown command: {name}\r\n"),
            ChatCommand::Quit => {
                if let Some(session) = self.sessions.remove(&addr) {
                    session.connection.close();
                    tracing::info!(session_id = %session.id, "client quit");
                }
                return;
            }
        };
        if let Some(session) = self.sessions.get(&addr)
            && let Err(err) = session.connection.send(reply.as_bytes())
        {
            tracing::debug!(session_id = %session.id, error = %err, "could not answer command");
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn stats(&self, now: Instant) -> HubStats {
        HubStats {
            session_count: self.sessions.len(),
            active_bans: self.bans.active_count(now),
            messages_relayed: self.messages_relayed,
            sessions: self.sessions.values().map(SessionSummary::from).collect(),
            timestamp: Utc::now(),
        }
    }

    /// Returns the session registered for `addr`.
    #[must_use]
    pub fn session(&self, addr: &SocketAddr) -> Option<&ClientSession> {
        self.sessions.get(addr)
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Read access to the ban records.
    #[must_use]
    pub fn bans(&self) -> &BanList {
        &self.bans
    }
}
