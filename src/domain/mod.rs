//! Domain layer: sessions, bans, events and moderation policy.
//!
//! This module contains the state the hub owns (sessions and ban records),
//! the events it consumes, and the connection abstraction it writes to.

pub mod ban_list;
pub mod command;
pub mod connection;
pub mod hub_event;
pub mod policy;
pub mod redact;
pub mod session;
pub mod session_id;

pub use ban_list::BanList;
pub use command::ChatCommand;
pub use connection::Connection;
pub use hub_event::{HubEvent, HubStats};
pub use policy::HubPolicy;
pub use redact::{Redaction, Sensitive};
pub use session::{ClientSession, SessionSummary};
pub use session_id::SessionId;
