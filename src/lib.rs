//! # chat-relay
//!
//! TCP chat relay with per-session rate limiting, strike accounting and
//! temporary host bans.
//!
//! Clients connect over plain TCP and write text; every accepted message is
//! relayed to all other connected clients. A single hub task owns all chat
//! state and processes events one at a time, so no locks guard the session
//! registry or the ban list.
//!
//! ## Architecture
//!
//! ```text
//! Clients (TCP)
//!     │
//!     ├── Listener (net/)        accept → spawn reader
//!     ├── Reader per client      read → HubEvent
//!     │
//!     ├── HubHandle (service/)   bounded mpsc, the only way in
//!     ├── Hub (service/)         admission, rate, strikes, bans, broadcast
//!     │
//!     ├── TcpConnection (net/)   bounded writer task per client
//!     │
//!     └── Admin API (api/)       /health, /stats
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod net;
pub mod service;
