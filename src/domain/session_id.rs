//! Type-safe session identifier.
//!
//! [`SessionId`] is a newtype wrapper around [`uuid::Uuid`] (v4). Addresses
//! key the registry, but they are sensitive in logs; the session ID is the
//! name a session goes by in audit output and stats.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for an admitted client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Creates a new random `SessionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
