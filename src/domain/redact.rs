//! Log-text redaction of host identities.

use std::fmt;

/// Privacy toggle for log output. Affects only formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Redaction {
    enabled: bool,
}

impl Redaction {
    /// Creates a toggle; `enabled = true` hides wrapped values.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Returns `true` if wrapped values print as `[REDACTED]`.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.enabled
    }

    /// Wraps `value` so that it honours this toggle when displayed.
    #[must_use]
    pub const fn apply<T: fmt::Display>(self, value: T) -> Sensitive<T> {
        Sensitive {
            value,
            redacted: self.enabled,
        }
    }
}

/// A value that displays as `[REDACTED]` when redaction is on.
#[derive(Debug, Clone, Copy)]
pub struct Sensitive<T> {
    value: T,
    redacted: bool,
}

impl<T: fmt::Display> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.redacted {
            f.write_str("[REDACTED]")
        } else {
            self.value.fmt(f)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn disabled_passes_value_through() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 4));
        assert_eq!(Redaction::new(false).apply(ip).to_string(), "192.168.1.4");
    }

    #[test]
    fn enabled_hides_value() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 4));
        assert_eq!(Redaction::new(true).apply(ip).to_string(), "[REDACTED]");
    }
}
