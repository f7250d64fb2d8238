//! TCP accept loop.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use super::TransportSettings;
use super::reader::run_client;
use crate::error::RelayError;
use crate::service::HubHandle;

/// Binds the chat listener.
///
/// # Errors
///
/// Returns [`RelayError::Bind`] if the address cannot be bound. This is the
/// one fatal error of the relay.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, RelayError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { addr, source })
}

/// First pause after a failed `accept()`.
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
/// Longest pause between retries while `accept()` keeps failing.
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Pause before the next `accept()` after `failures` consecutive errors.
///
/// Doubles from [`ACCEPT_BACKOFF_MIN`] and saturates at [`ACCEPT_BACKOFF_MAX`].
fn accept_backoff(failures: u32) -> Duration {
    let factor = 1_u32.checked_shl(failures.saturating_sub(1)).unwrap_or(u32::MAX);
    ACCEPT_BACKOFF_MIN
        .saturating_mul(factor)
        .min(ACCEPT_BACKOFF_MAX)
}

/// Accepts connections forever, spawning a reader task for each.
///
/// Accept errors are logged and retried after a growing pause, so a
/// persistent failure such as EMFILE does not spin. Returns only when the
/// hub has stopped.
pub async fn accept_loop(listener: TcpListener, hub: HubHandle, settings: TransportSettings) {
    let mut failures: u32 = 0;
    loop {
        if hub.is_closed() {
            tracing::info!("hub stopped; listener exiting");
            return;
        }
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                failures = 0;
                if let Err(err) = stream.set_nodelay(true) {
                    tracing::debug!(error = %err, "could not set TCP_NODELAY");
                }
                let (read_half, write_half) = stream.into_split();
                tokio::spawn(run_client(
                    read_half,
                    write_half,
                    peer_addr,
                    hub.clone(),
                    settings.clone(),
                ));
            }
            Err(err) => {
                failures = failures.saturating_add(1);
                let pause = accept_backoff(failures);
                tracing::error!(
                    error = %settings.redaction.apply(err),
                    failures,
                    pause_ms = u64::try_from(pause.as_millis()).unwrap_or(u64::MAX),
                    "could not accept connection"
                );
                tokio::time::sleep(pause).await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accept_backoff_doubles_then_saturates() {
        assert_eq!(accept_backoff(1), Duration::from_millis(10));
        assert_eq!(accept_backoff(2), Duration::from_millis(20));
        assert_eq!(accept_backoff(4), Duration::from_millis(80));
        assert_eq!(accept_backoff(8), ACCEPT_BACKOFF_MAX);
        assert_eq!(accept_backoff(40), ACCEPT_BACKOFF_MAX);
        assert_eq!(accept_backoff(u32::MAX), ACCEPT_BACKOFF_MAX);
    }

    #[test]
    fn accept_backoff_never_spins() {
        assert!(accept_backoff(0) >= ACCEPT_BACKOFF_MIN);
    }

    #[tokio::test]
    async fn accept_loop_exits_once_hub_is_gone() {
        let (hub, events) = HubHandle::channel(1);
        drop(events);
        let Ok(addr) = "127.0.0.1:0".parse() else {
            panic!("bad addr");
        };
        let Ok(listener) = bind(addr).await else {
            panic!("bind failed");
        };
        let done = tokio::time::timeout(
            Duration::from_secs(1),
            accept_loop(listener, hub, TransportSettings::default()),
        )
        .await;
        assert!(done.is_ok());
    }
}
