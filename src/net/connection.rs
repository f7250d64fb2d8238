//! TCP implementation of [`Connection`].
//!
//! Each connection owns a writer task fed by a bounded queue, so the hub
//! can hand off a payload without ever waiting on a socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::domain::{Connection, Redaction};
use crate::error::RelayError;

/// Hub-facing handle for one accepted TCP stream.
#[derive(Debug)]
pub struct TcpConnection {
    peer_addr: SocketAddr,
    outbound: mpsc::Sender<Arc<[u8]>>,
    shutdown: CancellationToken,
}

impl TcpConnection {
    /// Spawns the writer task for `writer` and returns the handle.
    ///
    /// `buffer` bounds the queued payloads; `write_timeout` bounds each write.
    #[must_use]
    pub fn spawn<W>(
        writer: W,
        peer_addr: SocketAddr,
        buffer: usize,
        write_timeout: Duration,
        redaction: Redaction,
    ) -> Arc<Self>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, queue) = mpsc::channel(buffer.max(1));
        let shutdown = CancellationToken::new();
        tokio::spawn(write_loop(
            writer,
            queue,
            shutdown.clone(),
            write_timeout,
            redaction.apply(peer_addr).to_string(),
        ));
        Arc::new(Self {
            peer_addr,
            outbound,
            shutdown,
        })
    }

    /// Token cancelled when the connection is closed from either side.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl Connection for TcpConnection {
    fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    fn send(&self, payload: &[u8]) -> Result<(), RelayError> {
        if self.shutdown.is_cancelled() {
            return Err(RelayError::DeliveryFailure {
                reason: "connection closed".to_string(),
            });
        }
        self.outbound
            .try_send(Arc::from(payload))
            .map_err(|err| RelayError::DeliveryFailure {
                reason: match err {
                    TrySendError::Full(_) => "outbound buffer full".to_string(),
                    TrySendError::Closed(_) => "writer stopped".to_string(),
                },
            })
    }

    fn close(&self) {
        self.shutdown.cancel();
    }
}

/// Drains the queue into the socket until the connection is closed.
///
/// On close, payloads queued before the close are still written, so a
/// notice sent right before closing reaches the client.
async fn write_loop<W>(
    mut writer: W,
    mut queue: mpsc::Receiver<Arc<[u8]>>,
    shutdown: CancellationToken,
    write_timeout: Duration,
    peer: String,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            payload = queue.recv() => {
                let Some(payload) = payload else { break };
                if let Err(err) = write_bounded(&mut writer, &payload, write_timeout).await {
                    tracing::debug!(peer = %peer, error = %err, "write failed; closing connection");
                    shutdown.cancel();
                    break;
                }
            }
            () = shutdown.cancelled() => {
                while let Ok(payload) = queue.try_recv() {
                    if write_bounded(&mut writer, &payload, write_timeout).await.is_err() {
                        break;
                    }
                }
                break;
            }
        }
    }
    let _ = writer.shutdown().await;
    tracing::trace!(peer = %peer, "writer stopped");
}

async fn write_bounded<W>(writer: &mut W, payload: &[u8], limit: Duration) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match tokio::time::timeout(limit, writer.write_all(payload)).await {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "write timed out",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    fn addr() -> SocketAddr {
        let Ok(addr) = "127.0.0.1:7000".parse() else {
            panic!("bad addr");
        };
        addr
    }

    #[tokio::test]
    async fn queued_payloads_are_written_in_order() {
        let (client, server) = tokio::io::duplex(1024);
        let conn = TcpConnection::spawn(
            server,
            addr(),
            8,
            Duration::from_secs(1),
            Redaction::default(),
        );

        assert!(conn.send(b"one ").is_ok());
        assert!(conn.send(b"two").is_ok());
        conn.close();

        let mut client = client;
        let mut received = String::new();
        let Ok(_) = client.read_to_string(&mut received).await else {
            panic!("read failed");
        };
        assert_eq!(received, "one two");
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let (_client, server) = tokio::io::duplex(64);
        let conn = TcpConnection::spawn(
            server,
            addr(),
            8,
            Duration::from_secs(1),
            Redaction::default(),
        );
        conn.close();
        conn.close();

        assert!(conn.shutdown_token().is_cancelled());
        assert!(matches!(
            conn.send(b"late"),
            Err(RelayError::DeliveryFailure { .. })
        ));
    }

    #[tokio::test]
    async fn stalled_peer_fills_the_queue_without_blocking() {
        // Nobody reads the client side, so the writer stalls on the first
        // payload and the queue fills up.
        let (_client, server) = tokio::io::duplex(4);
        let conn = TcpConnection::spawn(
            server,
            addr(),
            1,
            Duration::from_secs(30),
            Redaction::default(),
        );

        let mut full = false;
        for _ in 0..16 {
            if conn.send(b"0123456789").is_err() {
                full = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(full);
    }

    #[tokio::test]
    async fn write_timeout_closes_the_connection() {
        let (_client, server) = tokio::io::duplex(4);
        let conn = TcpConnection::spawn(
            server,
            addr(),
            4,
            Duration::from_millis(20),
            Redaction::default(),
        );
        assert!(conn.send(b"more than four bytes").is_ok());

        let token = conn.shutdown_token();
        let closed = tokio::time::timeout(Duration::from_secs(2), token.cancelled()).await;
        assert!(closed.is_ok());
    }
}
