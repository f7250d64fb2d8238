//! Per-connection read loop.
//!
//! Owns the read half of one stream: optional name handshake, then one
//! `Inbound` event per non-empty read, then exactly one `Disconnected`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_util::sync::CancellationToken;

use super::TransportSettings;
use super::connection::TcpConnection;
use crate::domain::Connection;
use crate::service::HubHandle;

/// Prompt written before reading the display name.
pub const NAME_PROMPT: &[u8] = b"Enter your name: ";

/// Runs one client from accept to disconnect.
///
/// Generic over the stream halves so it can be driven by in-memory pipes.
pub async fn run_client<R, W>(
    mut reader: R,
    writer: W,
    peer_addr: SocketAddr,
    hub: HubHandle,
    settings: TransportSettings,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let tcp = TcpConnection::spawn(
        writer,
        peer_addr,
        settings.outbound_buffer,
        settings.write_timeout,
        settings.redaction,
    );
    let shutdown = tcp.shutdown_token();
    let connection: Arc<dyn Connection> = tcp;
    let peer = settings.redaction.apply(peer_addr);
    let mut buffer = vec![0_u8; settings.read_buffer_size.max(1)];

    let display_name = if settings.name_prompt {
        match read_name(&mut reader, &connection, &shutdown, &settings, &mut buffer).await {
            Some(name) => Some(name),
            None => {
                tracing::info!(peer = %peer, "client left before naming itself");
                connection.close();
                return;
            }
        }
    } else {
        None
    };

    if hub.connected(Arc::clone(&connection), display_name).await.is_err() {
        connection.close();
        return;
    }

    loop {
        let read = tokio::select! {
            () = shutdown.cancelled() => break,
            read = reader.read(&mut buffer) => read,
        };
        let n = match read {
            Ok(0) => {
                tracing::debug!(peer = %peer, "client closed the stream");
                break;
            }
            Ok(n) => n,
            Err(err) => {
                tracing::debug!(peer = %peer, error = %err, "could not read from client");
                break;
            }
        };
        let Some(chunk) = buffer.get(..n) else {
            break;
        };
        if hub.inbound(Arc::clone(&connection), chunk.to_vec()).await.is_err() {
            break;
        }
    }

    connection.close();
    if let Err(err) = hub.disconnected(connection).await {
        tracing::debug!(peer = %peer, error = %err, "could not report disconnect");
    }
}

/// Prompts for a name and reads one chunk as the answer.
async fn read_name<R>(
    reader: &mut R,
    connection: &Arc<dyn Connection>,
    shutdown: &CancellationToken,
    settings: &TransportSettings,
    buffer: &mut [u8],
) -> Option<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    connection.send(NAME_PROMPT).ok()?;
    let read = tokio::select! {
        () = shutdown.cancelled() => return None,
        read = tokio::time::timeout(settings.handshake_timeout, reader.read(buffer)) => read,
    };
    match read {
        Ok(Ok(n)) if n > 0 => buffer.get(..n).map(<[u8]>::to_vec),
        _ => None,
    }
}
