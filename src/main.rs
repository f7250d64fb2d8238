//! chat-relay server entry point.
//!
//! Starts the hub, the TCP chat listener and, if configured, the admin API.

use tracing_subscriber::EnvFilter;

use chat_relay::api;
use chat_relay::app_state::AppState;
use chat_relay::config::{LogFormat, RelayConfig};
use chat_relay::net;
use chat_relay::service::{Hub, HubHandle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    // Start the hub
    let (hub, events) = HubHandle::channel(config.event_channel_capacity);
    let hub_task = tokio::spawn(Hub::new(config.policy()).run(events));

    // Bind before serving anything; failure here is fatal
    let listener = net::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.policy().redaction.apply(config.listen_addr),
        "chat listener ready"
    );

    if let Some(admin_addr) = config.admin_addr {
        let admin_listener = tokio::net::TcpListener::bind(admin_addr).await?;
        let app = api::build_router(AppState { hub: hub.clone() });
        tracing::info!(addr = %admin_addr, "admin api listening");
        tokio::spawn(async move {
            if let Err(err) = axum::serve(admin_listener, app).await {
                tracing::error!(error = %err, "admin api stopped");
            }
        });
    }

    tokio::select! {
        () = net::accept_loop(listener, hub, config.transport()) => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                tracing::error!(error = %err, "could not listen for shutdown signal");
            }
            tracing::info!("shutting down");
        }
    }

    hub_task.abort();
    Ok(())
}
