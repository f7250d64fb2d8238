//! End-to-end tests over real TCP sockets on the loopback interface.

#![allow(clippy::panic, missing_docs)]

use std::net::SocketAddr;
use std::time::Duration;

use chat_relay::api;
use chat_relay::app_state::AppState;
use chat_relay::domain::HubPolicy;
use chat_relay::net::{self, TransportSettings};
use chat_relay::service::{Hub, HubHandle};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const WAIT: Duration = Duration::from_secs(5);

async fn start_relay(policy: HubPolicy) -> (SocketAddr, HubHandle) {
    let (hub, events) = HubHandle::channel(64);
    tokio::spawn(Hub::new(policy).run(events));

    let Ok(addr) = "127.0.0.1:0".parse() else {
        panic!("bad addr");
    };
    let Ok(listener) = net::bind(addr).await else {
        panic!("bind failed");
    };
    let Ok(local) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(net::accept_loop(
        listener,
        hub.clone(),
        TransportSettings::default(),
    ));
    (local, hub)
}

async fn connect(addr: SocketAddr) -> TcpStream {
    let Ok(stream) = TcpStream::connect(addr).await else {
        panic!("connect failed");
    };
    stream
}

async fn wait_for_sessions(hub: &HubHandle, expected: usize) {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let Ok(stats) = hub.stats().await else {
            panic!("hub stopped");
        };
        if stats.session_count == expected {
            return;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("expected {expected} sessions, have {}", stats.session_count);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn read_until_closed(stream: &mut TcpStream) -> String {
    let mut out = Vec::new();
    let Ok(Ok(_)) = tokio::time::timeout(WAIT, stream.read_to_end(&mut out)).await else {
        panic!("stream was not closed");
    };
    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test]
async fn message_reaches_other_clients_only() {
    let (addr, hub) = start_relay(HubPolicy {
        message_interval: Duration::ZERO,
        ..HubPolicy::default()
    })
    .await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut c = connect(addr).await;
    wait_for_sessions(&hub, 3).await;

    assert!(a.write_all(b"hello").await.is_ok());

    for peer in [&mut b, &mut c] {
        let mut buf = [0_u8; 5];
        let Ok(Ok(_)) = tokio::time::timeout(WAIT, peer.read_exact(&mut buf)).await else {
            panic!("peer did not receive the message");
        };
        assert_eq!(&buf, b"hello");
    }

    let mut buf = [0_u8; 16];
    let echoed = tokio::time::timeout(Duration::from_millis(200), a.read(&mut buf)).await;
    assert!(echoed.is_err(), "sender must not receive its own message");
}

#[tokio::test]
async fn banned_host_is_rejected_on_reconnect() {
    let (addr, hub) = start_relay(HubPolicy {
        message_interval: Duration::from_secs(60),
        ban_duration: Duration::from_secs(60),
        strike_limit: 0,
        ..HubPolicy::default()
    })
    .await;

    let mut offender = connect(addr).await;
    wait_for_sessions(&hub, 1).await;
    assert!(offender.write_all(b"too fast").await.is_ok());
    assert_eq!(read_until_closed(&mut offender).await, "You are banned!\n");
    wait_for_sessions(&hub, 0).await;

    let mut retry = connect(addr).await;
    let notice = read_until_closed(&mut retry).await;
    assert!(notice.starts_with("You are banned: "));
    assert!(notice.ends_with("seconds left\n"));

    let Ok(stats) = hub.stats().await else {
        panic!("hub stopped");
    };
    assert_eq!(stats.session_count, 0);
    assert_eq!(stats.active_bans, 1);
}

#[tokio::test]
async fn admin_api_reports_health_and_stats() {
    let (addr, hub) = start_relay(HubPolicy::default()).await;
    let _client = connect(addr).await;
    wait_for_sessions(&hub, 1).await;

    let Ok(admin_addr) = "127.0.0.1:0".parse::<SocketAddr>() else {
        panic!("bad addr");
    };
    let Ok(admin) = tokio::net::TcpListener::bind(admin_addr).await else {
        panic!("admin bind failed");
    };
    let Ok(admin_local) = admin.local_addr() else {
        panic!("no local addr");
    };
    let app = api::build_router(AppState { hub });
    tokio::spawn(async move {
        let _ = axum::serve(admin, app).await;
    });

    let Ok(health) = reqwest::get(format!("http://{admin_local}/health")).await else {
        panic!("health request failed");
    };
    assert_eq!(health.status(), reqwest::StatusCode::OK);

    let Ok(stats) = reqwest::get(format!("http://{admin_local}/stats")).await else {
        panic!("stats request failed");
    };
    let Ok(body) = stats.json::<serde_json::Value>().await else {
        panic!("stats body was not JSON");
    };
    assert_eq!(body.get("session_count"), Some(&serde_json::json!(1)));
    assert_eq!(body.get("active_bans"), Some(&serde_json::json!(0)));
}
