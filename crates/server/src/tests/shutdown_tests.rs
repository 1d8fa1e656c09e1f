use super::*;

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    time::Duration,
};

use discovery::BroadcastConfig;
use shared::domain::ServiceState;
use tokio::{net::UdpSocket, time::timeout};

async fn running_broadcast() -> (Arc<Mutex<BroadcastService>>, UdpSocket) {
    let listener = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("listener");
    let port = listener.local_addr().expect("addr").port();
    let mut service = BroadcastService::new(BroadcastConfig {
        discovery_port: port,
        target: Ipv4Addr::LOCALHOST,
        interval: Duration::from_millis(100),
        advertise_address: Some(Ipv4Addr::LOCALHOST),
        ..BroadcastConfig::default()
    });
    service.start().await.expect("start");
    (Arc::new(Mutex::new(service)), listener)
}

#[tokio::test]
async fn request_stops_broadcast_and_exits_successfully() {
    let (broadcast, _listener) = running_broadcast().await;
    assert_eq!(broadcast.lock().await.state(), ServiceState::Running);

    let coordinator = ShutdownCoordinator::new();
    coordinator.handle().request(ShutdownReason::Interrupt);
    let outcome = timeout(Duration::from_secs(2), coordinator.run(broadcast.clone()))
        .await
        .expect("coordinator finished");

    assert_eq!(outcome.reason, ShutdownReason::Interrupt);
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(broadcast.lock().await.state(), ServiceState::Stopped);
}

#[tokio::test]
async fn first_request_wins() {
    let mut coordinator = ShutdownCoordinator::new();
    let handle = coordinator.handle();
    handle.request(ShutdownReason::Terminate);
    handle.request(ShutdownReason::Interrupt);
    assert_eq!(coordinator.wait().await, ShutdownReason::Terminate);
}

#[tokio::test]
async fn coordinator_waits_until_requested() {
    let mut coordinator = ShutdownCoordinator::new();
    let pending = timeout(Duration::from_millis(50), coordinator.wait()).await;
    assert!(pending.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn sigterm_is_turned_into_a_request() {
    let mut coordinator = ShutdownCoordinator::new();
    let listener = listen_for_signals(coordinator.handle()).expect("install handlers");

    let status = std::process::Command::new("kill")
        .args(["-s", "TERM", &std::process::id().to_string()])
        .status()
        .expect("run kill");
    assert!(status.success());

    let reason = timeout(Duration::from_secs(5), coordinator.wait())
        .await
        .expect("signal delivered");
    assert_eq!(reason, ShutdownReason::Terminate);
    listener.abort();
}
