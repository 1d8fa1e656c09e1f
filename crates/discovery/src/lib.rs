//! Periodic UDP announcement of the HTTP control endpoint.
//!
//! A [`BroadcastService`] owns at most one send loop at a time. Each
//! [`BroadcastService::start`] gets a fresh instance key and its own stop
//! channel, and waits for any previous loop to finish before spawning. The
//! advertised address is resolved inside the loop task, so `start` returns
//! as soon as the socket is open.

use std::{
    future::Future,
    io,
    net::{Ipv4Addr, SocketAddrV4},
    time::Duration,
};

use shared::{
    domain::ServiceState,
    protocol::{
        DiscoveryPayload, DEFAULT_BROADCAST_INTERVAL_SECS, DEFAULT_DEVICE_NAME,
        DEFAULT_DISCOVERY_PORT, DEFAULT_HTTP_PORT,
    },
};
use thiserror::Error;
use tokio::{net::UdpSocket, sync::watch, task::JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

pub mod address;

#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// UDP port the announcements are sent to.
    pub discovery_port: u16,
    /// HTTP control port advertised inside each announcement.
    pub service_port: u16,
    pub device_name: String,
    pub target: Ipv4Addr,
    pub bind_addr: SocketAddrV4,
    pub interval: Duration,
    /// Skips host name resolution when set.
    pub advertise_address: Option<Ipv4Addr>,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            discovery_port: DEFAULT_DISCOVERY_PORT,
            service_port: DEFAULT_HTTP_PORT,
            device_name: DEFAULT_DEVICE_NAME.into(),
            target: Ipv4Addr::BROADCAST,
            bind_addr: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
            interval: Duration::from_secs(DEFAULT_BROADCAST_INTERVAL_SECS),
            advertise_address: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to bind broadcast socket on {addr}: {source}")]
    Bind {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable SO_BROADCAST: {0}")]
    EnableBroadcast(#[source] io::Error),
}

struct ActiveRun {
    announced: watch::Receiver<Option<DiscoveryPayload>>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Per-run values the send loop announces.
struct RunPlan {
    key: Uuid,
    device_name: String,
    service_port: u16,
    target: SocketAddrV4,
    interval: Duration,
}

pub struct BroadcastService {
    config: BroadcastConfig,
    run: Option<ActiveRun>,
}

impl BroadcastService {
    pub fn new(config: BroadcastConfig) -> Self {
        Self { config, run: None }
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// Starts a new announcement run and returns its instance key.
    ///
    /// A loop left over from an earlier run is stopped and joined first, so
    /// two loops never announce concurrently. Only the socket is set up here;
    /// the advertised address is resolved by the loop itself. Socket setup
    /// failures are logged and returned; the service then stays stopped.
    pub async fn start(&mut self) -> Result<Uuid, BroadcastError> {
        match self.config.advertise_address {
            Some(address) => self.start_with(std::future::ready(address)).await,
            None => self.start_with(address::resolve_local_ipv4()).await,
        }
    }

    async fn start_with<F>(&mut self, resolve: F) -> Result<Uuid, BroadcastError>
    where
        F: Future<Output = Ipv4Addr> + Send + 'static,
    {
        self.join().await;

        info!("starting discovery broadcast service");
        let key = Uuid::new_v4();
        info!(%key, "generated discovery key");

        let socket = match open_socket(self.config.bind_addr).await {
            Ok(socket) => socket,
            Err(error) => {
                error!(%error, "broadcast service failed");
                return Err(error);
            }
        };

        let plan = RunPlan {
            key,
            device_name: self.config.device_name.clone(),
            service_port: self.config.service_port,
            target: SocketAddrV4::new(self.config.target, self.config.discovery_port),
            interval: self.config.interval,
        };
        let (stop_tx, stop_rx) = watch::channel(false);
        let (announce_tx, announced) = watch::channel(None);
        let task = tokio::spawn(send_loop(socket, plan, resolve, announce_tx, stop_rx));

        self.run = Some(ActiveRun {
            announced,
            stop_tx,
            task,
        });
        Ok(key)
    }

    /// Requests the current loop to stop. Does not wait for it.
    pub fn stop(&self) {
        if let Some(run) = &self.run {
            run.stop_tx.send_replace(true);
        }
    }

    pub fn end(&self) {
        self.stop();
    }

    /// Stops the current loop, if any, and waits for it to release its socket.
    pub async fn join(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        run.stop_tx.send_replace(true);
        if let Err(error) = run.task.await {
            warn!(%error, "broadcast loop ended abnormally");
        }
    }

    pub fn state(&self) -> ServiceState {
        match &self.run {
            Some(run) if !*run.stop_tx.borrow() && !run.task.is_finished() => {
                ServiceState::Running
            }
            _ => ServiceState::Stopped,
        }
    }

    /// The payload currently being announced. `None` when stopped or while
    /// the advertised address is still being resolved.
    pub fn announcement(&self) -> Option<DiscoveryPayload> {
        match self.state() {
            ServiceState::Running => self
                .run
                .as_ref()
                .and_then(|run| run.announced.borrow().clone()),
            ServiceState::Stopped => None,
        }
    }

    /// Waits until the current run has resolved its address and returns
    /// the announced payload, or `None` if the run ended first.
    pub async fn announced(&self) -> Option<DiscoveryPayload> {
        let mut announced = self.run.as_ref()?.announced.clone();
        let payload = announced
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|payload| (*payload).clone());
        payload
    }
}

async fn open_socket(bind_addr: SocketAddrV4) -> Result<UdpSocket, BroadcastError> {
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|source| BroadcastError::Bind {
            addr: bind_addr,
            source,
        })?;
    socket
        .set_broadcast(true)
        .map_err(BroadcastError::EnableBroadcast)?;
    Ok(socket)
}

async fn send_loop<F>(
    socket: UdpSocket,
    plan: RunPlan,
    resolve: F,
    announce_tx: watch::Sender<Option<DiscoveryPayload>>,
    mut stop: watch::Receiver<bool>,
) where
    F: Future<Output = Ipv4Addr>,
{
    let address = tokio::select! {
        address = resolve => Some(address),
        _ = stop.changed() => None,
    };

    if let Some(address) = address {
        let announcement =
            DiscoveryPayload::new(plan.key, plan.device_name, address, plan.service_port);
        announce_tx.send_replace(Some(announcement.clone()));
        announce(&socket, &announcement, plan.target, plan.interval, &mut stop).await;
    }

    drop(socket);
    info!("broadcast service stopped");
}

async fn announce(
    socket: &UdpSocket,
    announcement: &DiscoveryPayload,
    target: SocketAddrV4,
    interval: Duration,
    stop: &mut watch::Receiver<bool>,
) {
    loop {
        let stopped = *stop.borrow_and_update();
        if stopped {
            break;
        }

        let payload = announcement.clone();
        match payload.to_bytes() {
            Ok(bytes) => match socket.send_to(&bytes, target).await {
                Ok(_) => info!(
                    port = target.port(),
                    key = %payload.key,
                    address = %payload.address,
                    advertised_port = payload.port,
                    "broadcast sent"
                ),
                Err(error) => warn!(%error, %target, "broadcast error"),
            },
            Err(error) => warn!(%error, "broadcast error"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
