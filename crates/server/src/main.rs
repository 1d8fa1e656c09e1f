use std::{future::IntoFuture, net::SocketAddr, process::ExitCode, sync::Arc};

use anyhow::Context;
use discovery::BroadcastService;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

mod api;
mod app_state;
mod config;
mod shutdown;

use api::build_router;
use app_state::AppState;
use config::load_settings;
use shutdown::{listen_for_signals, ShutdownCoordinator};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    info!(
        http_port = settings.http_port,
        udp_port = settings.udp_port,
        "starting control server"
    );

    let coordinator = ShutdownCoordinator::new();
    listen_for_signals(coordinator.handle()).context("failed to install signal handlers")?;

    let broadcast = Arc::new(Mutex::new(BroadcastService::new(
        settings.broadcast_config(),
    )));
    let state = AppState {
        device_name: settings.device_name.clone(),
        http_port: settings.http_port,
        broadcast: broadcast.clone(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .http_bind()
        .parse()
        .with_context(|| format!("invalid http bind address '{}'", settings.http_bind()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind control endpoint on {addr}"))?;
    info!(%addr, "control server listening");

    if let Err(error) = broadcast.lock().await.start().await {
        warn!(%error, "continuing without discovery broadcast");
    }

    tokio::select! {
        served = axum::serve(listener, app).into_future() => {
            broadcast.lock().await.stop();
            if let Err(error) = &served {
                error!(%error, "control server stopped");
            }
            served?;
            Ok(ExitCode::SUCCESS)
        }
        outcome = coordinator.run(broadcast.clone()) => {
            info!(reason = ?outcome.reason, "exiting");
            Ok(ExitCode::from(outcome.exit_code))
        }
    }
}
