use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use sessions::SessionRegistry;
use tracing::info;

mod config;
mod dispatch;
mod page;
mod routes;

use config::load_settings;
use dispatch::spawn_registry;
use routes::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(about = "Session dashboard served over HTTP")]
struct Args {
    /// Address to serve the dashboard on, e.g. 127.0.0.1:5006
    #[arg(long)]
    bind: Option<String>,
    /// Control port of the local core used by Local sessions
    #[arg(long)]
    control_port: Option<u16>,
    #[arg(long)]
    remote_host: Option<String>,
    #[arg(long)]
    remote_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(bind) = args.bind {
        settings.bind = bind;
    }
    if let Some(port) = args.control_port {
        settings.control_port = port;
    }
    if let Some(host) = args.remote_host {
        settings.remote_host = host;
    }
    if let Some(port) = args.remote_port {
        settings.remote_port = port;
    }

    let (registry, dispatcher) = spawn_registry(SessionRegistry::new(settings.wiring()));
    let http = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(2))
        .build()
        .context("failed to build http client")?;
    let app = build_router(Arc::new(AppState { registry, http }));

    let addr: SocketAddr = settings
        .bind
        .parse()
        .with_context(|| format!("invalid dashboard bind address '{}'", settings.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind dashboard on {addr}"))?;
    info!(url = %format!("http://{addr}/"), "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future()
        .await?;
    dispatcher.abort();
    info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(error) => {
                tracing::warn!(%error, "SIGTERM handler unavailable; waiting for ctrl-c only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown requested");
}
