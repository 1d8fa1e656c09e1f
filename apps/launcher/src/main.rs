use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Context};
use clap::Parser;
use eframe::egui;
use shared::protocol::DEFAULT_DASHBOARD_BIND;
use tracing::{info, warn};

mod app;
mod paths;
mod supervisor;

use app::{lock, LauncherApp, WINDOW_SIZE, WINDOW_TITLE};
use supervisor::{ServerCommand, Supervisor};

#[derive(Parser, Debug)]
#[command(about = "Starts the dashboard server and keeps it alive while the window is open")]
struct Args {
    /// Dashboard server executable; defaults to `dashboard` next to this binary
    #[arg(long)]
    dashboard_bin: Option<PathBuf>,
    /// Window icon (PNG)
    #[arg(long)]
    icon: Option<PathBuf>,
    /// How long the server gets to exit after SIGTERM before it is killed
    #[arg(long, default_value_t = 3000)]
    grace_period_ms: u64,
    /// Address the dashboard server should listen on
    #[arg(long, default_value = DEFAULT_DASHBOARD_BIND)]
    bind: String,
    #[arg(long)]
    no_browser: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from));
    let cwd = std::env::current_dir().ok();

    let program = paths::resolve_dashboard_bin(args.dashboard_bin, exe_dir.as_deref())
        .context("dashboard executable not found next to the launcher; pass --dashboard-bin")?;
    let dashboard_url = format!("http://{}/", args.bind);

    let command = ServerCommand::new(program).arg("--bind").arg(&args.bind);
    let mut supervisor = Supervisor::new(command, Duration::from_millis(args.grace_period_ms));
    supervisor
        .launch()
        .context("failed to start dashboard server")?;
    info!(pid = ?supervisor.server_pid(), url = %dashboard_url, "dashboard launched");
    if !args.no_browser {
        open_in_browser(&dashboard_url);
    }
    let supervisor = Arc::new(Mutex::new(supervisor));

    let mut viewport = egui::ViewportBuilder::default()
        .with_title(WINDOW_TITLE)
        .with_inner_size(WINDOW_SIZE)
        .with_resizable(false)
        .with_always_on_top();
    match paths::resolve_icon(args.icon, exe_dir.as_deref(), cwd.as_deref()) {
        Some(path) => match paths::load_icon(&path) {
            Ok(icon) => viewport = viewport.with_icon(icon),
            Err(error) => warn!(path = %path.display(), %error, "could not load window icon"),
        },
        None => warn!(
            path = paths::ICON_RELATIVE_PATH,
            "window icon not found; continuing without one"
        ),
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    let app_supervisor = Arc::clone(&supervisor);
    let window = eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(LauncherApp::new(app_supervisor, dashboard_url)))),
    );

    let shutdown = lock(&supervisor).shutdown();
    window.map_err(|err| anyhow!("launcher window failed: {err}"))?;
    shutdown.context("failed to stop dashboard server")?;
    info!(status = ?lock(&supervisor).exit_status(), "launcher exiting");
    Ok(())
}

fn open_in_browser(url: &str) {
    #[cfg(target_os = "windows")]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", "", url])
        .spawn();

    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(url).spawn();

    #[cfg(all(unix, not(target_os = "macos")))]
    let result = std::process::Command::new("xdg-open").arg(url).spawn();

    if let Err(error) = result {
        warn!(%url, %error, "failed to open browser");
    }
}
