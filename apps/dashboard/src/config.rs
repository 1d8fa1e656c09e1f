use std::fs;

use sessions::{RemoteEndpoint, SessionWiring};
use shared::protocol::{DEFAULT_DASHBOARD_BIND, DEFAULT_HTTP_PORT};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind: String,
    /// Control port of the local core, targeted by Local sessions.
    pub control_port: u16,
    pub remote_host: String,
    pub remote_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        let remote = RemoteEndpoint::default();
        Self {
            bind: DEFAULT_DASHBOARD_BIND.into(),
            control_port: DEFAULT_HTTP_PORT,
            remote_host: remote.host,
            remote_port: remote.port,
        }
    }
}

impl Settings {
    pub fn wiring(&self) -> SessionWiring {
        SessionWiring {
            local_control_port: self.control_port,
            remote: RemoteEndpoint {
                host: self.remote_host.clone(),
                port: self.remote_port,
            },
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("dashboard.toml").ok();
    settings_from(file.as_deref(), |name| std::env::var(name).ok())
}

pub(crate) fn settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<toml::Table>(raw) {
            Ok(table) => {
                if let Some(v) = table.get("bind").and_then(toml::Value::as_str) {
                    settings.bind = v.to_string();
                }
                if let Some(v) = table.get("remote_host").and_then(toml::Value::as_str) {
                    settings.remote_host = v.to_string();
                }
                if let Some(v) = port_value(&table, "control_port") {
                    settings.control_port = v;
                }
                if let Some(v) = port_value(&table, "remote_port") {
                    settings.remote_port = v;
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable dashboard.toml"),
        }
    }

    if let Some(v) = env("DASHBOARD_BIND") {
        settings.bind = v;
    }
    if let Some(v) = env("REACHER_HTTP_PORT") {
        match v.trim().parse() {
            Ok(port) => settings.control_port = port,
            Err(error) => warn!(value = %v, %error, "invalid REACHER_HTTP_PORT"),
        }
    }
    if let Some(v) = env("DASHBOARD_REMOTE_HOST") {
        settings.remote_host = v;
    }
    if let Some(v) = env("DASHBOARD_REMOTE_PORT") {
        match v.trim().parse() {
            Ok(port) => settings.remote_port = port,
            Err(error) => warn!(value = %v, %error, "invalid DASHBOARD_REMOTE_PORT"),
        }
    }

    settings
}

fn port_value(table: &toml::Table, key: &str) -> Option<u16> {
    let value = table.get(key)?;
    let parsed = match value {
        toml::Value::Integer(i) => u16::try_from(*i).ok(),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        warn!(%key, %value, "invalid port in dashboard.toml");
    }
    parsed
}
