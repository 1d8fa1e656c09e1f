use std::{fmt::Display, fs, net::Ipv4Addr, str::FromStr, time::Duration};

use discovery::BroadcastConfig;
use shared::protocol::{
    DEFAULT_BROADCAST_INTERVAL_SECS, DEFAULT_DEVICE_NAME, DEFAULT_DISCOVERY_PORT,
    DEFAULT_HTTP_PORT,
};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub http_host: String,
    pub http_port: u16,
    pub udp_port: u16,
    pub device_name: String,
    pub broadcast_interval_secs: u64,
    pub advertise_address: Option<Ipv4Addr>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".into(),
            http_port: DEFAULT_HTTP_PORT,
            udp_port: DEFAULT_DISCOVERY_PORT,
            device_name: DEFAULT_DEVICE_NAME.into(),
            broadcast_interval_secs: DEFAULT_BROADCAST_INTERVAL_SECS,
            advertise_address: None,
        }
    }
}

impl Settings {
    pub fn http_bind(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            discovery_port: self.udp_port,
            service_port: self.http_port,
            device_name: self.device_name.clone(),
            interval: Duration::from_secs(self.broadcast_interval_secs),
            advertise_address: self.advertise_address,
            ..BroadcastConfig::default()
        }
    }
}

/// Reads `server.toml` from the working directory if present, then applies
/// `REACHER_*` environment overrides.
pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
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
                for (key, value) in &table {
                    let value = match value {
                        toml::Value::String(s) => s.clone(),
                        toml::Value::Integer(i) => i.to_string(),
                        other => {
                            warn!(%key, value = %other, "ignoring unsupported server.toml value");
                            continue;
                        }
                    };
                    apply(&mut settings, key, &value, "server.toml");
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable server.toml"),
        }
    }

    for (var, key) in [
        ("REACHER_HTTP_HOST", "http_host"),
        ("REACHER_HTTP_PORT", "http_port"),
        ("REACHER_UDP_PORT", "udp_port"),
        ("REACHER_DEVICE_NAME", "device_name"),
        ("REACHER_BROADCAST_INTERVAL_SECS", "broadcast_interval_secs"),
        ("REACHER_ADVERTISE_ADDRESS", "advertise_address"),
    ] {
        if let Some(value) = env(var) {
            apply(&mut settings, key, &value, var);
        }
    }

    settings
}

fn apply(settings: &mut Settings, key: &str, value: &str, source: &str) {
    let value = value.trim();
    match key {
        "http_host" => settings.http_host = value.to_string(),
        "http_port" => settings.http_port = parse_or_keep(source, value, settings.http_port),
        "udp_port" => settings.udp_port = parse_or_keep(source, value, settings.udp_port),
        "device_name" => settings.device_name = value.to_string(),
        "broadcast_interval_secs" => {
            let secs = parse_or_keep(source, value, settings.broadcast_interval_secs);
            if secs == 0 {
                warn!(%source, "broadcast interval must be positive; keeping previous value");
            } else {
                settings.broadcast_interval_secs = secs;
            }
        }
        "advertise_address" => match value.parse::<Ipv4Addr>() {
            Ok(ip) => settings.advertise_address = Some(ip),
            Err(error) => {
                warn!(%source, value = %value, %error, "invalid advertise address; resolving from host name");
            }
        },
        other => warn!(key = %other, %source, "ignoring unknown setting"),
    }
}

fn parse_or_keep<T>(source: &str, raw: &str, current: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw.parse::<T>() {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(%source, value = %raw, %error, "invalid setting; keeping previous value");
            current
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
