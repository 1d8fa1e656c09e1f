use super::{settings_from, Settings};

use std::{collections::HashMap, net::Ipv4Addr, time::Duration};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults_match_protocol_ports() {
    let settings = settings_from(None, env_of(&[]));
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.http_port, 6229);
    assert_eq!(settings.udp_port, 7899);
    assert_eq!(settings.http_bind(), "0.0.0.0:6229");
}

#[test]
fn environment_overrides_ports() {
    let settings = settings_from(
        None,
        env_of(&[("REACHER_UDP_PORT", "9000"), ("REACHER_HTTP_PORT", "8080")]),
    );
    assert_eq!(settings.udp_port, 9000);
    assert_eq!(settings.http_port, 8080);

    let broadcast = settings.broadcast_config();
    assert_eq!(broadcast.discovery_port, 9000);
    assert_eq!(broadcast.service_port, 8080);
    assert_eq!(broadcast.interval, Duration::from_secs(5));
}

#[test]
fn invalid_port_keeps_default() {
    let settings = settings_from(None, env_of(&[("REACHER_HTTP_PORT", "not-a-port")]));
    assert_eq!(settings.http_port, 6229);

    let settings = settings_from(None, env_of(&[("REACHER_UDP_PORT", "70000")]));
    assert_eq!(settings.udp_port, 7899);
}

#[test]
fn file_values_accept_integers_and_strings() {
    let file = r#"
        http_port = 7001
        udp_port = "7002"
        device_name = "rig-a"
        advertise_address = "192.168.1.50"
    "#;
    let settings = settings_from(Some(file), env_of(&[]));
    assert_eq!(settings.http_port, 7001);
    assert_eq!(settings.udp_port, 7002);
    assert_eq!(settings.device_name, "rig-a");
    assert_eq!(
        settings.advertise_address,
        Some(Ipv4Addr::new(192, 168, 1, 50))
    );
}

#[test]
fn environment_wins_over_file() {
    let settings = settings_from(
        Some("http_port = 7001"),
        env_of(&[("REACHER_HTTP_PORT", "7100")]),
    );
    assert_eq!(settings.http_port, 7100);
}

#[test]
fn zero_interval_is_rejected() {
    let settings = settings_from(None, env_of(&[("REACHER_BROADCAST_INTERVAL_SECS", "0")]));
    assert_eq!(settings.broadcast_interval_secs, 5);

    let settings = settings_from(None, env_of(&[("REACHER_BROADCAST_INTERVAL_SECS", "2")]));
    assert_eq!(settings.broadcast_config().interval, Duration::from_secs(2));
}

#[test]
fn unreadable_file_falls_back_to_defaults() {
    let settings = settings_from(Some("this is = = not toml"), env_of(&[]));
    assert_eq!(settings, Settings::default());
}
