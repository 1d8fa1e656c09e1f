//! Resolution of the IPv4 address advertised in discovery packets.

use std::net::{IpAddr, Ipv4Addr};

use tracing::{debug, warn};

/// Resolves the host name of this machine and returns the address other
/// hosts on the LAN are most likely to reach it on.
///
/// Falls back to `127.0.0.1` when the host name does not resolve to any IPv4
/// address.
pub async fn resolve_local_ipv4() -> Ipv4Addr {
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();

    match tokio::net::lookup_host((hostname.as_str(), 0)).await {
        Ok(addrs) => {
            let candidates: Vec<Ipv4Addr> = addrs
                .filter_map(|addr| match addr.ip() {
                    IpAddr::V4(ip) => Some(ip),
                    IpAddr::V6(_) => None,
                })
                .collect();
            if let Some(ip) = pick_advertised(&candidates) {
                debug!(%hostname, %ip, "resolved advertised address");
                return ip;
            }
            warn!(%hostname, "host name has no IPv4 address; advertising loopback");
        }
        Err(error) => {
            warn!(%hostname, %error, "failed to resolve host name; advertising loopback");
        }
    }

    Ipv4Addr::LOCALHOST
}

/// Prefers the first routable address, else the first loopback one.
pub fn pick_advertised(candidates: &[Ipv4Addr]) -> Option<Ipv4Addr> {
    let usable = || candidates.iter().copied().filter(|ip| !ip.is_unspecified());
    usable()
        .find(|ip| !ip.is_loopback())
        .or_else(|| usable().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_non_loopback_address() {
        let picked = pick_advertised(&[
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::new(192, 168, 1, 40),
            Ipv4Addr::new(10, 0, 0, 2),
        ]);
        assert_eq!(picked, Some(Ipv4Addr::new(192, 168, 1, 40)));
    }

    #[test]
    fn falls_back_to_loopback_when_nothing_else() {
        assert_eq!(
            pick_advertised(&[Ipv4Addr::new(127, 0, 1, 1)]),
            Some(Ipv4Addr::new(127, 0, 1, 1))
        );
        assert_eq!(pick_advertised(&[Ipv4Addr::UNSPECIFIED]), None);
        assert_eq!(pick_advertised(&[]), None);
    }

    #[tokio::test]
    async fn resolution_always_yields_an_address() {
        let ip = resolve_local_ipv4().await;
        assert!(!ip.is_unspecified());
    }
}
