//! Local network identity for LAN access to the server.
//!
//! The outbound address is found by "connecting" a UDP socket to a public
//! address: the OS picks the route and binds the socket to the matching
//! interface, and nothing is ever sent.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

/// Public address used only to make the OS choose an outbound route.
pub const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

const UNKNOWN_HOST: &str = "unknown";

/// Returns the IPv4 address of the interface used for outbound traffic.
///
/// Failures are logged and collapse to `None`.
pub fn resolve_local_address() -> Option<Ipv4Addr> {
    match route_local_address(ROUTE_PROBE_ADDR) {
        Ok(ip) => Some(ip),
        Err(e) => {
            tracing::warn!("Error getting IP: {e}");
            None
        }
    }
}

/// Resolves the local address the OS would use to reach `target`.
pub fn route_local_address(target: &str) -> io::Result<Ipv4Addr> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))?;
    socket.connect(target)?;
    match socket.local_addr()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
        other => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no usable outbound IPv4 address (got {other})"),
        )),
    }
}

/// Returns the machine hostname, or `"unknown"` when it cannot be read.
pub fn resolve_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

/// Everything the IP reporter prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkReport {
    pub address: Option<Ipv4Addr>,
    pub hostname: String,
    pub port: u16,
}

impl NetworkReport {
    pub fn gather(port: u16) -> Self {
        Self {
            address: resolve_local_address(),
            hostname: resolve_hostname(),
            port,
        }
    }

    /// URL other devices on the LAN should open.
    pub fn lan_url(&self) -> Option<String> {
        self.address.map(|ip| format!("http://{ip}:{}", self.port))
    }

    /// QR helper page served by the web app.
    pub fn qr_url(&self) -> Option<String> {
        self.lan_url().map(|url| format!("{url}/qr"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_never_empty() {
        assert!(!resolve_hostname().is_empty());
    }

    #[test]
    fn resolve_local_address_does_not_panic() {
        // Sandboxed CI may have no route at all; either outcome is valid.
        if let Some(ip) = resolve_local_address() {
            assert!(!ip.is_unspecified());
            assert_eq!(ip.to_string().split('.').count(), 4);
        }
    }

    #[test]
    fn loopback_target_resolves_to_loopback() {
        let ip = route_local_address("127.0.0.1:9").unwrap();
        assert!(ip.is_loopback());
    }

    #[test]
    fn unresolvable_target_is_an_error() {
        assert!(route_local_address("not an address").is_err());
    }

    #[test]
    fn report_urls() {
        let report = NetworkReport {
            address: Some(Ipv4Addr::new(192, 168, 1, 42)),
            hostname: "parking-desk".into(),
            port: 3000,
        };
        assert_eq!(report.lan_url().unwrap(), "http://192.168.1.42:3000");
        assert_eq!(report.qr_url().unwrap(), "http://192.168.1.42:3000/qr");
    }

    #[test]
    fn report_without_address_has_no_urls() {
        let report = NetworkReport {
            address: None,
            hostname: UNKNOWN_HOST.into(),
            port: 3000,
        };
        assert!(report.lan_url().is_none());
        assert!(report.qr_url().is_none());
    }
}
