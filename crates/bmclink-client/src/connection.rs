//! Connection descriptor: endpoint, credentials, and transport selection.

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use tokio::net::{UdpSocket, lookup_host};

use crate::error::Error;

/// Default RMCP/IPMI UDP port.
pub const DEFAULT_PORT: u16 = 623;

/// Transport interface selector.
///
/// `lan` speaks IPMI v1.5 natively over UDP; `lanplus` delegates to an
/// external `ipmitool`-compatible helper (as does `lan` when an explicit
/// helper path is configured).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interface {
    /// Native IPMI v1.5 over UDP.
    Lan,
    /// IPMI v2.0 via the external helper.
    #[default]
    Lanplus,
}

impl std::fmt::Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Lan => "lan",
            Self::Lanplus => "lanplus",
        })
    }
}

impl FromStr for Interface {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lan" => Ok(Self::Lan),
            "lanplus" => Ok(Self::Lanplus),
            other => Err(Error::UnsupportedInterface(other.to_string())),
        }
    }
}

/// Properties for reaching one BMC. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Connection {
    /// BMC hostname or IP literal.
    pub hostname: String,
    /// UDP port; [`DEFAULT_PORT`] when unset.
    pub port: Option<u16>,
    /// User name, at most 16 bytes.
    pub username: String,
    /// Password, at most 16 bytes.
    pub password: String,
    /// Transport interface selector.
    pub interface: Interface,
    /// Path to the external helper; enables the subprocess transport even
    /// for the `lan` interface.
    pub path: Option<PathBuf>,
}

impl Connection {
    /// The effective UDP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// The BMC's IP address: the hostname itself when it is already a
    /// literal, otherwise the first resolved address. Resolution failures
    /// fall back to the hostname unchanged.
    pub async fn remote_ip(&self) -> String {
        if self.hostname.parse::<IpAddr>().is_ok() {
            return self.hostname.clone();
        }
        match lookup_host((self.hostname.as_str(), self.port())).await {
            Ok(mut addrs) => addrs
                .next()
                .map_or_else(|| self.hostname.clone(), |addr| addr.ip().to_string()),
            Err(_) => self.hostname.clone(),
        }
    }

    /// The local address this host would use to reach the BMC, discovered
    /// through a transient UDP socket. Virtual-media drivers embed this in
    /// callback URLs handed to the BMC. Falls back to the hostname on error;
    /// a value that cannot be discovered will never reach the BMC anyway.
    pub async fn local_ip(&self) -> String {
        let Ok(socket) = UdpSocket::bind(("0.0.0.0", 0)).await else {
            return self.hostname.clone();
        };
        if socket.connect((self.hostname.as_str(), self.port())).await.is_err() {
            return self.hostname.clone();
        }
        match socket.local_addr() {
            Ok(addr) => addr.ip().to_string(),
            Err(_) => self.hostname.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remote_ip_returns_literal_unchanged() {
        let c = Connection { hostname: "127.0.0.1".to_string(), ..Default::default() };
        assert_eq!("127.0.0.1", c.remote_ip().await);
    }

    #[tokio::test]
    async fn local_ip_toward_loopback_is_loopback() {
        let c = Connection {
            hostname: "127.0.0.1".to_string(),
            port: Some(623),
            ..Default::default()
        };
        assert_eq!("127.0.0.1", c.local_ip().await);
    }

    #[test]
    fn interface_from_str() {
        assert_eq!(Interface::Lan, "lan".parse().unwrap());
        assert_eq!(Interface::Lanplus, "lanplus".parse().unwrap());
        assert!("serial".parse::<Interface>().is_err());
        assert_eq!("lanplus", Interface::Lanplus.to_string());
    }

    #[test]
    fn default_port_applies_when_unset() {
        let c = Connection::default();
        assert_eq!(DEFAULT_PORT, c.port());

        let c = Connection { port: Some(1623), ..Default::default() };
        assert_eq!(1623, c.port());
    }
}
