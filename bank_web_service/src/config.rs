//! Service configuration, read from the environment

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const HOST_VAR: &str = "BANK_HOST";
pub const PORT_VAR: &str = "BANK_PORT";

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 8080;

/// **Where the web service listens**
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
        }
    }
}

impl ServiceConfig {
    /// Reads [`HOST_VAR`] and [`PORT_VAR`].
    pub fn from_env() -> Self {
        Self::from_values(env::var(HOST_VAR).ok(), env::var(PORT_VAR).ok())
    }

    /// **Builds a configuration out of optional raw values**
    ///
    /// A missing value silently falls back to its default;
    /// a malformed one falls back to its default with a warning.
    pub fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let host = match host {
            None => DEFAULT_HOST,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!(
                    "{} could not be parsed from \"{}\"; using default: {}",
                    HOST_VAR,
                    raw,
                    DEFAULT_HOST
                );
                DEFAULT_HOST
            }),
        };

        let port = match port {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!(
                    "{} could not be parsed from \"{}\"; using default: {}",
                    PORT_VAR,
                    raw,
                    DEFAULT_PORT
                );
                DEFAULT_PORT
            }),
        };

        Self { host, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
