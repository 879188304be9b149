//! Server settings read from the environment (`PORT`, `ROOM_NAME`, ...).
//!
//! Unset variables take their defaults; unparseable ones are logged and
//! ignored.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address both listeners bind to
    pub bind_address: IpAddr,
    /// WebSocket port
    pub port: u16,
    /// Port of the plain HTTP liveness endpoint
    pub health_port: u16,
    /// Name clients use in `JoinOrCreate`
    pub room_name: String,
    /// Silence after which a connection is dropped
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 2567,
            health_port: 2568,
            room_name: "my_room".to_string(),
            idle_timeout: Duration::from_secs(15),
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset keys keep their
    /// defaults; invalid values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDRESS") {
            if let Ok(parsed) = addr.parse() {
                config.bind_address = parsed;
            } else {
                tracing::warn!("Invalid BIND_ADDRESS '{}', using default", addr);
            }
        }

        if let Some(port) = lookup("PORT") {
            match parse_port(&port) {
                Some(parsed) => config.port = parsed,
                None => tracing::warn!("Invalid PORT '{}', using default", port),
            }
        }

        if let Some(port) = lookup("HEALTH_PORT") {
            match parse_port(&port) {
                Some(parsed) => config.health_port = parsed,
                None => {
                    tracing::warn!("Invalid HEALTH_PORT '{}', using default", port)
                }
            }
        }

        if let Some(name) = lookup("ROOM_NAME") {
            if name.trim().is_empty() {
                tracing::warn!("ROOM_NAME is empty, using default");
            } else {
                config.room_name = name;
            }
        }

        if let Some(secs) = lookup("IDLE_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse::<u64>() {
                if parsed > 0 {
                    config.idle_timeout = Duration::from_secs(parsed);
                } else {
                    tracing::warn!("IDLE_TIMEOUT_SECS must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid IDLE_TIMEOUT_SECS '{}', using default", secs);
            }
        }

        config
    }

    /// `host:port` for the WebSocket listener.
    pub fn ws_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// `host:port` for the health listener.
    pub fn health_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.health_port)
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.parse::<u16>().ok().filter(|port| *port > 0)
}
