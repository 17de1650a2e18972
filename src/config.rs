/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Server and client configuration.
//!
//! Both configurations deserialize from JSON with every field optional, and
//! can be overridden from environment variables:
//!
//! - `EXCHANGE_COMMAND_ADDR`: TCP command address (default `127.0.0.1:4001`
//!   for the client, `0.0.0.0:4001` for the server)
//! - `EXCHANGE_EVENT_GROUP`: event group address (default `239.1.1.1`)
//! - `EXCHANGE_EVENT_PORT`: event UDP port (default `4002`)
//! - `EXCHANGE_MULTICAST_TTL`: multicast hop limit, server only (default `1`)
//! - `EXCHANGE_QUEUE_CAPACITY`: pending request bound, client only (default `10`)
//! - `EXCHANGE_REQUEST_TIMEOUT_MS`: per-request timeout, client only (default `5000`)
//! - `EXCHANGE_CONNECT_TIMEOUT_MS`: connect timeout, client only (default `2000`)

use serde::{Deserialize, Serialize};
use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default TCP port for commands.
pub const DEFAULT_COMMAND_PORT: u16 = 4001;

/// Default UDP port for events.
pub const DEFAULT_EVENT_PORT: u16 = 4002;

/// Default event multicast group.
pub const DEFAULT_EVENT_GROUP: Ipv4Addr = Ipv4Addr::new(239, 1, 1, 1);

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unparsable value.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// A JSON document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exchange-side settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the command listener binds to.
    pub command_addr: SocketAddr,
    /// Destination group of event datagrams. A non-multicast address is
    /// used as a plain unicast destination.
    pub event_group: Ipv4Addr,
    /// Destination port of event datagrams.
    pub event_port: u16,
    /// Hop limit of multicast datagrams.
    pub multicast_ttl: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_COMMAND_PORT)),
            event_group: DEFAULT_EVENT_GROUP,
            event_port: DEFAULT_EVENT_PORT,
            multicast_ttl: 1,
        }
    }
}

impl ServerConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Builds a configuration from the defaults overridden by `EXCHANGE_*`
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            command_addr: env_or("EXCHANGE_COMMAND_ADDR", defaults.command_addr)?,
            event_group: env_or("EXCHANGE_EVENT_GROUP", defaults.event_group)?,
            event_port: env_or("EXCHANGE_EVENT_PORT", defaults.event_port)?,
            multicast_ttl: env_or("EXCHANGE_MULTICAST_TTL", defaults.multicast_ttl)?,
        })
    }

    /// Destination of event datagrams.
    #[must_use]
    pub fn event_addr(&self) -> SocketAddr {
        SocketAddr::from((self.event_group, self.event_port))
    }
}

/// Broker-side settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the exchange's command listener.
    pub command_addr: SocketAddr,
    /// Group to receive events from. A non-multicast address is bound
    /// directly instead of joined.
    pub event_group: Ipv4Addr,
    /// Port to receive events on.
    pub event_port: u16,
    /// Maximum number of requests waiting for the connection; further
    /// callers wait for space.
    pub queue_capacity: usize,
    /// Time allowed for one request/response exchange.
    pub request_timeout_ms: u64,
    /// Time allowed to establish the command connection.
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            command_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_COMMAND_PORT)),
            event_group: DEFAULT_EVENT_GROUP,
            event_port: DEFAULT_EVENT_PORT,
            queue_capacity: 10,
            request_timeout_ms: 5_000,
            connect_timeout_ms: 2_000,
        }
    }
}

impl ClientConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Builds a configuration from the defaults overridden by `EXCHANGE_*`
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            command_addr: env_or("EXCHANGE_COMMAND_ADDR", defaults.command_addr)?,
            event_group: env_or("EXCHANGE_EVENT_GROUP", defaults.event_group)?,
            event_port: env_or("EXCHANGE_EVENT_PORT", defaults.event_port)?,
            queue_capacity: env_or("EXCHANGE_QUEUE_CAPACITY", defaults.queue_capacity)?,
            request_timeout_ms: env_or(
                "EXCHANGE_REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            )?,
            connect_timeout_ms: env_or(
                "EXCHANGE_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout_ms,
            )?,
        })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    parse_or(name, env::var(name).ok(), default)
}

/// Parses a raw variable value, keeping `default` when it is unset.
fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
        None => Ok(default),
    }
}
