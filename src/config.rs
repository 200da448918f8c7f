use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const DEFAULT_SEND_TIMEOUT_MS: u64 = 250;
const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Runtime configuration for the relay
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Longest a single delivery may wait for space in a member's queue
    pub send_timeout: Duration,
    /// Events buffered per member before deliveries start waiting
    pub outbound_buffer: usize,
    /// Maximum members per room, unbounded when `None`
    pub room_capacity: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 50051)),
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            room_capacity: None,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from `SIGNAL_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let listen_addr = parse_or(&lookup, "SIGNAL_LISTEN_ADDR", defaults.listen_addr);
        let send_timeout_ms = parse_or(&lookup, "SIGNAL_SEND_TIMEOUT_MS", DEFAULT_SEND_TIMEOUT_MS);
        let outbound_buffer = parse_or(&lookup, "SIGNAL_OUTBOUND_BUFFER", DEFAULT_OUTBOUND_BUFFER);
        let room_capacity = parse_or(&lookup, "SIGNAL_ROOM_CAPACITY", 0usize);

        Self {
            listen_addr,
            send_timeout: Duration::from_millis(send_timeout_ms),
            outbound_buffer: outbound_buffer.max(1),
            room_capacity: (room_capacity > 0).then_some(room_capacity),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!(key = key, value = %raw, error = %e, default = %default, "Invalid config value, using default");
            default
        }),
        None => default,
    }
}
