//! Server configuration

use std::time::Duration;

use boardroom_core::Limits;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::DEFAULT_PORT;

/// Longest idle time a room may be given before the sweep closes it
pub const MAX_IDLE_ROOM_SECS: u64 = 7 * 24 * 60 * 60;

/// Listener, liveness and housekeeping settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How often every peer is pinged
    pub heartbeat_interval_ms: u64,
    /// Peers silent for longer than this are dropped
    pub liveness_timeout_ms: u64,
    /// Rooms untouched for longer than this are closed
    pub idle_room_secs: u64,
    pub sweep_interval_secs: u64,
    pub limits: Limits,
}

impl ServerConfig {
    /// Reject values the background tasks cannot run with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("liveness_timeout_ms", self.liveness_timeout_ms),
            ("sweep_interval_secs", self.sweep_interval_secs),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(Error::InvalidConfig(format!("{} must be positive", name)));
        }
        if self.idle_room_secs > MAX_IDLE_ROOM_SECS {
            return Err(Error::InvalidConfig(format!(
                "idle_room_secs must be at most {}",
                MAX_IDLE_ROOM_SECS
            )));
        }
        self.limits.check().map_err(Error::InvalidConfig)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Idle limit for rooms, capped at [`MAX_IDLE_ROOM_SECS`]
    pub fn idle_room(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.idle_room_secs.min(MAX_IDLE_ROOM_SECS) as i64)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            heartbeat_interval_ms: 10_000,
            liveness_timeout_ms: 30_000,
            idle_room_secs: 30 * 60,
            sweep_interval_secs: 60,
            limits: Limits::default(),
        }
    }
}
