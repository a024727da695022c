//! Connection hub and client session configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Limits and timings for live client connections
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Outbound messages buffered per connection before drops start
    #[serde(default = "default_queue_capacity")]
    pub send_queue_capacity: usize,

    /// Deadline for writing one frame to a client
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,

    /// How long a connection may stay silent before it is dropped
    #[serde(default = "default_pong_wait")]
    pub pong_wait_secs: u64,

    /// Interval between server pings; must be shorter than `pong_wait_secs`
    #[serde(default = "default_ping_period")]
    pub ping_period_secs: u64,

    /// Largest inbound frame accepted, in bytes
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    /// Broadcasts queued for the hub loop
    #[serde(default = "default_queue_capacity")]
    pub broadcast_queue_capacity: usize,
}

impl HubConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_secs)
    }

    pub fn ping_period(&self) -> Duration {
        Duration::from_secs(self.ping_period_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("hub.send_queue_capacity", self.send_queue_capacity as u64),
            ("hub.write_timeout_secs", self.write_timeout_secs),
            ("hub.pong_wait_secs", self.pong_wait_secs),
            ("hub.ping_period_secs", self.ping_period_secs),
            ("hub.max_message_bytes", self.max_message_bytes as u64),
            ("hub.broadcast_queue_capacity", self.broadcast_queue_capacity as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ValidationError::MustBePositive(name));
        }
        if self.ping_period_secs >= self.pong_wait_secs {
            return Err(ValidationError::PingPeriodTooLong);
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            send_queue_capacity: default_queue_capacity(),
            write_timeout_secs: default_write_timeout(),
            pong_wait_secs: default_pong_wait(),
            ping_period_secs: default_ping_period(),
            max_message_bytes: default_max_message_bytes(),
            broadcast_queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    256
}

fn default_write_timeout() -> u64 {
    10
}

fn default_pong_wait() -> u64 {
    60
}

fn default_ping_period() -> u64 {
    30
}

fn default_max_message_bytes() -> usize {
    512 * 1024
}
