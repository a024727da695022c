//! Event bus configuration

use serde::Deserialize;

use super::error::ValidationError;

/// In-process event bus settings
#[derive(Debug, Clone, Deserialize)]
pub struct EventBusConfig {
    /// Number of recent events kept for history queries
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl EventBusConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.history_capacity == 0 {
            return Err(ValidationError::MustBePositive("event_bus.history_capacity"));
        }
        Ok(())
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_history_capacity() -> usize {
    1000
}
