//! Background scheduler configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Background scheduling settings
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Run the periodic scheduling loop
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between scheduling passes
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Pending tasks examined per tenant per pass
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::MustBePositive("scheduler.interval_secs"));
        }
        if self.batch_limit == 0 {
            return Err(ValidationError::MustBePositive("scheduler.batch_limit"));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
            batch_limit: default_batch_limit(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    5
}

fn default_batch_limit() -> usize {
    100
}
