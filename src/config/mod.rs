//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `UNLIMITED_CORP` prefix and nested values use double underscores as separators.
//! Every section has defaults, so an empty environment yields a working config.
//!
//! # Example
//!
//! ```no_run
//! use unlimited_corp::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}:{}", config.server.host, config.server.port);
//! ```

mod error;
mod event_bus;
mod hub;
mod scheduler;
mod server;

pub use error::{ConfigError, ValidationError};
pub use event_bus::EventBusConfig;
pub use hub::HubConfig;
pub use scheduler::SchedulerConfig;
pub use server::{LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listener address and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// Event bus history
    #[serde(default)]
    pub event_bus: EventBusConfig,

    /// Connection hub queues and heartbeat timings
    #[serde(default)]
    pub hub: HubConfig,

    /// Background task scheduling
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `UNLIMITED_CORP` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `UNLIMITED_CORP__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `UNLIMITED_CORP__HUB__SEND_QUEUE_CAPACITY=512` -> `hub.send_queue_capacity = 512`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("UNLIMITED_CORP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.event_bus.validate()?;
        self.hub.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }
}
