//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, HomeserverConfig, RoomConfig, ...)
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup validation collecting every error
//! - [`store`]: the live, write-through [`ConfigStore`]

mod defaults;
mod store;
mod types;
pub mod validation;

pub use store::ConfigStore;
pub use types::{
    ActionsConfig, BotConfig, Config, ConfigError, HomeserverConfig, LogFormat, LoggingConfig,
    RoomConfig, WelcomeConfig,
};
