//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;
use warden_proto::{MemberId, RoomId};

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("homeserver.url is required")]
    MissingHomeserverUrl,
    #[error("homeserver.url must start with http:// or https://, got '{0}'")]
    InvalidHomeserverUrl(String),
    #[error("homeserver.login and homeserver.password are required when no access_token is stored")]
    MissingCredentials,
    #[error("bot.prefix must not be empty")]
    EmptyPrefix,
    #[error("invalid room id in [rooms]: '{0}'")]
    InvalidRoomId(String),
    #[error("invalid member id in admins: '{0}'")]
    InvalidAdminId(String),
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
    #[error("bot.help_file does not exist: {0}")]
    HelpFileNotFound(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Homeserver
    let url = &config.homeserver.url;
    if url.is_empty() {
        errors.push(ValidationError::MissingHomeserverUrl);
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ValidationError::InvalidHomeserverUrl(url.clone()));
    }
    let has_token = config
        .homeserver
        .access_token
        .as_deref()
        .is_some_and(|t| !t.is_empty());
    if !has_token && (config.homeserver.login.is_empty() || config.homeserver.password.is_empty()) {
        errors.push(ValidationError::MissingCredentials);
    }

    if config.bot.prefix.is_empty() {
        errors.push(ValidationError::EmptyPrefix);
    }

    // Identifiers
    for room in config.rooms.keys() {
        if RoomId::parse(room.as_str()).is_err() {
            errors.push(ValidationError::InvalidRoomId(room.to_string()));
        }
    }
    for admin in &config.admins {
        if MemberId::parse(admin.as_str()).is_err() {
            errors.push(ValidationError::InvalidAdminId(admin.to_string()));
        }
    }

    // Intervals and rates
    let positive: [(&'static str, u64); 6] = [
        ("bot.sync_timeout_ms", config.bot.sync_timeout_ms),
        ("bot.heartbeat_secs", config.bot.heartbeat_secs),
        ("welcome.lifetime_secs", config.welcome.lifetime_secs),
        ("welcome.sweep_secs", config.welcome.sweep_secs),
        ("actions.actions_per_second", u64::from(config.actions.actions_per_second)),
        ("actions.burst", u64::from(config.actions.burst)),
    ];
    for (name, value) in positive {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(name));
        }
    }

    if let Some(ref help) = config.bot.help_file
        && !Path::new(help).exists()
    {
        errors.push(ValidationError::HelpFileNotFound(help.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
