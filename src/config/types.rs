//! Core configuration types and loading.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use warden_proto::{MemberId, RoomId, RoomMode};

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("room {0} is not configured")]
    UnknownRoom(RoomId),
}

/// Bot configuration, persisted as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Members allowed to issue commands.
    #[serde(default)]
    pub admins: BTreeSet<MemberId>,
    /// Homeserver connection and session.
    pub homeserver: HomeserverConfig,
    /// Bot behaviour.
    #[serde(default)]
    pub bot: BotConfig,
    /// Outbound action policy (rate limit, dry run).
    #[serde(default)]
    pub actions: ActionsConfig,
    /// Welcome room settings.
    #[serde(default)]
    pub welcome: WelcomeConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Named text snippets usable as welcome messages.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// Monitored rooms keyed by room id.
    #[serde(default)]
    pub rooms: BTreeMap<RoomId, RoomConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// A configuration with defaults for everything except the homeserver.
    pub fn new(homeserver: HomeserverConfig) -> Self {
        Self {
            admins: BTreeSet::new(),
            homeserver,
            bot: BotConfig::default(),
            actions: ActionsConfig::default(),
            welcome: WelcomeConfig::default(),
            logging: LoggingConfig::default(),
            vars: BTreeMap::new(),
            rooms: BTreeMap::new(),
        }
    }
}

/// Homeserver connection settings.
///
/// `access_token`, `device_id` and `user_id` are written back after a
/// successful password login so restarts reuse the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeserverConfig {
    /// Base URL, e.g. `https://matrix.example.org`.
    pub url: String,
    /// Login name (localpart or full member id).
    #[serde(default)]
    pub login: String,
    /// Account password.
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<MemberId>,
}

impl HomeserverConfig {
    /// Forget the stored session, forcing a fresh login.
    pub fn clear_session(&mut self) {
        self.access_token = None;
        self.device_id = None;
        self.user_id = None;
    }
}

/// Bot behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Command prefix, matched exactly at the start of a message.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Only process commands: no membership handling, no reconciliation,
    /// no leaving foreign rooms.
    #[serde(default = "default_false")]
    pub passive: bool,
    /// Markdown file posted by `help`; a built-in text is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_file: Option<String>,
    #[serde(default = "default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
    #[serde(default = "default_rejoin_delay_secs")]
    pub rejoin_delay_secs: u64,
    #[serde(default = "default_poll_retry_secs")]
    pub poll_retry_secs: u64,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    #[serde(default = "default_reboot_delay_secs")]
    pub reboot_delay_secs: u64,
    /// Prometheus metrics HTTP port (0 disables the endpoint).
    #[serde(default)]
    pub metrics_port: u16,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            passive: false,
            help_file: None,
            sync_timeout_ms: default_sync_timeout_ms(),
            rejoin_delay_secs: default_rejoin_delay_secs(),
            poll_retry_secs: default_poll_retry_secs(),
            heartbeat_secs: default_heartbeat_secs(),
            reboot_delay_secs: default_reboot_delay_secs(),
            metrics_port: 0,
        }
    }
}

/// Outbound action policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Log ban/unban calls instead of issuing them.
    #[serde(default = "default_false")]
    pub dry_run: bool,
    /// Sustained homeserver calls per second.
    #[serde(default = "default_actions_per_second")]
    pub actions_per_second: u32,
    /// Calls allowed in a burst above the sustained rate.
    #[serde(default = "default_action_burst")]
    pub burst: u32,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            actions_per_second: default_actions_per_second(),
            burst: default_action_burst(),
        }
    }
}

/// Welcome room settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeConfig {
    /// Seconds a welcome room lives before it is evicted.
    #[serde(default = "default_welcome_lifetime_secs")]
    pub lifetime_secs: u64,
    /// Seconds between eviction sweeps.
    #[serde(default = "default_welcome_sweep_secs")]
    pub sweep_secs: u64,
    /// Name given to created welcome rooms.
    #[serde(default = "default_welcome_room_name")]
    pub room_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_topic: Option<String>,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: default_welcome_lifetime_secs(),
            sweep_secs: default_welcome_sweep_secs(),
            room_name: default_welcome_room_name(),
            room_topic: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Log output settings. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

/// Per-room configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Enabled modes.
    #[serde(default)]
    pub modes: BTreeSet<RoomMode>,
    /// Mode parameters keyed by mode name (e.g. `WELCOME = "greeting"`).
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl RoomConfig {
    /// Parameter attached to `mode`, if any.
    pub fn param(&self, mode: RoomMode) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(mode.as_str()))
            .map(|(_, value)| value.as_str())
    }

    /// Parameters with their keys parsed back into modes; unknown keys are skipped.
    pub fn typed_params(&self) -> BTreeMap<RoomMode, String> {
        self.params
            .iter()
            .filter_map(|(key, value)| key.parse().ok().map(|mode| (mode, value.clone())))
            .collect()
    }
}
