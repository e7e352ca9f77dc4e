//! Unified error handling for roomwarden.
//!
//! Room actions and command handlers each get their own error enum, with a
//! static code per variant for metric labels.

use thiserror::Error;
use warden_proto::RoomId;

use crate::config::ConfigError;

// ============================================================================
// Action Errors (homeserver calls)
// ============================================================================

/// Errors returned by the homeserver collaborators.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("homeserver rejected request ({status} {errcode}): {message}")]
    Api {
        status: u16,
        errcode: String,
        message: String,
    },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid homeserver url: {0}")]
    InvalidUrl(String),

    #[error("no credentials configured")]
    NoCredentials,

    #[error("failed to persist session: {0}")]
    Persist(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

impl ActionError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Api { .. } => "api",
            Self::Decode(_) => "decode",
            Self::InvalidUrl(_) => "invalid_url",
            Self::NoCredentials => "no_credentials",
            Self::Persist(_) => "persist",
            Self::Other(_) => "other",
        }
    }

    /// True when the homeserver answered with `M_FORBIDDEN`.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Api { errcode, .. } if errcode == "M_FORBIDDEN")
    }
}

/// Result type for room actions.
pub type ActionResult<T> = Result<T, ActionError>;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur while executing a parsed command.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Action(#[from] ActionError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("room {0} is not monitored")]
    RoomNotMonitored(RoomId),

    #[error("no variable named '{0}'")]
    NoSuchVar(String),

    #[error("no handler for command: {0}")]
    UnknownCommand(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Action(e) => e.error_code(),
            Self::Config(_) => "config",
            Self::RoomNotMonitored(_) => "room_not_monitored",
            Self::NoSuchVar(_) => "no_such_var",
            Self::UnknownCommand(_) => "unknown_command",
        }
    }

    /// Text echoed back into the room for this error.
    ///
    /// Returns `None` for failures that are only logged.
    pub fn to_reply(&self) -> Option<String> {
        match self {
            Self::RoomNotMonitored(_) | Self::NoSuchVar(_) => Some(self.to_string()),
            Self::Action(ActionError::Api { errcode, message, .. }) => {
                Some(format!("homeserver refused: {errcode} {message}"))
            }
            Self::Action(_) | Self::Config(_) | Self::UnknownCommand(_) => None,
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
