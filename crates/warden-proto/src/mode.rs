//! Per-room behaviour flags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RoomModeParseError;

/// A behaviour flag enabled on a monitored room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomMode {
    /// Room used for testing; no special behaviour.
    Test,
    /// The bot holds administrator power in the room.
    SelfAdministrator,
    /// The bot holds moderator power in the room.
    SelfModerator,
    /// Commands are accepted from admins in this room.
    Administration,
    /// New joiners get a private welcome room.
    Welcome,
    /// Bans in this room are shared with the other ban-sync rooms.
    BanlistSync,
}

impl RoomMode {
    /// Every mode, in declaration order.
    pub const ALL: [RoomMode; 6] = [
        RoomMode::Test,
        RoomMode::SelfAdministrator,
        RoomMode::SelfModerator,
        RoomMode::Administration,
        RoomMode::Welcome,
        RoomMode::BanlistSync,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomMode::Test => "TEST",
            RoomMode::SelfAdministrator => "SELF_ADMINISTRATOR",
            RoomMode::SelfModerator => "SELF_MODERATOR",
            RoomMode::Administration => "ADMINISTRATION",
            RoomMode::Welcome => "WELCOME",
            RoomMode::BanlistSync => "BANLIST_SYNC",
        }
    }

    /// Modes that give the bot power to ban in a room.
    pub fn grants_ban_power(&self) -> bool {
        matches!(self, RoomMode::SelfAdministrator | RoomMode::SelfModerator)
    }
}

impl fmt::Display for RoomMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomMode {
    type Err = RoomModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RoomModeParseError(s.to_string()))
    }
}
