//! In-room command grammar.
//!
//! Commands are written as `<prefix><command> <args>`. The prefix is stripped
//! by the caller; everything after it is parsed into a [`BotCommand`].
//!
//! Arguments are whitespace separated words. A word may be wrapped in double
//! quotes to include spaces (`\"` and `\\` escape inside quotes). The final
//! free-text argument of `ban`, `vars set`, `say room` and
//! `room <id> params <mode> set` takes the rest of the line verbatim.

mod parse;

pub use parse::command_words;

use std::str::FromStr;

use crate::error::CommandParseError;
use crate::id::{MemberId, RoomId};
use crate::mode::RoomMode;

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// `version`
    Version,
    /// `help`
    Help,
    /// `admin grant|revoke|list`
    Admin(AdminAction),
    /// `ban <member> [reason...]`
    Ban {
        /// Member to ban.
        member: MemberId,
        /// Reason, empty when omitted.
        reason: String,
    },
    /// `unban <member>`
    Unban {
        /// Member to unban.
        member: MemberId,
    },
    /// `room ...`
    Room(RoomAction),
    /// `vars ...`
    Vars(VarsAction),
    /// `say room <room> <text...>`
    Say {
        /// Destination room.
        room: RoomId,
        /// Text to post.
        text: String,
    },
    /// `login|host|password get|set`
    Setting {
        /// Which connection setting.
        setting: Setting,
        /// Read or write.
        action: SettingAction,
    },
    /// `reboot`
    Reboot,
}

/// Subcommands of `admin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    /// Grant admin rights.
    Grant(MemberId),
    /// Revoke admin rights.
    Revoke(MemberId),
    /// List admins.
    List,
}

/// Subcommands of `room`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomAction {
    /// `room add <id>`
    Add(RoomId),
    /// `room del <id>`
    Del(RoomId),
    /// `room list`
    List,
    /// `room <id> mode add <mode>`
    ModeAdd {
        /// Target room.
        room: RoomId,
        /// Mode to enable.
        mode: RoomMode,
    },
    /// `room <id> mode del <mode>`
    ModeDel {
        /// Target room.
        room: RoomId,
        /// Mode to disable.
        mode: RoomMode,
    },
    /// `room <id> mode list`
    ModeList {
        /// Target room.
        room: RoomId,
    },
    /// `room <id> params <mode> set <value...>`
    ParamSet {
        /// Target room.
        room: RoomId,
        /// Mode the parameter belongs to.
        mode: RoomMode,
        /// New value.
        value: String,
    },
}

impl RoomAction {
    /// The room the action targets, if any.
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            RoomAction::Add(room) | RoomAction::Del(room) => Some(room),
            RoomAction::ModeAdd { room, .. }
            | RoomAction::ModeDel { room, .. }
            | RoomAction::ModeList { room }
            | RoomAction::ParamSet { room, .. } => Some(room),
            RoomAction::List => None,
        }
    }
}

/// Subcommands of `vars`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarsAction {
    /// `vars set <name> <payload...>`
    Set {
        /// Variable name.
        name: String,
        /// Variable payload.
        payload: String,
    },
    /// `vars get <name>`
    Get(String),
    /// `vars del <name>`
    Del(String),
    /// `vars list`
    List,
}

/// Connection settings adjustable from chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    /// Login name.
    Login,
    /// Homeserver URL.
    Host,
    /// Account password.
    Password,
}

impl Setting {
    /// Command word for the setting.
    pub fn as_str(&self) -> &'static str {
        match self {
            Setting::Login => "login",
            Setting::Host => "host",
            Setting::Password => "password",
        }
    }
}

/// Read or write a [`Setting`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingAction {
    /// Reply with the current value.
    Get,
    /// Replace the value.
    Set(String),
}

impl BotCommand {
    /// Name of the top-level command word, used as the handler key.
    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::Version => "version",
            BotCommand::Help => "help",
            BotCommand::Admin(_) => "admin",
            BotCommand::Ban { .. } => "ban",
            BotCommand::Unban { .. } => "unban",
            BotCommand::Room(_) => "room",
            BotCommand::Vars(_) => "vars",
            BotCommand::Say { .. } => "say",
            BotCommand::Setting { setting, .. } => setting.as_str(),
            BotCommand::Reboot => "reboot",
        }
    }
}

impl FromStr for BotCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse_command(s)
    }
}
