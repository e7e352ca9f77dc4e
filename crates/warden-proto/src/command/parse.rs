//! Command parser.

use super::{AdminAction, BotCommand, RoomAction, Setting, SettingAction, VarsAction};
use crate::error::CommandParseError;
use crate::id::{MemberId, RoomId};
use crate::mode::RoomMode;

const COMMANDS: &str = "version, help, admin, ban, unban, room, vars, say, login, host, password, reboot";
const ADMIN_SUBS: &str = "one of grant, revoke, list";
const ROOM_SUBS: &str = "one of add, del, list or a room id";
const ROOM_ID_SUBS: &str = "one of mode, params";
const MODE_SUBS: &str = "one of add, del, list";
const VARS_SUBS: &str = "one of set, get, del, list";
const SETTING_SUBS: &str = "one of get, set";

/// Cursor over the command text.
struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.input.len()
    }

    /// Next word, honouring double quotes. Returns its start offset.
    fn word(&mut self) -> Result<Option<(usize, String)>, CommandParseError> {
        if self.at_end() {
            return Ok(None);
        }
        let start = self.pos;
        let rest = &self.input[start..];

        if let Some(quoted) = rest.strip_prefix('"') {
            let mut out = String::new();
            let mut escaped = false;
            for (i, c) in quoted.char_indices() {
                if escaped {
                    out.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    self.pos = start + 1 + i + 1;
                    return Ok(Some((start, out)));
                } else {
                    out.push(c);
                }
            }
            return Err(CommandParseError::UnterminatedQuote(start));
        }

        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos = start + len;
        Ok(Some((start, rest[..len].to_string())))
    }

    fn expect_word(
        &mut self,
        command: &'static str,
        expected: &'static str,
    ) -> Result<(usize, String), CommandParseError> {
        self.word()?
            .ok_or(CommandParseError::Incomplete { command, expected })
    }

    /// Remainder of the line, trimmed. `None` when nothing is left.
    fn rest(&mut self) -> Option<(usize, &'a str)> {
        if self.at_end() {
            return None;
        }
        let start = self.pos;
        self.pos = self.input.len();
        Some((start, self.input[start..].trim_end()))
    }

    fn expect_rest(
        &mut self,
        command: &'static str,
        expected: &'static str,
    ) -> Result<String, CommandParseError> {
        self.rest()
            .map(|(_, text)| text.to_string())
            .ok_or(CommandParseError::Incomplete { command, expected })
    }

    fn finish(&mut self) -> Result<(), CommandParseError> {
        match self.rest() {
            None => Ok(()),
            Some((position, input)) => Err(CommandParseError::TrailingInput {
                input: input.to_string(),
                position,
            }),
        }
    }

    fn member(&mut self, command: &'static str) -> Result<MemberId, CommandParseError> {
        let (position, raw) = self.expect_word(command, "a member id")?;
        MemberId::parse(&raw).map_err(|source| CommandParseError::InvalidId { position, source })
    }

    fn room(&mut self, command: &'static str) -> Result<RoomId, CommandParseError> {
        let (position, raw) = self.expect_word(command, "a room id")?;
        RoomId::parse(&raw).map_err(|source| CommandParseError::InvalidId { position, source })
    }

    fn mode(&mut self, command: &'static str) -> Result<RoomMode, CommandParseError> {
        let (position, raw) = self.expect_word(command, "a room mode")?;
        raw.parse()
            .map_err(|source| CommandParseError::InvalidRoomMode { position, source })
    }
}

pub(super) fn parse_command(input: &str) -> Result<BotCommand, CommandParseError> {
    let mut reader = Reader::new(input);
    let Some((_, word)) = reader.word()? else {
        return Err(CommandParseError::Empty);
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "version" => BotCommand::Version,
        "help" => BotCommand::Help,
        "reboot" => BotCommand::Reboot,
        "admin" => BotCommand::Admin(parse_admin(&mut reader)?),
        "ban" => {
            let member = reader.member("ban")?;
            let reason = reader
                .rest()
                .map(|(_, text)| text.to_string())
                .unwrap_or_default();
            BotCommand::Ban { member, reason }
        }
        "unban" => BotCommand::Unban {
            member: reader.member("unban")?,
        },
        "room" => BotCommand::Room(parse_room(&mut reader)?),
        "vars" => BotCommand::Vars(parse_vars(&mut reader)?),
        "say" => parse_say(&mut reader)?,
        "login" => parse_setting(&mut reader, Setting::Login)?,
        "host" => parse_setting(&mut reader, Setting::Host)?,
        "password" => parse_setting(&mut reader, Setting::Password)?,
        _ => return Err(CommandParseError::UnknownCommand(word)),
    };

    reader.finish()?;
    Ok(command)
}

/// Top-level command words, for help and error text.
pub fn command_words() -> &'static str {
    COMMANDS
}

fn parse_admin(reader: &mut Reader<'_>) -> Result<AdminAction, CommandParseError> {
    let (_, sub) = reader.expect_word("admin", ADMIN_SUBS)?;
    match sub.to_ascii_lowercase().as_str() {
        "grant" => Ok(AdminAction::Grant(reader.member("admin grant")?)),
        "revoke" => Ok(AdminAction::Revoke(reader.member("admin revoke")?)),
        "list" => Ok(AdminAction::List),
        _ => Err(CommandParseError::InvalidSubcommand {
            command: "admin",
            sub,
            expected: ADMIN_SUBS,
        }),
    }
}

fn parse_room(reader: &mut Reader<'_>) -> Result<RoomAction, CommandParseError> {
    let (position, sub) = reader.expect_word("room", ROOM_SUBS)?;
    match sub.to_ascii_lowercase().as_str() {
        "add" => return Ok(RoomAction::Add(reader.room("room add")?)),
        "del" => return Ok(RoomAction::Del(reader.room("room del")?)),
        "list" => return Ok(RoomAction::List),
        _ => {}
    }

    if !sub.starts_with(['!', '#']) {
        return Err(CommandParseError::InvalidSubcommand {
            command: "room",
            sub,
            expected: ROOM_SUBS,
        });
    }
    let room =
        RoomId::parse(&sub).map_err(|source| CommandParseError::InvalidId { position, source })?;

    let (_, sub) = reader.expect_word("room <id>", ROOM_ID_SUBS)?;
    match sub.to_ascii_lowercase().as_str() {
        "mode" => {
            let (_, op) = reader.expect_word("room <id> mode", MODE_SUBS)?;
            match op.to_ascii_lowercase().as_str() {
                "add" => Ok(RoomAction::ModeAdd {
                    mode: reader.mode("room <id> mode add")?,
                    room,
                }),
                "del" => Ok(RoomAction::ModeDel {
                    mode: reader.mode("room <id> mode del")?,
                    room,
                }),
                "list" => Ok(RoomAction::ModeList { room }),
                _ => Err(CommandParseError::InvalidSubcommand {
                    command: "room <id> mode",
                    sub: op,
                    expected: MODE_SUBS,
                }),
            }
        }
        "params" => {
            let mode = reader.mode("room <id> params")?;
            let (_, op) = reader.expect_word("room <id> params <mode>", "set")?;
            if !op.eq_ignore_ascii_case("set") {
                return Err(CommandParseError::InvalidSubcommand {
                    command: "room <id> params <mode>",
                    sub: op,
                    expected: "set",
                });
            }
            let value = reader.expect_rest("room <id> params <mode> set", "a value")?;
            Ok(RoomAction::ParamSet { room, mode, value })
        }
        _ => Err(CommandParseError::InvalidSubcommand {
            command: "room <id>",
            sub,
            expected: ROOM_ID_SUBS,
        }),
    }
}

fn parse_vars(reader: &mut Reader<'_>) -> Result<VarsAction, CommandParseError> {
    let (_, sub) = reader.expect_word("vars", VARS_SUBS)?;
    match sub.to_ascii_lowercase().as_str() {
        "set" => {
            let (_, name) = reader.expect_word("vars set", "a variable name")?;
            let payload = reader.expect_rest("vars set <name>", "a payload")?;
            Ok(VarsAction::Set { name, payload })
        }
        "get" => Ok(VarsAction::Get(
            reader.expect_word("vars get", "a variable name")?.1,
        )),
        "del" => Ok(VarsAction::Del(
            reader.expect_word("vars del", "a variable name")?.1,
        )),
        "list" => Ok(VarsAction::List),
        _ => Err(CommandParseError::InvalidSubcommand {
            command: "vars",
            sub,
            expected: VARS_SUBS,
        }),
    }
}

fn parse_say(reader: &mut Reader<'_>) -> Result<BotCommand, CommandParseError> {
    let (_, sub) = reader.expect_word("say", "room")?;
    if !sub.eq_ignore_ascii_case("room") {
        return Err(CommandParseError::InvalidSubcommand {
            command: "say",
            sub,
            expected: "room",
        });
    }
    let room = reader.room("say room")?;
    let text = reader.expect_rest("say room <id>", "message text")?;
    Ok(BotCommand::Say { room, text })
}

fn parse_setting(reader: &mut Reader<'_>, setting: Setting) -> Result<BotCommand, CommandParseError> {
    let command = setting.as_str();
    let (_, sub) = reader.expect_word(command, SETTING_SUBS)?;
    let action = match sub.to_ascii_lowercase().as_str() {
        "get" => SettingAction::Get,
        "set" => SettingAction::Set(reader.expect_rest(command, "a value")?),
        _ => {
            return Err(CommandParseError::InvalidSubcommand {
                command,
                sub,
                expected: SETTING_SUBS,
            })
        }
    };
    Ok(BotCommand::Setting { setting, action })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<BotCommand, CommandParseError> {
        input.parse()
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("version").unwrap(), BotCommand::Version);
        assert_eq!(parse("  HELP  ").unwrap(), BotCommand::Help);
        assert_eq!(parse("reboot").unwrap(), BotCommand::Reboot);
        assert_eq!(parse("").unwrap_err(), CommandParseError::Empty);
        assert_eq!(
            parse("frobnicate").unwrap_err(),
            CommandParseError::UnknownCommand("frobnicate".to_string())
        );
    }

    #[test]
    fn test_trailing_input_rejected() {
        let err = parse("version now").unwrap_err();
        assert_eq!(
            err,
            CommandParseError::TrailingInput {
                input: "now".to_string(),
                position: 8,
            }
        );
    }

    #[test]
    fn test_ban_with_reason() {
        let cmd = parse("ban @eve:example.org spam and abuse").unwrap();
        assert_eq!(
            cmd,
            BotCommand::Ban {
                member: MemberId::new("@eve:example.org"),
                reason: "spam and abuse".to_string(),
            }
        );
        assert_eq!(cmd.name(), "ban");
    }

    #[test]
    fn test_ban_without_reason() {
        let cmd = parse("ban @eve:example.org").unwrap();
        assert_eq!(
            cmd,
            BotCommand::Ban {
                member: MemberId::new("@eve:example.org"),
                reason: String::new(),
            }
        );
    }

    #[test]
    fn test_ban_invalid_member() {
        let err = parse("ban eve spam").unwrap_err();
        match err {
            CommandParseError::InvalidId { position, source } => {
                assert_eq!(position, 4);
                assert_eq!(source.kind, "member");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            parse("unban").unwrap_err(),
            CommandParseError::Incomplete { command: "unban", .. }
        ));
    }

    #[test]
    fn test_admin() {
        assert_eq!(
            parse("admin grant @a:x").unwrap(),
            BotCommand::Admin(AdminAction::Grant(MemberId::new("@a:x")))
        );
        assert_eq!(
            parse("admin revoke @a:x").unwrap(),
            BotCommand::Admin(AdminAction::Revoke(MemberId::new("@a:x")))
        );
        assert_eq!(parse("admin list").unwrap(), BotCommand::Admin(AdminAction::List));
        assert!(matches!(
            parse("admin promote @a:x").unwrap_err(),
            CommandParseError::InvalidSubcommand { command: "admin", .. }
        ));
    }

    #[test]
    fn test_room_management() {
        assert_eq!(
            parse("room add !r:x").unwrap(),
            BotCommand::Room(RoomAction::Add(RoomId::new("!r:x")))
        );
        assert_eq!(
            parse("room add #lobby:x").unwrap(),
            BotCommand::Room(RoomAction::Add(RoomId::new("#lobby:x")))
        );
        assert_eq!(
            parse("room del !r:x").unwrap(),
            BotCommand::Room(RoomAction::Del(RoomId::new("!r:x")))
        );
        assert_eq!(parse("room list").unwrap(), BotCommand::Room(RoomAction::List));
    }

    #[test]
    fn test_room_modes() {
        assert_eq!(
            parse("room !r:x mode add banlist_sync").unwrap(),
            BotCommand::Room(RoomAction::ModeAdd {
                room: RoomId::new("!r:x"),
                mode: RoomMode::BanlistSync,
            })
        );
        assert_eq!(
            parse("room !r:x mode del WELCOME").unwrap(),
            BotCommand::Room(RoomAction::ModeDel {
                room: RoomId::new("!r:x"),
                mode: RoomMode::Welcome,
            })
        );
        assert_eq!(
            parse("room !r:x mode list").unwrap(),
            BotCommand::Room(RoomAction::ModeList {
                room: RoomId::new("!r:x")
            })
        );
        let err = parse("room !r:x mode add SUPERUSER").unwrap_err();
        assert!(matches!(err, CommandParseError::InvalidRoomMode { position: 19, .. }));
    }

    #[test]
    fn test_room_params() {
        assert_eq!(
            parse("room !r:x params welcome set Hello {member}, welcome to {room}!").unwrap(),
            BotCommand::Room(RoomAction::ParamSet {
                room: RoomId::new("!r:x"),
                mode: RoomMode::Welcome,
                value: "Hello {member}, welcome to {room}!".to_string(),
            })
        );
        assert!(matches!(
            parse("room !r:x params welcome set").unwrap_err(),
            CommandParseError::Incomplete { .. }
        ));
        assert!(matches!(
            parse("room !r:x params welcome get").unwrap_err(),
            CommandParseError::InvalidSubcommand { .. }
        ));
    }

    #[test]
    fn test_room_invalid_subcommand() {
        assert!(matches!(
            parse("room purge").unwrap_err(),
            CommandParseError::InvalidSubcommand { command: "room", .. }
        ));
        assert!(matches!(
            parse("room !nocolon mode list").unwrap_err(),
            CommandParseError::InvalidId { position: 5, .. }
        ));
    }

    #[test]
    fn test_vars() {
        assert_eq!(
            parse("vars set greeting Hi there").unwrap(),
            BotCommand::Vars(VarsAction::Set {
                name: "greeting".to_string(),
                payload: "Hi there".to_string(),
            })
        );
        assert_eq!(
            parse("vars set \"long name\" x").unwrap(),
            BotCommand::Vars(VarsAction::Set {
                name: "long name".to_string(),
                payload: "x".to_string(),
            })
        );
        assert_eq!(
            parse("vars get greeting").unwrap(),
            BotCommand::Vars(VarsAction::Get("greeting".to_string()))
        );
        assert_eq!(
            parse("vars del greeting").unwrap(),
            BotCommand::Vars(VarsAction::Del("greeting".to_string()))
        );
        assert_eq!(parse("vars list").unwrap(), BotCommand::Vars(VarsAction::List));
    }

    #[test]
    fn test_quotes() {
        assert_eq!(
            parse("vars get \"a \\\"b\\\" c\"").unwrap(),
            BotCommand::Vars(VarsAction::Get("a \"b\" c".to_string()))
        );
        assert_eq!(
            parse("vars get \"open").unwrap_err(),
            CommandParseError::UnterminatedQuote(9)
        );
    }

    #[test]
    fn test_say() {
        assert_eq!(
            parse("say room !r:x hello   world").unwrap(),
            BotCommand::Say {
                room: RoomId::new("!r:x"),
                text: "hello   world".to_string(),
            }
        );
        assert!(matches!(
            parse("say everyone hi").unwrap_err(),
            CommandParseError::InvalidSubcommand { command: "say", .. }
        ));
    }

    #[test]
    fn test_settings() {
        assert_eq!(
            parse("login get").unwrap(),
            BotCommand::Setting {
                setting: Setting::Login,
                action: SettingAction::Get,
            }
        );
        let cmd = parse("host set https://matrix.example.org").unwrap();
        assert_eq!(
            cmd,
            BotCommand::Setting {
                setting: Setting::Host,
                action: SettingAction::Set("https://matrix.example.org".to_string()),
            }
        );
        assert_eq!(cmd.name(), "host");
        assert!(matches!(
            parse("password set").unwrap_err(),
            CommandParseError::Incomplete { command: "password", .. }
        ));
    }

    #[test]
    fn test_command_words_lists_every_command() {
        for word in ["version", "ban", "room", "vars", "reboot"] {
            assert!(command_words().contains(word));
        }
    }
}
