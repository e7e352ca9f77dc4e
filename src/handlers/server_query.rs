//! Query handlers: version, help

use super::{Context, Handler, misrouted};
use crate::error::HandlerResult;
use async_trait::async_trait;
use tracing::warn;
use warden_proto::BotCommand;

/// Bot version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Help posted when no `help_file` is configured. `{p}` is the prefix.
const BUILTIN_HELP: &str = "\
**roomwarden commands**

| Command | Effect |
|---|---|
| `{p}version` | Show the running version |
| `{p}help` | Show this text |
| `{p}admin grant\\|revoke <member>` | Change the admin list |
| `{p}admin list` | List admins |
| `{p}ban <member> [reason]` | Ban here and in every ban-sync room |
| `{p}unban <member>` | Unban here and in every ban-sync room |
| `{p}room add\\|del <room>` | Start or stop monitoring a room |
| `{p}room list` | List monitored rooms |
| `{p}room <room> mode add\\|del\\|list [mode]` | Change room modes |
| `{p}room <room> params <mode> set <value>` | Set a mode parameter |
| `{p}vars set <name> <payload>` | Store a text variable |
| `{p}vars get\\|del <name>`, `{p}vars list` | Read or remove variables |
| `{p}say room <room> <text>` | Post text in another room |
| `{p}login\\|host get\\|set [value]` | Connection settings |
| `{p}password set <value>` | Change the account password |
| `{p}reboot` | Restart the bot |

Modes: `TEST`, `SELF_ADMINISTRATOR`, `SELF_MODERATOR`, `ADMINISTRATION`, `WELCOME`, `BANLIST_SYNC`.
";

/// Handler for `version`.
///
/// Replies with `v<version>`.
pub struct VersionHandler;

#[async_trait]
impl Handler for VersionHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        if !matches!(command, BotCommand::Version) {
            return Err(misrouted(&command));
        }
        ctx.reply(&format!("v{VERSION}")).await
    }
}

/// Handler for `help`.
///
/// Posts the configured help file as Markdown, or the built-in table.
pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        if !matches!(command, BotCommand::Help) {
            return Err(misrouted(&command));
        }
        let help_file = ctx.bot.config.read(|c| c.bot.help_file.clone());
        let text = match help_file {
            Some(path) => match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to read help file, using built-in help");
                    builtin_help(&ctx.bot.config.prefix())
                }
            },
            None => builtin_help(&ctx.bot.config.prefix()),
        };
        ctx.reply_markdown(&text).await
    }
}

fn builtin_help(prefix: &str) -> String {
    BUILTIN_HELP.replace("{p}", prefix)
}
