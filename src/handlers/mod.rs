//! Bot command handlers.
//!
//! This module contains the [`Router`] that turns chat messages into
//! commands and the [`Handler`] registry that executes them.
//!
//! A message goes through three gates before anything runs:
//! 1. it starts with the configured prefix
//! 2. the room has ADMINISTRATION and the sender is an admin
//! 3. the rest parses as a [`BotCommand`]
//!
//! Failing the first two is silent; a parse failure is echoed to the room.

mod admin;
mod bans;
mod context;
mod oper;
mod room;
mod say;
mod server_query;
mod settings;
mod vars;

pub use admin::AdminHandler;
pub use bans::{BanHandler, UnbanHandler};
pub use context::Context;
pub use oper::RebootHandler;
pub use room::RoomHandler;
pub use say::SayHandler;
pub use server_query::{HelpHandler, VersionHandler};
pub use settings::SettingHandler;
pub use vars::VarsHandler;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, warn};
use warden_proto::{BotCommand, MemberId, RoomId, RoomMode};

use crate::bot::Bot;
use crate::error::{HandlerError, HandlerResult};
use crate::telemetry::{CommandTimer, spans};

/// Trait implemented by all command handlers.
///
/// Handlers receive the parsed command by value; a handler registered under
/// one name only ever sees commands of that name.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult;
}

/// Error for a command routed to the wrong handler.
pub(crate) fn misrouted(command: &BotCommand) -> HandlerError {
    HandlerError::UnknownCommand(command.name().to_string())
}

/// Registry of command handlers keyed by command word.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Queries
        handlers.insert("version", Box::new(VersionHandler));
        handlers.insert("help", Box::new(HelpHandler));

        // Moderation
        handlers.insert("ban", Box::new(BanHandler));
        handlers.insert("unban", Box::new(UnbanHandler));
        handlers.insert("say", Box::new(SayHandler));

        // Configuration
        handlers.insert("admin", Box::new(AdminHandler));
        handlers.insert("room", Box::new(RoomHandler));
        handlers.insert("vars", Box::new(VarsHandler));
        handlers.insert("login", Box::new(SettingHandler));
        handlers.insert("host", Box::new(SettingHandler));
        handlers.insert("password", Box::new(SettingHandler));

        // Operator
        handlers.insert("reboot", Box::new(RebootHandler));

        Self { handlers }
    }

    /// Execute a parsed command.
    pub async fn dispatch(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        let name = command.name();
        let Some(handler) = self.handlers.get(name) else {
            return Err(HandlerError::UnknownCommand(name.to_string()));
        };
        let _timer = CommandTimer::new(name);
        handler.handle(ctx, command).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Did not start with the prefix.
    NotCommand,
    /// Sent by the bot itself.
    FromSelf,
    /// Room lacks ADMINISTRATION or the sender is not an admin.
    Unauthorized,
    /// Parse error, echoed to the room.
    Rejected,
    Executed,
    /// Handler returned an error.
    Failed,
}

/// Gatekeeper in front of the [`Registry`].
#[derive(Default)]
pub struct Router {
    registry: Registry,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dispatch(
        &self,
        bot: &Arc<Bot>,
        room: &RoomId,
        sender: &MemberId,
        body: &str,
    ) -> RouteOutcome {
        let prefix = bot.config.prefix();
        let Some(line) = body.strip_prefix(prefix.as_str()) else {
            return RouteOutcome::NotCommand;
        };
        if bot.is_self(sender) {
            return RouteOutcome::FromSelf;
        }
        if !bot.config.is_mode_enabled(room, RoomMode::Administration) || !bot.config.is_admin(sender) {
            debug!(room = %room, sender = %sender, "Ignoring unauthorized command");
            return RouteOutcome::Unauthorized;
        }

        let command = match line.parse::<BotCommand>() {
            Ok(command) => command,
            Err(e) => {
                debug!(room = %room, sender = %sender, error = %e, "Command rejected");
                let _ = bot.post(room, &e.to_string()).await;
                return RouteOutcome::Rejected;
            }
        };

        let name = command.name();
        let ctx = Context::new(bot, room, sender);
        let result = self
            .registry
            .dispatch(&ctx, command)
            .instrument(spans::command(name, sender.as_str(), room.as_str()))
            .await;

        match result {
            Ok(()) => RouteOutcome::Executed,
            Err(e) => {
                crate::metrics::record_command_error(name, e.error_code());
                warn!(command = name, room = %room, error = %e, "Command failed");
                if let Some(reply) = e.to_reply() {
                    let _ = ctx.reply(&reply).await;
                }
                RouteOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::bot::test_support::{SELF_ID, bot, config};
    use crate::client::fake::FakeHomeserver;

    pub const OP: &str = "@op:x";
    pub const ADMIN_ROOM: &str = "!admin:x";

    /// A bot with a joined ADMINISTRATION room plus `rooms`.
    pub async fn admin_bot(rooms: &[(&str, &[RoomMode])]) -> (Arc<Bot>, FakeHomeserver) {
        let fake = FakeHomeserver::new(SELF_ID);
        let mut all: Vec<(&str, &[RoomMode])> = vec![(ADMIN_ROOM, &[RoomMode::Administration])];
        all.extend_from_slice(rooms);
        let bot = bot(config(&all), &fake);
        for (room, _) in &all {
            bot.join_room(&RoomId::new(*room)).await.unwrap();
        }
        (bot, fake)
    }

    /// Issue `body` as the admin in the admin room.
    pub async fn run(bot: &Arc<Bot>, body: &str) -> RouteOutcome {
        bot.router
            .dispatch(bot, &RoomId::new(ADMIN_ROOM), &MemberId::new(OP), body)
            .await
    }

    /// Messages posted into the admin room.
    pub fn replies(fake: &FakeHomeserver) -> Vec<String> {
        fake.sent()
            .into_iter()
            .filter(|(room, _)| room.as_str() == ADMIN_ROOM)
            .map(|(_, text)| text)
            .collect()
    }
}
