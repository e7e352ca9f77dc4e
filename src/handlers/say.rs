//! `say room <room> <text>`: post as the bot in another room.

use super::{Context, Handler, misrouted};
use crate::error::HandlerResult;
use async_trait::async_trait;
use tracing::info;
use warden_proto::BotCommand;

pub struct SayHandler;

#[async_trait]
impl Handler for SayHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        let (room, text) = match command {
            BotCommand::Say { room, text } => (room, text),
            other => return Err(misrouted(&other)),
        };
        info!(room = %room, by = %ctx.sender, "Posting on behalf of admin");
        ctx.bot.post(&room, &text).await?;
        Ok(())
    }
}
