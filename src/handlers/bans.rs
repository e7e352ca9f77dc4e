//! Ban handlers: `ban <member> [reason]` and `unban <member>`.
//!
//! The originating room is handled directly when the bot has ban power
//! there; every other eligible room is reached through propagation. One
//! reply is posted per room actually changed.

use super::{Context, Handler, misrouted};
use crate::error::HandlerResult;
use crate::services::banlist;
use async_trait::async_trait;
use tracing::info;
use warden_proto::{BotCommand, MemberId, RoomId};

/// True when the bot can ban in the command's room.
fn can_ban_here(ctx: &Context<'_>) -> bool {
    ctx.bot
        .rooms
        .snapshot(ctx.room)
        .is_some_and(|record| record.can_ban())
}

async fn report(ctx: &Context<'_>, verb: &str, member: &MemberId, rooms: &[RoomId]) -> HandlerResult {
    let names = ctx.bot.display_names(rooms).await;
    for room in rooms {
        let name = names.get(room).map(String::as_str).unwrap_or(room.as_str());
        ctx.reply(&format!("{verb} {member} in {name}")).await?;
    }
    Ok(())
}

pub struct BanHandler;

#[async_trait]
impl Handler for BanHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        let (member, reason) = match command {
            BotCommand::Ban { member, reason } => (member, reason),
            other => return Err(misrouted(&other)),
        };

        let mut banned = Vec::new();
        if can_ban_here(ctx) && !ctx.bot.rooms.is_banned(ctx.room, &member) {
            ctx.bot.ban_member(ctx.room, &member, &reason).await?;
            banned.push(ctx.room.clone());
        }
        banned.extend(banlist::propagate_ban(ctx.bot, ctx.room, &member, &reason).await);
        info!(member = %member, by = %ctx.sender, rooms = banned.len(), "Ban command");

        if banned.is_empty() {
            return ctx.reply(&format!("{member} was not banned anywhere new")).await;
        }
        report(ctx, "Banned", &member, &banned).await
    }
}

pub struct UnbanHandler;

#[async_trait]
impl Handler for UnbanHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        let member = match command {
            BotCommand::Unban { member } => member,
            other => return Err(misrouted(&other)),
        };

        let mut unbanned = Vec::new();
        if can_ban_here(ctx) && ctx.bot.rooms.is_banned(ctx.room, &member) {
            ctx.bot.unban_member(ctx.room, &member).await?;
            unbanned.push(ctx.room.clone());
        }
        unbanned.extend(banlist::propagate_unban(ctx.bot, ctx.room, &member).await);
        info!(member = %member, by = %ctx.sender, rooms = unbanned.len(), "Unban command");

        if unbanned.is_empty() {
            return ctx.reply(&format!("{member} was not banned in any room I moderate")).await;
        }
        report(ctx, "Unbanned", &member, &unbanned).await
    }
}
