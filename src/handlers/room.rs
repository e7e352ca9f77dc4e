//! Room management: `room add|del|list` and per-room modes and params.

use super::{Context, Handler, misrouted};
use crate::config::RoomConfig;
use crate::error::HandlerResult;
use async_trait::async_trait;
use tracing::{info, warn};
use warden_proto::{BotCommand, RoomAction, RoomId, RoomMode};

fn describe_modes(config: &RoomConfig) -> String {
    if config.modes.is_empty() {
        return "none".to_string();
    }
    config
        .modes
        .iter()
        .map(RoomMode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct RoomHandler;

impl RoomHandler {
    async fn add(&self, ctx: &Context<'_>, room: RoomId) -> HandlerResult {
        if ctx.bot.config.is_monitored(&room) {
            return ctx.reply(&format!("{room} is already monitored")).await;
        }
        let joined = ctx.bot.join_room(&room).await?;
        ctx.bot.config.add_room(&joined)?;
        ctx.bot.refresh_modes(&joined);
        info!(room = %joined, by = %ctx.sender, "Room added");
        ctx.reply(&format!("Now monitoring {joined}")).await
    }

    async fn del(&self, ctx: &Context<'_>, room: RoomId) -> HandlerResult {
        ctx.require_monitored(&room)?;
        ctx.bot.config.remove_room(&room)?;
        info!(room = %room, by = %ctx.sender, "Room removed");
        ctx.reply(&format!("Stopped monitoring {room}")).await?;
        if let Err(e) = ctx.bot.leave_room(&room).await {
            warn!(room = %room, error = %e, "Failed to leave removed room");
        }
        Ok(())
    }

    async fn list(&self, ctx: &Context<'_>) -> HandlerResult {
        let rooms = ctx.bot.config.monitored_rooms();
        if rooms.is_empty() {
            return ctx.reply("No rooms monitored").await;
        }
        let names = ctx.bot.display_names(&rooms).await;
        let mut lines = Vec::with_capacity(rooms.len());
        for room in &rooms {
            let config = ctx.bot.config.room(room).unwrap_or_default();
            let name = names.get(room).map(String::as_str).unwrap_or(room.as_str());
            let mut line = format!("- **{name}** `{room}`: {}", describe_modes(&config));
            for (mode, value) in &config.params {
                line.push_str(&format!(" ({mode}={value})"));
            }
            lines.push(line);
        }
        ctx.reply_markdown(&lines.join("\n")).await
    }

    async fn mode_add(&self, ctx: &Context<'_>, room: RoomId, mode: RoomMode) -> HandlerResult {
        ctx.require_monitored(&room)?;
        let added = ctx.bot.config.add_mode(&room, mode)?;
        ctx.bot.refresh_modes(&room);
        if added {
            info!(room = %room, mode = %mode, by = %ctx.sender, "Mode enabled");
            ctx.reply(&format!("{mode} enabled in {room}")).await
        } else {
            ctx.reply(&format!("{mode} was already enabled in {room}")).await
        }
    }

    async fn mode_del(&self, ctx: &Context<'_>, room: RoomId, mode: RoomMode) -> HandlerResult {
        ctx.require_monitored(&room)?;
        let removed = ctx.bot.config.remove_mode(&room, mode)?;
        ctx.bot.refresh_modes(&room);
        if removed {
            info!(room = %room, mode = %mode, by = %ctx.sender, "Mode disabled");
            ctx.reply(&format!("{mode} disabled in {room}")).await
        } else {
            ctx.reply(&format!("{mode} was not enabled in {room}")).await
        }
    }

    async fn mode_list(&self, ctx: &Context<'_>, room: RoomId) -> HandlerResult {
        ctx.require_monitored(&room)?;
        let config = ctx.bot.config.room(&room).unwrap_or_default();
        ctx.reply(&format!("Modes in {room}: {}", describe_modes(&config)))
            .await
    }

    async fn param_set(&self, ctx: &Context<'_>, room: RoomId, mode: RoomMode, value: String) -> HandlerResult {
        ctx.require_monitored(&room)?;
        ctx.bot.config.set_param(&room, mode, &value)?;
        ctx.bot.refresh_modes(&room);
        info!(room = %room, mode = %mode, by = %ctx.sender, "Mode parameter set");
        ctx.reply(&format!("{mode} parameter for {room} set")).await
    }
}

#[async_trait]
impl Handler for RoomHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        let action = match command {
            BotCommand::Room(action) => action,
            other => return Err(misrouted(&other)),
        };
        match action {
            RoomAction::Add(room) => self.add(ctx, room).await,
            RoomAction::Del(room) => self.del(ctx, room).await,
            RoomAction::List => self.list(ctx).await,
            RoomAction::ModeAdd { room, mode } => self.mode_add(ctx, room, mode).await,
            RoomAction::ModeDel { room, mode } => self.mode_del(ctx, room, mode).await,
            RoomAction::ModeList { room } => self.mode_list(ctx, room).await,
            RoomAction::ParamSet { room, mode, value } => self.param_set(ctx, room, mode, value).await,
        }
    }
}
