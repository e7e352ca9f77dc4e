//! Per-command execution context.

use std::sync::Arc;
use warden_proto::{MemberId, RoomId};

use crate::bot::Bot;
use crate::error::HandlerResult;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Shared bot state.
    pub bot: &'a Arc<Bot>,
    /// Room the command was issued in; replies go here.
    pub room: &'a RoomId,
    /// Admin who issued the command.
    pub sender: &'a MemberId,
}

impl<'a> Context<'a> {
    pub fn new(bot: &'a Arc<Bot>, room: &'a RoomId, sender: &'a MemberId) -> Self {
        Self { bot, room, sender }
    }

    /// Reply with plain text in the originating room.
    pub async fn reply(&self, text: &str) -> HandlerResult {
        self.bot.post(self.room, text).await?;
        Ok(())
    }

    /// Reply with Markdown in the originating room.
    pub async fn reply_markdown(&self, markdown: &str) -> HandlerResult {
        self.bot.post_markdown(self.room, markdown).await?;
        Ok(())
    }

    /// Require `room` to be monitored.
    pub fn require_monitored(&self, room: &RoomId) -> HandlerResult {
        if self.bot.config.is_monitored(room) {
            Ok(())
        } else {
            Err(crate::error::HandlerError::RoomNotMonitored(room.clone()))
        }
    }
}
