//! Operator handlers: `reboot`.

use super::{Context, Handler, misrouted};
use crate::error::HandlerResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use warden_proto::BotCommand;

/// Handler for `reboot`.
///
/// Replies, then requests process shutdown after `reboot_delay_secs`. The
/// supervisor (systemd, container runtime) is expected to restart the bot.
pub struct RebootHandler;

#[async_trait]
impl Handler for RebootHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        if !matches!(command, BotCommand::Reboot) {
            return Err(misrouted(&command));
        }
        let delay = ctx.bot.config.read(|c| c.bot.reboot_delay_secs);
        info!(by = %ctx.sender, delay_secs = delay, "Reboot requested");
        ctx.reply(&format!("Rebooting in {delay} seconds")).await?;

        let bot = Arc::clone(ctx.bot);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay)).await;
            bot.request_shutdown();
        });
        Ok(())
    }
}
