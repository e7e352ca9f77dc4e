//! Admin list management: `admin grant|revoke|list`.

use super::{Context, Handler, misrouted};
use crate::error::HandlerResult;
use async_trait::async_trait;
use tracing::info;
use warden_proto::{AdminAction, BotCommand};

pub struct AdminHandler;

#[async_trait]
impl Handler for AdminHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        let action = match command {
            BotCommand::Admin(action) => action,
            other => return Err(misrouted(&other)),
        };
        let config = &ctx.bot.config;

        match action {
            AdminAction::Grant(member) => {
                if config.grant_admin(&member)? {
                    info!(member = %member, by = %ctx.sender, "Admin granted");
                    ctx.reply(&format!("{member} is now an admin")).await
                } else {
                    ctx.reply(&format!("{member} is already an admin")).await
                }
            }
            AdminAction::Revoke(member) => {
                if config.revoke_admin(&member)? {
                    info!(member = %member, by = %ctx.sender, "Admin revoked");
                    ctx.reply(&format!("{member} is no longer an admin")).await
                } else {
                    ctx.reply(&format!("{member} is not an admin")).await
                }
            }
            AdminAction::List => {
                let admins = config.admins();
                if admins.is_empty() {
                    return ctx.reply("No admins configured").await;
                }
                let list: Vec<String> = admins.iter().map(ToString::to_string).collect();
                ctx.reply(&format!("Admins: {}", list.join(", "))).await
            }
        }
    }
}
