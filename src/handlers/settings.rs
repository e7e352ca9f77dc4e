//! Connection settings: `login|host get|set`, `password set`.
//!
//! Changes are persisted and clear the stored session; they take effect on
//! the next start.

use super::{Context, Handler, misrouted};
use crate::error::HandlerResult;
use async_trait::async_trait;
use tracing::info;
use warden_proto::{BotCommand, Setting, SettingAction};

const MASK: &str = "********";

pub struct SettingHandler;

#[async_trait]
impl Handler for SettingHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        let (setting, action) = match command {
            BotCommand::Setting { setting, action } => (setting, action),
            other => return Err(misrouted(&other)),
        };
        let name = setting.as_str();

        match action {
            SettingAction::Get => {
                let value = ctx.bot.config.setting(setting);
                let shown = match setting {
                    Setting::Password if !value.is_empty() => MASK,
                    _ if value.is_empty() => "(unset)",
                    _ => value.as_str(),
                };
                ctx.reply(&format!("{name}: {shown}")).await
            }
            SettingAction::Set(value) => {
                ctx.bot.config.set_setting(setting, &value)?;
                info!(setting = name, by = %ctx.sender, "Connection setting changed");
                ctx.reply(&format!("{name} updated, takes effect after reboot"))
                    .await
            }
        }
    }
}
