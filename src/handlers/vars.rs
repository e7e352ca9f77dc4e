//! Text variables: `vars set|get|del|list`.
//!
//! Variables hold reusable text, e.g. welcome messages referenced by a
//! room's WELCOME parameter.

use super::{Context, Handler, misrouted};
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use warden_proto::{BotCommand, VarsAction};

pub struct VarsHandler;

#[async_trait]
impl Handler for VarsHandler {
    async fn handle(&self, ctx: &Context<'_>, command: BotCommand) -> HandlerResult {
        let action = match command {
            BotCommand::Vars(action) => action,
            other => return Err(misrouted(&other)),
        };
        let config = &ctx.bot.config;

        match action {
            VarsAction::Set { name, payload } => {
                config.set_var(&name, &payload)?;
                ctx.reply(&format!("Variable '{name}' set")).await
            }
            VarsAction::Get(name) => {
                let payload = config.var(&name).ok_or(HandlerError::NoSuchVar(name))?;
                ctx.reply(&payload).await
            }
            VarsAction::Del(name) => match config.delete_var(&name)? {
                Some(_) => ctx.reply(&format!("Variable '{name}' deleted")).await,
                None => Err(HandlerError::NoSuchVar(name)),
            },
            VarsAction::List => {
                let vars = config.vars();
                if vars.is_empty() {
                    return ctx.reply("No variables set").await;
                }
                let names: Vec<&str> = vars.keys().map(String::as_str).collect();
                ctx.reply(&format!("Variables: {}", names.join(", "))).await
            }
        }
    }
}
