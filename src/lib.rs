//! roomwarden - Matrix room moderation bot.
//!
//! Watches a set of monitored rooms through the homeserver sync feed, keeps
//! per-room membership and ban bookkeeping, replicates bans between rooms
//! that share a ban list, greets newcomers in private welcome rooms and
//! takes admin commands from chat.

pub mod bot;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod services;
pub mod state;
pub mod sync;
pub mod telemetry;
