//! Integration test common infrastructure.
//!
//! Provides an in-process fake homeserver and a helper that starts the bot
//! against it over real HTTP.

pub mod bot;
pub mod homeserver;

#[allow(unused_imports)]
pub use bot::{TestBot, config_toml, eventually};
#[allow(unused_imports)]
pub use homeserver::{FakeHomeserver, now_ms};
