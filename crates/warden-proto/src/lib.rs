//! # warden-proto
//!
//! Wire types for the subset of the homeserver client-server API that the
//! roomwarden moderation bot consumes, plus the grammar of its in-room
//! commands.
//!
//! ## Features
//!
//! - Validated [`RoomId`] and [`MemberId`] newtypes
//! - Timeline [`Event`]s with typed membership and message content
//! - [`SyncBatch`], the flattened form of one `/sync` response
//! - Request/response bodies for room actions ([`request`])
//! - [`RoomMode`] flags and the [`BotCommand`] parser
//!
//! ## Parsing commands
//!
//! ```rust
//! use warden_proto::{BotCommand, MemberId};
//!
//! let cmd: BotCommand = "ban @eve:example.org spam".parse().expect("valid command");
//! assert_eq!(
//!     cmd,
//!     BotCommand::Ban {
//!         member: MemberId::new("@eve:example.org"),
//!         reason: "spam".to_string(),
//!     }
//! );
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod event;
pub mod id;
pub mod mode;
pub mod request;
pub mod sync;

pub use command::{AdminAction, BotCommand, RoomAction, Setting, SettingAction, VarsAction};
pub use error::{CommandParseError, IdError, RoomModeParseError};
pub use event::{Event, MemberContent, Membership};
pub use id::{MemberId, RoomId};
pub use mode::RoomMode;
pub use sync::{SyncBatch, SyncResponse};
