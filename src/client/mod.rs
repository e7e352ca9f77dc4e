//! Homeserver collaborators.
//!
//! The moderation core only talks to the homeserver through the traits in
//! this module:
//! - [`SyncTransport`]: incremental event feed
//! - [`RoomActions`]: join/leave/ban/unban and room queries
//! - [`Messaging`]: posting into rooms
//! - [`MarkupRenderer`]: Markdown to HTML for formatted posts
//!
//! [`http::HomeserverClient`] implements the first three over the
//! client-server API; [`ratelimit::RateLimited`] paces any [`RoomActions`].

pub mod http;
pub mod markup;
pub mod ratelimit;

use async_trait::async_trait;
use std::collections::BTreeMap;
use warden_proto::request::CreateRoomRequest;
use warden_proto::{MemberId, RoomId, SyncBatch};

use crate::error::ActionResult;

pub use http::HomeserverClient;
pub use markup::{CommonMarkRenderer, MarkupRenderer};
pub use ratelimit::RateLimited;

/// Incremental event feed.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Long-poll for events after `since`.
    ///
    /// `full_state` asks for complete room state instead of a delta; the
    /// driver sets it on the first poll only.
    async fn poll(
        &self,
        since: Option<&str>,
        timeout_ms: u64,
        full_state: bool,
    ) -> ActionResult<SyncBatch>;
}

/// Room level actions and queries.
#[async_trait]
pub trait RoomActions: Send + Sync {
    /// The member id the bot is acting as.
    async fn whoami(&self) -> ActionResult<MemberId>;

    /// Join a room (or alias) and return its canonical id.
    async fn join(&self, room: &RoomId, via: &[String]) -> ActionResult<RoomId>;

    async fn leave(&self, room: &RoomId) -> ActionResult<()>;

    async fn ban(&self, room: &RoomId, member: &MemberId, reason: &str) -> ActionResult<()>;

    async fn unban(&self, room: &RoomId, member: &MemberId) -> ActionResult<()>;

    /// Create a room and return its id.
    async fn create(&self, request: &CreateRoomRequest) -> ActionResult<RoomId>;

    /// Joined members mapped to their display names.
    async fn list_members(&self, room: &RoomId) -> ActionResult<BTreeMap<MemberId, String>>;

    /// Banned members mapped to the ban reason (empty when none was given).
    async fn banned_members(&self, room: &RoomId) -> ActionResult<BTreeMap<MemberId, String>>;

    /// Human readable room name, falling back to the id.
    async fn room_display_name(&self, room: &RoomId) -> ActionResult<String>;

    async fn joined_rooms(&self) -> ActionResult<Vec<RoomId>>;
}

/// Posting into rooms.
#[async_trait]
pub trait Messaging: Send + Sync {
    async fn send_plain(&self, room: &RoomId, text: &str) -> ActionResult<()>;

    /// Post a message with a plain fallback and a rendered HTML body.
    async fn send_formatted(&self, room: &RoomId, plain: &str, rendered: &str) -> ActionResult<()>;
}

#[cfg(test)]
pub(crate) mod fake;
