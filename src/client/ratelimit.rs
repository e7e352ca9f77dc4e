//! Outbound pacing for room actions.
//!
//! Wraps any [`RoomActions`] with a single governor token bucket. Every call
//! waits for a permit before it reaches the homeserver, so a ban propagated
//! to many rooms is spread out instead of tripping server-side limits.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use warden_proto::request::CreateRoomRequest;
use warden_proto::{MemberId, RoomId};

use super::RoomActions;
use crate::config::ActionsConfig;
use crate::error::ActionResult;

/// A [`RoomActions`] wrapper that enforces a rate limit.
pub struct RateLimited<A> {
    inner: A,
    limiter: DefaultDirectRateLimiter,
}

impl<A: RoomActions> RateLimited<A> {
    /// Wrap `inner`, allowing `per_second` sustained calls and bursts of `burst`.
    pub fn new(inner: A, per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(rate);
        Self {
            inner,
            limiter: RateLimiter::direct(Quota::per_second(rate).allow_burst(burst)),
        }
    }

    /// Wrap `inner` using the `[actions]` settings.
    pub fn from_config(inner: A, config: &ActionsConfig) -> Self {
        Self::new(inner, config.actions_per_second, config.burst)
    }

    /// Wait for rate limiter before proceeding.
    async fn wait_for_permit(&self) {
        self.limiter.until_ready().await;
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: RoomActions> RoomActions for RateLimited<A> {
    async fn whoami(&self) -> ActionResult<MemberId> {
        self.wait_for_permit().await;
        self.inner.whoami().await
    }

    async fn join(&self, room: &RoomId, via: &[String]) -> ActionResult<RoomId> {
        self.wait_for_permit().await;
        self.inner.join(room, via).await
    }

    async fn leave(&self, room: &RoomId) -> ActionResult<()> {
        self.wait_for_permit().await;
        self.inner.leave(room).await
    }

    async fn ban(&self, room: &RoomId, member: &MemberId, reason: &str) -> ActionResult<()> {
        self.wait_for_permit().await;
        self.inner.ban(room, member, reason).await
    }

    async fn unban(&self, room: &RoomId, member: &MemberId) -> ActionResult<()> {
        self.wait_for_permit().await;
        self.inner.unban(room, member).await
    }

    async fn create(&self, request: &CreateRoomRequest) -> ActionResult<RoomId> {
        self.wait_for_permit().await;
        self.inner.create(request).await
    }

    async fn list_members(&self, room: &RoomId) -> ActionResult<BTreeMap<MemberId, String>> {
        self.wait_for_permit().await;
        self.inner.list_members(room).await
    }

    async fn banned_members(&self, room: &RoomId) -> ActionResult<BTreeMap<MemberId, String>> {
        self.wait_for_permit().await;
        self.inner.banned_members(room).await
    }

    async fn room_display_name(&self, room: &RoomId) -> ActionResult<String> {
        self.wait_for_permit().await;
        self.inner.room_display_name(room).await
    }

    async fn joined_rooms(&self) -> ActionResult<Vec<RoomId>> {
        self.wait_for_permit().await;
        self.inner.joined_rooms().await
    }
}
