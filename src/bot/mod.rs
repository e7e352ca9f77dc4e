//! The bot: shared state plus the room operations every component uses.
//!
//! [`Bot`] is the hub handed (as `Arc<Bot>`) to the sync driver, the
//! background tasks and command handlers. Its methods combine a homeserver
//! call with the matching state update, so callers never update the room
//! store for an action that did not happen.

mod membership;
mod startup;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{Instrument, info, warn};
use warden_proto::{MemberId, RoomId, RoomMode};

use crate::client::{MarkupRenderer, Messaging, RoomActions};
use crate::config::ConfigStore;
use crate::error::{ActionError, ActionResult};
use crate::handlers::Router;
use crate::state::{RoomStore, WelcomeRegistry};
use crate::telemetry::spans;

pub use startup::BotTasks;

/// Everything needed to build a [`Bot`].
pub struct BotParams {
    pub config: Arc<ConfigStore>,
    pub actions: Arc<dyn RoomActions>,
    pub messaging: Arc<dyn Messaging>,
    pub renderer: Arc<dyn MarkupRenderer>,
    /// Member id resolved at login.
    pub self_id: MemberId,
}

pub struct Bot {
    pub config: Arc<ConfigStore>,
    pub rooms: RoomStore,
    pub welcome: WelcomeRegistry,
    pub actions: Arc<dyn RoomActions>,
    pub messaging: Arc<dyn Messaging>,
    pub renderer: Arc<dyn MarkupRenderer>,
    pub router: Router,
    self_id: MemberId,
    /// Server timestamp (ms) before which events are ignored.
    ready_ts: AtomicI64,
    /// Last sync cursor, for the heartbeat.
    cursor: Mutex<Option<String>>,
    shutdown: Notify,
}

impl Bot {
    pub fn new(params: BotParams) -> Arc<Self> {
        Arc::new(Self {
            config: params.config,
            rooms: RoomStore::new(),
            welcome: WelcomeRegistry::new(),
            actions: params.actions,
            messaging: params.messaging,
            renderer: params.renderer,
            router: Router::new(),
            self_id: params.self_id,
            ready_ts: AtomicI64::new(i64::MAX),
            cursor: Mutex::new(None),
            shutdown: Notify::new(),
        })
    }

    pub fn self_id(&self) -> &MemberId {
        &self.self_id
    }

    pub fn is_self(&self, member: &MemberId) -> bool {
        member == &self.self_id
    }

    /// Events with a server timestamp at or before this are never classified.
    /// Starts at `i64::MAX` so nothing is processed before bootstrap finishes.
    pub fn ready_ts(&self) -> i64 {
        self.ready_ts.load(Ordering::Acquire)
    }

    pub fn set_ready_ts(&self, ts: i64) {
        self.ready_ts.store(ts, Ordering::Release);
    }

    pub fn cursor(&self) -> Option<String> {
        self.cursor.lock().clone()
    }

    pub fn set_cursor(&self, cursor: &str) {
        *self.cursor.lock() = Some(cursor.to_string());
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Ask the process to exit.
    pub fn request_shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.notify_one();
    }

    /// Resolves once [`request_shutdown`](Self::request_shutdown) is called.
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }

    // ------------------------------------------------------------------------
    // Room operations
    // ------------------------------------------------------------------------

    /// Join a monitored room and seed its record from the homeserver.
    ///
    /// Returns the canonical room id (differs from `room` for aliases).
    pub async fn join_room(&self, room: &RoomId) -> ActionResult<RoomId> {
        async {
            let via: Vec<String> = room.server_name().map(str::to_string).into_iter().collect();
            let joined = self
                .actions
                .join(room, &via)
                .await
                .inspect_err(|e| record_failure("join", e))?;
            if &joined != room {
                warn!(configured = %room, resolved = %joined, "Room alias resolved; configure the room id instead");
            }

            let members = self
                .actions
                .list_members(&joined)
                .await
                .inspect_err(|e| record_failure("list_members", e))?;
            let banned = self
                .actions
                .banned_members(&joined)
                .await
                .inspect_err(|e| record_failure("banned_members", e))?;

            let room_config = self.config.room(room).unwrap_or_default();
            self.rooms.seed(
                &joined,
                members.into_keys(),
                banned,
                room_config.modes.clone(),
                room_config.typed_params(),
            );
            info!(room = %joined, "Joined monitored room");
            Ok::<_, ActionError>(joined)
        }
        .instrument(spans::room_bootstrap(room.as_str()))
        .await
    }

    /// Leave a room and forget its record.
    pub async fn leave_room(&self, room: &RoomId) -> ActionResult<()> {
        self.actions
            .leave(room)
            .await
            .inspect_err(|e| record_failure("leave", e))?;
        self.rooms.drop_room(room);
        info!(room = %room, "Left room");
        Ok(())
    }

    /// Ban `member` in `room` and record it. In dry-run mode only the record
    /// is updated.
    pub async fn ban_member(&self, room: &RoomId, member: &MemberId, reason: &str) -> ActionResult<()> {
        if self.config.is_dry_run() {
            info!(room = %room, member = %member, reason = %reason, "Dry run: would ban");
        } else {
            self.actions
                .ban(room, member, reason)
                .await
                .inspect_err(|e| record_failure("ban", e))?;
            info!(room = %room, member = %member, reason = %reason, "Banned member");
        }
        self.rooms.apply_ban(room, member, reason);
        Ok(())
    }

    /// Unban `member` in `room` and record it. In dry-run mode only the
    /// record is updated.
    pub async fn unban_member(&self, room: &RoomId, member: &MemberId) -> ActionResult<()> {
        if self.config.is_dry_run() {
            info!(room = %room, member = %member, "Dry run: would unban");
        } else {
            self.actions
                .unban(room, member)
                .await
                .inspect_err(|e| record_failure("unban", e))?;
            info!(room = %room, member = %member, "Unbanned member");
        }
        self.rooms.apply_unban(room, member);
        Ok(())
    }

    /// Re-read modes and params for `room` from the configuration into its record.
    pub fn refresh_modes(&self, room: &RoomId) {
        let room_config = self.config.room(room).unwrap_or_default();
        self.rooms
            .set_modes(room, room_config.modes.clone(), room_config.typed_params());
    }

    /// True when the bot can ban in `room` according to its configured modes.
    pub fn can_ban_in(&self, room: &RoomId) -> bool {
        self.config.is_mode_enabled(room, RoomMode::SelfModerator)
            || self.config.is_mode_enabled(room, RoomMode::SelfAdministrator)
    }

    // ------------------------------------------------------------------------
    // Posting
    // ------------------------------------------------------------------------

    /// Post plain text. Failures are logged and returned.
    pub async fn post(&self, room: &RoomId, text: &str) -> ActionResult<()> {
        self.messaging
            .send_plain(room, text)
            .await
            .inspect_err(|e| {
                record_failure("send", e);
                warn!(room = %room, error = %e, "Failed to post message");
            })
    }

    /// Post Markdown, rendered to HTML with a plain fallback.
    pub async fn post_markdown(&self, room: &RoomId, markdown: &str) -> ActionResult<()> {
        let rendered = self.renderer.render(markdown);
        self.messaging
            .send_formatted(room, markdown, &rendered)
            .await
            .inspect_err(|e| {
                record_failure("send", e);
                warn!(room = %room, error = %e, "Failed to post message");
            })
    }

    /// Display names for a set of rooms, falling back to the id on failure.
    pub async fn display_names(&self, rooms: &[RoomId]) -> BTreeMap<RoomId, String> {
        let lookups = rooms.iter().map(|room| async move {
            let name = match self.actions.room_display_name(room).await {
                Ok(name) => name,
                Err(e) => {
                    record_failure("room_name", &e);
                    room.to_string()
                }
            };
            (room.clone(), name)
        });
        join_all(lookups).await.into_iter().collect()
    }
}

/// Count a failed homeserver call.
pub(crate) fn record_failure(action: &str, error: &ActionError) {
    crate::metrics::record_action_failure(action, error.error_code());
}
