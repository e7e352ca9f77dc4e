//! Sync driver: the single consumer of the event feed.
//!
//! Polls the homeserver, applies each batch completely, then polls again.
//! Membership transitions of one room are applied in event order; anything
//! slow that must not hold up the feed (welcome rooms, rejoins) is spawned.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, trace, warn};
use warden_proto::event::Membership;
use warden_proto::{Event, RoomId, SyncBatch};

use super::classifier::{Classified, Classifier};
use super::rejoin;
use crate::bot::Bot;
use crate::client::SyncTransport;
use crate::services::welcome::{self, Eviction};
use crate::telemetry::spans;

pub struct SyncDriver {
    bot: Arc<Bot>,
    transport: Arc<dyn SyncTransport>,
    since: Option<String>,
    /// Cleared after the first successful poll.
    full_state: bool,
}

impl SyncDriver {
    pub fn new(bot: Arc<Bot>, transport: Arc<dyn SyncTransport>) -> Self {
        Self {
            bot,
            transport,
            since: None,
            full_state: true,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Poll forever. Transport failures are logged and retried after a
    /// jittered pause.
    pub async fn run(mut self) {
        info!("Sync driver started");
        loop {
            self.poll_once().await;
        }
    }

    async fn poll_once(&mut self) {
        let timeout_ms = self.bot.config.read(|c| c.bot.sync_timeout_ms);
        match self
            .transport
            .poll(self.since.as_deref(), timeout_ms, self.full_state)
            .await
        {
            Ok(batch) => {
                self.full_state = false;
                if !batch.next_batch.is_empty() {
                    self.since = Some(batch.next_batch.clone());
                }
                self.apply_batch(batch).await;
            }
            Err(e) => {
                crate::bot::record_failure("sync", &e);
                let retry = self.bot.config.read(|c| c.bot.poll_retry_secs);
                let jitter = rand::thread_rng().gen_range(0..1000);
                warn!(error = %e, retry_secs = retry, "Sync poll failed");
                tokio::time::sleep(Duration::from_secs(retry) + Duration::from_millis(jitter)).await;
            }
        }
    }

    /// Apply one batch: joined rooms in order, then departures.
    pub async fn apply_batch(&self, batch: SyncBatch) {
        let SyncBatch {
            next_batch,
            joined,
            left,
            malformed,
        } = batch;
        let span = spans::sync_batch(&next_batch);
        async {
            crate::metrics::record_sync_batch(malformed);
            if malformed > 0 {
                warn!(malformed, "Dropped undecodable events");
            }
            for (room, events) in &joined {
                self.apply_room(room, events).await;
            }
            for room in left {
                rejoin::handle_left(&self.bot, room);
            }
            self.bot.set_cursor(&next_batch);
        }
        .instrument(span)
        .await
    }

    async fn apply_room(&self, room: &RoomId, events: &[Event]) {
        let bot = &self.bot;

        if bot.welcome.contains(room) {
            if events.iter().any(|e| self.is_departure(e)) {
                let bot = Arc::clone(bot);
                let room = room.clone();
                tokio::spawn(async move {
                    welcome::evict(&bot, &room, Eviction::Departure).await;
                });
            }
            return;
        }

        if !bot.config.is_monitored(room) {
            trace!(room = %room, events = events.len(), "Events for unmonitored room ignored");
            return;
        }

        for event in events {
            // Re-read per event: a command earlier in the batch can flip modes.
            let classifier = Classifier::new(bot.self_id(), bot.ready_ts());
            match classifier.classify(&bot.rooms, room, event) {
                Classified::Stale => crate::metrics::record_stale_event(),
                Classified::Chat { sender, body } => {
                    bot.router.dispatch(bot, room, &sender, &body).await;
                }
                Classified::Membership(transition) => {
                    if bot.config.is_passive() {
                        continue;
                    }
                    if !bot.rooms.is_tracked(room) {
                        debug!(room = %room, kind = transition.kind(), "Transition for untracked room skipped");
                        continue;
                    }
                    crate::metrics::record_transition(transition.kind());
                    bot.apply_transition(room, transition).await;
                }
                Classified::ProfileUpdate { member } => {
                    debug!(room = %room, member = %member, "Profile update");
                }
                Classified::Ignored => {}
            }
        }
    }

    /// A post-ready leave or ban of someone other than the bot.
    fn is_departure(&self, event: &Event) -> bool {
        if event.origin_server_ts <= self.bot.ready_ts() {
            return false;
        }
        let Some(Ok(content)) = event.member_content() else {
            return false;
        };
        matches!(content.membership, Membership::Leave | Membership::Ban)
            && !self.bot.is_self(&event.subject())
    }
}
