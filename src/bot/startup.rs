//! Bot bootstrap and background tasks.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{Bot, record_failure};
use crate::client::SyncTransport;
use crate::services::{banlist, welcome};
use crate::sync::SyncDriver;

/// Handles of the long-running tasks started by [`Bot::start`].
pub struct BotTasks {
    pub driver: JoinHandle<()>,
    pub sweep: JoinHandle<()>,
    pub heartbeat: JoinHandle<()>,
}

impl BotTasks {
    pub fn abort(&self) {
        self.driver.abort();
        self.sweep.abort();
        self.heartbeat.abort();
    }
}

impl Bot {
    /// Bring the bot online.
    ///
    /// 1. Leave foreign rooms (skipped in passive mode).
    /// 2. Join and seed every monitored room; failures skip the room.
    /// 3. Reconcile ban lists (skipped in passive mode).
    /// 4. Open the event gate and start the driver, sweep and heartbeat.
    pub async fn start(self: &Arc<Self>, transport: Arc<dyn SyncTransport>) -> BotTasks {
        let passive = self.config.is_passive();
        info!(
            self_id = %self.self_id,
            passive,
            dry_run = self.config.is_dry_run(),
            "Starting bot"
        );

        if !passive {
            self.leave_foreign_rooms().await;
        }

        let joined = self.join_monitored().await;
        info!(joined, configured = self.config.monitored_rooms().len(), "Monitored rooms joined");

        if !passive {
            banlist::reconcile(self).await;
        }

        self.set_ready_ts(chrono::Utc::now().timestamp_millis());

        BotTasks {
            driver: SyncDriver::new(Arc::clone(self), transport).spawn(),
            sweep: welcome::spawn_sweep_task(Arc::clone(self)),
            heartbeat: spawn_heartbeat(Arc::clone(self)),
        }
    }

    async fn leave_foreign_rooms(&self) {
        let joined = match self.actions.joined_rooms().await {
            Ok(rooms) => rooms,
            Err(e) => {
                record_failure("joined_rooms", &e);
                warn!(error = %e, "Could not list joined rooms");
                return;
            }
        };
        for room in joined.iter().filter(|r| !self.config.is_monitored(r)) {
            if let Err(e) = self.leave_room(room).await {
                warn!(room = %room, error = %e, "Failed to leave foreign room");
            }
        }
    }

    async fn join_monitored(&self) -> usize {
        let mut joined = 0;
        for room in self.config.monitored_rooms() {
            match self.join_room(&room).await {
                Ok(_) => joined += 1,
                Err(e) => warn!(room = %room, error = %e, "Failed to join monitored room"),
            }
        }
        joined
    }

    fn heartbeat(&self) {
        let rooms = self.rooms.len();
        let welcome = self.welcome.len();
        crate::metrics::set_tracked_rooms(rooms);
        crate::metrics::set_welcome_rooms(welcome);
        info!(
            rooms,
            welcome,
            cursor = self.cursor().as_deref().unwrap_or("-"),
            "Heartbeat"
        );
    }
}

fn spawn_heartbeat(bot: Arc<Bot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(bot.config.read(|c| c.bot.heartbeat_secs).max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            bot.heartbeat();
        }
    })
}
