//! Rejoin recovery for rooms the bot was removed from.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warden_proto::RoomId;

use crate::bot::Bot;

/// React to the bot no longer being joined to `room`.
///
/// Welcome rooms are forgotten. Monitored rooms lose their record and get one
/// rejoin attempt after the configured delay. Anything else is just dropped.
pub fn handle_left(bot: &Arc<Bot>, room: RoomId) -> Option<JoinHandle<()>> {
    if bot.welcome.remove(&room).is_some() {
        debug!(room = %room, "Welcome room closed remotely");
        crate::metrics::record_welcome_eviction("remote");
        return None;
    }

    bot.rooms.drop_room(&room);
    if !bot.config.is_monitored(&room) {
        debug!(room = %room, "Left unmonitored room");
        return None;
    }

    let delay = Duration::from_secs(bot.config.read(|c| c.bot.rejoin_delay_secs));
    info!(room = %room, delay_secs = delay.as_secs(), "Removed from monitored room, scheduling rejoin");
    Some(schedule_rejoin(Arc::clone(bot), room, delay))
}

/// Single rejoin attempt after `delay`. Failure is logged, never retried.
pub fn schedule_rejoin(bot: Arc<Bot>, room: RoomId, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if !bot.config.is_monitored(&room) {
            debug!(room = %room, "Room no longer monitored, skipping rejoin");
            return;
        }
        match bot.join_room(&room).await {
            Ok(_) => info!(room = %room, "Rejoined monitored room"),
            Err(e) => warn!(room = %room, error = %e, "Rejoin failed"),
        }
    })
}
