//! `/sync` response bodies.
//!
//! [`SyncResponse`] mirrors the JSON the homeserver returns; [`SyncBatch`]
//! is the flattened form consumed by the sync driver. Events that fail to
//! deserialize are counted and dropped rather than failing the whole batch.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Event;
use crate::id::RoomId;

/// Raw `/sync` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Cursor to pass as `since` on the next poll.
    pub next_batch: String,
    /// Per-room updates.
    #[serde(default)]
    pub rooms: RoomsSection,
}

/// The `rooms` object of a sync response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomsSection {
    /// Rooms the user is joined to.
    #[serde(default)]
    pub join: BTreeMap<RoomId, JoinedRoom>,
    /// Rooms the user has left (or been removed from) since `since`.
    #[serde(default)]
    pub leave: BTreeMap<RoomId, Value>,
}

/// Update for one joined room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinedRoom {
    /// New timeline events.
    #[serde(default)]
    pub timeline: Timeline,
}

/// Timeline section of a joined room update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    /// Events in server order, kept raw so one bad event cannot poison the batch.
    #[serde(default)]
    pub events: Vec<Value>,
}

/// One sync batch, ready for classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncBatch {
    /// Cursor for the next poll.
    pub next_batch: String,
    /// Timeline events per joined room, each list in server order.
    pub joined: BTreeMap<RoomId, Vec<Event>>,
    /// Rooms the bot is no longer joined to.
    pub left: BTreeSet<RoomId>,
    /// Number of events dropped because they could not be decoded.
    pub malformed: usize,
}

impl SyncBatch {
    /// Total number of decoded timeline events.
    pub fn event_count(&self) -> usize {
        self.joined.values().map(Vec::len).sum()
    }
}

impl From<SyncResponse> for SyncBatch {
    fn from(response: SyncResponse) -> Self {
        let mut malformed = 0;
        let joined = response
            .rooms
            .join
            .into_iter()
            .map(|(room, update)| {
                let events = update
                    .timeline
                    .events
                    .into_iter()
                    .filter_map(|raw| match serde_json::from_value::<Event>(raw) {
                        Ok(event) => Some(event),
                        Err(_) => {
                            malformed += 1;
                            None
                        }
                    })
                    .collect();
                (room, events)
            })
            .collect();

        SyncBatch {
            next_batch: response.next_batch,
            joined,
            left: response.rooms.leave.into_keys().collect(),
            malformed,
        }
    }
}
