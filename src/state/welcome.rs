//! Registry of live welcome rooms.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use warden_proto::{MemberId, RoomId};

use super::dashmap_ext::DashMapExt;

/// A private room created to greet one new member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeRoom {
    pub id: RoomId,
    /// The member being welcomed.
    pub member: MemberId,
    /// Monitored room whose join triggered the welcome.
    pub source: RoomId,
    pub created_at: Instant,
}

/// Active welcome rooms keyed by room id.
///
/// Entries only ever leave through [`remove`](Self::remove). Whoever gets
/// `Some` back owns the eviction and is the only one to issue the leave, so
/// a departure racing the sweep never leaves twice.
#[derive(Debug, Default)]
pub struct WelcomeRegistry {
    rooms: DashMap<RoomId, WelcomeRoom>,
}

impl WelcomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, room: WelcomeRoom) {
        self.rooms.insert(room.id.clone(), room);
        crate::metrics::set_welcome_rooms(self.rooms.len());
    }

    pub fn remove(&self, room: &RoomId) -> Option<WelcomeRoom> {
        let removed = self.rooms.remove(room).map(|(_, entry)| entry);
        if removed.is_some() {
            crate::metrics::set_welcome_rooms(self.rooms.len());
        }
        removed
    }

    pub fn contains(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    pub fn get(&self, room: &RoomId) -> Option<WelcomeRoom> {
        self.rooms.get_cloned(room)
    }

    /// Entries whose age at `now` has reached `lifetime`.
    pub fn expired(&self, now: Instant, lifetime: Duration) -> Vec<WelcomeRoom> {
        self.rooms
            .filter_cloned(|entry| now.saturating_duration_since(entry.created_at) >= lifetime)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
