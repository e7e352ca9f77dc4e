//! Room State Store.
//!
//! One [`RoomRecord`] per monitored room the bot has joined. All mutation
//! goes through `DashMap::get_mut`, which holds the shard write lock for the
//! duration of the change, so updates to one room are serialized while
//! different rooms proceed independently.
//!
//! Operations on rooms without a record are silent no-ops: the sync feed can
//! legitimately deliver events for a room the bot is still joining or has
//! just left.

use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use warden_proto::{MemberId, RoomId, RoomMode};

use super::dashmap_ext::DashMapExt;

/// Bookkeeping for one joined room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub id: RoomId,
    /// Currently joined members. Never overlaps `banned`.
    pub members: BTreeSet<MemberId>,
    /// Banned members and the ban reason (empty when none was given).
    pub banned: BTreeMap<MemberId, String>,
    /// Mirror of the configured modes.
    pub modes: BTreeSet<RoomMode>,
    /// Mirror of the configured mode parameters.
    pub params: BTreeMap<RoomMode, String>,
}

impl RoomRecord {
    pub fn has_mode(&self, mode: RoomMode) -> bool {
        self.modes.contains(&mode)
    }

    /// The bot holds power to ban here.
    pub fn can_ban(&self) -> bool {
        self.modes.iter().any(RoomMode::grants_ban_power)
    }

    /// Bans in this room are shared with other rooms.
    pub fn syncs_bans(&self) -> bool {
        self.has_mode(RoomMode::BanlistSync)
    }

    /// Eligible to receive propagated bans and unbans.
    pub fn is_ban_target(&self) -> bool {
        self.syncs_bans() && self.can_ban()
    }
}

/// Result of applying a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Member was not in the room before.
    Joined,
    /// Member was already present (profile change).
    AlreadyPresent,
    /// Room has no record.
    Untracked,
}

/// Per-room membership and ban state.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: DashMap<RoomId, RoomRecord>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) the record for a room the bot just joined.
    ///
    /// Members that also appear in `banned` are dropped from the member set.
    pub fn seed(
        &self,
        room: &RoomId,
        members: impl IntoIterator<Item = MemberId>,
        banned: BTreeMap<MemberId, String>,
        modes: BTreeSet<RoomMode>,
        params: BTreeMap<RoomMode, String>,
    ) {
        let members: BTreeSet<MemberId> = members
            .into_iter()
            .filter(|m| !banned.contains_key(m))
            .collect();
        debug!(
            room = %room,
            members = members.len(),
            banned = banned.len(),
            "Room record seeded"
        );
        self.rooms.insert(
            room.clone(),
            RoomRecord {
                id: room.clone(),
                members,
                banned,
                modes,
                params,
            },
        );
        crate::metrics::set_tracked_rooms(self.rooms.len());
    }

    pub fn apply_join(&self, room: &RoomId, member: &MemberId) -> JoinOutcome {
        let Some(mut record) = self.rooms.get_mut(room) else {
            return JoinOutcome::Untracked;
        };
        record.banned.remove(member);
        if record.members.insert(member.clone()) {
            JoinOutcome::Joined
        } else {
            JoinOutcome::AlreadyPresent
        }
    }

    /// Returns `true` when the member was present.
    pub fn apply_leave(&self, room: &RoomId, member: &MemberId) -> bool {
        self.rooms
            .get_mut(room)
            .is_some_and(|mut record| record.members.remove(member))
    }

    /// Record a ban, overwriting any earlier reason. Returns `false` for
    /// untracked rooms.
    pub fn apply_ban(&self, room: &RoomId, member: &MemberId, reason: &str) -> bool {
        let Some(mut record) = self.rooms.get_mut(room) else {
            return false;
        };
        record.members.remove(member);
        record.banned.insert(member.clone(), reason.to_string());
        true
    }

    /// Returns `true` when the member was listed as banned.
    pub fn apply_unban(&self, room: &RoomId, member: &MemberId) -> bool {
        self.rooms
            .get_mut(room)
            .is_some_and(|mut record| record.banned.remove(member).is_some())
    }

    pub fn is_member(&self, room: &RoomId, member: &MemberId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|record| record.members.contains(member))
    }

    pub fn is_banned(&self, room: &RoomId, member: &MemberId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|record| record.banned.contains_key(member))
    }

    /// Mirrored mode check; `false` for untracked rooms.
    pub fn has_mode(&self, room: &RoomId, mode: RoomMode) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|record| record.has_mode(mode))
    }

    pub fn is_tracked(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    /// Read-only copy of a record.
    pub fn snapshot(&self, room: &RoomId) -> Option<RoomRecord> {
        self.rooms.get_cloned(room)
    }

    /// Records matching `pred`, cloned.
    pub fn records_where(&self, pred: impl FnMut(&RoomRecord) -> bool) -> Vec<RoomRecord> {
        self.rooms.filter_cloned(pred)
    }

    pub fn drop_room(&self, room: &RoomId) -> Option<RoomRecord> {
        let removed = self.rooms.remove(room).map(|(_, record)| record);
        if removed.is_some() {
            debug!(room = %room, "Room record dropped");
            crate::metrics::set_tracked_rooms(self.rooms.len());
        }
        removed
    }

    /// Refresh the mirrored modes after a configuration change.
    pub fn set_modes(
        &self,
        room: &RoomId,
        modes: BTreeSet<RoomMode>,
        params: BTreeMap<RoomMode, String>,
    ) {
        if let Some(mut record) = self.rooms.get_mut(room) {
            record.modes = modes;
            record.params = params;
        }
    }

    pub fn rooms(&self) -> Vec<RoomId> {
        self.rooms.keys_cloned()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
