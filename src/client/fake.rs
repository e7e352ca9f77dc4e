//! In-memory homeserver for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use warden_proto::request::CreateRoomRequest;
use warden_proto::{MemberId, RoomId, SyncBatch};

use super::{Messaging, RoomActions, SyncTransport};
use crate::error::{ActionError, ActionResult};

#[derive(Default)]
pub struct FakeRoom {
    pub members: BTreeMap<MemberId, String>,
    pub banned: BTreeMap<MemberId, String>,
    pub name: Option<String>,
}

#[derive(Default)]
struct State {
    rooms: BTreeMap<RoomId, FakeRoom>,
    joined: BTreeSet<RoomId>,
    failing: BTreeSet<RoomId>,
    bans: Vec<(RoomId, MemberId, String)>,
    unbans: Vec<(RoomId, MemberId)>,
    joins: Vec<RoomId>,
    leaves: Vec<RoomId>,
    created: Vec<CreateRoomRequest>,
    sent: Vec<(RoomId, String)>,
    batches: VecDeque<SyncBatch>,
    polls: Vec<bool>,
}

/// Cloneable handle to a shared fake server.
#[derive(Clone)]
pub struct FakeHomeserver {
    self_id: MemberId,
    state: Arc<Mutex<State>>,
}

fn forbidden() -> ActionError {
    ActionError::Api {
        status: 403,
        errcode: "M_FORBIDDEN".into(),
        message: "not allowed".into(),
    }
}

impl FakeHomeserver {
    pub fn new(self_id: &str) -> Self {
        Self {
            self_id: MemberId::new(self_id),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn self_id(&self) -> MemberId {
        self.self_id.clone()
    }

    pub fn add_room(&self, room: &RoomId, members: &[&str], banned: &[(&str, &str)]) {
        let mut state = self.state.lock();
        let entry = state.rooms.entry(room.clone()).or_default();
        for m in members {
            entry.members.insert(MemberId::new(*m), m.trim_start_matches('@').to_string());
        }
        for (m, reason) in banned {
            entry.banned.insert(MemberId::new(*m), reason.to_string());
        }
    }

    pub fn fail_actions_in(&self, room: &RoomId) {
        self.state.lock().failing.insert(room.clone());
    }

    pub fn push_batch(&self, batch: SyncBatch) {
        self.state.lock().batches.push_back(batch);
    }

    pub fn bans(&self) -> Vec<(RoomId, MemberId, String)> {
        self.state.lock().bans.clone()
    }

    pub fn unbans(&self) -> Vec<(RoomId, MemberId)> {
        self.state.lock().unbans.clone()
    }

    pub fn joins(&self) -> Vec<RoomId> {
        self.state.lock().joins.clone()
    }

    pub fn leaves(&self) -> Vec<RoomId> {
        self.state.lock().leaves.clone()
    }

    pub fn created(&self) -> Vec<CreateRoomRequest> {
        self.state.lock().created.clone()
    }

    pub fn sent(&self) -> Vec<(RoomId, String)> {
        self.state.lock().sent.clone()
    }

    pub fn polls(&self) -> Vec<bool> {
        self.state.lock().polls.clone()
    }

    pub fn banned_in(&self, room: &RoomId) -> BTreeMap<MemberId, String> {
        self.state
            .lock()
            .rooms
            .get(room)
            .map(|r| r.banned.clone())
            .unwrap_or_default()
    }

    pub fn mark_joined(&self, room: &RoomId) {
        self.state.lock().joined.insert(room.clone());
    }
}

#[async_trait]
impl SyncTransport for FakeHomeserver {
    async fn poll(&self, since: Option<&str>, timeout_ms: u64, full_state: bool) -> ActionResult<SyncBatch> {
        let next = {
            let mut state = self.state.lock();
            state.polls.push(full_state);
            state.batches.pop_front()
        };
        match next {
            Some(batch) => Ok(batch),
            None => {
                tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
                Ok(SyncBatch {
                    next_batch: since.unwrap_or_default().to_string(),
                    ..Default::default()
                })
            }
        }
    }
}

#[async_trait]
impl RoomActions for FakeHomeserver {
    async fn whoami(&self) -> ActionResult<MemberId> {
        Ok(self.self_id.clone())
    }

    async fn join(&self, room: &RoomId, _via: &[String]) -> ActionResult<RoomId> {
        let mut state = self.state.lock();
        if state.failing.contains(room) {
            return Err(forbidden());
        }
        state.joins.push(room.clone());
        state.joined.insert(room.clone());
        let self_id = self.self_id.clone();
        state
            .rooms
            .entry(room.clone())
            .or_default()
            .members
            .insert(self_id, "warden".into());
        Ok(room.clone())
    }

    async fn leave(&self, room: &RoomId) -> ActionResult<()> {
        let mut state = self.state.lock();
        state.leaves.push(room.clone());
        state.joined.remove(room);
        Ok(())
    }

    async fn ban(&self, room: &RoomId, member: &MemberId, reason: &str) -> ActionResult<()> {
        let mut state = self.state.lock();
        if state.failing.contains(room) {
            return Err(forbidden());
        }
        state.bans.push((room.clone(), member.clone(), reason.to_string()));
        let entry = state.rooms.entry(room.clone()).or_default();
        entry.members.remove(member);
        entry.banned.insert(member.clone(), reason.to_string());
        Ok(())
    }

    async fn unban(&self, room: &RoomId, member: &MemberId) -> ActionResult<()> {
        let mut state = self.state.lock();
        if state.failing.contains(room) {
            return Err(forbidden());
        }
        state.unbans.push((room.clone(), member.clone()));
        if let Some(entry) = state.rooms.get_mut(room) {
            entry.banned.remove(member);
        }
        Ok(())
    }

    async fn create(&self, request: &CreateRoomRequest) -> ActionResult<RoomId> {
        let mut state = self.state.lock();
        let room = RoomId::new(format!("!welcome{}:x", state.created.len() + 1));
        state.created.push(request.clone());
        state.joined.insert(room.clone());
        state.rooms.entry(room.clone()).or_default();
        Ok(room)
    }

    async fn list_members(&self, room: &RoomId) -> ActionResult<BTreeMap<MemberId, String>> {
        Ok(self
            .state
            .lock()
            .rooms
            .get(room)
            .map(|r| r.members.clone())
            .unwrap_or_default())
    }

    async fn banned_members(&self, room: &RoomId) -> ActionResult<BTreeMap<MemberId, String>> {
        Ok(self.banned_in(room))
    }

    async fn room_display_name(&self, room: &RoomId) -> ActionResult<String> {
        Ok(self
            .state
            .lock()
            .rooms
            .get(room)
            .and_then(|r| r.name.clone())
            .unwrap_or_else(|| room.to_string()))
    }

    async fn joined_rooms(&self) -> ActionResult<Vec<RoomId>> {
        Ok(self.state.lock().joined.iter().cloned().collect())
    }
}

#[async_trait]
impl Messaging for FakeHomeserver {
    async fn send_plain(&self, room: &RoomId, text: &str) -> ActionResult<()> {
        self.state.lock().sent.push((room.clone(), text.to_string()));
        Ok(())
    }

    async fn send_formatted(&self, room: &RoomId, plain: &str, _rendered: &str) -> ActionResult<()> {
        self.state.lock().sent.push((room.clone(), plain.to_string()));
        Ok(())
    }
}
