//! In-process fake homeserver speaking the client-server API subset the
//! bot uses. Tokens are not checked.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use warden_proto::event::Membership;
use warden_proto::sync::{JoinedRoom, Timeline};
use warden_proto::{Event, MemberId, RoomId, SyncResponse};

#[derive(Default)]
pub struct RoomState {
    pub members: BTreeSet<MemberId>,
    pub banned: BTreeMap<MemberId, String>,
}

#[derive(Default)]
pub struct ServerState {
    pub rooms: BTreeMap<RoomId, RoomState>,
    pub joined: BTreeSet<RoomId>,
    pub bans: Vec<(RoomId, MemberId, String)>,
    pub unbans: Vec<(RoomId, MemberId)>,
    pub leaves: Vec<RoomId>,
    pub created: Vec<Value>,
    pub sent: Vec<(RoomId, String)>,
    pub logins: usize,
    queued: VecDeque<SyncResponse>,
    batch: u64,
}

#[derive(Clone)]
struct Shared {
    user_id: MemberId,
    state: Arc<Mutex<ServerState>>,
}

/// Handle to a running fake homeserver.
#[derive(Clone)]
pub struct FakeHomeserver {
    pub user_id: MemberId,
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn timeline(room: &RoomId, events: &[Event]) -> SyncResponse {
    let mut response = SyncResponse::default();
    let events = events
        .iter()
        .map(|e| serde_json::to_value(e).unwrap())
        .collect();
    response.rooms.join.insert(
        room.clone(),
        JoinedRoom {
            timeline: Timeline { events },
        },
    );
    response
}

impl FakeHomeserver {
    pub async fn spawn(user_id: &str) -> Self {
        let state = Arc::new(Mutex::new(ServerState::default()));
        let shared = Shared {
            user_id: MemberId::new(user_id),
            state: Arc::clone(&state),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(shared)).await.unwrap();
        });
        Self {
            user_id: MemberId::new(user_id),
            addr,
            state,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn add_room(&self, room: &str, members: &[&str], banned: &[(&str, &str)]) {
        let mut state = self.state.lock();
        let entry = state.rooms.entry(RoomId::new(room)).or_default();
        entry.members.extend(members.iter().map(|m| MemberId::new(*m)));
        for (member, reason) in banned {
            entry.banned.insert(MemberId::new(*member), reason.to_string());
        }
    }

    /// Queue timeline events for the next sync response.
    pub fn push_timeline(&self, room: &str, events: Vec<Event>) {
        let response = timeline(&RoomId::new(room), &events);
        self.state.lock().queued.push_back(response);
    }

    /// Queue a room removal for the next sync response.
    pub fn push_leave(&self, room: &str) {
        let mut response = SyncResponse::default();
        response.rooms.leave.insert(RoomId::new(room), json!({}));
        let mut state = self.state.lock();
        state.joined.remove(&RoomId::new(room));
        state.queued.push_back(response);
    }

    pub fn read<R>(&self, f: impl FnOnce(&ServerState) -> R) -> R {
        f(&self.state.lock())
    }

    pub fn bans(&self) -> Vec<(RoomId, MemberId, String)> {
        self.read(|s| s.bans.clone())
    }

    pub fn sent_in(&self, room: &str) -> Vec<String> {
        self.read(|s| {
            s.sent
                .iter()
                .filter(|(r, _)| r.as_str() == room)
                .map(|(_, body)| body.clone())
                .collect()
        })
    }
}

fn router(shared: Shared) -> Router {
    Router::new()
        .route("/_matrix/client/v3/login", post(login))
        .route("/_matrix/client/v3/account/whoami", get(whoami))
        .route("/_matrix/client/v3/sync", get(sync))
        .route("/_matrix/client/v3/join/:room", post(join))
        .route("/_matrix/client/v3/joined_rooms", get(joined_rooms))
        .route("/_matrix/client/v3/createRoom", post(create_room))
        .route("/_matrix/client/v3/rooms/:room/leave", post(leave))
        .route("/_matrix/client/v3/rooms/:room/ban", post(ban))
        .route("/_matrix/client/v3/rooms/:room/unban", post(unban))
        .route("/_matrix/client/v3/rooms/:room/joined_members", get(joined_members))
        .route("/_matrix/client/v3/rooms/:room/members", get(members))
        .route("/_matrix/client/v3/rooms/:room/send/m.room.message/:txn", put(send))
        .with_state(shared)
}

async fn login(State(s): State<Shared>) -> Json<Value> {
    s.state.lock().logins += 1;
    Json(json!({
        "access_token": "token",
        "device_id": "DEVICE",
        "user_id": s.user_id,
    }))
}

async fn whoami(State(s): State<Shared>) -> Json<Value> {
    Json(json!({ "user_id": s.user_id }))
}

#[derive(Deserialize)]
struct SyncQuery {
    since: Option<String>,
    timeout: Option<u64>,
}

async fn sync(State(s): State<Shared>, Query(q): Query<SyncQuery>) -> Json<Value> {
    let next = {
        let mut state = s.state.lock();
        match state.queued.pop_front() {
            Some(mut response) => {
                state.batch += 1;
                response.next_batch = format!("s{}", state.batch);
                Some(response)
            }
            None => None,
        }
    };
    match next {
        Some(response) => Json(serde_json::to_value(response).unwrap()),
        None => {
            let wait = q.timeout.unwrap_or(0).min(50);
            tokio::time::sleep(Duration::from_millis(wait)).await;
            Json(json!({ "next_batch": q.since.unwrap_or_else(|| "s0".into()) }))
        }
    }
}

async fn join(State(s): State<Shared>, Path(room): Path<RoomId>) -> Json<Value> {
    let mut state = s.state.lock();
    state.joined.insert(room.clone());
    state
        .rooms
        .entry(room.clone())
        .or_default()
        .members
        .insert(s.user_id.clone());
    Json(json!({ "room_id": room }))
}

async fn joined_rooms(State(s): State<Shared>) -> Json<Value> {
    let rooms: Vec<RoomId> = s.state.lock().joined.iter().cloned().collect();
    Json(json!({ "joined_rooms": rooms }))
}

async fn create_room(State(s): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = s.state.lock();
    state.created.push(body);
    let room = RoomId::new(format!("!w{}:example.org", state.created.len()));
    state.joined.insert(room.clone());
    state.rooms.entry(room.clone()).or_default();
    Json(json!({ "room_id": room }))
}

async fn leave(State(s): State<Shared>, Path(room): Path<RoomId>) -> Json<Value> {
    let mut state = s.state.lock();
    state.joined.remove(&room);
    state.leaves.push(room);
    Json(json!({}))
}

#[derive(Deserialize)]
struct MemberAction {
    user_id: MemberId,
    #[serde(default)]
    reason: Option<String>,
}

async fn ban(State(s): State<Shared>, Path(room): Path<RoomId>, Json(body): Json<MemberAction>) -> Json<Value> {
    let reason = body.reason.unwrap_or_default();
    let mut state = s.state.lock();
    state.bans.push((room.clone(), body.user_id.clone(), reason.clone()));
    let entry = state.rooms.entry(room.clone()).or_default();
    entry.members.remove(&body.user_id);
    entry.banned.insert(body.user_id.clone(), reason.clone());

    // The homeserver echoes the ban back through sync.
    let echo = Event::member(
        s.user_id.clone(),
        &body.user_id,
        Membership::Ban,
        Some(&reason).filter(|r| !r.is_empty()).map(String::as_str),
        now_ms(),
    );
    state.queued.push_back(timeline(&room, &[echo]));
    Json(json!({}))
}

async fn unban(State(s): State<Shared>, Path(room): Path<RoomId>, Json(body): Json<MemberAction>) -> Json<Value> {
    let mut state = s.state.lock();
    state.unbans.push((room.clone(), body.user_id.clone()));
    if let Some(entry) = state.rooms.get_mut(&room) {
        entry.banned.remove(&body.user_id);
    }
    Json(json!({}))
}

async fn joined_members(State(s): State<Shared>, Path(room): Path<RoomId>) -> Json<Value> {
    let state = s.state.lock();
    let joined: BTreeMap<String, Value> = state
        .rooms
        .get(&room)
        .map(|r| {
            r.members
                .iter()
                .map(|m| (m.to_string(), json!({ "display_name": null })))
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "joined": joined }))
}

async fn members(State(s): State<Shared>, Path(room): Path<RoomId>) -> Json<Value> {
    let state = s.state.lock();
    let chunk: Vec<Event> = state
        .rooms
        .get(&room)
        .map(|r| {
            r.banned
                .iter()
                .map(|(member, reason)| {
                    let reason = Some(reason.as_str()).filter(|r| !r.is_empty());
                    Event::member(MemberId::new("@mod:example.org"), member, Membership::Ban, reason, 1)
                })
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "chunk": chunk }))
}

async fn send(
    State(s): State<Shared>,
    Path((room, _txn)): Path<(RoomId, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let text = body["body"].as_str().unwrap_or_default().to_string();
    s.state.lock().sent.push((room, text));
    Json(json!({ "event_id": "$sent" }))
}
