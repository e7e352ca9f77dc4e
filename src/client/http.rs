//! Client-server API implementation of the homeserver collaborators.
//!
//! One [`HomeserverClient`] backs [`SyncTransport`], [`RoomActions`] and
//! [`Messaging`]. It is cheap to clone; clones share the HTTP pool and the
//! session.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use warden_proto::event::Membership;
use warden_proto::request::{
    CreateRoomRequest, ErrorResponse, JoinedMembersResponse, JoinedRoomsResponse, LoginRequest,
    LoginResponse, MemberActionRequest, MembersResponse, MessageContent, RoomIdResponse,
    RoomNameContent, WhoAmIResponse,
};
use warden_proto::{MemberId, RoomId, SyncBatch, SyncResponse};

use super::{Messaging, RoomActions, SyncTransport};
use crate::config::ConfigStore;
use crate::error::{ActionError, ActionResult};

const API_PREFIX: [&str; 3] = ["_matrix", "client", "v3"];

/// Extra time allowed on top of the long-poll timeout before the HTTP
/// request itself is abandoned.
const REQUEST_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct Session {
    base: Url,
    access_token: Option<String>,
}

/// HTTP client for one homeserver account.
#[derive(Clone)]
pub struct HomeserverClient {
    http: reqwest::Client,
    config: Arc<ConfigStore>,
    session: Arc<RwLock<Session>>,
}

impl HomeserverClient {
    /// Build a client from the `[homeserver]` settings. No request is made
    /// until [`login`](Self::login).
    pub fn new(config: Arc<ConfigStore>) -> ActionResult<Self> {
        let (url, token, timeout_ms) = config.read(|c| {
            (
                c.homeserver.url.clone(),
                c.homeserver.access_token.clone(),
                c.bot.sync_timeout_ms,
            )
        });
        let base = Url::parse(&url).map_err(|e| ActionError::InvalidUrl(format!("{url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ActionError::InvalidUrl(url));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms) + REQUEST_GRACE)
            .user_agent(concat!("roomwarden/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            session: Arc::new(RwLock::new(Session {
                base,
                access_token: token.filter(|t| !t.is_empty()),
            })),
        })
    }

    /// Establish a session and return the bot's member id.
    ///
    /// A stored access token is tried first; if the homeserver rejects it the
    /// client falls back to password login. Fresh sessions are persisted.
    pub async fn login(&self) -> ActionResult<MemberId> {
        if self.session.read().access_token.is_some() {
            match self.whoami().await {
                Ok(user_id) => {
                    info!(user = %user_id, "Resumed stored session");
                    return Ok(user_id);
                }
                Err(ActionError::Api { errcode, .. }) if errcode == "M_UNKNOWN_TOKEN" => {
                    warn!("Stored access token rejected, logging in again");
                    self.session.write().access_token = None;
                }
                Err(e) => return Err(e),
            }
        }

        let (login, password, device_id) = self.config.read(|c| {
            (
                c.homeserver.login.clone(),
                c.homeserver.password.clone(),
                c.homeserver.device_id.clone(),
            )
        });
        if login.is_empty() || password.is_empty() {
            return Err(ActionError::NoCredentials);
        }

        let body = LoginRequest::password(&login, &password, device_id.as_deref());
        let url = self.endpoint(&["login"])?;
        let response: LoginResponse = self
            .send(self.http.post(url).json(&body), false)
            .await?;

        self.session.write().access_token = Some(response.access_token.clone());
        self.config.store_session(
            &response.access_token,
            response.device_id.as_deref(),
            &response.user_id,
        )?;
        info!(user = %response.user_id, device = ?response.device_id, "Logged in");
        Ok(response.user_id)
    }

    fn endpoint(&self, segments: &[&str]) -> ActionResult<Url> {
        let mut url = self.session.read().base.clone();
        url.path_segments_mut()
            .map_err(|_| ActionError::InvalidUrl("base url cannot take a path".into()))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    fn room_endpoint(&self, room: &RoomId, tail: &[&str]) -> ActionResult<Url> {
        let mut segments = vec!["rooms", room.as_str()];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, auth: bool) -> ActionResult<T> {
        let request = if auth {
            match self.session.read().access_token.clone() {
                Some(token) => request.bearer_auth(token),
                None => return Err(ActionError::NoCredentials),
            }
        } else {
            request
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let bytes = response.bytes().await?;
        Err(match serde_json::from_slice::<ErrorResponse>(&bytes) {
            Ok(err) => ActionError::Api {
                status: status.as_u16(),
                errcode: err.errcode,
                message: err.error,
            },
            Err(_) => ActionError::Api {
                status: status.as_u16(),
                errcode: "M_UNKNOWN".to_string(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            },
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> ActionResult<T> {
        debug!(method = %method, path = %url.path(), "Homeserver request");
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send(request, true).await
    }
}

#[async_trait]
impl SyncTransport for HomeserverClient {
    async fn poll(
        &self,
        since: Option<&str>,
        timeout_ms: u64,
        full_state: bool,
    ) -> ActionResult<SyncBatch> {
        let mut url = self.endpoint(&["sync"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("timeout", &timeout_ms.to_string());
            if let Some(since) = since {
                query.append_pair("since", since);
            }
            if full_state {
                query.append_pair("full_state", "true");
            }
        }
        let response: SyncResponse = self.call(Method::GET, url, None).await?;
        Ok(SyncBatch::from(response))
    }
}

#[async_trait]
impl RoomActions for HomeserverClient {
    async fn whoami(&self) -> ActionResult<MemberId> {
        let url = self.endpoint(&["account", "whoami"])?;
        let response: WhoAmIResponse = self.call(Method::GET, url, None).await?;
        Ok(response.user_id)
    }

    async fn join(&self, room: &RoomId, via: &[String]) -> ActionResult<RoomId> {
        let mut url = self.endpoint(&["join", room.as_str()])?;
        if !via.is_empty() {
            let mut query = url.query_pairs_mut();
            for server in via {
                query.append_pair("server_name", server);
            }
        }
        let response: RoomIdResponse = self.call(Method::POST, url, Some(json!({}))).await?;
        Ok(response.room_id)
    }

    async fn leave(&self, room: &RoomId) -> ActionResult<()> {
        let url = self.room_endpoint(room, &["leave"])?;
        let _: serde_json::Value = self.call(Method::POST, url, Some(json!({}))).await?;
        Ok(())
    }

    async fn ban(&self, room: &RoomId, member: &MemberId, reason: &str) -> ActionResult<()> {
        let url = self.room_endpoint(room, &["ban"])?;
        let body = serde_json::to_value(MemberActionRequest::new(member, reason))?;
        let _: serde_json::Value = self.call(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    async fn unban(&self, room: &RoomId, member: &MemberId) -> ActionResult<()> {
        let url = self.room_endpoint(room, &["unban"])?;
        let body = serde_json::to_value(MemberActionRequest::new(member, ""))?;
        let _: serde_json::Value = self.call(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    async fn create(&self, request: &CreateRoomRequest) -> ActionResult<RoomId> {
        let url = self.endpoint(&["createRoom"])?;
        let body = serde_json::to_value(request)?;
        let response: RoomIdResponse = self.call(Method::POST, url, Some(body)).await?;
        Ok(response.room_id)
    }

    async fn list_members(&self, room: &RoomId) -> ActionResult<BTreeMap<MemberId, String>> {
        let url = self.room_endpoint(room, &["joined_members"])?;
        let response: JoinedMembersResponse = self.call(Method::GET, url, None).await?;
        Ok(response
            .joined
            .into_iter()
            .map(|(id, profile)| {
                let name = profile.display_name.unwrap_or_else(|| id.to_string());
                (id, name)
            })
            .collect())
    }

    async fn banned_members(&self, room: &RoomId) -> ActionResult<BTreeMap<MemberId, String>> {
        let mut url = self.room_endpoint(room, &["members"])?;
        url.query_pairs_mut().append_pair("membership", "ban");
        let response: MembersResponse = self.call(Method::GET, url, None).await?;

        let mut banned = BTreeMap::new();
        for event in response.chunk {
            match event.member_content() {
                Some(Ok(content)) if content.membership == Membership::Ban => {
                    banned.insert(event.subject(), content.reason.unwrap_or_default());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(room = %room, error = %e, "Skipping malformed ban entry");
                }
                None => {}
            }
        }
        Ok(banned)
    }

    async fn room_display_name(&self, room: &RoomId) -> ActionResult<String> {
        let url = self.room_endpoint(room, &["state", "m.room.name", ""])?;
        match self.call::<RoomNameContent>(Method::GET, url, None).await {
            Ok(content) if !content.name.is_empty() => Ok(content.name),
            Ok(_) => Ok(room.to_string()),
            Err(ActionError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(room.to_string())
            }
            Err(e) => Err(e),
        }
    }

    async fn joined_rooms(&self) -> ActionResult<Vec<RoomId>> {
        let url = self.endpoint(&["joined_rooms"])?;
        let response: JoinedRoomsResponse = self.call(Method::GET, url, None).await?;
        Ok(response.joined_rooms)
    }
}

impl HomeserverClient {
    async fn send_content(&self, room: &RoomId, content: MessageContent<'_>) -> ActionResult<()> {
        let txn = uuid::Uuid::new_v4().simple().to_string();
        let url = self.room_endpoint(room, &["send", "m.room.message", &txn])?;
        let body = serde_json::to_value(content)?;
        let _: serde_json::Value = self.call(Method::PUT, url, Some(body)).await?;
        Ok(())
    }
}

#[async_trait]
impl Messaging for HomeserverClient {
    async fn send_plain(&self, room: &RoomId, text: &str) -> ActionResult<()> {
        self.send_content(room, MessageContent::plain(text)).await
    }

    async fn send_formatted(&self, room: &RoomId, plain: &str, rendered: &str) -> ActionResult<()> {
        self.send_content(room, MessageContent::formatted(plain, rendered))
            .await
    }
}
