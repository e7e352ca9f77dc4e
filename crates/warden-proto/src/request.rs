//! Request and response bodies for the room action endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{MemberId, RoomId};

/// Password login request (`POST /login`).
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// Always `m.login.password`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// User identifier block.
    pub identifier: UserIdentifier<'a>,
    /// Account password.
    pub password: &'a str,
    /// Device to reuse, if one was stored from an earlier login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<&'a str>,
    /// Display name for a newly created device.
    pub initial_device_display_name: &'a str,
}

impl<'a> LoginRequest<'a> {
    /// Password login for `user`.
    pub fn password(user: &'a str, password: &'a str, device_id: Option<&'a str>) -> Self {
        Self {
            kind: "m.login.password",
            identifier: UserIdentifier {
                kind: "m.id.user",
                user,
            },
            password,
            device_id,
            initial_device_display_name: "roomwarden",
        }
    }
}

/// `m.id.user` identifier.
#[derive(Debug, Clone, Serialize)]
pub struct UserIdentifier<'a> {
    /// Always `m.id.user`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Localpart or full member id.
    pub user: &'a str,
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Token for subsequent requests.
    pub access_token: String,
    /// Device the token belongs to.
    #[serde(default)]
    pub device_id: Option<String>,
    /// Fully qualified id of the logged in member.
    pub user_id: MemberId,
}

/// `GET /account/whoami` response.
#[derive(Debug, Clone, Deserialize)]
pub struct WhoAmIResponse {
    /// The member the token belongs to.
    pub user_id: MemberId,
}

/// Body for `ban` and `kick` style endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct MemberActionRequest<'a> {
    /// Target member.
    pub user_id: &'a MemberId,
    /// Reason shown to the room; omitted when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

impl<'a> MemberActionRequest<'a> {
    /// Builds the body, dropping an empty reason.
    pub fn new(user_id: &'a MemberId, reason: &'a str) -> Self {
        Self {
            user_id,
            reason: (!reason.is_empty()).then_some(reason),
        }
    }
}

/// Room visibility in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Listed in the public directory.
    Public,
    /// Not listed.
    Private,
}

/// Room creation preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Invite-only, history visible to members.
    PrivateChat,
    /// Like private chat but every invitee gets the creator's power.
    TrustedPrivateChat,
    /// Anyone can join.
    PublicChat,
}

/// `POST /createRoom` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomRequest {
    /// Directory visibility.
    pub visibility: Visibility,
    /// Local part of the alias to publish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_alias_name: Option<String>,
    /// Room name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Room topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Members invited at creation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invite: Vec<MemberId>,
    /// Creation preset.
    pub preset: Preset,
    /// Marks the room as a direct conversation.
    pub is_direct: bool,
}

impl CreateRoomRequest {
    /// A private direct room inviting a single member.
    pub fn direct(member: MemberId) -> Self {
        Self {
            visibility: Visibility::Private,
            room_alias_name: None,
            name: None,
            topic: None,
            invite: vec![member],
            preset: Preset::TrustedPrivateChat,
            is_direct: true,
        }
    }
}

/// `POST /createRoom` and `POST /join` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomIdResponse {
    /// The created or joined room.
    pub room_id: RoomId,
}

/// `GET /joined_rooms` response.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinedRoomsResponse {
    /// Rooms the member is joined to.
    pub joined_rooms: Vec<RoomId>,
}

/// `GET /rooms/{id}/joined_members` response.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinedMembersResponse {
    /// Joined members keyed by id.
    #[serde(default)]
    pub joined: BTreeMap<MemberId, JoinedMember>,
}

/// Profile of one joined member.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinedMember {
    /// Display name, if set.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// `GET /rooms/{id}/members` response.
#[derive(Debug, Clone, Deserialize)]
pub struct MembersResponse {
    /// Membership state events.
    #[serde(default)]
    pub chunk: Vec<crate::event::Event>,
}

/// `m.room.name` state content.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomNameContent {
    /// The room name.
    #[serde(default)]
    pub name: String,
}

/// `m.room.message` content the bot sends.
#[derive(Debug, Clone, Serialize)]
pub struct MessageContent<'a> {
    /// Always `m.text`.
    pub msgtype: &'static str,
    /// Plain text body.
    pub body: &'a str,
    /// `org.matrix.custom.html` when `formatted_body` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    /// Rendered HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<&'a str>,
}

impl<'a> MessageContent<'a> {
    /// Plain text message.
    pub fn plain(body: &'a str) -> Self {
        Self {
            msgtype: crate::event::TEXT_MSGTYPE,
            body,
            format: None,
            formatted_body: None,
        }
    }

    /// Message carrying both plain and HTML bodies.
    pub fn formatted(body: &'a str, html: &'a str) -> Self {
        Self {
            msgtype: crate::event::TEXT_MSGTYPE,
            body,
            format: Some("org.matrix.custom.html"),
            formatted_body: Some(html),
        }
    }
}

/// Standard error body returned by the homeserver.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Machine readable code such as `M_FORBIDDEN`.
    pub errcode: String,
    /// Human readable message.
    #[serde(default)]
    pub error: String,
}
