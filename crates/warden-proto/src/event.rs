//! Timeline events.
//!
//! Only the fields the bot inspects are typed; `content` stays as raw JSON
//! until one of the accessors interprets it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::id::MemberId;

/// Event type of membership changes.
pub const MEMBER_EVENT: &str = "m.room.member";
/// Event type of chat messages.
pub const MESSAGE_EVENT: &str = "m.room.message";
/// Message type of plain text chat messages.
pub const TEXT_MSGTYPE: &str = "m.text";

/// One event from a room timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type, e.g. `m.room.member`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Server assigned event id.
    #[serde(default)]
    pub event_id: String,
    /// Member that sent the event.
    pub sender: MemberId,
    /// Server timestamp in milliseconds since the epoch.
    #[serde(default)]
    pub origin_server_ts: i64,
    /// Present on state events; for membership it names the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    /// Raw event content.
    #[serde(default)]
    pub content: Value,
}

/// The `membership` value of an `m.room.member` event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Membership {
    /// `join`
    Join,
    /// `leave`; also used on the wire for kicks and unbans.
    Leave,
    /// `ban`
    Ban,
    /// `invite`, `knock` or anything unknown.
    Other(String),
}

impl From<String> for Membership {
    fn from(value: String) -> Self {
        match value.as_str() {
            "join" => Membership::Join,
            "leave" => Membership::Leave,
            "ban" => Membership::Ban,
            _ => Membership::Other(value),
        }
    }
}

impl From<Membership> for String {
    fn from(value: Membership) -> Self {
        value.as_str().to_string()
    }
}

impl Membership {
    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Membership::Join => "join",
            Membership::Leave => "leave",
            Membership::Ban => "ban",
            Membership::Other(other) => other,
        }
    }
}

/// Typed content of an `m.room.member` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberContent {
    /// New membership state.
    pub membership: Membership,
    /// Moderator supplied reason for kicks and bans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Display name at the time of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayname: Option<String>,
}

impl Event {
    /// Builds a membership event for `subject`, as sent by `sender`.
    pub fn member(
        sender: MemberId,
        subject: &MemberId,
        membership: Membership,
        reason: Option<&str>,
        origin_server_ts: i64,
    ) -> Self {
        let content = MemberContent {
            membership,
            reason: reason.map(str::to_string),
            displayname: None,
        };
        Self {
            kind: MEMBER_EVENT.to_string(),
            event_id: String::new(),
            sender,
            origin_server_ts,
            state_key: Some(subject.to_string()),
            content: serde_json::to_value(content).unwrap_or(Value::Null),
        }
    }

    /// Builds a plain text chat message.
    pub fn text(sender: MemberId, body: &str, origin_server_ts: i64) -> Self {
        Self {
            kind: MESSAGE_EVENT.to_string(),
            event_id: String::new(),
            sender,
            origin_server_ts,
            state_key: None,
            content: json!({ "msgtype": TEXT_MSGTYPE, "body": body }),
        }
    }

    /// True for `m.room.member` events.
    pub fn is_membership(&self) -> bool {
        self.kind == MEMBER_EVENT
    }

    /// Interprets the content of a membership event.
    ///
    /// Returns `None` for other event types and `Some(Err(_))` when the
    /// content does not have the membership shape.
    pub fn member_content(&self) -> Option<Result<MemberContent, serde_json::Error>> {
        if !self.is_membership() {
            return None;
        }
        Some(serde_json::from_value(self.content.clone()))
    }

    /// The member a membership event is about.
    ///
    /// This is the state key; events without one are taken to be about their
    /// sender.
    pub fn subject(&self) -> MemberId {
        match &self.state_key {
            Some(key) if !key.is_empty() => MemberId::new(key.clone()),
            _ => self.sender.clone(),
        }
    }

    /// Body of a plain text chat message, if this is one.
    pub fn text_body(&self) -> Option<&str> {
        if self.kind != MESSAGE_EVENT {
            return None;
        }
        if self.content.get("msgtype").and_then(Value::as_str) != Some(TEXT_MSGTYPE) {
            return None;
        }
        self.content.get("body").and_then(Value::as_str)
    }
}
