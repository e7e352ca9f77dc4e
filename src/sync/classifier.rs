//! Event Classifier.
//!
//! Turns one raw timeline event into a typed outcome. Classification reads
//! the room's current record (is the subject a member? banned?), so events
//! of one room must be classified and applied strictly in order.

use warden_proto::event::Membership;
use warden_proto::{Event, MemberId, RoomId};

use crate::state::RoomStore;

/// A membership change derived from an `m.room.member` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Join {
        member: MemberId,
    },
    Leave {
        member: MemberId,
    },
    /// A leave-shaped event for a member the room lists as banned.
    Unban {
        member: MemberId,
        moderator: MemberId,
    },
    Ban {
        member: MemberId,
        moderator: MemberId,
        reason: String,
        /// `false` when the bot itself issued the ban.
        propagate: bool,
    },
    /// Invite, knock, unknown or malformed membership.
    Other {
        membership: String,
    },
}

impl Transition {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Transition::Join { .. } => "join",
            Transition::Leave { .. } => "leave",
            Transition::Unban { .. } => "unban",
            Transition::Ban { .. } => "ban",
            Transition::Other { .. } => "other",
        }
    }
}

/// Outcome of classifying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// At or before the ready timestamp.
    Stale,
    /// Plain text chat message, destined for the command router.
    Chat { sender: MemberId, body: String },
    Membership(Transition),
    /// A join from someone already present (display name or avatar change).
    ProfileUpdate { member: MemberId },
    /// Any other event type.
    Ignored,
}

/// Classifier bound to one bot identity and ready timestamp.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    self_id: &'a MemberId,
    ready_ts: i64,
}

impl<'a> Classifier<'a> {
    pub fn new(self_id: &'a MemberId, ready_ts: i64) -> Self {
        Self { self_id, ready_ts }
    }

    pub fn classify(&self, store: &RoomStore, room: &RoomId, event: &Event) -> Classified {
        if event.origin_server_ts <= self.ready_ts {
            return Classified::Stale;
        }

        if let Some(body) = event.text_body() {
            return Classified::Chat {
                sender: event.sender.clone(),
                body: body.to_string(),
            };
        }

        let content = match event.member_content() {
            None => return Classified::Ignored,
            Some(Ok(content)) => content,
            Some(Err(e)) => {
                tracing::warn!(room = %room, event = %event.event_id, error = %e, "Malformed membership event");
                return Classified::Membership(Transition::Other {
                    membership: String::new(),
                });
            }
        };

        let member = event.subject();
        let transition = match content.membership {
            Membership::Join => {
                if store.is_member(room, &member) {
                    return Classified::ProfileUpdate { member };
                }
                Transition::Join { member }
            }
            Membership::Leave => {
                if store.is_banned(room, &member) {
                    Transition::Unban {
                        member,
                        moderator: event.sender.clone(),
                    }
                } else {
                    Transition::Leave { member }
                }
            }
            Membership::Ban => Transition::Ban {
                member,
                propagate: &event.sender != self.self_id,
                moderator: event.sender.clone(),
                reason: content.reason.unwrap_or_default(),
            },
            Membership::Other(membership) => Transition::Other { membership },
        };
        Classified::Membership(transition)
    }
}
