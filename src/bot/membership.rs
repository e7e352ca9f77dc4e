//! Applying classified membership transitions.

use std::sync::Arc;
use tracing::{debug, warn};
use warden_proto::{RoomId, RoomMode};

use super::Bot;
use crate::services::{banlist, welcome};
use crate::state::JoinOutcome;
use crate::sync::Transition;

impl Bot {
    /// Update the room record for one transition and run its follow-ups.
    ///
    /// Propagation is awaited so the next event of the batch sees its
    /// effects; welcome room creation is spawned.
    pub async fn apply_transition(self: &Arc<Self>, room: &RoomId, transition: Transition) {
        match transition {
            Transition::Join { member } => {
                let outcome = self.rooms.apply_join(room, &member);
                if outcome == JoinOutcome::Joined
                    && !self.is_self(&member)
                    && self.rooms.has_mode(room, RoomMode::Welcome)
                {
                    welcome::spawn_welcome(self, room, member);
                }
            }
            Transition::Leave { member } => {
                self.rooms.apply_leave(room, &member);
            }
            Transition::Unban { member, moderator } => {
                self.rooms.apply_unban(room, &member);
                if !self.is_self(&moderator) {
                    banlist::propagate_unban(self, room, &member).await;
                }
            }
            Transition::Ban {
                member,
                moderator,
                reason,
                propagate,
            } => {
                self.rooms.apply_ban(room, &member, &reason);
                if propagate {
                    banlist::propagate_ban(self, room, &member, &reason).await;
                } else {
                    debug!(room = %room, member = %member, moderator = %moderator, "Ban recorded without propagation");
                }
            }
            Transition::Other { membership } => {
                warn!(room = %room, membership = %membership, "Unhandled membership change");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::client::fake::FakeHomeserver;
    use warden_proto::MemberId;

    const TARGET: &[RoomMode] = &[RoomMode::BanlistSync, RoomMode::SelfModerator];

    fn m(id: &str) -> MemberId {
        MemberId::new(id)
    }

    #[tokio::test]
    async fn test_self_issued_ban_not_propagated() {
        let fake = FakeHomeserver::new(SELF_ID);
        let (a, b) = (RoomId::new("!a:x"), RoomId::new("!b:x"));
        let bot = bot(config(&[("!a:x", TARGET), ("!b:x", TARGET)]), &fake);
        bot.join_room(&a).await.unwrap();
        bot.join_room(&b).await.unwrap();

        bot.apply_transition(
            &a,
            Transition::Ban {
                member: m("@eve:x"),
                moderator: m(SELF_ID),
                reason: String::new(),
                propagate: false,
            },
        )
        .await;
        assert!(bot.rooms.is_banned(&a, &m("@eve:x")));
        assert!(!bot.rooms.is_banned(&b, &m("@eve:x")));
        assert!(fake.bans().is_empty());
    }

    #[tokio::test]
    async fn test_ban_in_non_sync_room_reaches_eligible_rooms() {
        let fake = FakeHomeserver::new(SELF_ID);
        let (a, b) = (RoomId::new("!a:x"), RoomId::new("!b:x"));
        let bot = bot(config(&[("!a:x", &[RoomMode::SelfModerator]), ("!b:x", TARGET)]), &fake);
        bot.join_room(&a).await.unwrap();
        bot.join_room(&b).await.unwrap();

        bot.apply_transition(
            &a,
            Transition::Ban {
                member: m("@eve:x"),
                moderator: m("@mod:x"),
                reason: "spam".into(),
                propagate: true,
            },
        )
        .await;
        assert!(bot.rooms.is_banned(&a, &m("@eve:x")));
        assert!(bot.rooms.is_banned(&b, &m("@eve:x")));
        assert_eq!(fake.bans(), vec![(b.clone(), m("@eve:x"), "spam".to_string())]);
    }

    #[tokio::test]
    async fn test_unban_in_non_sync_room_reaches_eligible_rooms() {
        let fake = FakeHomeserver::new(SELF_ID);
        let (a, b) = (RoomId::new("!a:x"), RoomId::new("!b:x"));
        fake.add_room(&a, &[], &[("@eve:x", "spam")]);
        fake.add_room(&b, &[], &[("@eve:x", "spam")]);
        let bot = bot(config(&[("!a:x", &[RoomMode::SelfModerator]), ("!b:x", TARGET)]), &fake);
        bot.join_room(&a).await.unwrap();
        bot.join_room(&b).await.unwrap();

        bot.apply_transition(
            &a,
            Transition::Unban {
                member: m("@eve:x"),
                moderator: m("@mod:x"),
            },
        )
        .await;
        assert!(!bot.rooms.is_banned(&b, &m("@eve:x")));
        assert_eq!(fake.unbans(), vec![(b.clone(), m("@eve:x"))]);
    }

    #[tokio::test]
    async fn test_observed_unban_propagates() {
        let fake = FakeHomeserver::new(SELF_ID);
        let (a, b) = (RoomId::new("!a:x"), RoomId::new("!b:x"));
        fake.add_room(&a, &[], &[("@eve:x", "spam")]);
        fake.add_room(&b, &[], &[("@eve:x", "spam")]);
        let bot = bot(config(&[("!a:x", TARGET), ("!b:x", TARGET)]), &fake);
        bot.join_room(&a).await.unwrap();
        bot.join_room(&b).await.unwrap();
        let members_before = bot.rooms.snapshot(&a).unwrap().members;

        bot.apply_transition(
            &a,
            Transition::Unban {
                member: m("@eve:x"),
                moderator: m("@mod:x"),
            },
        )
        .await;
        assert!(!bot.rooms.is_banned(&a, &m("@eve:x")));
        assert_eq!(bot.rooms.snapshot(&a).unwrap().members, members_before);
        assert_eq!(fake.unbans(), vec![(b.clone(), m("@eve:x"))]);
    }

    #[tokio::test]
    async fn test_join_in_welcome_room_spawns_welcome() {
        let fake = FakeHomeserver::new(SELF_ID);
        let a = RoomId::new("!a:x");
        let bot = bot(config(&[("!a:x", &[RoomMode::Welcome])]), &fake);
        bot.join_room(&a).await.unwrap();

        bot.apply_transition(&a, Transition::Join { member: m("@bob:x") }).await;
        for _ in 0..10 {
            if !fake.created().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(fake.created().len(), 1);
        assert!(bot.rooms.is_member(&a, &m("@bob:x")));
    }
}
