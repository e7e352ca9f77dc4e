//! Welcome room manager.
//!
//! A join in a WELCOME room spawns a private room for the newcomer. The room
//! lives until the member leaves it or it reaches the configured lifetime,
//! whichever comes first. Eviction always goes through
//! [`WelcomeRegistry::remove`](crate::state::WelcomeRegistry::remove) first;
//! only the caller that removed the entry issues the leave.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use warden_proto::request::CreateRoomRequest;
use warden_proto::{MemberId, RoomId, RoomMode};

use crate::bot::{Bot, record_failure};
use crate::error::ActionResult;
use crate::state::WelcomeRoom;

/// Why a welcome room is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    Departure,
    Timeout,
}

impl Eviction {
    fn as_str(self) -> &'static str {
        match self {
            Eviction::Departure => "departure",
            Eviction::Timeout => "timeout",
        }
    }
}

/// Substitute `{member}` and `{room}` in a welcome template.
pub fn render_template(template: &str, member: &MemberId, room_name: &str) -> String {
    template
        .replace("{member}", member.as_str())
        .replace("{room}", room_name)
}

/// Welcome template for `source`: the WELCOME parameter names a variable
/// whose payload is used, or is the message text itself.
pub fn welcome_template(bot: &Bot, source: &RoomId) -> Option<String> {
    let param = bot.config.param(source, RoomMode::Welcome)?;
    if param.is_empty() {
        return None;
    }
    Some(bot.config.var(&param).unwrap_or(param))
}

/// Create a welcome room for `member`, post the greeting and register it.
pub async fn create_welcome(bot: &Bot, source: &RoomId, member: &MemberId) -> ActionResult<RoomId> {
    let settings = bot.config.read(|c| c.welcome.clone());
    let mut request = CreateRoomRequest::direct(member.clone());
    request.name = Some(settings.room_name);
    request.topic = settings.room_topic;
    request.room_alias_name = Some(uuid::Uuid::new_v4().simple().to_string());

    let room = bot
        .actions
        .create(&request)
        .await
        .inspect_err(|e| record_failure("create", e))?;

    bot.welcome.register(WelcomeRoom {
        id: room.clone(),
        member: member.clone(),
        source: source.clone(),
        created_at: Instant::now(),
    });
    info!(room = %room, member = %member, source = %source, "Welcome room created");

    if let Some(template) = welcome_template(bot, source) {
        let source_name = bot.display_names(std::slice::from_ref(source)).await;
        let source_name = source_name
            .get(source)
            .cloned()
            .unwrap_or_else(|| source.to_string());
        let message = render_template(&template, member, &source_name);
        // A failed greeting still leaves a usable room.
        let _ = bot.post_markdown(&room, &message).await;
    }
    Ok(room)
}

/// Fire-and-forget [`create_welcome`].
pub fn spawn_welcome(bot: &Arc<Bot>, source: &RoomId, member: MemberId) -> JoinHandle<()> {
    let bot = Arc::clone(bot);
    let source = source.clone();
    tokio::spawn(async move {
        if let Err(e) = create_welcome(&bot, &source, &member).await {
            warn!(source = %source, member = %member, error = %e, "Failed to create welcome room");
        }
    })
}

/// Close a welcome room. Returns `false` when another path already did.
pub async fn evict(bot: &Bot, room: &RoomId, reason: Eviction) -> bool {
    let Some(entry) = bot.welcome.remove(room) else {
        return false;
    };
    crate::metrics::record_welcome_eviction(reason.as_str());
    info!(room = %room, member = %entry.member, reason = reason.as_str(), "Closing welcome room");
    if let Err(e) = bot.actions.leave(room).await {
        record_failure("leave", &e);
        warn!(room = %room, error = %e, "Failed to leave welcome room");
    }
    true
}

/// Evict every welcome room that reached its lifetime at `now`.
pub async fn sweep(bot: &Bot, now: Instant) -> usize {
    let lifetime = Duration::from_secs(bot.config.read(|c| c.welcome.lifetime_secs));
    let mut evicted = 0;
    for entry in bot.welcome.expired(now, lifetime) {
        if evict(bot, &entry.id, Eviction::Timeout).await {
            evicted += 1;
        }
    }
    if evicted > 0 {
        debug!(evicted, remaining = bot.welcome.len(), "Welcome sweep");
    }
    evicted
}

/// Run [`sweep`] every `sweep_secs`.
pub fn spawn_sweep_task(bot: Arc<Bot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(bot.config.read(|c| c.welcome.sweep_secs).max(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            sweep(&bot, Instant::now()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::test_support::*;
    use crate::client::fake::FakeHomeserver;

    fn m(id: &str) -> MemberId {
        MemberId::new(id)
    }

    fn welcome_bot(fake: &FakeHomeserver, param: Option<&str>) -> Arc<Bot> {
        let mut cfg = config(&[("!a:x", &[RoomMode::Welcome])]);
        cfg.vars.insert("greeting".into(), "Hi {member}, welcome to {room}".into());
        if let Some(param) = param {
            if let Some(room) = cfg.rooms.get_mut(&RoomId::new("!a:x")) {
                room.params.insert("WELCOME".into(), param.into());
            }
        }
        bot(cfg, fake)
    }

    #[test]
    fn test_render_template() {
        assert_eq!(
            render_template("Hi {member} in {room}", &m("@bob:x"), "Lobby"),
            "Hi @bob:x in Lobby"
        );
        assert_eq!(render_template("plain", &m("@bob:x"), "Lobby"), "plain");
    }

    #[tokio::test]
    async fn test_template_from_variable() {
        let fake = FakeHomeserver::new(SELF_ID);
        let source = RoomId::new("!a:x");
        let bot = welcome_bot(&fake, Some("greeting"));
        let room = create_welcome(&bot, &source, &m("@bob:x")).await.unwrap();

        assert!(bot.welcome.contains(&room));
        let created = fake.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].invite, vec![m("@bob:x")]);
        assert_eq!(created[0].name.as_deref(), Some("Welcome"));
        assert_eq!(
            fake.sent(),
            vec![(room, "Hi @bob:x, welcome to !a:x".to_string())]
        );
    }

    #[tokio::test]
    async fn test_literal_template_and_no_param() {
        let fake = FakeHomeserver::new(SELF_ID);
        let source = RoomId::new("!a:x");
        let bot = welcome_bot(&fake, Some("Hello {member}"));
        let room = create_welcome(&bot, &source, &m("@bob:x")).await.unwrap();
        assert_eq!(fake.sent(), vec![(room, "Hello @bob:x".to_string())]);

        let fake = FakeHomeserver::new(SELF_ID);
        let bot = welcome_bot(&fake, None);
        create_welcome(&bot, &source, &m("@bob:x")).await.unwrap();
        assert!(fake.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_respects_lifetime() {
        let fake = FakeHomeserver::new(SELF_ID);
        let bot = welcome_bot(&fake, None);
        let t0 = Instant::now();
        let room = create_welcome(&bot, &RoomId::new("!a:x"), &m("@bob:x")).await.unwrap();

        assert_eq!(sweep(&bot, t0 + Duration::from_secs(3599)).await, 0);
        assert!(bot.welcome.contains(&room));

        assert_eq!(sweep(&bot, t0 + Duration::from_secs(3600)).await, 1);
        assert!(!bot.welcome.contains(&room));
        assert_eq!(fake.leaves(), vec![room]);
    }

    #[tokio::test]
    async fn test_eviction_happens_once() {
        let fake = FakeHomeserver::new(SELF_ID);
        let bot = welcome_bot(&fake, None);
        let room = create_welcome(&bot, &RoomId::new("!a:x"), &m("@bob:x")).await.unwrap();

        assert!(evict(&bot, &room, Eviction::Departure).await);
        assert!(!evict(&bot, &room, Eviction::Timeout).await);
        assert_eq!(fake.leaves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_evicts_expired_rooms() {
        let fake = FakeHomeserver::new(SELF_ID);
        let bot = welcome_bot(&fake, None);
        let room = create_welcome(&bot, &RoomId::new("!a:x"), &m("@bob:x")).await.unwrap();

        let task = spawn_sweep_task(Arc::clone(&bot));
        tokio::time::sleep(Duration::from_secs(3500)).await;
        assert!(bot.welcome.contains(&room));

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert!(!bot.welcome.contains(&room));
        task.abort();
    }
}
