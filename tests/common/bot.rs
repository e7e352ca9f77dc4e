//! Running bot wired to a [`FakeHomeserver`].

use roomwarden::bot::{Bot, BotParams, BotTasks};
use roomwarden::client::{CommonMarkRenderer, HomeserverClient, RateLimited};
use roomwarden::config::ConfigStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use super::homeserver::FakeHomeserver;

pub struct TestBot {
    pub bot: Arc<Bot>,
    pub config_path: std::path::PathBuf,
    tasks: BotTasks,
    _dir: TempDir,
}

impl Drop for TestBot {
    fn drop(&mut self) {
        self.tasks.abort();
    }
}

/// Config text for `server` with the given `[rooms.*]` tables appended.
pub fn config_toml(server: &FakeHomeserver, rooms: &str) -> String {
    format!(
        r#"admins = ["@op:example.org"]

[homeserver]
url = "{url}"
login = "warden"
password = "secret"

[bot]
sync_timeout_ms = 100
poll_retry_secs = 1

[actions]
actions_per_second = 100
burst = 100

{rooms}
"#,
        url = server.url()
    )
}

impl TestBot {
    /// Write `config` to a temp file, log in and start the bot.
    pub async fn start(config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("roomwarden.toml");
        std::fs::write(&config_path, config).unwrap();

        let store = Arc::new(ConfigStore::load(&config_path).unwrap());
        let client = HomeserverClient::new(Arc::clone(&store)).unwrap();
        let self_id = client.login().await.unwrap();
        let actions_config = store.read(|c| c.actions.clone());

        let client = Arc::new(client);
        let bot = Bot::new(BotParams {
            config: store,
            actions: Arc::new(RateLimited::from_config((*client).clone(), &actions_config)),
            messaging: client.clone(),
            renderer: Arc::new(CommonMarkRenderer),
            self_id,
        });
        let tasks = bot.start(client).await;

        Self {
            bot,
            config_path,
            tasks,
            _dir: dir,
        }
    }
}

/// Poll `check` until it holds or five seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..250 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
