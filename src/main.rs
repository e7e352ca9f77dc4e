//! roomwarden - Matrix room moderation bot.

use anyhow::Context as _;
use roomwarden::bot::{Bot, BotParams};
use roomwarden::client::{CommonMarkRenderer, HomeserverClient, RateLimited};
use roomwarden::config::{ConfigStore, validation};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "roomwarden.toml".to_string());

    let store = ConfigStore::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;
    let config = store.snapshot();

    roomwarden::telemetry::init(&config.logging);

    if let Err(problems) = validation::validate(&config) {
        for problem in &problems {
            error!(path = %config_path, "Invalid config: {problem}");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", problems.len());
    }

    info!(
        homeserver = %config.homeserver.url,
        rooms = config.rooms.len(),
        admins = config.admins.len(),
        "Starting roomwarden v{}",
        env!("CARGO_PKG_VERSION")
    );

    roomwarden::metrics::init();
    if config.bot.metrics_port != 0 {
        tokio::spawn(roomwarden::http::run_http_server(config.bot.metrics_port));
    }

    let store = Arc::new(store);
    let client = HomeserverClient::new(Arc::clone(&store)).context("failed to build HTTP client")?;
    let self_id = client.login().await.context("homeserver login failed")?;
    info!(self_id = %self_id, "Logged in");

    let client = Arc::new(client);
    let actions = Arc::new(RateLimited::from_config(
        client.as_ref().clone(),
        &config.actions,
    ));

    let bot = Bot::new(BotParams {
        config: store,
        actions,
        messaging: client.clone(),
        renderer: Arc::new(CommonMarkRenderer),
        self_id,
    });
    let tasks = bot.start(client).await;

    tokio::select! {
        _ = bot.shutdown_requested() => info!("Shutting down on request"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down on signal");
        }
    }
    tasks.abort();

    Ok(())
}
