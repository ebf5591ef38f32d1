//! Standalone Telegram bot binary.
//!
//! ## Purpose
//! Runs the Telegram long-polling bot on its own.
//!
//! ## Intended use
//! Useful when the bot is deployed separately from the HTTP API. The workspace's main
//! `medchat-run` binary runs the REST server and the bot concurrently.

use api_shared::load_core_config;
use api_telegram::{Poller, Relay, SessionStore, TelegramClient};
use medchat_core::AssistantService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MedChat Telegram bot
///
/// # Environment Variables
/// - `TELEGRAM_BOT_TOKEN`: Bot API token (required)
/// - `SUPABASE_URL`, `SUPABASE_KEY`, `GOOGLE_API_KEY`: see `api_shared::load_core_config`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is missing or invalid, or
/// - the HTTP clients cannot be built.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_telegram=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token = std::env::var("TELEGRAM_BOT_TOKEN")
        .map_err(|_| anyhow::anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

    let cfg = load_core_config()?;
    let assistant = AssistantService::from_config(&cfg)?;
    let client = TelegramClient::new(&token)?;

    tracing::info!("-- Starting MedChat Telegram bot");

    Poller::new(client, Relay::new(assistant, SessionStore::new()))
        .run()
        .await;

    Ok(())
}
