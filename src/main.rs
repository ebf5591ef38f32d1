use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use api_shared::{load_core_config, rest_addr_from_env_value};
use api_telegram::{Poller, Relay, SessionStore, TelegramClient, notifier_from_env_values};
use medchat_core::AssistantService;

/// Main entry point for the MedChat application
///
/// Starts the REST server and, when a bot token is configured, the Telegram poller:
/// - REST server on port 5000 (configurable via MEDCHAT_REST_ADDR)
/// - Telegram long polling (enabled by TELEGRAM_BOT_TOKEN)
///
/// Both share one `AssistantService`.
///
/// # Environment Variables
/// - `MEDCHAT_REST_ADDR`: REST server address (default: "0.0.0.0:5000")
/// - `SUPABASE_URL`, `SUPABASE_KEY`: record store project URL and key
/// - `GOOGLE_API_KEY`: Gemini API key
/// - `GEMINI_MODEL`: Gemini model (default: "gemini-2.5-flash")
/// - `PROMPT_MAX_RECORDS`: records per kind in a prompt (default: 50)
/// - `TELEGRAM_BOT_TOKEN`: enables the Telegram bot
/// - `TELEGRAM_CHAT_ID`: with the token, enables `/send-notification`
///
/// # Returns
/// * `Ok(())` - If servers start and run successfully
/// * `Err(anyhow::Error)` - If configuration, server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medchat_run=info".parse()?)
                .add_directive("medchat_core=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("api_telegram=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = rest_addr_from_env_value(std::env::var("MEDCHAT_REST_ADDR").ok());
    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());

    let cfg = load_core_config()?;
    let assistant = AssistantService::from_config(&cfg)?;

    let mut state = AppState::new(assistant.clone());
    if let Some(notifier) =
        notifier_from_env_values(bot_token.clone(), std::env::var("TELEGRAM_CHAT_ID").ok())?
    {
        state = state.with_notifier(Arc::new(notifier));
    }

    tracing::info!("++ Starting MedChat REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let rest_server = tokio::spawn(async move { axum::serve(listener, router(state)).await });

    // Start Telegram poller
    let poller = match bot_token {
        Some(token) => {
            let client = TelegramClient::new(&token)?;
            let poller = Poller::new(client, Relay::new(assistant, SessionStore::new()));
            Some(tokio::spawn(poller.run()))
        }
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, Telegram bot disabled");
            None
        }
    };

    // Run both; the process stops when either side stops
    match poller {
        Some(poller) => tokio::select! {
            rest_result = rest_server => rest_result??,
            poller_result = poller => poller_result?,
        },
        None => rest_server.await??,
    }

    Ok(())
}
