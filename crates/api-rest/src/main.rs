//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `medchat-run` binary also runs the Telegram bot.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use api_shared::{load_core_config, rest_addr_from_env_value};
use api_telegram::notifier_from_env_values;
use medchat_core::AssistantService;

/// Main entry point for the MedChat REST API server
///
/// # Environment Variables
/// - `MEDCHAT_REST_ADDR`: Server address (default: "0.0.0.0:5000")
/// - `SUPABASE_URL`, `SUPABASE_KEY`, `GOOGLE_API_KEY`: see `api_shared::load_core_config`
/// - `TELEGRAM_BOT_TOKEN` + `TELEGRAM_CHAT_ID`: enable `/send-notification`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is missing or invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = rest_addr_from_env_value(std::env::var("MEDCHAT_REST_ADDR").ok());

    tracing::info!("-- Starting MedChat REST API on {}", addr);

    let cfg = load_core_config()?;
    let mut state = AppState::new(AssistantService::from_config(&cfg)?);

    match notifier_from_env_values(
        std::env::var("TELEGRAM_BOT_TOKEN").ok(),
        std::env::var("TELEGRAM_CHAT_ID").ok(),
    )? {
        Some(notifier) => state = state.with_notifier(Arc::new(notifier)),
        None => tracing::warn!("TELEGRAM_CHAT_ID not set, /send-notification is disabled"),
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
