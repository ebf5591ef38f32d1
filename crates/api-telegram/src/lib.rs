//! # API Telegram
//!
//! Telegram channel for MedChat.
//!
//! Handles:
//! - Bot API calls (`getUpdates` long polling, `sendMessage` with splitting)
//! - The volatile chat-to-patient session map
//! - The per-chat login/question state machine
//! - Operator notifications for the REST `/send-notification` endpoint
//!
//! Uses `medchat-core` for record lookups and answers.

#![warn(rust_2018_idioms)]

pub mod client;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod relay;
pub mod sessions;
pub mod types;

pub use client::{split_message, TelegramClient, MAX_MESSAGE_CHARS};
pub use error::{TelegramError, TelegramResult};
pub use notifier::{notifier_from_env_values, TelegramNotifier};
pub use poller::Poller;
pub use relay::{Command, Relay};
pub use sessions::{Session, SessionStore};
