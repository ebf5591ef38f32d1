//! Operator notifications delivered to a fixed Telegram chat.

use crate::client::TelegramClient;
use crate::{TelegramError, TelegramResult};
use async_trait::async_trait;
use medchat_core::{Notifier, PatientError, PatientResult};

/// Sends notices to one chat using Telegram's Markdown parse mode.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient, chat_id: i64) -> Self {
        Self { client, chat_id }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> PatientResult<()> {
        self.client
            .send_message(self.chat_id, text, Some("Markdown"))
            .await
            .map_err(|e| PatientError::Notification(e.to_string()))
    }
}

/// Builds a notifier when both `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` are set.
///
/// # Errors
///
/// Returns `TelegramError::InvalidConfig` if the chat id is not an integer.
pub fn notifier_from_env_values(
    token: Option<String>,
    chat_id: Option<String>,
) -> TelegramResult<Option<TelegramNotifier>> {
    let token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let chat_id = chat_id.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

    let (Some(token), Some(chat_id)) = (token, chat_id) else {
        return Ok(None);
    };

    let chat_id = chat_id.parse::<i64>().map_err(|_| {
        TelegramError::InvalidConfig(format!("TELEGRAM_CHAT_ID must be an integer, got `{chat_id}`"))
    })?;

    Ok(Some(TelegramNotifier::new(TelegramClient::new(&token)?, chat_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn notifier_needs_token_and_chat() {
        assert!(notifier_from_env_values(None, Some("1".into())).unwrap().is_none());
        assert!(notifier_from_env_values(Some("t".into()), None).unwrap().is_none());
        assert!(notifier_from_env_values(Some("t".into()), Some("abc".into())).is_err());

        let notifier = notifier_from_env_values(Some("t".into()), Some("-100123".into()))
            .unwrap()
            .expect("configured");
        assert_eq!(notifier.chat_id(), -100123);
    }

    #[tokio::test]
    async fn notify_uses_markdown() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::PartialJson(json!({
                "chat_id": 42,
                "text": "*New Diagnosis Added*",
                "parse_mode": "Markdown"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":1}}"#)
            .create_async()
            .await;

        let client = TelegramClient::new("TOKEN").unwrap().with_base_url(server.url());
        TelegramNotifier::new(client, 42)
            .notify("*New Diagnosis Added*")
            .await
            .expect("delivered");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn notify_maps_failures() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let client = TelegramClient::new("TOKEN").unwrap().with_base_url(server.url());
        let err = TelegramNotifier::new(client, 42).notify("hi").await.unwrap_err();
        assert!(matches!(err, PatientError::Notification(ref m) if m.contains("chat not found")));
    }
}
