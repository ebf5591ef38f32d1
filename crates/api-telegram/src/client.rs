//! Minimal Telegram Bot API client.
//!
//! Every method is called as `POST {base}/bot<token>/<method>` with a JSON body. The token is
//! part of the URL, so URLs are stripped from transport errors before they are returned.

use crate::types::{ApiResponse, Update};
use crate::{TelegramError, TelegramResult};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// Default Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Longest text accepted by `sendMessage`.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Timeout for ordinary method calls.
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    /// # Errors
    ///
    /// Returns `TelegramError::InvalidConfig` for an empty token.
    pub fn new(token: &str) -> TelegramResult<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TelegramError::InvalidConfig(
                "TELEGRAM_BOT_TOKEN cannot be empty".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(TelegramError::HttpClient)?;

        Ok(Self {
            client,
            base_url: TELEGRAM_API_BASE.to_string(),
            token: token.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &Value,
        timeout: Duration,
    ) -> TelegramResult<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramError::Request {
                method,
                source: e.without_url(),
            })?;

        // Error statuses still carry the JSON envelope with a description.
        let envelope: ApiResponse<T> =
            response.json().await.map_err(|e| TelegramError::Decode {
                method,
                source: e.without_url(),
            })?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(TelegramError::Api {
                method,
                error_code,
                description: description.unwrap_or_else(|| "no result".into()),
            }),
        }
    }

    /// Long-polls for new updates.
    ///
    /// `offset` acknowledges every update below it; the server holds the request open for up
    /// to `timeout_secs` when there is nothing to deliver.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> TelegramResult<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        self.call(
            "getUpdates",
            &body,
            Duration::from_secs(timeout_secs + REQUEST_TIMEOUT_SECS),
        )
        .await
    }

    /// Sends `text` to a chat, split into several messages when it is too long.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> TelegramResult<()> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let mut body = json!({ "chat_id": chat_id, "text": chunk });
            if let Some(mode) = parse_mode {
                body["parse_mode"] = json!(mode);
            }
            let _: Value = self
                .call(
                    "sendMessage",
                    &body,
                    Duration::from_secs(REQUEST_TIMEOUT_SECS),
                )
                .await?;
        }
        Ok(())
    }
}

/// Splits text into chunks of at most `max_chars` characters.
///
/// Chunks break on line boundaries; a single line longer than `max_chars` is split hard.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("hello", 10), vec!["hello".to_string()]);
    }

    #[test]
    fn splits_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_message(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc".to_string()]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn long_line_is_split_hard() {
        let text = "x".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(10);
        assert_eq!(split_message(&text, 10).len(), 1);
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramClient::new(" ").is_err());
    }

    #[tokio::test]
    async fn get_updates_sends_offset_and_timeout() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/getUpdates")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "offset": 43,
                "timeout": 30
            })))
            .with_status(200)
            .with_body(
                r#"{"ok":true,"result":[{"update_id":43,"message":{"message_id":1,"chat":{"id":7},"text":"hi"}}]}"#,
            )
            .create_async()
            .await;

        let client = TelegramClient::new("TOKEN").unwrap().with_base_url(server.url());
        let updates = client.get_updates(Some(43), 30).await.expect("updates");

        mock.assert_async().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 43);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 7);
        assert_eq!(message.text.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn api_error_carries_description() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let client = TelegramClient::new("TOKEN").unwrap().with_base_url(server.url());
        match client.send_message(1, "hello", None).await {
            Err(TelegramError::Api {
                method,
                error_code,
                description,
            }) => {
                assert_eq!(method, "sendMessage");
                assert_eq!(error_code, Some(400));
                assert!(description.contains("chat not found"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_message_splits_long_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "chat_id": 5,
                "parse_mode": "Markdown"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":1}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = TelegramClient::new("TOKEN").unwrap().with_base_url(server.url());
        let text = format!("{}\n{}", "a".repeat(3000), "b".repeat(3000));
        client
            .send_message(5, &text, Some("Markdown"))
            .await
            .expect("sent");

        mock.assert_async().await;
    }
}
