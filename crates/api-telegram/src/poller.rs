//! Long-polling loop.
//!
//! A single worker fetches updates, relays each one and sends the reply before fetching the
//! next batch, so every chat's messages are handled in order.

use crate::client::TelegramClient;
use crate::relay::Relay;
use crate::TelegramResult;
use std::time::Duration;

/// Seconds the Bot API may hold a `getUpdates` call open.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct Poller {
    client: TelegramClient,
    relay: Relay,
    offset: Option<i64>,
    timeout_secs: u64,
}

impl Poller {
    pub fn new(client: TelegramClient, relay: Relay) -> Self {
        Self {
            client,
            relay,
            offset: None,
            timeout_secs: POLL_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Offset sent with the next `getUpdates` call.
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetches and handles one batch of updates, returning how many were received.
    ///
    /// # Errors
    ///
    /// Returns the `getUpdates` failure. Reply delivery failures are logged and skipped.
    pub async fn poll_once(&mut self) -> TelegramResult<usize> {
        let updates = self
            .client
            .get_updates(self.offset, self.timeout_secs)
            .await?;

        for update in &updates {
            self.offset = Some(update.update_id + 1);

            let Some((chat_id, reply)) = self.relay.handle_update(update).await else {
                continue;
            };
            if let Err(e) = self.client.send_message(chat_id, &reply, None).await {
                tracing::error!(chat_id, "reply delivery error: {:?}", e);
            }
        }

        Ok(updates.len())
    }

    /// Polls forever. Errors are logged and followed by a fixed [`RETRY_DELAY`].
    pub async fn run(mut self) {
        tracing::info!("++ Telegram poller started");
        loop {
            match self.poll_once().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(updates = n, offset = ?self.offset, "handled updates"),
                Err(e) => {
                    tracing::error!("Telegram polling error: {:?}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
}
