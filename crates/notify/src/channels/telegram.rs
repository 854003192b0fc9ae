//! Telegram Bot API notification channel.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::events::NotifyEvent;
use crate::NotifyChannel;

/// Public Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum message length accepted by `sendMessage`.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram notification channel posting to a single chat.
pub struct TelegramChannel {
    bot_token: String,
    chat_id: String,
    api_base: String,
    client: reqwest::Client,
}

impl fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramChannel {
    /// Create a Telegram channel for a bot token and destination chat.
    ///
    /// Fails with [`ChannelError::NotConfigured`] when either value is blank.
    pub fn new(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let bot_token = bot_token.into().trim().to_string();
        let chat_id = chat_id.into().trim().to_string();
        if bot_token.is_empty() {
            return Err(ChannelError::NotConfigured("bot token is empty".to_string()));
        }
        if chat_id.is_empty() {
            return Err(ChannelError::NotConfigured("chat id is empty".to_string()));
        }

        Ok(Self {
            bot_token,
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
            client: build_client(timeout)?,
        })
    }

    /// Point the channel at a different Bot API server.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Format an event as a `sendMessage` payload.
    fn format_payload(&self, event: &NotifyEvent) -> SendMessage {
        SendMessage {
            chat_id: self.chat_id.clone(),
            text: fit_message(event, MAX_MESSAGE_CHARS),
            disable_web_page_preview: false,
        }
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, ChannelError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Render an event so that it fits in `limit` characters.
///
/// Only the post text is shortened; the title and permalink are kept whole.
fn fit_message(event: &NotifyEvent, limit: usize) -> String {
    let rendered = event.render();
    if rendered.chars().count() <= limit {
        return rendered;
    }

    let NotifyEvent::NewPost { text, url, .. } = event;
    let title = event.title();
    // Two blank-line separators plus the ellipsis.
    let overhead = title.chars().count() + url.chars().count() + 4 + 1;
    let budget = limit.saturating_sub(overhead);
    let truncated: String = text.trim().chars().take(budget).collect();

    format!("{title}\n\n{}…\n\n{url}", truncated.trim_end())
}

#[async_trait]
impl NotifyChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let payload = self.format_payload(event);

        debug!(channel = "telegram", post_id = event.id(), "Sending notification");

        let response = self
            .client
            .post(format!("{}/bot{}/sendMessage", self.api_base, self.bot_token))
            .json(&payload)
            .send()
            .await
            // The request URL embeds the bot token.
            .map_err(|e| ChannelError::Http(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            debug!(
                channel = "telegram",
                post_id = event.id(),
                "Notification sent successfully"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();

        warn!(
            channel = "telegram",
            status = %status,
            body = %body,
            "Telegram sendMessage request failed"
        );

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.parameters)
                .and_then(|p| p.retry_after)
                .unwrap_or(0);
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        Err(ChannelError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

// =============================================================================
// Telegram API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SendMessage {
    chat_id: String,
    text: String,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}
