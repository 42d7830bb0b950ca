//! Telegram Bot API client — long-polls for updates and implements
//! [`BotApi`] over HTTPS JSON calls.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::api::{BotApi, BotCommand, ChatId, MessageId};
use super::keyboard::InlineKeyboard;
use super::update::{BotEvent, Update};
use crate::error::ChannelError;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Edits that change nothing are reported as errors by the Bot API.
const NOT_MODIFIED: &str = "message is not modified";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(token: SecretString) -> Self {
        Self {
            token,
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at another Bot API server (local server, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.token.expose_secret()
        )
    }

    /// POST `body` to `method` and unwrap the `{ok, result}` envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, ChannelError> {
        self.call_with_timeout(method, body, None).await
    }

    async fn call_with_timeout<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<T, ChannelError> {
        let mut request = self.client.post(self.api_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ChannelError::Http(format!("{method}: {e}")))?;
        let status = resp.status();

        let envelope: ApiResponse<T> = resp
            .json()
            .await
            .map_err(|e| ChannelError::telegram(method, format!("{status}: bad response: {e}")))?;

        if !envelope.ok {
            return Err(ChannelError::telegram(
                method,
                envelope
                    .description
                    .unwrap_or_else(|| format!("request failed with {status}")),
            ));
        }
        envelope
            .result
            .ok_or_else(|| ChannelError::InvalidMessage(format!("{method}: missing result")))
    }

    /// Run an edit call, treating "not modified" as success.
    async fn call_edit(&self, method: &str, body: &Value) -> Result<(), ChannelError> {
        match self.call::<Value>(method, body).await {
            Ok(_) => Ok(()),
            Err(ChannelError::SendFailed { reason, .. }) if reason.contains(NOT_MODIFIED) => {
                tracing::debug!(method, "Edit left message unchanged");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch pending updates after `offset`, waiting up to `timeout`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, ChannelError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"]
        });
        self.call_with_timeout("getUpdates", &body, Some(timeout + Duration::from_secs(10)))
            .await
    }

    /// Long-poll forever, yielding decoded events in arrival order.
    pub fn updates(&self, poll_timeout: Duration) -> BoxStream<'static, BotEvent> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let client = self.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;
            tracing::info!("Telegram bot listening for updates...");

            loop {
                let updates = match client.get_updates(offset, poll_timeout).await {
                    Ok(updates) => updates,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                for update in updates {
                    // Advance offset past this update
                    offset = offset.max(update.update_id + 1);
                    let update_id = update.update_id;

                    let Some(event) = update.into_event() else {
                        tracing::debug!(update_id, "Skipping unhandled update");
                        continue;
                    };
                    if tx.send(event).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        Box::pin(stream)
    }
}

fn with_keyboard(mut body: Value, keyboard: Option<&InlineKeyboard>) -> Value {
    if let Some(kb) = keyboard.filter(|kb| !kb.is_empty()) {
        body["reply_markup"] = json!(kb);
    }
    body
}

#[async_trait]
impl BotApi for TelegramClient {
    /// Long texts are split; the keyboard goes on the last chunk.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);
        let mut sent_id = 0;

        for (i, chunk) in chunks.iter().enumerate() {
            let body = json!({ "chat_id": chat_id, "text": chunk });
            let body = if i == last {
                with_keyboard(body, keyboard)
            } else {
                body
            };
            let sent: SentMessage = self.call("sendMessage", &body).await?;
            sent_id = sent.message_id;
        }
        Ok(sent_id)
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError> {
        let body = with_keyboard(
            json!({ "chat_id": chat_id, "photo": photo, "caption": caption }),
            keyboard,
        );
        let sent: SentMessage = self.call("sendPhoto", &body).await?;
        tracing::debug!(chat_id, message_id = sent.message_id, "Telegram photo sent");
        Ok(sent.message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError> {
        let body = with_keyboard(
            json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            keyboard,
        );
        self.call_edit("editMessageText", &body).await
    }

    async fn edit_message_photo(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        photo: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError> {
        let body = with_keyboard(
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "media": { "type": "photo", "media": photo, "caption": caption }
            }),
            keyboard,
        );
        self.call_edit("editMessageMedia", &body).await
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChannelError> {
        self.call::<bool>(
            "deleteMessage",
            &json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
        .map(|_| ())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = Value::String(text.to_string());
        }
        self.call::<bool>("answerCallbackQuery", &body)
            .await
            .map(|_| ())
    }

    async fn pin_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChannelError> {
        self.call::<bool>(
            "pinChatMessage",
            &json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
        .map(|_| ())
    }

    async fn set_commands(&self, commands: &[BotCommand]) -> Result<(), ChannelError> {
        self.call::<bool>("setMyCommands", &json!({ "commands": commands }))
            .await
            .map(|_| ())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Split a message into chunks of at most `max_chars` characters.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.chars().count() > max_chars {
        // Byte offset of the first char past the limit
        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map_or(remaining.len(), |(i, _)| i);
        let window = &remaining[..limit];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining.to_string());
    }
    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
