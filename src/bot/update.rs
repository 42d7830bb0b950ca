//! Inbound updates. Bot API JSON decoded into [`BotEvent`]s.

use serde::Deserialize;

use super::api::{ChatId, MessageId};
use super::callback::CallbackData;
use crate::content::UserProfile;
use crate::wizard::UserId;

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

// ── Decoded events ──────────────────────────────────────────────────

/// Slash commands the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Calculate,
    Reviews,
    Portfolio,
    Contacts,
    Ping,
    /// Any other `/command`; never treated as wizard input.
    Other(String),
}

impl Command {
    /// Parse `/name` or `/name@botname`, ignoring arguments. Returns `None`
    /// for text that isn't a command.
    pub fn parse(text: &str) -> Option<Self> {
        let head = text.trim_start().strip_prefix('/')?.split_whitespace().next()?;
        let name = head.split('@').next().unwrap_or(head);
        Some(match name {
            "start" => Self::Start,
            "calculate" => Self::Calculate,
            "otzivi" => Self::Reviews,
            "portfolio" => Self::Portfolio,
            "contacts" => Self::Contacts,
            "ping" => Self::Ping,
            other => Self::Other(other.to_string()),
        })
    }
}

/// The message a callback button was attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMessage {
    pub message_id: MessageId,
    pub has_photo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    pub id: String,
    pub data: CallbackData,
    pub source: Option<SourceMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Command(Command),
    Callback(CallbackEvent),
    Text(String),
}

/// One inbound chat event, tied to the user who caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotEvent {
    pub user: UserId,
    pub chat_id: ChatId,
    pub profile: UserProfile,
    pub kind: EventKind,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

impl Update {
    /// Decode into an event. Updates the bot doesn't react to (edits,
    /// stickers, callbacks without data, anonymous senders) yield `None`.
    pub fn into_event(self) -> Option<BotEvent> {
        if let Some(query) = self.callback_query {
            let raw = query.data.as_deref()?;
            let chat_id = query
                .message
                .as_ref()
                .map_or(query.from.id, |m| m.chat.id);
            return Some(BotEvent {
                user: UserId(query.from.id),
                chat_id,
                profile: UserProfile::from(&query.from),
                kind: EventKind::Callback(CallbackEvent {
                    id: query.id.clone(),
                    data: CallbackData::parse(raw),
                    source: query.message.as_ref().map(|m| SourceMessage {
                        message_id: m.message_id,
                        has_photo: m.photo.as_ref().is_some_and(|p| !p.is_empty()),
                    }),
                }),
            });
        }

        let message = self.message?;
        let from = message.from.as_ref()?;
        let text = message.text.as_deref()?;
        let kind = match Command::parse(text) {
            Some(command) => EventKind::Command(command),
            None => EventKind::Text(text.to_string()),
        };
        Some(BotEvent {
            user: UserId(from.id),
            chat_id: message.chat.id,
            profile: UserProfile::from(from),
            kind,
        })
    }
}
