//! Outbound capability the handlers depend on.

use async_trait::async_trait;
use serde::Serialize;

use super::keyboard::InlineKeyboard;
use crate::error::ChannelError;

/// Telegram chat identifier.
pub type ChatId = i64;

/// Identifier of a message within a chat.
pub type MessageId = i64;

/// An entry of the command menu shown by Telegram clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: &str, description: &str) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Commands registered with `setMyCommands` at startup.
pub fn menu_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("calculate", "Калькулятор стоимости"),
        BotCommand::new("portfolio", "Портфолио работ"),
        BotCommand::new("otzivi", "Отзывы клиентов"),
        BotCommand::new("contacts", "Контакты"),
    ]
}

/// Messaging operations used by the conversation handlers.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Send a text message; returns the id of the (last) sent message.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError>;

    /// Send a photo by URL with a caption.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError>;

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError>;

    /// Replace the photo and caption of a photo message.
    async fn edit_message_photo(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        photo: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError>;

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChannelError>;

    /// Answer a callback query, optionally showing `text` as a toast.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChannelError>;

    async fn pin_message(&self, chat_id: ChatId, message_id: MessageId)
    -> Result<(), ChannelError>;

    async fn set_commands(&self, commands: &[BotCommand]) -> Result<(), ChannelError>;
}
