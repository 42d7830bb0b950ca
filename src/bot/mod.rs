//! Telegram bot — update decoding, outbound API, and event handling.

pub mod api;
pub mod callback;
pub mod carousel;
pub mod dispatcher;
pub mod keyboard;
pub mod locks;
pub mod reply;
pub mod telegram;
pub mod update;

pub use api::{BotApi, BotCommand, ChatId, MessageId, menu_commands};
pub use callback::CallbackData;
pub use carousel::CarouselService;
pub use dispatcher::Dispatcher;
pub use keyboard::{InlineButton, InlineKeyboard};
pub use reply::Reply;
pub use telegram::TelegramClient;
pub use update::{BotEvent, Command, EventKind};
