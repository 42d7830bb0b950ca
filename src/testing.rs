//! In-memory fakes shared by unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::bot::api::{BotApi, BotCommand, ChatId, MessageId};
use crate::bot::keyboard::InlineKeyboard;
use crate::content::{
    ContactContent, PortfolioEntry, Review, StartContent, UserPage, UserProfile, WizardConfig,
};
use crate::error::{ChannelError, DatabaseError};
use crate::store::{ContentStore, UserStore};

pub fn wizard_config() -> WizardConfig {
    WizardConfig {
        step1_question: "Какой тип помещения?".into(),
        step1_options: vec!["Apt".into()],
        step2_question: "В каком районе?".into(),
        step2_options: vec!["Moscow".into()],
        step3_question: "Какой метраж?".into(),
        step4_question: "Как с вами связаться?".into(),
        step4_options: vec!["Email".into(), "Телефон".into()],
        step5_contact_prompt: "Оставьте контакт".into(),
        final_message: "Спасибо! Мы скоро свяжемся.".into(),
    }
}

pub fn review(name: &str) -> Review {
    Review {
        id: 0,
        name: name.into(),
        date: "2024-01-15".into(),
        text: "Отлично".into(),
    }
}

pub fn portfolio_entry(id: i64, title: &str) -> PortfolioEntry {
    PortfolioEntry {
        id,
        image_src: format!("https://example.com/{id}.jpg"),
        title: title.into(),
        description: "Под ключ".into(),
    }
}

// ── Content ─────────────────────────────────────────────────────────

/// Content and user store backed by plain mutable fields.
#[derive(Default)]
pub struct StaticContent {
    start: Mutex<Option<StartContent>>,
    contact: Mutex<Option<ContactContent>>,
    wizard: Mutex<Option<WizardConfig>>,
    reviews: Mutex<Vec<Review>>,
    portfolio: Mutex<Vec<PortfolioEntry>>,
    upserts: Mutex<Vec<(i64, UserProfile)>>,
    touches: Mutex<Vec<i64>>,
    yield_on_config: AtomicBool,
}

impl StaticContent {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_wizard(config: WizardConfig) -> Arc<Self> {
        let content = Self::empty();
        content.set_wizard(Some(config));
        content
    }

    pub fn set_start(&self, start: Option<StartContent>) {
        *self.start.lock().unwrap() = start;
    }

    pub fn set_contact(&self, contact: Option<ContactContent>) {
        *self.contact.lock().unwrap() = contact;
    }

    pub fn set_wizard(&self, config: Option<WizardConfig>) {
        *self.wizard.lock().unwrap() = config;
    }

    /// Make config reads suspend once, like a real database round trip.
    pub fn yield_on_config(&self) {
        self.yield_on_config.store(true, Ordering::SeqCst);
    }

    pub fn set_reviews(&self, reviews: Vec<Review>) {
        *self.reviews.lock().unwrap() = reviews;
    }

    pub fn set_portfolio(&self, entries: Vec<PortfolioEntry>) {
        *self.portfolio.lock().unwrap() = entries;
    }

    pub fn upserts(&self) -> Vec<(i64, UserProfile)> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn touches(&self) -> Vec<i64> {
        self.touches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentStore for StaticContent {
    async fn get_start(&self) -> Result<Option<StartContent>, DatabaseError> {
        Ok(self.start.lock().unwrap().clone())
    }

    async fn get_contact(&self) -> Result<Option<ContactContent>, DatabaseError> {
        Ok(self.contact.lock().unwrap().clone())
    }

    async fn get_wizard_config(&self) -> Result<Option<WizardConfig>, DatabaseError> {
        if self.yield_on_config.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Ok(self.wizard.lock().unwrap().clone())
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, DatabaseError> {
        Ok(self.reviews.lock().unwrap().clone())
    }

    async fn list_portfolio(&self) -> Result<Vec<PortfolioEntry>, DatabaseError> {
        Ok(self.portfolio.lock().unwrap().clone())
    }
}

#[async_trait]
impl UserStore for StaticContent {
    async fn upsert_user(
        &self,
        chat_id: i64,
        profile: &UserProfile,
    ) -> Result<(), DatabaseError> {
        self.upserts.lock().unwrap().push((chat_id, profile.clone()));
        Ok(())
    }

    async fn touch_user(&self, chat_id: i64) -> Result<(), DatabaseError> {
        self.touches.lock().unwrap().push(chat_id);
        Ok(())
    }

    async fn list_users(
        &self,
        _skip: Option<u32>,
        _take: Option<u32>,
    ) -> Result<UserPage, DatabaseError> {
        Ok(UserPage {
            users: Vec::new(),
            total: 0,
        })
    }
}

// ── Bot API ─────────────────────────────────────────────────────────

/// One recorded outbound call, failed attempts included.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    SendMessage {
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    SendPhoto {
        chat_id: ChatId,
        photo: String,
        caption: String,
        keyboard: Option<InlineKeyboard>,
    },
    EditText {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    EditPhoto {
        chat_id: ChatId,
        message_id: MessageId,
        photo: String,
        caption: String,
        keyboard: Option<InlineKeyboard>,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
    AnswerCallback {
        id: String,
        text: Option<String>,
    },
    Pin {
        chat_id: ChatId,
        message_id: MessageId,
    },
    SetCommands(Vec<BotCommand>),
}

/// Bot API fake that records calls and fails the methods it is told to.
#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<ApiCall>>,
    failing: Mutex<HashSet<&'static str>>,
    failing_once: Mutex<HashSet<&'static str>>,
    next_id: Mutex<MessageId>,
}

impl RecordingApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every call to the Bot API `method` fail.
    pub fn fail(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    /// Make the next call to `method` fail.
    pub fn fail_once(&self, method: &'static str) {
        self.failing_once.lock().unwrap().insert(method);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::SendMessage { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edited_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::EditText { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn acks(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::AnswerCallback { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, method: &'static str, call: ApiCall) -> Result<MessageId, ChannelError> {
        self.calls.lock().unwrap().push(call);
        let fails = self.failing.lock().unwrap().contains(method)
            || self.failing_once.lock().unwrap().remove(method);
        if fails {
            return Err(ChannelError::telegram(method, "injected failure"));
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        Ok(*next_id)
    }
}

#[async_trait]
impl BotApi for RecordingApi {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError> {
        self.record(
            "sendMessage",
            ApiCall::SendMessage {
                chat_id,
                text: text.into(),
                keyboard: keyboard.cloned(),
            },
        )
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, ChannelError> {
        self.record(
            "sendPhoto",
            ApiCall::SendPhoto {
                chat_id,
                photo: photo.into(),
                caption: caption.into(),
                keyboard: keyboard.cloned(),
            },
        )
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError> {
        self.record(
            "editMessageText",
            ApiCall::EditText {
                chat_id,
                message_id,
                text: text.into(),
                keyboard: keyboard.cloned(),
            },
        )
        .map(|_| ())
    }

    async fn edit_message_photo(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        photo: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), ChannelError> {
        self.record(
            "editMessageMedia",
            ApiCall::EditPhoto {
                chat_id,
                message_id,
                photo: photo.into(),
                caption: caption.into(),
                keyboard: keyboard.cloned(),
            },
        )
        .map(|_| ())
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChannelError> {
        self.record("deleteMessage", ApiCall::Delete { chat_id, message_id })
            .map(|_| ())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.record(
            "answerCallbackQuery",
            ApiCall::AnswerCallback {
                id: callback_id.into(),
                text: text.map(String::from),
            },
        )
        .map(|_| ())
    }

    async fn pin_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), ChannelError> {
        self.record("pinChatMessage", ApiCall::Pin { chat_id, message_id })
            .map(|_| ())
    }

    async fn set_commands(&self, commands: &[BotCommand]) -> Result<(), ChannelError> {
        self.record("setMyCommands", ApiCall::SetCommands(commands.to_vec()))
            .map(|_| ())
    }
}
