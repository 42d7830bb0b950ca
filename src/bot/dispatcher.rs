//! Event dispatcher — routes each inbound chat event to its handler.
//!
//! Handling is serialized per user and never fails outward: transport and
//! storage errors are logged and the event is dropped.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::api::{BotApi, ChatId};
use super::callback::CallbackData;
use super::carousel::CarouselService;
use super::locks::UserLocks;
use super::reply::Reply;
use super::update::{BotEvent, CallbackEvent, Command, EventKind};
use crate::carousel::CarouselDomain;
use crate::content::UserProfile;
use crate::error::{ChannelError, FlowError};
use crate::render;
use crate::store::{ContentStore, UserStore};
use crate::wizard::{SessionStore, UserId, WizardEngine};

/// Start-menu tokens with a built-in meaning.
const MENU_REVIEWS: &str = "otzivi";
const MENU_PORTFOLIO: &str = "portfolio";
const MENU_CONTACTS: &str = "contacts";
const MENU_CALCULATE: &str = "calculate";

/// Reply to `/ping`.
pub const PING_REPLY: &str = "Все ОК";

pub struct Dispatcher {
    api: Arc<dyn BotApi>,
    content: Arc<dyn ContentStore>,
    users: Arc<dyn UserStore>,
    wizard: WizardEngine,
    carousel: CarouselService,
    locks: UserLocks,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn BotApi>,
        content: Arc<dyn ContentStore>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            wizard: WizardEngine::new(Arc::clone(&content), sessions),
            carousel: CarouselService::new(Arc::clone(&content), Arc::clone(&api)),
            api,
            content,
            users,
            locks: UserLocks::new(),
        }
    }

    pub fn wizard(&self) -> &WizardEngine {
        &self.wizard
    }

    /// Handle one event to completion.
    pub async fn dispatch(&self, event: BotEvent) {
        let _guard = self.locks.lock(event.user).await;
        let user = event.user;

        if let Err(e) = self.users.touch_user(user.0).await {
            warn!(user_id = %user, error = %e, "Failed to record user activity");
        }

        if let Err(e) = self.route(event).await {
            warn!(user_id = %user, error = %e, "Failed to handle event");
        }
    }

    async fn route(&self, event: BotEvent) -> Result<(), ChannelError> {
        let BotEvent {
            user,
            chat_id,
            profile,
            kind,
        } = event;

        match kind {
            EventKind::Command(command) => self.on_command(user, chat_id, &profile, command).await,
            EventKind::Callback(callback) => self.on_callback(user, chat_id, callback).await,
            EventKind::Text(text) => {
                let replies = self.wizard.free_text(user, &text).await;
                self.execute(chat_id, None, replies).await
            }
        }
    }

    async fn on_command(
        &self,
        user: UserId,
        chat_id: ChatId,
        profile: &UserProfile,
        command: Command,
    ) -> Result<(), ChannelError> {
        debug!(user_id = %user, ?command, "Command received");
        match command {
            Command::Start => self.send_start(user, chat_id, profile).await,
            Command::Calculate => {
                let replies = self.wizard.start(user).await;
                self.execute(chat_id, None, replies).await
            }
            Command::Reviews => self.carousel.open(chat_id, CarouselDomain::Reviews).await,
            Command::Portfolio => self.carousel.open(chat_id, CarouselDomain::Portfolio).await,
            Command::Contacts => self.send_contacts(chat_id).await,
            Command::Ping => self.api.send_message(chat_id, PING_REPLY, None).await.map(|_| ()),
            Command::Other(name) => {
                debug!(user_id = %user, command = %name, "Ignoring unknown command");
                Ok(())
            }
        }
    }

    async fn on_callback(
        &self,
        user: UserId,
        chat_id: ChatId,
        callback: CallbackEvent,
    ) -> Result<(), ChannelError> {
        let CallbackEvent { id, data, source } = callback;
        debug!(user_id = %user, token = %data, "Callback received");

        match data {
            CallbackData::Navigate {
                domain,
                direction,
                index,
            } => {
                self.carousel
                    .navigate(chat_id, &id, source, domain, direction, index)
                    .await
            }
            CallbackData::WizardChoice { step, index } => {
                let replies = self.wizard.choose(user, step, index).await;
                self.execute(chat_id, Some(&id), replies).await
            }
            CallbackData::Menu(token) => {
                if let Err(e) = self.api.answer_callback(&id, None).await {
                    warn!(chat_id, error = %e, "Failed to answer callback");
                }
                self.on_menu(user, chat_id, &token).await
            }
            CallbackData::Invalid(kind) => {
                let error = kind.error().to_string();
                self.api.answer_callback(&id, Some(&error)).await
            }
        }
    }

    async fn on_menu(&self, user: UserId, chat_id: ChatId, token: &str) -> Result<(), ChannelError> {
        match token {
            MENU_REVIEWS => self.carousel.open(chat_id, CarouselDomain::Reviews).await,
            MENU_PORTFOLIO => self.carousel.open(chat_id, CarouselDomain::Portfolio).await,
            MENU_CONTACTS => self.send_contacts(chat_id).await,
            MENU_CALCULATE => {
                let replies = self.wizard.start(user).await;
                self.execute(chat_id, None, replies).await
            }
            other => {
                let text = format!("Команда \"{other}\" не найдена.");
                self.api.send_message(chat_id, &text, None).await.map(|_| ())
            }
        }
    }

    /// Greeting with the start menu, pinned to the chat.
    async fn send_start(
        &self,
        user: UserId,
        chat_id: ChatId,
        profile: &UserProfile,
    ) -> Result<(), ChannelError> {
        if let Err(e) = self.users.upsert_user(user.0, profile).await {
            warn!(user_id = %user, error = %e, "Failed to save user profile");
        }

        let start = match self.content.get_start().await {
            Ok(Some(start)) => start,
            Ok(None) => return self.send_config_missing(chat_id).await,
            Err(e) => {
                warn!(error = %e, "Failed to load start content");
                return self.send_config_missing(chat_id).await;
            }
        };

        let keyboard = render::menu_keyboard(&start.buttons);
        let message_id = self
            .api
            .send_message(chat_id, &start.content, Some(&keyboard))
            .await?;

        if let Err(e) = self.api.pin_message(chat_id, message_id).await {
            warn!(chat_id, error = %e, "Failed to pin start message");
        }
        info!(user_id = %user, "Start menu sent");
        Ok(())
    }

    /// Address first, then the manager note with link buttons.
    async fn send_contacts(&self, chat_id: ChatId) -> Result<(), ChannelError> {
        let contact = match self.content.get_contact().await {
            Ok(Some(contact)) => contact,
            Ok(None) => return self.send_config_missing(chat_id).await,
            Err(e) => {
                warn!(error = %e, "Failed to load contact content");
                return self.send_config_missing(chat_id).await;
            }
        };

        self.api.send_message(chat_id, &contact.address, None).await?;
        let keyboard = render::contact_keyboard(&contact.buttons);
        self.api
            .send_message(chat_id, &contact.manager_text, Some(&keyboard))
            .await
            .map(|_| ())
    }

    async fn send_config_missing(&self, chat_id: ChatId) -> Result<(), ChannelError> {
        self.api
            .send_message(chat_id, &FlowError::ConfigNotFound.to_string(), None)
            .await
            .map(|_| ())
    }

    /// Deliver handler replies in order. Acks without a pending callback
    /// are dropped.
    async fn execute(
        &self,
        chat_id: ChatId,
        callback_id: Option<&str>,
        replies: Vec<Reply>,
    ) -> Result<(), ChannelError> {
        for reply in replies {
            match reply {
                Reply::Text { text, keyboard } => {
                    self.api
                        .send_message(chat_id, &text, keyboard.as_ref())
                        .await?;
                }
                Reply::Ack(text) => {
                    let Some(id) = callback_id else { continue };
                    // Stale queries can't be answered; the rest still goes out.
                    if let Err(e) = self.api.answer_callback(id, text.as_deref()).await {
                        warn!(chat_id, error = %e, "Failed to answer callback");
                    }
                }
            }
        }
        Ok(())
    }
}
