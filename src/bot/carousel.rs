//! Carousel presentation: showing an item and replacing it in place when
//! the user presses prev/next.

use std::sync::Arc;

use tracing::{debug, warn};

use super::api::{BotApi, ChatId};
use super::keyboard::InlineKeyboard;
use super::update::SourceMessage;
use crate::carousel::{CarouselDomain, Direction, next_index};
use crate::error::ChannelError;
use crate::render;
use crate::store::ContentStore;

/// One rendered carousel item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub text: String,
    /// Photo URL; reviews have none.
    pub photo: Option<String>,
    pub keyboard: InlineKeyboard,
}

pub struct CarouselService {
    content: Arc<dyn ContentStore>,
    api: Arc<dyn BotApi>,
}

impl CarouselService {
    pub fn new(content: Arc<dyn ContentStore>, api: Arc<dyn BotApi>) -> Self {
        Self { content, api }
    }

    /// Render every item of `domain`, in display order.
    ///
    /// A failed lookup is logged and shown as an empty collection.
    pub async fn slides(&self, domain: CarouselDomain) -> Vec<Slide> {
        let slides = match domain {
            CarouselDomain::Reviews => self.content.list_reviews().await.map(|reviews| {
                reviews
                    .iter()
                    .enumerate()
                    .map(|(i, review)| Slide {
                        text: render::format_review(review),
                        photo: None,
                        keyboard: render::navigation_keyboard(domain, i),
                    })
                    .collect()
            }),
            CarouselDomain::Portfolio => self.content.list_portfolio().await.map(|entries| {
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| Slide {
                        text: render::format_portfolio(entry),
                        photo: Some(entry.image_src.clone()),
                        keyboard: render::navigation_keyboard(domain, i),
                    })
                    .collect()
            }),
        };
        slides.unwrap_or_else(|e| {
            warn!(%domain, error = %e, "Failed to load carousel items");
            Vec::new()
        })
    }

    /// Show the first item as a new message.
    pub async fn open(&self, chat_id: ChatId, domain: CarouselDomain) -> Result<(), ChannelError> {
        let slides = self.slides(domain).await;
        let Some(first) = slides.first() else {
            self.api
                .send_message(chat_id, domain.empty_message(), None)
                .await?;
            return Ok(());
        };
        debug!(chat_id, %domain, total = slides.len(), "Opening carousel");
        self.show(chat_id, None, first).await
    }

    /// Handle a prev/next press on the item at `index`.
    pub async fn navigate(
        &self,
        chat_id: ChatId,
        callback_id: &str,
        source: Option<SourceMessage>,
        domain: CarouselDomain,
        direction: Direction,
        index: usize,
    ) -> Result<(), ChannelError> {
        let slides = self.slides(domain).await;
        let ack = slides.is_empty().then(|| domain.empty_ack());
        if let Err(e) = self.api.answer_callback(callback_id, ack).await {
            warn!(chat_id, %domain, error = %e, "Failed to answer carousel callback");
        }
        if slides.is_empty() {
            return Ok(());
        }

        let Some(target) = next_index(index, direction, slides.len()).and_then(|i| slides.get(i))
        else {
            debug!(chat_id, %domain, index, total = slides.len(), "Stale carousel index");
            self.api
                .send_message(chat_id, domain.not_found_message(), None)
                .await?;
            return Ok(());
        };
        self.show(chat_id, source, target).await
    }

    /// Display `slide`, degrading step by step: update `source` in place,
    /// then send a fresh message, then send bare text.
    async fn show(
        &self,
        chat_id: ChatId,
        source: Option<SourceMessage>,
        slide: &Slide,
    ) -> Result<(), ChannelError> {
        if let Some(source) = source {
            match self.replace(chat_id, source, slide).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!(chat_id, error = %e, "In-place update failed, sending new message"),
            }
        }

        let sent = match &slide.photo {
            Some(photo) => self
                .api
                .send_photo(chat_id, photo, &slide.text, Some(&slide.keyboard))
                .await
                .map(|_| ()),
            None => self
                .api
                .send_message(chat_id, &slide.text, Some(&slide.keyboard))
                .await
                .map(|_| ()),
        };
        let Err(e) = sent else {
            return Ok(());
        };
        warn!(chat_id, error = %e, "Sending item failed, falling back to plain text");

        // A photo item keeps its controls; a text item already failed with them.
        let keyboard = slide.photo.as_ref().map(|_| &slide.keyboard);
        self.api
            .send_message(chat_id, &slide.text, keyboard)
            .await
            .map(|_| ())
    }

    async fn replace(
        &self,
        chat_id: ChatId,
        source: SourceMessage,
        slide: &Slide,
    ) -> Result<(), ChannelError> {
        match &slide.photo {
            None => {
                self.api
                    .edit_message_text(chat_id, source.message_id, &slide.text, Some(&slide.keyboard))
                    .await
            }
            Some(photo) if source.has_photo => {
                self.api
                    .edit_message_photo(
                        chat_id,
                        source.message_id,
                        photo,
                        &slide.text,
                        Some(&slide.keyboard),
                    )
                    .await
            }
            // A text message can't become a photo; swap it for a new one.
            Some(photo) => {
                self.api.delete_message(chat_id, source.message_id).await?;
                self.api
                    .send_photo(chat_id, photo, &slide.text, Some(&slide.keyboard))
                    .await
                    .map(|_| ())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ApiCall, RecordingApi, StaticContent, portfolio_entry, review};

    const CHAT: ChatId = 42;

    fn service(content: Arc<StaticContent>, api: Arc<RecordingApi>) -> CarouselService {
        CarouselService::new(content, api)
    }

    fn reviews(names: &[&str]) -> Arc<StaticContent> {
        let content = StaticContent::empty();
        content.set_reviews(names.iter().map(|n| review(n)).collect());
        content
    }

    fn text_source() -> Option<SourceMessage> {
        Some(SourceMessage {
            message_id: 5,
            has_photo: false,
        })
    }

    #[tokio::test]
    async fn open_empty_collection() {
        let api = RecordingApi::new();
        let svc = service(StaticContent::empty(), api.clone());
        svc.open(CHAT, CarouselDomain::Reviews).await.unwrap();
        assert_eq!(api.sent_texts(), ["Пока нет отзывов."]);

        svc.open(CHAT, CarouselDomain::Portfolio).await.unwrap();
        assert_eq!(api.sent_texts()[1], "Пока нет портфолио.");
    }

    #[tokio::test]
    async fn open_shows_first_item_with_controls() {
        let api = RecordingApi::new();
        let svc = service(reviews(&["A", "B"]), api.clone());
        svc.open(CHAT, CarouselDomain::Reviews).await.unwrap();

        let calls = api.calls();
        let ApiCall::SendMessage { text, keyboard, .. } = &calls[0] else {
            panic!("unexpected call: {:?}", calls[0]);
        };
        assert!(text.contains("👤 Имя: A"));
        assert_eq!(
            keyboard.as_ref().unwrap().callback_tokens().collect::<Vec<_>>(),
            ["comment_prev_0", "comment_next_0"]
        );
    }

    #[tokio::test]
    async fn next_wraps_around_with_in_place_edits() {
        let api = RecordingApi::new();
        let svc = service(reviews(&["A", "B"]), api.clone());

        svc.navigate(CHAT, "cb", text_source(), CarouselDomain::Reviews, Direction::Next, 0)
            .await
            .unwrap();
        svc.navigate(CHAT, "cb", text_source(), CarouselDomain::Reviews, Direction::Next, 1)
            .await
            .unwrap();

        let edits = api.edited_texts();
        assert_eq!(edits.len(), 2);
        assert!(edits[0].contains("Имя: B"));
        assert!(edits[1].contains("Имя: A"));
        assert_eq!(api.acks(), [None, None]);
    }

    #[tokio::test]
    async fn navigating_empty_collection_acks_only() {
        let api = RecordingApi::new();
        let svc = service(StaticContent::empty(), api.clone());
        svc.navigate(CHAT, "cb", text_source(), CarouselDomain::Portfolio, Direction::Prev, 0)
            .await
            .unwrap();
        assert_eq!(api.acks(), [Some("Нет портфолио".to_string())]);
        assert!(api.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn failed_ack_does_not_block_navigation() {
        let api = RecordingApi::new();
        api.fail("answerCallbackQuery");
        let svc = service(reviews(&["A", "B"]), api.clone());

        svc.navigate(CHAT, "cb", text_source(), CarouselDomain::Reviews, Direction::Next, 0)
            .await
            .unwrap();

        let edits = api.edited_texts();
        assert_eq!(edits.len(), 1);
        assert!(edits[0].contains("Имя: B"));
    }

    #[tokio::test]
    async fn stale_index_reports_not_found() {
        let api = RecordingApi::new();
        let svc = service(reviews(&["A"]), api.clone());
        svc.navigate(CHAT, "cb", text_source(), CarouselDomain::Reviews, Direction::Next, 7)
            .await
            .unwrap();
        assert_eq!(api.acks(), [None]);
        assert_eq!(api.sent_texts(), ["Отзыв не найден."]);
    }

    #[tokio::test]
    async fn failed_edit_falls_back_to_new_message() {
        let api = RecordingApi::new();
        api.fail("editMessageText");
        let svc = service(reviews(&["A", "B"]), api.clone());
        svc.navigate(CHAT, "cb", text_source(), CarouselDomain::Reviews, Direction::Prev, 0)
            .await
            .unwrap();

        let calls = api.calls();
        let ApiCall::SendMessage { text, keyboard, .. } = calls.last().unwrap() else {
            panic!("expected a new message");
        };
        assert!(text.contains("Имя: B"));
        assert!(keyboard.is_some());
    }

    #[tokio::test]
    async fn portfolio_on_photo_message_edits_media() {
        let api = RecordingApi::new();
        let content = StaticContent::empty();
        content.set_portfolio(vec![portfolio_entry(1, "Кухня"), portfolio_entry(2, "Ванная")]);
        let svc = service(content, api.clone());

        let source = Some(SourceMessage {
            message_id: 9,
            has_photo: true,
        });
        svc.navigate(CHAT, "cb", source, CarouselDomain::Portfolio, Direction::Next, 0)
            .await
            .unwrap();

        assert!(matches!(
            api.calls().last(),
            Some(ApiCall::EditPhoto { message_id: 9, caption, .. }) if caption.starts_with("Ванная")
        ));
    }

    #[tokio::test]
    async fn portfolio_on_text_message_is_replaced_by_photo() {
        let api = RecordingApi::new();
        let content = StaticContent::empty();
        content.set_portfolio(vec![portfolio_entry(1, "Кухня")]);
        let svc = service(content, api.clone());

        svc.navigate(CHAT, "cb", text_source(), CarouselDomain::Portfolio, Direction::Next, 0)
            .await
            .unwrap();

        let calls = api.calls();
        assert!(matches!(calls[1], ApiCall::Delete { message_id: 5, .. }));
        assert!(matches!(calls[2], ApiCall::SendPhoto { .. }));
    }

    #[tokio::test]
    async fn photo_failures_degrade_to_text_with_controls() {
        let api = RecordingApi::new();
        api.fail("editMessageMedia");
        api.fail("sendPhoto");
        let content = StaticContent::empty();
        content.set_portfolio(vec![portfolio_entry(1, "Кухня"), portfolio_entry(2, "Ванная")]);
        let svc = service(content, api.clone());

        let source = Some(SourceMessage {
            message_id: 9,
            has_photo: true,
        });
        svc.navigate(CHAT, "cb", source, CarouselDomain::Portfolio, Direction::Prev, 0)
            .await
            .unwrap();

        let calls = api.calls();
        let ApiCall::SendMessage { text, keyboard, .. } = calls.last().unwrap() else {
            panic!("expected plain text fallback");
        };
        assert!(text.starts_with("Ванная"));
        assert!(keyboard.is_some());
    }

    #[tokio::test]
    async fn text_item_last_resort_drops_controls() {
        let api = RecordingApi::new();
        api.fail("editMessageText");
        api.fail_once("sendMessage");
        let svc = service(reviews(&["A"]), api.clone());

        svc.navigate(CHAT, "cb", text_source(), CarouselDomain::Reviews, Direction::Next, 0)
            .await
            .unwrap();

        let calls = api.calls();
        let ApiCall::SendMessage { keyboard, .. } = calls.last().unwrap() else {
            panic!("expected plain text fallback");
        };
        assert!(keyboard.is_none());
    }
}
