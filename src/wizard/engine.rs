//! Wizard engine: validates chat events against the user's session and
//! decides what to send back.
//!
//! The engine reads question text through [`ContentStore`] and keeps runs
//! in an injected [`SessionStore`]. It never returns an error: every
//! failure becomes a user-facing [`Reply`].

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::bot::Reply;
use crate::content::WizardConfig;
use crate::error::FlowError;
use crate::render;
use crate::store::ContentStore;

use super::session::{UserId, WizardSession};
use super::state::{AwaitingInput, ChoiceStep, WizardStep};
use super::store::SessionStore;

/// Leading decimal number, the way a lenient float parser reads it
/// (`"50 м2"` → 50, `"12.5.3"` → 12.5).
static AREA_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid area regex")
});

/// Parse user-typed area. Accepts a leading finite number strictly greater
/// than zero; anything after the number is ignored.
pub fn parse_area(input: &str) -> Option<f64> {
    let number = AREA_PREFIX.find(input.trim())?;
    number
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

pub struct WizardEngine {
    content: Arc<dyn ContentStore>,
    sessions: Arc<dyn SessionStore>,
}

impl WizardEngine {
    pub fn new(content: Arc<dyn ContentStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { content, sessions }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Begin a fresh run, replacing any unfinished one.
    pub async fn start(&self, user: UserId) -> Vec<Reply> {
        let Some(config) = self.load_config().await else {
            self.sessions.delete(user);
            return vec![Reply::text(FlowError::ConfigNotFound.to_string())];
        };

        self.sessions.set(user, WizardSession::start(user));
        info!(user_id = %user, "Wizard started");

        self.prompt(&config, WizardStep::AwaitingStep1Choice)
            .into_iter()
            .collect()
    }

    /// Handle a button press on a choice step.
    ///
    /// A step-1 press with no session opens one, so the question message
    /// keeps working after the session was dropped.
    pub async fn choose(&self, user: UserId, step: ChoiceStep, index: usize) -> Vec<Reply> {
        let existing = self.sessions.touch(user);
        let Some(config) = self.load_config().await else {
            return vec![Reply::ack_with(FlowError::ConfigNotFound.to_string())];
        };

        let Some(value) = config.option(step, index) else {
            debug!(user_id = %user, ?step, index, "Wizard option out of range");
            return vec![Reply::ack_with(FlowError::InvalidSelection.to_string())];
        };

        let mut session = match existing {
            Some(session) => session,
            None if step == ChoiceStep::PropertyType => WizardSession::start(user),
            None => {
                debug!(user_id = %user, ?step, "Wizard choice without a session");
                return vec![Reply::ack_with(FlowError::InvalidSelection.to_string())];
            }
        };

        let next = match session.record_choice(step, value.to_string()) {
            Ok(next) => next,
            Err(e) => {
                debug!(user_id = %user, error = %e, "Wizard choice refused");
                return vec![Reply::ack_with(FlowError::InvalidSelection.to_string())];
            }
        };
        self.sessions.set(user, session);
        debug!(user_id = %user, step = %next, "Wizard advanced");

        let mut replies = vec![Reply::ack()];
        replies.extend(self.prompt(&config, next));
        replies
    }

    /// Handle a plain text message. Text unrelated to a waiting step is
    /// ignored without reply.
    pub async fn free_text(&self, user: UserId, text: &str) -> Vec<Reply> {
        let Some(session) = self.sessions.touch(user) else {
            return Vec::new();
        };

        match session.waiting() {
            AwaitingInput::NotWaiting => {
                debug!(user_id = %user, step = %session.step(), "Ignoring text while not waiting");
                Vec::new()
            }
            AwaitingInput::AwaitingArea => self.receive_area(session, text.trim()).await,
            AwaitingInput::AwaitingContact => self.receive_contact(session, text.trim()).await,
        }
    }

    async fn receive_area(&self, mut session: WizardSession, text: &str) -> Vec<Reply> {
        let user = session.user_id;
        if parse_area(text).is_none() {
            return vec![Reply::text(FlowError::InvalidArea.to_string())];
        }

        let Some(config) = self.load_config().await else {
            self.sessions.delete(user);
            return vec![Reply::text(FlowError::ConfigNotFound.to_string())];
        };

        match session.record_area(text.to_string()) {
            Ok(next) => {
                self.sessions.set(user, session);
                self.prompt(&config, next).into_iter().collect()
            }
            Err(e) => {
                warn!(user_id = %user, error = %e, "Area refused");
                Vec::new()
            }
        }
    }

    async fn receive_contact(&self, mut session: WizardSession, text: &str) -> Vec<Reply> {
        let user = session.user_id;
        if text.is_empty() {
            return Vec::new();
        }

        let Some(config) = self.load_config().await else {
            self.sessions.delete(user);
            return vec![Reply::text(FlowError::ConfigNotFound.to_string())];
        };

        if let Err(e) = session.record_contact(text.to_string()) {
            warn!(user_id = %user, error = %e, "Contact refused");
            return Vec::new();
        }

        // The run is over whichever way finalization goes.
        self.sessions.delete(user);

        match session.complete() {
            Some(application) => {
                info!(
                    user_id = %user,
                    property_type = %application.property_type,
                    contact_method = %application.contact_method,
                    "Wizard finished"
                );
                vec![
                    Reply::text(render::format_summary(&application)),
                    Reply::text(config.final_message),
                ]
            }
            None => {
                warn!(user_id = %user, "Wizard finished with missing answers");
                vec![Reply::text(FlowError::RestartRequired.to_string())]
            }
        }
    }

    /// Question for `step`, if the step asks one.
    fn prompt(&self, config: &WizardConfig, step: WizardStep) -> Option<Reply> {
        if let Some(choice) = step.expected_choice() {
            return Some(Reply::with_keyboard(
                config.question(choice),
                render::choice_keyboard(choice, config.options(choice)),
            ));
        }
        match step {
            WizardStep::AwaitingArea => Some(Reply::text(config.step3_question.clone())),
            WizardStep::AwaitingContact => {
                Some(Reply::text(config.step5_contact_prompt.clone()))
            }
            _ => None,
        }
    }

    async fn load_config(&self) -> Option<WizardConfig> {
        match self.content.get_wizard_config().await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to load wizard config");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StaticContent, wizard_config};
    use crate::wizard::InMemorySessionStore;

    const USER: UserId = UserId(1001);

    fn engine_with(content: Arc<StaticContent>) -> WizardEngine {
        WizardEngine::new(content, InMemorySessionStore::new())
    }

    fn engine() -> WizardEngine {
        engine_with(StaticContent::with_wizard(wizard_config()))
    }

    fn texts(replies: &[Reply]) -> Vec<&str> {
        replies.iter().filter_map(Reply::as_text).collect()
    }

    async fn run_to_area(engine: &WizardEngine) {
        engine.start(USER).await;
        engine.choose(USER, ChoiceStep::PropertyType, 0).await;
        engine.choose(USER, ChoiceStep::Location, 0).await;
    }

    async fn run_to_contact(engine: &WizardEngine) {
        run_to_area(engine).await;
        engine.free_text(USER, "50").await;
        engine.choose(USER, ChoiceStep::ContactMethod, 0).await;
    }

    // ── parse_area ──────────────────────────────────────────────────

    #[test]
    fn area_accepts_positive_numbers() {
        assert_eq!(parse_area("50"), Some(50.0));
        assert_eq!(parse_area(" 12.5 "), Some(12.5));
        assert_eq!(parse_area(".5"), Some(0.5));
        assert_eq!(parse_area("1e2"), Some(100.0));
        assert_eq!(parse_area("75 м²"), Some(75.0));
        assert_eq!(parse_area("60,5"), Some(60.0));
    }

    #[test]
    fn area_rejects_non_positive_and_garbage() {
        for input in ["invalid", "-10", "0", "0.0", "", "м² 50", "Infinity", "1e400", "."] {
            assert_eq!(parse_area(input), None, "{input}");
        }
    }

    // ── start ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_creates_session_and_asks_step_one() {
        let engine = engine();
        assert!(engine.sessions().get(USER).is_none());

        let replies = engine.start(USER).await;

        let session = engine.sessions().get(USER).unwrap();
        assert_eq!(session.step(), WizardStep::AwaitingStep1Choice);
        assert_eq!(replies.len(), 1);
        match &replies[0] {
            Reply::Text { text, keyboard } => {
                assert_eq!(text, "Какой тип помещения?");
                let kb = keyboard.as_ref().unwrap();
                assert_eq!(kb.callback_tokens().collect::<Vec<_>>(), ["calc_step1_0"]);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_without_config_reports_and_leaves_no_session() {
        let engine = engine_with(StaticContent::empty());
        let replies = engine.start(USER).await;
        assert_eq!(texts(&replies), ["Конфигурация не найдена"]);
        assert!(engine.sessions().get(USER).is_none());
    }

    #[tokio::test]
    async fn restart_discards_previous_answers() {
        let engine = engine();
        run_to_area(&engine).await;
        engine.start(USER).await;
        let session = engine.sessions().get(USER).unwrap();
        assert!(session.property_type.is_none());
        assert_eq!(session.step(), WizardStep::AwaitingStep1Choice);
    }

    // ── choices ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn two_choices_lead_to_area_prompt() {
        let engine = engine();
        engine.start(USER).await;

        let replies = engine.choose(USER, ChoiceStep::PropertyType, 0).await;
        assert_eq!(replies[0], Reply::ack());
        assert_eq!(texts(&replies), ["В каком районе?"]);

        let replies = engine.choose(USER, ChoiceStep::Location, 0).await;
        assert_eq!(replies, vec![Reply::ack(), Reply::text("Какой метраж?")]);

        let session = engine.sessions().get(USER).unwrap();
        assert_eq!(session.property_type.as_deref(), Some("Apt"));
        assert_eq!(session.location.as_deref(), Some("Moscow"));
        assert_eq!(session.waiting(), AwaitingInput::AwaitingArea);
    }

    #[tokio::test]
    async fn out_of_range_option_is_acked_as_error() {
        let engine = engine();
        engine.start(USER).await;
        let replies = engine.choose(USER, ChoiceStep::PropertyType, 5).await;
        assert_eq!(replies, vec![Reply::ack_with("Ошибка")]);
        let session = engine.sessions().get(USER).unwrap();
        assert!(session.property_type.is_none());
    }

    #[tokio::test]
    async fn out_of_order_choice_is_acked_as_error() {
        let engine = engine();
        engine.start(USER).await;
        let replies = engine.choose(USER, ChoiceStep::ContactMethod, 0).await;
        assert_eq!(replies, vec![Reply::ack_with("Ошибка")]);
        assert_eq!(
            engine.sessions().get(USER).unwrap().step(),
            WizardStep::AwaitingStep1Choice
        );
    }

    #[tokio::test]
    async fn step_one_press_without_session_opens_one() {
        let engine = engine();
        let replies = engine.choose(USER, ChoiceStep::PropertyType, 0).await;
        assert_eq!(replies[0], Reply::ack());
        let session = engine.sessions().get(USER).unwrap();
        assert_eq!(session.step(), WizardStep::AwaitingStep2Choice);
    }

    #[tokio::test]
    async fn later_press_without_session_is_refused() {
        let engine = engine();
        let replies = engine.choose(USER, ChoiceStep::Location, 0).await;
        assert_eq!(replies, vec![Reply::ack_with("Ошибка")]);
        assert!(engine.sessions().get(USER).is_none());
    }

    #[tokio::test]
    async fn choice_without_config_acks_config_error() {
        let content = StaticContent::with_wizard(wizard_config());
        let engine = engine_with(content.clone());
        engine.start(USER).await;
        content.set_wizard(None);

        let replies = engine.choose(USER, ChoiceStep::PropertyType, 0).await;
        assert_eq!(replies, vec![Reply::ack_with("Конфигурация не найдена")]);
    }

    // ── free text ───────────────────────────────────────────────────

    #[tokio::test]
    async fn valid_area_advances_to_contact_method() {
        let engine = engine();
        run_to_area(&engine).await;

        let replies = engine.free_text(USER, "50").await;
        assert_eq!(texts(&replies), ["Как с вами связаться?"]);

        let session = engine.sessions().get(USER).unwrap();
        assert_eq!(session.area.as_deref(), Some("50"));
        assert_eq!(session.step(), WizardStep::AwaitingStep4Choice);
        assert_eq!(session.waiting(), AwaitingInput::NotWaiting);
    }

    #[tokio::test]
    async fn invalid_area_keeps_waiting() {
        let engine = engine();
        run_to_area(&engine).await;

        for input in ["invalid", "-10"] {
            let replies = engine.free_text(USER, input).await;
            assert_eq!(
                texts(&replies),
                ["Пожалуйста, введите корректное число (метраж в м²)"]
            );
            let session = engine.sessions().get(USER).unwrap();
            assert_eq!(session.waiting(), AwaitingInput::AwaitingArea);
            assert!(session.area.is_none());
        }

        engine.free_text(USER, "42").await;
        assert_eq!(
            engine.sessions().get(USER).unwrap().area.as_deref(),
            Some("42")
        );
    }

    #[tokio::test]
    async fn rejected_input_counts_as_activity() {
        let engine = engine();
        run_to_area(&engine).await;
        let backdate = |engine: &WizardEngine| {
            let mut session = engine.sessions().get(USER).unwrap();
            session.touched_at = chrono::Utc::now() - chrono::Duration::hours(2);
            engine.sessions().set(USER, session);
        };
        let max_idle = std::time::Duration::from_secs(3600);

        backdate(&engine);
        engine.free_text(USER, "invalid").await;
        assert_eq!(engine.sessions().purge_idle(max_idle), 0);

        backdate(&engine);
        engine.choose(USER, ChoiceStep::PropertyType, 0).await;
        assert_eq!(engine.sessions().purge_idle(max_idle), 0);
        assert_eq!(
            engine.sessions().get(USER).unwrap().waiting(),
            AwaitingInput::AwaitingArea
        );
    }

    #[tokio::test]
    async fn area_stores_trimmed_raw_text() {
        let engine = engine();
        run_to_area(&engine).await;
        engine.free_text(USER, "  65 м² ").await;
        assert_eq!(
            engine.sessions().get(USER).unwrap().area.as_deref(),
            Some("65 м²")
        );
    }

    #[tokio::test]
    async fn area_without_config_discards_session() {
        let content = StaticContent::with_wizard(wizard_config());
        let engine = engine_with(content.clone());
        run_to_area(&engine).await;
        content.set_wizard(None);

        let replies = engine.free_text(USER, "50").await;
        assert_eq!(texts(&replies), ["Конфигурация не найдена"]);
        assert!(engine.sessions().get(USER).is_none());
    }

    #[tokio::test]
    async fn text_without_session_is_silently_ignored() {
        let engine = engine();
        let replies = engine.free_text(USER, "hello").await;
        assert!(replies.is_empty());
        assert!(engine.sessions().is_empty());
    }

    #[tokio::test]
    async fn text_while_choosing_is_ignored() {
        let engine = engine();
        engine.start(USER).await;
        let before = engine.sessions().get(USER).unwrap();

        assert!(engine.free_text(USER, "50").await.is_empty());
        let after = engine.sessions().get(USER).unwrap();
        assert_eq!(after.step(), before.step());
        assert!(after.area.is_none());
    }

    #[tokio::test]
    async fn completion_sends_summary_then_closing_and_drops_session() {
        let engine = engine();
        run_to_contact(&engine).await;
        assert_eq!(
            engine.sessions().get(USER).unwrap().waiting(),
            AwaitingInput::AwaitingContact
        );

        let replies = engine.free_text(USER, " ivan@example.com ").await;
        assert_eq!(replies.len(), 2);
        let summary = replies[0].as_text().unwrap();
        assert!(summary.starts_with("💰 Расчет стоимости ремонта"));
        assert!(summary.contains("🏠 Тип помещения: Apt"));
        assert!(summary.contains("📍 Расположение: Moscow"));
        assert!(summary.contains("📐 Метраж: 50 м²"));
        assert!(summary.ends_with("📱 Email: ivan@example.com"));
        assert_eq!(replies[1].as_text(), Some("Спасибо! Мы скоро свяжемся."));
        assert!(engine.sessions().get(USER).is_none());
    }

    #[tokio::test]
    async fn blank_contact_is_ignored() {
        let engine = engine();
        run_to_contact(&engine).await;
        assert!(engine.free_text(USER, "   ").await.is_empty());
        assert_eq!(
            engine.sessions().get(USER).unwrap().waiting(),
            AwaitingInput::AwaitingContact
        );
    }

    #[tokio::test]
    async fn contact_without_config_discards_session() {
        let content = StaticContent::with_wizard(wizard_config());
        let engine = engine_with(content.clone());
        run_to_contact(&engine).await;
        content.set_wizard(None);

        let replies = engine.free_text(USER, "+7 900").await;
        assert_eq!(texts(&replies), ["Конфигурация не найдена"]);
        assert!(engine.sessions().get(USER).is_none());
    }

    #[tokio::test]
    async fn incomplete_session_forces_restart() {
        let engine = engine();
        let mut session = WizardSession::start(USER);
        session.force_step(WizardStep::AwaitingContact);
        engine.sessions().set(USER, session);

        let replies = engine.free_text(USER, "+7 900").await;
        assert_eq!(
            texts(&replies),
            ["Произошла ошибка. Пожалуйста, начните заново командой /calculate"]
        );
        assert!(engine.sessions().get(USER).is_none());
    }

    #[tokio::test]
    async fn users_do_not_share_runs() {
        let engine = engine();
        let other = UserId(2002);
        run_to_area(&engine).await;
        engine.start(other).await;

        engine.free_text(other, "50").await;
        assert!(engine.sessions().get(other).unwrap().area.is_none());
        assert_eq!(
            engine.sessions().get(USER).unwrap().waiting(),
            AwaitingInput::AwaitingArea
        );
    }
}
