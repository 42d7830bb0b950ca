//! Message formatting: pure functions from records to display text and
//! keyboards.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::bot::callback::wizard_token;
use crate::bot::keyboard::{InlineButton, InlineKeyboard};
use crate::carousel::{CarouselDomain, Direction};
use crate::content::{LinkButton, MenuButton, PortfolioEntry, Review};
use crate::wizard::{ChoiceStep, CompletedApplication};

/// Start-menu buttons per row.
const MENU_BUTTONS_PER_ROW: usize = 2;

const PREV_LABEL: &str = "◀️ Предыдущий";
const NEXT_LABEL: &str = "Следующий ▶️";

/// Contact method whose details line is labelled "Email" rather than
/// "Телефон".
const EMAIL_METHOD: &str = "Email";

pub fn format_review(review: &Review) -> String {
    format!(
        "👤 Имя: {}\n📅 Дата: {}\n\n💬 Отзыв:\n{}",
        review.name,
        format_date(&review.date),
        review.text
    )
}

pub fn format_portfolio(entry: &PortfolioEntry) -> String {
    format!("{}\n\n{}", entry.title, entry.description)
}

/// `dd.mm.yyyy`, or the input unchanged when it isn't a recognizable date.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        });
    match date {
        Some(d) => d.format("%d.%m.%Y").to_string(),
        None => raw.to_string(),
    }
}

/// Estimate summary sent when the wizard finishes.
pub fn format_summary(app: &CompletedApplication) -> String {
    let contact_label = if app.contact_method == EMAIL_METHOD {
        "Email"
    } else {
        "Телефон"
    };
    format!(
        "💰 Расчет стоимости ремонта\n\n\
         🏠 Тип помещения: {}\n\
         📍 Расположение: {}\n\
         📐 Метраж: {} м²\n\
         💬 Способ связи: {}\n\
         📱 {}: {}",
        app.property_type,
        app.location,
        app.area,
        app.contact_method,
        contact_label,
        app.contact_info
    )
}

/// Options of a wizard choice step, one per row.
pub fn choice_keyboard(step: ChoiceStep, options: &[String]) -> InlineKeyboard {
    InlineKeyboard::column(
        options
            .iter()
            .enumerate()
            .map(|(i, label)| InlineButton::callback(label.clone(), wizard_token(step, i))),
    )
}

/// Prev/next controls for the item at `index`, in a single row.
pub fn navigation_keyboard(domain: CarouselDomain, index: usize) -> InlineKeyboard {
    InlineKeyboard::new(vec![vec![
        InlineButton::callback(PREV_LABEL, domain.nav_token(Direction::Prev, index)),
        InlineButton::callback(NEXT_LABEL, domain.nav_token(Direction::Next, index)),
    ]])
}

pub fn menu_keyboard(buttons: &[MenuButton]) -> InlineKeyboard {
    InlineKeyboard::grid(
        buttons
            .iter()
            .map(|b| InlineButton::callback(b.text.clone(), b.callback_data.clone())),
        MENU_BUTTONS_PER_ROW,
    )
}

pub fn contact_keyboard(buttons: &[LinkButton]) -> InlineKeyboard {
    InlineKeyboard::column(
        buttons
            .iter()
            .map(|b| InlineButton::link(b.text.clone(), b.url.clone())),
    )
}
