//! Inline keyboards attached to outgoing messages.
//!
//! Serializes to the Bot API `InlineKeyboardMarkup` shape:
//! `{"inline_keyboard": [[{"text": .., "callback_data": ..}]]}`.

use serde::Serialize;

/// One button. Exactly one of `callback_data` / `url` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

/// Rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    #[serde(rename = "inline_keyboard")]
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// One button per row.
    pub fn column(buttons: impl IntoIterator<Item = InlineButton>) -> Self {
        Self::grid(buttons, 1)
    }

    /// Buttons batched `per_row` to a row; the last row may be shorter.
    pub fn grid(buttons: impl IntoIterator<Item = InlineButton>, per_row: usize) -> Self {
        let per_row = per_row.max(1);
        let mut rows: Vec<Vec<InlineButton>> = Vec::new();
        for button in buttons {
            match rows.last_mut() {
                Some(row) if row.len() < per_row => row.push(button),
                _ => rows.push(vec![button]),
            }
        }
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// All callback tokens, row by row.
    pub fn callback_tokens(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|b| b.callback_data.as_deref())
    }
}
