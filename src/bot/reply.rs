//! Outgoing instructions produced by conversation handlers.
//!
//! Handlers never talk to the transport directly; they return a list of
//! [`Reply`] values that the dispatcher executes in order.

use super::keyboard::InlineKeyboard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send a new text message to the user's chat.
    Text {
        text: String,
        keyboard: Option<InlineKeyboard>,
    },

    /// Answer the pending callback query, optionally with a toast.
    Ack(Option<String>),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Self::Text {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn ack() -> Self {
        Self::Ack(None)
    }

    pub fn ack_with(text: impl Into<String>) -> Self {
        Self::Ack(Some(text.into()))
    }

    /// Message text, for text replies.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Ack(_) => None,
        }
    }
}
