//! Error types for the bot.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Telegram transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send {method} on channel {name}: {reason}")]
    SendFailed {
        name: String,
        method: String,
        reason: String,
    },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl ChannelError {
    pub(crate) fn telegram(method: &str, reason: impl Into<String>) -> Self {
        Self::SendFailed {
            name: "telegram".into(),
            method: method.into(),
            reason: reason.into(),
        }
    }
}

/// Failures inside a conversation flow.
///
/// The `Display` text of each variant is the exact message shown to the
/// user, so handlers reply with `err.to_string()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// The singleton record (start, contacts, wizard questions) is missing.
    #[error("Конфигурация не найдена")]
    ConfigNotFound,

    /// Malformed wizard token, or a selection outside the option bounds.
    #[error("Ошибка")]
    InvalidSelection,

    /// Malformed carousel token.
    #[error("Ошибка навигации")]
    InvalidNavigation,

    /// Area input is not a positive finite number.
    #[error("Пожалуйста, введите корректное число (метраж в м²)")]
    InvalidArea,

    /// Finalization reached with a field missing.
    #[error("Произошла ошибка. Пожалуйста, начните заново командой /calculate")]
    RestartRequired,
}
