//! Error types for tbm-telegram

use thiserror::Error;

/// tbm-telegram error type
#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Bot not registered for this user")]
    NotRegistered,

    #[error("{0}")]
    MissingField(String),

    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TelegramError>;
