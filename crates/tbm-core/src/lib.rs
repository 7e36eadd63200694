//! tbm-core: Telegram Bot Manager core library
//!
//! Shared configuration and error types for the gateway service.

pub mod config;
pub mod error;

pub use config::{ApiConfig, Config, LogConfig, TelegramConfig};
pub use error::{Error, Result};
