//! tbm-telegram: Telegram Bot API integration for tbm-gateway
//!
//! Provides the wire-level Bot API client, the `TelegramApi` capability
//! trait, and the per-user `BotRegistry` that owns every bot handle and
//! configured group list.

pub mod client;
pub mod error;
pub mod registry;
pub mod types;

pub use client::{BotClient, ClientFactory, TelegramApi, bot_client_factory};
pub use error::{Result, TelegramError};
pub use registry::BotRegistry;
pub use types::{
    BotProfile, GroupAdmin, GroupEdit, GroupPatch, GroupPermissions, GroupRecord, MemberBatch,
    MemberFailure, MessageReceipt,
};
