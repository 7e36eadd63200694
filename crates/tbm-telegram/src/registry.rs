//! Per-user bot registry and request dispatcher
//!
//! The registry is the sole owner of mutable state (bot handles and group
//! lists) and the sole caller of the remote Bot API. Each user's state sits
//! behind its own mutex, so operations for the same user serialize while
//! different users proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::client::{ClientFactory, TelegramApi};
use crate::error::{Result, TelegramError};
use crate::types::{
    BotProfile, GroupAdmin, GroupEdit, GroupPatch, GroupRecord, MemberBatch, MemberFailure,
    MessageReceipt,
};

/// State owned by one user identifier
#[derive(Default)]
struct UserState {
    bot: Option<Arc<dyn TelegramApi>>,
    groups: Vec<GroupRecord>,
}

/// Registry of per-user bot handles and configured group lists
pub struct BotRegistry {
    users: RwLock<HashMap<String, Arc<Mutex<UserState>>>>,
    factory: ClientFactory,
}

impl BotRegistry {
    /// Create a registry that builds bot clients with the given factory
    pub fn new(factory: ClientFactory) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            factory,
        }
    }

    async fn entry(&self, user_id: &str) -> Option<Arc<Mutex<UserState>>> {
        self.users.read().await.get(user_id).cloned()
    }

    async fn entry_or_create(&self, user_id: &str) -> Arc<Mutex<UserState>> {
        if let Some(entry) = self.entry(user_id).await {
            return entry;
        }
        let mut users = self.users.write().await;
        Arc::clone(users.entry(user_id.to_string()).or_default())
    }

    async fn registered(&self, user_id: &str) -> Result<Arc<Mutex<UserState>>> {
        self.entry(user_id).await.ok_or(TelegramError::NotRegistered)
    }

    /// Register (or replace) the bot handle for a user.
    ///
    /// The token is verified with a `getMe` liveness check before anything
    /// is stored; a failed check leaves any prior registration untouched.
    /// Re-registration swaps the handle and keeps the configured group list.
    pub async fn register_bot(&self, user_id: &str, token: &str) -> Result<BotProfile> {
        if token.is_empty() {
            return Err(TelegramError::MissingField(
                "bot_token is required".to_string(),
            ));
        }

        let client = (self.factory)(token)?;

        let me = match client.get_me().await {
            Ok(me) => me,
            Err(TelegramError::Api(description)) => {
                return Err(TelegramError::Api(format!(
                    "Invalid bot token: {}",
                    description
                )));
            }
            Err(e) => return Err(e),
        };

        let entry = self.entry_or_create(user_id).await;
        let mut state = entry.lock().await;
        state.bot = Some(client);

        info!("Registered bot {} for user {}", me.id, user_id);
        Ok(BotProfile::from(me))
    }

    /// Attach an existing chat to the user's group list.
    ///
    /// The Bot API cannot create groups, so "configure" means: look the chat
    /// up remotely and append a record of it. Configuring the same chat
    /// twice appends a duplicate record.
    pub async fn configure_group(&self, user_id: &str, chat_id: &str) -> Result<GroupRecord> {
        if chat_id.is_empty() {
            return Err(TelegramError::MissingField(
                "chat_id is required".to_string(),
            ));
        }

        let entry = self.registered(user_id).await?;
        let mut state = entry.lock().await;
        let bot = state.bot.clone().ok_or(TelegramError::NotRegistered)?;

        let chat = bot.get_chat(chat_id).await?;
        let member_count = member_count_or_zero(bot.as_ref(), chat_id).await;

        let record = GroupRecord::from_chat(chat, member_count);
        state.groups.push(record.clone());

        info!("Configured group {} for user {}", record.id, user_id);
        Ok(record)
    }

    /// Apply a partial update to a group: title, description, and
    /// permissions, independently and in that order, then re-fetch the chat
    /// and refresh the stored record.
    ///
    /// `list_updated` in the result is false when no stored record matched
    /// the chat id (the remote edits still happened).
    pub async fn edit_group(
        &self,
        user_id: &str,
        group_id: &str,
        patch: GroupPatch,
    ) -> Result<GroupEdit> {
        let entry = self.registered(user_id).await?;
        let mut state = entry.lock().await;
        let bot = state.bot.clone().ok_or(TelegramError::NotRegistered)?;

        if let Some(title) = &patch.title {
            bot.set_chat_title(group_id, title).await?;
        }
        if let Some(description) = &patch.description {
            bot.set_chat_description(group_id, description).await?;
        }
        if let Some(permissions) = &patch.permissions {
            bot.set_chat_permissions(group_id, permissions).await?;
        }

        let chat = bot.get_chat(group_id).await?;
        let member_count = member_count_or_zero(bot.as_ref(), group_id).await;
        let record = GroupRecord::from_chat(chat, member_count);

        // Stored records are matched by string-equal chat id
        let mut list_updated = false;
        for group in state.groups.iter_mut() {
            if group.id.to_string() == group_id {
                *group = record.clone();
                list_updated = true;
                break;
            }
        }

        Ok(GroupEdit {
            group: record,
            list_updated,
        })
    }

    /// Leave the chat and drop matching records from the user's list.
    ///
    /// "Delete" is from the bot's perspective only; the group itself
    /// survives on Telegram's side.
    pub async fn delete_group(&self, user_id: &str, group_id: &str) -> Result<()> {
        let entry = self.registered(user_id).await?;
        let mut state = entry.lock().await;
        let bot = state.bot.clone().ok_or(TelegramError::NotRegistered)?;

        bot.leave_chat(group_id).await?;
        state.groups.retain(|g| g.id.to_string() != group_id);

        info!("Left group {} for user {}", group_id, user_id);
        Ok(())
    }

    /// Add members one by one, isolating per-member failures.
    ///
    /// The loop is strictly sequential; Telegram's rate limits are the
    /// reason this is not parallelized.
    pub async fn add_members(
        &self,
        user_id: &str,
        group_id: &str,
        members: &[String],
    ) -> Result<MemberBatch> {
        let entry = self.registered(user_id).await?;
        let state = entry.lock().await;
        let bot = state.bot.clone().ok_or(TelegramError::NotRegistered)?;

        let mut batch = MemberBatch::default();
        for member in members {
            match bot.add_chat_member(group_id, member).await {
                Ok(()) => batch.succeeded.push(member.clone()),
                Err(e) => {
                    warn!("Failed to add {} to {}: {}", member, group_id, e);
                    batch.failed.push(MemberFailure {
                        user: member.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }

    /// Remove members one by one with the same failure isolation as
    /// `add_members`. Removal is a ban followed immediately by an unban,
    /// the Bot API idiom for a kick that allows re-entry.
    pub async fn remove_members(
        &self,
        user_id: &str,
        group_id: &str,
        members: &[String],
    ) -> Result<MemberBatch> {
        let entry = self.registered(user_id).await?;
        let state = entry.lock().await;
        let bot = state.bot.clone().ok_or(TelegramError::NotRegistered)?;

        let mut batch = MemberBatch::default();
        for member in members {
            match kick(bot.as_ref(), group_id, member).await {
                Ok(()) => batch.succeeded.push(member.clone()),
                Err(e) => {
                    warn!("Failed to remove {} from {}: {}", member, group_id, e);
                    batch.failed.push(MemberFailure {
                        user: member.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }

    /// Send a formatted message to a chat
    pub async fn send_message(
        &self,
        user_id: &str,
        group_id: &str,
        text: &str,
        parse_mode: &str,
    ) -> Result<MessageReceipt> {
        if text.is_empty() {
            return Err(TelegramError::MissingField(
                "message is required".to_string(),
            ));
        }

        let entry = self.registered(user_id).await?;
        let state = entry.lock().await;
        let bot = state.bot.clone().ok_or(TelegramError::NotRegistered)?;

        let sent = bot.send_message(group_id, text, parse_mode).await?;
        let sent_at = DateTime::from_timestamp(sent.date, 0).unwrap_or_else(Utc::now);

        Ok(MessageReceipt {
            message_id: sent.message_id,
            sent_at,
        })
    }

    /// The user's stored group list; empty (not an error) for unknown users
    pub async fn list_groups(&self, user_id: &str) -> Vec<GroupRecord> {
        match self.entry(user_id).await {
            Some(entry) => entry.lock().await.groups.clone(),
            None => Vec::new(),
        }
    }

    /// Fetch fresh chat metadata plus the administrator list.
    ///
    /// Read-only: the stored group list is not touched.
    pub async fn group_info(&self, user_id: &str, group_id: &str) -> Result<GroupRecord> {
        let entry = self.registered(user_id).await?;
        let state = entry.lock().await;
        let bot = state.bot.clone().ok_or(TelegramError::NotRegistered)?;

        let chat = bot.get_chat(group_id).await?;
        let member_count = member_count_or_zero(bot.as_ref(), group_id).await;
        let administrators = bot.get_chat_administrators(group_id).await?;

        let mut record = GroupRecord::from_chat(chat, member_count);
        record.administrators = Some(administrators.into_iter().map(GroupAdmin::from).collect());
        Ok(record)
    }
}

/// Member count is best effort: 0 when the lookup fails
async fn member_count_or_zero(bot: &dyn TelegramApi, chat_id: &str) -> u32 {
    match bot.get_chat_member_count(chat_id).await {
        Ok(count) => count,
        Err(e) => {
            debug!("Member count unavailable for {}: {}", chat_id, e);
            0
        }
    }
}

async fn kick(bot: &dyn TelegramApi, chat_id: &str, user: &str) -> Result<()> {
    bot.ban_chat_member(chat_id, user).await?;
    bot.unban_chat_member(chat_id, user).await
}
