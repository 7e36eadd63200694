//! Telegram Bot API wire types and gateway domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire types (Bot API)
// ============================================================================

/// Envelope every Bot API method returns
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// Telegram user, as returned by `getMe` and inside chat member entries
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

/// Chat metadata, as returned by `getChat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub invite_link: Option<String>,
}

/// One entry of `getChatAdministrators`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMemberInfo {
    pub user: User,
    pub status: String,
}

/// The slice of `sendMessage`'s result the gateway reports back
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
    /// Unix timestamp assigned by Telegram
    pub date: i64,
}

// ============================================================================
// Domain types
// ============================================================================

/// Identity of a registered bot, from the `getMe` liveness check
#[derive(Debug, Clone, Serialize)]
pub struct BotProfile {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

impl From<User> for BotProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
        }
    }
}

/// Administrator entry attached to a group info lookup
#[derive(Debug, Clone, Serialize)]
pub struct GroupAdmin {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub status: String,
}

impl From<ChatMemberInfo> for GroupAdmin {
    fn from(member: ChatMemberInfo) -> Self {
        Self {
            user_id: member.user.id,
            username: member.user.username,
            first_name: member.user.first_name,
            status: member.status,
        }
    }
}

/// A group the bot participates in, from this process's point of view.
///
/// The list a user accumulates is not synchronized with Telegram's actual
/// membership and can drift if the bot is removed out of band.
#[derive(Debug, Clone, Serialize)]
pub struct GroupRecord {
    pub id: i64,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub invite_link: Option<String>,
    /// Best effort; 0 when the member-count lookup fails
    pub member_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrators: Option<Vec<GroupAdmin>>,
}

impl GroupRecord {
    /// Assemble a record from chat metadata and a member count
    pub fn from_chat(chat: ChatInfo, member_count: u32) -> Self {
        Self {
            id: chat.id,
            title: chat.title,
            kind: chat.kind,
            description: chat.description,
            invite_link: chat.invite_link,
            member_count,
            administrators: None,
        }
    }
}

/// Chat permission set for `setChatPermissions`.
///
/// Omitted fields fall back to the defaults the gateway has always applied:
/// the send-* family is allowed, the admin-ish family is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPermissions {
    #[serde(default = "default_true")]
    pub can_send_messages: bool,
    #[serde(default = "default_true")]
    pub can_send_media_messages: bool,
    #[serde(default = "default_true")]
    pub can_send_polls: bool,
    #[serde(default = "default_true")]
    pub can_send_other_messages: bool,
    #[serde(default = "default_true")]
    pub can_add_web_page_previews: bool,
    #[serde(default)]
    pub can_change_info: bool,
    #[serde(default)]
    pub can_invite_users: bool,
    #[serde(default)]
    pub can_pin_messages: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GroupPermissions {
    fn default() -> Self {
        Self {
            can_send_messages: true,
            can_send_media_messages: true,
            can_send_polls: true,
            can_send_other_messages: true,
            can_add_web_page_previews: true,
            can_change_info: false,
            can_invite_users: false,
            can_pin_messages: false,
        }
    }
}

/// Partial update applied by the edit-group operation.
///
/// Fields are applied independently, in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<GroupPermissions>,
}

/// Result of an edit-group operation.
///
/// `list_updated` is false when the edited chat had no matching record in
/// the user's stored list (the remote edit still happened).
#[derive(Debug, Clone)]
pub struct GroupEdit {
    pub group: GroupRecord,
    pub list_updated: bool,
}

/// A member that could not be processed in a batch operation
#[derive(Debug, Clone, Serialize)]
pub struct MemberFailure {
    pub user: String,
    pub error: String,
}

/// Outcome of a per-member batch operation.
///
/// One member's failure never aborts the batch; both lists preserve the
/// input order.
#[derive(Debug, Default, Serialize)]
pub struct MemberBatch {
    pub succeeded: Vec<String>,
    pub failed: Vec<MemberFailure>,
}

/// Receipt for a delivered message
#[derive(Debug, Clone)]
pub struct MessageReceipt {
    pub message_id: i64,
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_defaults_from_empty_object() {
        let perms: GroupPermissions = serde_json::from_str("{}").unwrap();
        assert!(perms.can_send_messages);
        assert!(perms.can_send_media_messages);
        assert!(perms.can_send_polls);
        assert!(perms.can_send_other_messages);
        assert!(perms.can_add_web_page_previews);
        assert!(!perms.can_change_info);
        assert!(!perms.can_invite_users);
        assert!(!perms.can_pin_messages);
        assert_eq!(perms, GroupPermissions::default());
    }

    #[test]
    fn test_permission_explicit_fields_override_defaults() {
        let perms: GroupPermissions =
            serde_json::from_str(r#"{"can_send_messages": false, "can_pin_messages": true}"#)
                .unwrap();
        assert!(!perms.can_send_messages);
        assert!(perms.can_pin_messages);
        // Untouched fields keep their defaults
        assert!(perms.can_send_polls);
        assert!(!perms.can_change_info);
    }

    #[test]
    fn test_api_response_error_envelope() {
        let body = r#"{"ok": false, "error_code": 404, "description": "Not Found"}"#;
        let resp: ApiResponse<ChatInfo> = serde_json::from_str(body).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error_code, Some(404));
        assert_eq!(resp.description.as_deref(), Some("Not Found"));
        assert!(resp.result.is_none());
    }

    #[test]
    fn test_chat_info_decoding() {
        let body = r#"{
            "id": -1001234567890,
            "type": "supergroup",
            "title": "Test Group",
            "invite_link": "https://t.me/+abc"
        }"#;
        let chat: ChatInfo = serde_json::from_str(body).unwrap();
        assert_eq!(chat.id, -1001234567890);
        assert_eq!(chat.kind, "supergroup");
        assert_eq!(chat.title.as_deref(), Some("Test Group"));
        assert!(chat.description.is_none());

        let record = GroupRecord::from_chat(chat, 42);
        assert_eq!(record.member_count, 42);
        assert!(record.administrators.is_none());
    }

    #[test]
    fn test_group_record_serializes_wire_names() {
        let record = GroupRecord {
            id: -100,
            title: Some("g".into()),
            kind: "group".into(),
            description: None,
            invite_link: None,
            member_count: 0,
            administrators: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "group");
        assert!(value.get("administrators").is_none());
    }
}
