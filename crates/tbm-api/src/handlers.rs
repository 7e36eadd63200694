//! HTTP API handlers
//!
//! One handler per route. Missing-field validation happens here with a 400,
//! so the registry only ever sees well-formed requests.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tbm_telegram::{BotProfile, GroupPatch, GroupRecord, MemberFailure};

use crate::error::ApiError;
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Chat/user identifiers may arrive as JSON numbers or strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Int(i64),
    Str(String),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Str(s) => s,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBotRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub bot_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterBotResponse {
    pub success: bool,
    pub message: String,
    pub bot_info: BotProfile,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// Id of an existing chat; the Bot API cannot create groups
    #[serde(default)]
    pub chat_id: Option<IdValue>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub success: bool,
    pub message: String,
    pub group: GroupRecord,
}

#[derive(Debug, Serialize)]
pub struct DeleteGroupResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MembersRequest {
    #[serde(default)]
    pub members: Vec<IdValue>,
}

#[derive(Debug, Serialize)]
pub struct AddMembersResponse {
    pub success: bool,
    pub message: String,
    pub added_members: Vec<String>,
    pub failed_members: Vec<MemberFailure>,
}

#[derive(Debug, Serialize)]
pub struct RemoveMembersResponse {
    pub success: bool,
    pub message: String,
    pub removed_members: Vec<String>,
    pub failed_members: Vec<MemberFailure>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
}

fn default_parse_mode() -> String {
    "HTML".to_string()
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: String,
    pub message_id: i64,
    /// RFC 3339 timestamp assigned by Telegram
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct ListGroupsResponse {
    pub success: bool,
    pub groups: Vec<GroupRecord>,
}

#[derive(Debug, Serialize)]
pub struct GroupInfoResponse {
    pub success: bool,
    pub group: GroupRecord,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Telegram Bot Manager API is running",
    })
}

/// Register a bot token for a user
pub async fn register_bot(
    State(state): State<AppState>,
    Json(req): Json<RegisterBotRequest>,
) -> Result<Json<RegisterBotResponse>, ApiError> {
    let (Some(user_id), Some(bot_token)) = (
        req.user_id.filter(|s| !s.is_empty()),
        req.bot_token.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::missing("user_id and bot_token are required"));
    };

    debug!("Register request for user {}", user_id);
    let bot_info = state.registry.register_bot(&user_id, &bot_token).await?;

    Ok(Json(RegisterBotResponse {
        success: true,
        message: "Bot registered successfully".to_string(),
        bot_info,
    }))
}

/// Attach an existing chat to the user's group list
pub async fn create_group(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    let Some(chat_id) = req.chat_id else {
        return Err(ApiError::missing(
            "chat_id is required: the Bot API cannot create groups, so create \
             the group in Telegram, add the bot as administrator, and supply \
             the group's chat_id",
        ));
    };

    let group = state
        .registry
        .configure_group(&user_id, &chat_id.into_string())
        .await?;

    Ok(Json(GroupResponse {
        success: true,
        message: "Group configured successfully".to_string(),
        group,
    }))
}

/// Edit a group's title, description, or permissions
pub async fn edit_group(
    State(state): State<AppState>,
    Path((user_id, group_id)): Path<(String, String)>,
    Json(patch): Json<GroupPatch>,
) -> Result<Json<GroupResponse>, ApiError> {
    let edit = state.registry.edit_group(&user_id, &group_id, patch).await?;

    if !edit.list_updated {
        warn!(
            "Edited chat {} is not in the stored group list for user {}",
            group_id, user_id
        );
    }

    Ok(Json(GroupResponse {
        success: true,
        message: "Group edited successfully".to_string(),
        group: edit.group,
    }))
}

/// Make the bot leave the chat and forget its record
pub async fn delete_group(
    State(state): State<AppState>,
    Path((user_id, group_id)): Path<(String, String)>,
) -> Result<Json<DeleteGroupResponse>, ApiError> {
    state.registry.delete_group(&user_id, &group_id).await?;

    Ok(Json(DeleteGroupResponse {
        success: true,
        message: "Bot removed from group successfully".to_string(),
    }))
}

/// Add members to a group, one by one
pub async fn add_members(
    State(state): State<AppState>,
    Path((user_id, group_id)): Path<(String, String)>,
    Json(req): Json<MembersRequest>,
) -> Result<Json<AddMembersResponse>, ApiError> {
    let members: Vec<String> = req.members.into_iter().map(IdValue::into_string).collect();
    let batch = state.registry.add_members(&user_id, &group_id, &members).await?;

    Ok(Json(AddMembersResponse {
        success: true,
        message: format!("Added {} members", batch.succeeded.len()),
        added_members: batch.succeeded,
        failed_members: batch.failed,
    }))
}

/// Remove members from a group, one by one
pub async fn remove_members(
    State(state): State<AppState>,
    Path((user_id, group_id)): Path<(String, String)>,
    Json(req): Json<MembersRequest>,
) -> Result<Json<RemoveMembersResponse>, ApiError> {
    let members: Vec<String> = req.members.into_iter().map(IdValue::into_string).collect();
    let batch = state
        .registry
        .remove_members(&user_id, &group_id, &members)
        .await?;

    Ok(Json(RemoveMembersResponse {
        success: true,
        message: format!("Removed {} members", batch.succeeded.len()),
        removed_members: batch.succeeded,
        failed_members: batch.failed,
    }))
}

/// Send a formatted message to a group
pub async fn send_message(
    State(state): State<AppState>,
    Path((user_id, group_id)): Path<(String, String)>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let Some(message) = req.message.filter(|m| !m.is_empty()) else {
        return Err(ApiError::missing("message is required"));
    };

    let receipt = state
        .registry
        .send_message(&user_id, &group_id, &message, &req.parse_mode)
        .await?;

    info!("Message {} sent to group {}", receipt.message_id, group_id);
    Ok(Json(SendMessageResponse {
        success: true,
        message: "Message sent successfully".to_string(),
        message_id: receipt.message_id,
        date: receipt.sent_at.to_rfc3339(),
    }))
}

/// List the groups recorded for a user
pub async fn list_groups(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ListGroupsResponse> {
    let groups = state.registry.list_groups(&user_id).await;
    Json(ListGroupsResponse {
        success: true,
        groups,
    })
}

/// Fetch fresh group metadata including the administrator list
pub async fn group_info(
    State(state): State<AppState>,
    Path((user_id, group_id)): Path<(String, String)>,
) -> Result<Json<GroupInfoResponse>, ApiError> {
    let group = state.registry.group_info(&user_id, &group_id).await?;
    Ok(Json(GroupInfoResponse {
        success: true,
        group,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_defaults_to_html() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(req.parse_mode, "HTML");

        let req: SendMessageRequest =
            serde_json::from_str(r#"{"message": "hi", "parse_mode": "MarkdownV2"}"#).unwrap();
        assert_eq!(req.parse_mode, "MarkdownV2");
    }

    #[test]
    fn test_id_value_accepts_numbers_and_strings() {
        let req: CreateGroupRequest = serde_json::from_str(r#"{"chat_id": -1001234}"#).unwrap();
        assert_eq!(req.chat_id.unwrap().into_string(), "-1001234");

        let req: CreateGroupRequest = serde_json::from_str(r#"{"chat_id": "@mygroup"}"#).unwrap();
        assert_eq!(req.chat_id.unwrap().into_string(), "@mygroup");

        let req: CreateGroupRequest = serde_json::from_str("{}").unwrap();
        assert!(req.chat_id.is_none());
    }

    #[test]
    fn test_members_request_mixed_ids() {
        let req: MembersRequest =
            serde_json::from_str(r#"{"members": [123, "someone"]}"#).unwrap();
        let members: Vec<String> = req.members.into_iter().map(IdValue::into_string).collect();
        assert_eq!(members, vec!["123", "someone"]);
    }

    #[test]
    fn test_register_request_tolerates_missing_fields() {
        let req: RegisterBotRequest = serde_json::from_str(r#"{"user_id": "u1"}"#).unwrap();
        assert_eq!(req.user_id.as_deref(), Some("u1"));
        assert!(req.bot_token.is_none());
    }
}
