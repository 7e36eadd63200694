//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::handlers::{
    add_members, create_group, delete_group, edit_group, group_info, health, list_groups,
    register_bot, remove_members, send_message,
};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Bot registration
        .route("/bot/register", post(register_bot))
        // Group management
        .route("/bot/{user_id}/group/create", post(create_group))
        .route("/bot/{user_id}/group/{group_id}/edit", put(edit_group))
        .route("/bot/{user_id}/group/{group_id}/delete", delete(delete_group))
        .route("/bot/{user_id}/groups", get(list_groups))
        .route("/bot/{user_id}/group/{group_id}/info", get(group_info))
        // Members
        .route("/bot/{user_id}/group/{group_id}/members/add", post(add_members))
        .route("/bot/{user_id}/group/{group_id}/members/remove", post(remove_members))
        // Messaging
        .route("/bot/{user_id}/group/{group_id}/send-message", post(send_message))
}
