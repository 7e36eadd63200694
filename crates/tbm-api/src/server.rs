//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use tbm_core::Config;
use tbm_telegram::BotRegistry;

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BotRegistry>,
}

/// Build the application router with CORS applied
pub fn app(registry: Arc<BotRegistry>, allowed_origins: Option<&[String]>) -> Router {
    let state = AppState { registry };

    Router::new()
        .merge(routes())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Start the HTTP API server
pub async fn start_server(config: &Config, registry: Arc<BotRegistry>) -> anyhow::Result<()> {
    let app = app(registry, config.api.allowed_origins.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS from the configured allow-list; permissive when unset or `*`
fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    match allowed_origins {
        None => CorsLayer::permissive(),
        Some(list) if list.iter().any(|o| o == "*") => CorsLayer::permissive(),
        Some(list) => {
            let origins: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use tbm_telegram::client::{ClientFactory, TelegramApi};
    use tbm_telegram::error::{Result, TelegramError};
    use tbm_telegram::types::{ChatInfo, ChatMemberInfo, GroupPermissions, SentMessage, User};

    /// Minimal happy-path Bot API double for routing tests
    struct StubApi;

    #[async_trait]
    impl TelegramApi for StubApi {
        async fn get_me(&self) -> Result<User> {
            Ok(User {
                id: 42,
                first_name: "StubBot".to_string(),
                username: Some("stub_bot".to_string()),
                is_bot: true,
            })
        }

        async fn get_chat(&self, _chat_id: &str) -> Result<ChatInfo> {
            Ok(ChatInfo {
                id: -100123,
                kind: "supergroup".to_string(),
                title: Some("Stub Group".to_string()),
                description: None,
                invite_link: None,
            })
        }

        async fn get_chat_member_count(&self, _chat_id: &str) -> Result<u32> {
            Ok(3)
        }

        async fn set_chat_title(&self, _chat_id: &str, _title: &str) -> Result<()> {
            Ok(())
        }

        async fn set_chat_description(&self, _chat_id: &str, _description: &str) -> Result<()> {
            Ok(())
        }

        async fn set_chat_permissions(
            &self,
            _chat_id: &str,
            _permissions: &GroupPermissions,
        ) -> Result<()> {
            Ok(())
        }

        async fn leave_chat(&self, _chat_id: &str) -> Result<()> {
            Ok(())
        }

        async fn add_chat_member(&self, _chat_id: &str, _user: &str) -> Result<()> {
            Ok(())
        }

        async fn ban_chat_member(&self, _chat_id: &str, _user: &str) -> Result<()> {
            Ok(())
        }

        async fn unban_chat_member(&self, _chat_id: &str, _user: &str) -> Result<()> {
            Ok(())
        }

        async fn send_message(
            &self,
            _chat_id: &str,
            _text: &str,
            _parse_mode: &str,
        ) -> Result<SentMessage> {
            Ok(SentMessage {
                message_id: 1,
                date: 1_700_000_000,
            })
        }

        async fn get_chat_administrators(&self, _chat_id: &str) -> Result<Vec<ChatMemberInfo>> {
            Ok(Vec::new())
        }
    }

    fn stub_factory() -> ClientFactory {
        Arc::new(|_token: &str| Ok(Arc::new(StubApi) as Arc<dyn TelegramApi>))
    }

    fn test_app() -> Router {
        app(Arc::new(BotRegistry::new(stub_factory())), None)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_register_requires_user_id_and_token() {
        let response = test_app()
            .oneshot(post_json("/bot/register", json!({"user_id": "u1"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("bot_token"));
    }

    #[tokio::test]
    async fn test_create_group_requires_chat_id() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/bot/register",
                json!({"user_id": "u1", "bot_token": "123:ABC"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(post_json("/bot/u1/group/create", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("chat_id"));
    }

    #[tokio::test]
    async fn test_unregistered_user_gets_500_with_error_body() {
        let response = test_app()
            .oneshot(post_json(
                "/bot/ghost/group/-100123/send-message",
                json!({"message": "hi"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("not registered"));
    }

    #[tokio::test]
    async fn test_list_groups_is_empty_success_for_unknown_user() {
        let response = test_app()
            .oneshot(Request::get("/bot/nobody/groups").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["groups"], json!([]));
    }

    #[tokio::test]
    async fn test_register_and_configure_flow() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/bot/register",
                json!({"user_id": "u1", "bot_token": "123:ABC"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["bot_info"]["id"], 42);
        assert_eq!(body["bot_info"]["username"], "stub_bot");

        let response = app
            .clone()
            .oneshot(post_json("/bot/u1/group/create", json!({"chat_id": -100123})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["group"]["id"], -100123);
        assert_eq!(body["group"]["type"], "supergroup");

        let response = app
            .oneshot(Request::get("/bot/u1/groups").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["groups"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_cors_layer_accepts_origin_list() {
        // Builds without panicking for explicit lists and wildcard
        let _ = cors_layer(Some(&["http://localhost:3000".to_string()]));
        let _ = cors_layer(Some(&["*".to_string()]));
        let _ = cors_layer(None);
    }

    #[tokio::test]
    async fn test_send_message_response_shape() {
        let app = test_app();

        app.clone()
            .oneshot(post_json(
                "/bot/register",
                json!({"user_id": "u1", "bot_token": "123:ABC"}),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(post_json(
                "/bot/u1/group/-100123/send-message",
                json!({"message": "<b>hi</b>"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message_id"], 1);
        assert!(body["date"].as_str().unwrap().starts_with("2023-11-14"));
    }
}
