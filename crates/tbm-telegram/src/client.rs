//! Telegram Bot API HTTP client
//!
//! A thin JSON client over `https://api.telegram.org/bot<token>/<method>`,
//! behind the `TelegramApi` trait so the registry can be exercised without
//! network access.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use tbm_core::TelegramConfig;

use crate::error::{Result, TelegramError};
use crate::types::{ApiResponse, ChatInfo, ChatMemberInfo, GroupPermissions, SentMessage, User};

/// Capability interface over the remote Bot API.
///
/// Chat and member identifiers are passed as the caller supplied them;
/// numeric strings go out as JSON numbers, anything else verbatim, and the
/// remote side decides whether it is addressable.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn get_me(&self) -> Result<User>;
    async fn get_chat(&self, chat_id: &str) -> Result<ChatInfo>;
    async fn get_chat_member_count(&self, chat_id: &str) -> Result<u32>;
    async fn set_chat_title(&self, chat_id: &str, title: &str) -> Result<()>;
    async fn set_chat_description(&self, chat_id: &str, description: &str) -> Result<()>;
    async fn set_chat_permissions(
        &self,
        chat_id: &str,
        permissions: &GroupPermissions,
    ) -> Result<()>;
    async fn leave_chat(&self, chat_id: &str) -> Result<()>;
    async fn add_chat_member(&self, chat_id: &str, user: &str) -> Result<()>;
    async fn ban_chat_member(&self, chat_id: &str, user: &str) -> Result<()>;
    async fn unban_chat_member(&self, chat_id: &str, user: &str) -> Result<()>;
    async fn send_message(&self, chat_id: &str, text: &str, parse_mode: &str)
    -> Result<SentMessage>;
    async fn get_chat_administrators(&self, chat_id: &str) -> Result<Vec<ChatMemberInfo>>;
}

/// Builds a `TelegramApi` handle from a bot token.
///
/// The registry constructs one client per registration; tests install a
/// factory returning fakes.
pub type ClientFactory = Arc<dyn Fn(&str) -> Result<Arc<dyn TelegramApi>> + Send + Sync>;

/// Production factory: `BotClient` with timeout and base URL from config
pub fn bot_client_factory(config: &TelegramConfig) -> ClientFactory {
    let base_url = config.base_url.clone();
    let timeout = Duration::from_secs(config.request_timeout_secs);
    Arc::new(move |token: &str| {
        let client = BotClient::with_base_url(token, timeout, base_url.clone())?;
        Ok(Arc::new(client) as Arc<dyn TelegramApi>)
    })
}

/// Bot API client authenticated by one bot token
pub struct BotClient {
    client: Client,
    token: String,
    base_url: String,
}

impl BotClient {
    /// Create a client against the public Bot API server
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(token, timeout, "https://api.telegram.org".to_string())
    }

    /// Create a client with a custom base URL (tests, self-hosted servers)
    pub fn with_base_url(token: &str, timeout: Duration, base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TelegramError::Http)?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Issue one Bot API method call and unwrap the response envelope.
    ///
    /// The URL embeds the token, so logging sticks to the method name.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &Value) -> Result<T> {
        debug!("Calling Bot API method {}", method);

        let response = self
            .client
            .post(self.api_url(method))
            .json(params)
            .send()
            .await
            .map_err(TelegramError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(TelegramError::Http)?;

        decode_envelope(method, status, &body)
    }
}

/// Unwrap a Bot API response envelope into its `result`.
///
/// Error bodies still arrive as envelopes; anything else (a proxy error
/// page, say) fails the parse and is reported with its status and body.
fn decode_envelope<T: DeserializeOwned>(
    method: &str,
    status: StatusCode,
    body: &str,
) -> Result<T> {
    let parsed: ApiResponse<T> = serde_json::from_str(body).map_err(|e| {
        TelegramError::Api(format!("Failed to parse response ({}): {} - {}", status, e, body))
    })?;

    if !parsed.ok {
        let description = parsed
            .description
            .unwrap_or_else(|| format!("HTTP {}", status));
        warn!("Bot API method {} rejected: {}", method, description);
        return Err(TelegramError::Api(description));
    }

    parsed
        .result
        .ok_or_else(|| TelegramError::Api(format!("{}: empty result", method)))
}

/// Identifiers arrive as path/body strings; the Bot API wants numbers where
/// the value is numeric and accepts strings (e.g. `@channelname`) otherwise.
fn id_value(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => json!(n),
        Err(_) => json!(id),
    }
}

#[async_trait]
impl TelegramApi for BotClient {
    async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({})).await
    }

    async fn get_chat(&self, chat_id: &str) -> Result<ChatInfo> {
        self.call("getChat", &json!({ "chat_id": id_value(chat_id) }))
            .await
    }

    async fn get_chat_member_count(&self, chat_id: &str) -> Result<u32> {
        self.call("getChatMemberCount", &json!({ "chat_id": id_value(chat_id) }))
            .await
    }

    async fn set_chat_title(&self, chat_id: &str, title: &str) -> Result<()> {
        self.call::<bool>(
            "setChatTitle",
            &json!({ "chat_id": id_value(chat_id), "title": title }),
        )
        .await?;
        Ok(())
    }

    async fn set_chat_description(&self, chat_id: &str, description: &str) -> Result<()> {
        self.call::<bool>(
            "setChatDescription",
            &json!({ "chat_id": id_value(chat_id), "description": description }),
        )
        .await?;
        Ok(())
    }

    async fn set_chat_permissions(
        &self,
        chat_id: &str,
        permissions: &GroupPermissions,
    ) -> Result<()> {
        self.call::<bool>(
            "setChatPermissions",
            &json!({ "chat_id": id_value(chat_id), "permissions": permissions }),
        )
        .await?;
        Ok(())
    }

    async fn leave_chat(&self, chat_id: &str) -> Result<()> {
        self.call::<bool>("leaveChat", &json!({ "chat_id": id_value(chat_id) }))
            .await?;
        Ok(())
    }

    async fn add_chat_member(&self, chat_id: &str, user: &str) -> Result<()> {
        // The Bot API has no such method and rejects the call; the registry
        // reports that rejection per member. Bots can only join members via
        // invite links.
        self.call::<bool>(
            "addChatMember",
            &json!({ "chat_id": id_value(chat_id), "user_id": id_value(user) }),
        )
        .await?;
        Ok(())
    }

    async fn ban_chat_member(&self, chat_id: &str, user: &str) -> Result<()> {
        self.call::<bool>(
            "banChatMember",
            &json!({ "chat_id": id_value(chat_id), "user_id": id_value(user) }),
        )
        .await?;
        Ok(())
    }

    async fn unban_chat_member(&self, chat_id: &str, user: &str) -> Result<()> {
        self.call::<bool>(
            "unbanChatMember",
            &json!({ "chat_id": id_value(chat_id), "user_id": id_value(user) }),
        )
        .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: &str,
    ) -> Result<SentMessage> {
        self.call(
            "sendMessage",
            &json!({
                "chat_id": id_value(chat_id),
                "text": text,
                "parse_mode": parse_mode,
            }),
        )
        .await
    }

    async fn get_chat_administrators(&self, chat_id: &str) -> Result<Vec<ChatMemberInfo>> {
        self.call(
            "getChatAdministrators",
            &json!({ "chat_id": id_value(chat_id) }),
        )
        .await
    }
}
