use super::{
    ApiError, ApiResult, CHAT_CREATE_PATH, CHAT_LIST_PATH, ChatApi, USER_DATA_PATH,
};
use crate::config::ClientConfig;
use crate::types::{Chat, User};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const DEFAULT_REJECTION: &str = "Request failed";

#[derive(Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    success: bool,
    user: Option<User>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ChatsEnvelope {
    #[serde(default)]
    success: bool,
    chats: Option<Vec<Chat>>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct AckEnvelope {
    #[serde(default)]
    success: bool,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// reqwest-backed client for the chat backend
pub struct HttpChatApi {
    client: Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(config: &ClientConfig) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.request_timeout);
        let client = builder.build().unwrap_or_else(|err| {
            warn!("falling back to the default HTTP client: {err}");
            Client::new()
        });
        Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> ApiResult<T> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .header(AUTHORIZATION, token)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(path, status = status.as_u16(), "backend returned an error status");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// `message` from a JSON error body, else the raw body, else the status text.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or(DEFAULT_REJECTION)
        .to_string()
}

fn rejected(message: Option<String>) -> ApiError {
    ApiError::Rejected(message.unwrap_or_else(|| DEFAULT_REJECTION.to_string()))
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn fetch_user(&self, token: &str) -> ApiResult<User> {
        let data: UserEnvelope = self.get_json(USER_DATA_PATH, token).await?;
        if !data.success {
            return Err(rejected(data.message));
        }
        data.user.ok_or(ApiError::MissingField("user"))
    }

    async fn fetch_chats(&self, token: &str) -> ApiResult<Vec<Chat>> {
        let data: ChatsEnvelope = self.get_json(CHAT_LIST_PATH, token).await?;
        if !data.success {
            return Err(rejected(data.message));
        }
        data.chats.ok_or(ApiError::MissingField("chats"))
    }

    async fn create_chat(&self, token: &str) -> ApiResult<()> {
        let data: AckEnvelope = self.get_json(CHAT_CREATE_PATH, token).await?;
        if !data.success {
            return Err(rejected(data.message));
        }
        Ok(())
    }
}
