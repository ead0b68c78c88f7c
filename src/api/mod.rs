/// Backend API for the chat client
///
/// The session store talks to the backend only through the [`ChatApi`] trait,
/// so the UI runs against [`HttpChatApi`] while tests drive the store with a
/// scripted implementation.
///
/// # Endpoints
///
/// - `GET /api/user/data` - current user for the token
/// - `GET /api/chat/get` - the user's chat threads
/// - `GET /api/chat/create` - create an empty thread
///
/// Every call sends the raw token in the `Authorization` header and expects a
/// `{ success, ..., message? }` envelope.
mod http;

pub use http::HttpChatApi;

use crate::types::{Chat, User};
use async_trait::async_trait;

pub const USER_DATA_PATH: &str = "/api/user/data";
pub const CHAT_LIST_PATH: &str = "/api/chat/get";
pub const CHAT_CREATE_PATH: &str = "/api/chat/create";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response missing `{0}`")]
    MissingField(&'static str),
}

impl ApiError {
    /// Text for the toast: the server's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } | ApiError::Rejected(message) => message.clone(),
            ApiError::Transport(err) => err.to_string(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn fetch_user(&self, token: &str) -> ApiResult<User>;

    async fn fetch_chats(&self, token: &str) -> ApiResult<Vec<Chat>>;

    /// The response body is only checked for success.
    async fn create_chat(&self, token: &str) -> ApiResult<()>;
}
