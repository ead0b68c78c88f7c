use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Backend identifiers arrive either as numbers or as opaque strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Num(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        RecordId::Num(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub is_image: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl Message {
    pub fn text(role: Role, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            content: content.into(),
            is_image: false,
            timestamp,
        }
    }

    pub fn image(url: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: Role::Assistant,
            content: url.into(),
            is_image: true,
            timestamp,
        }
    }
}

fn default_chat_name() -> String {
    "New Chat".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default = "default_chat_name")]
    pub name: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Chat {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            name: default_chat_name(),
            messages: Vec::new(),
            user_id: None,
            user_name: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sidebar label: the first user prompt when there is one, else the thread name.
    pub fn preview(&self) -> String {
        let first_prompt = self
            .messages
            .iter()
            .find(|msg| msg.role == Role::User && !msg.is_image)
            .map(|msg| msg.content.trim());
        match first_prompt {
            Some(text) if !text.is_empty() => {
                let mut preview: String = text.chars().take(32).collect();
                if text.chars().count() > 32 {
                    preview.push('…');
                }
                preview
            }
            _ => self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Unknown stored values fall back to light, like a missing entry.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "dark" => ThemeMode::Dark,
            _ => ThemeMode::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    /// Class applied to the document root; dark mode carries the `dark` marker.
    pub fn root_class(self) -> &'static str {
        match self {
            ThemeMode::Light => "app-root",
            ThemeMode::Dark => "app-root dark",
        }
    }
}
