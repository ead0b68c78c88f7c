pub mod chat;
pub mod message;
pub mod settings;
pub mod toaster;

pub use chat::ChatView;
pub use message::MessageBubble;
pub use settings::SettingsView;
pub use toaster::Toaster;
