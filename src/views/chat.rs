use crate::session::{SessionPhase, SessionState, SessionStore};
use crate::types::{Chat, RecordId};
use crate::views::message::MessageBubble;
use dioxus::prelude::*;

#[component]
pub fn ChatView(session: Signal<SessionState>) -> Element {
    let state = session();
    let phase = state.phase();

    rsx! {
        div { class: "main-container chat-layout",
            ChatSidebar {
                chats: state.chats.clone(),
                selected: state.selected_chat.as_ref().map(|chat| chat.id.clone()),
                logged_in: state.user.is_some(),
            }
            div { class: "chat-wrap",
                {match (phase, state.selected_chat.clone()) {
                    (SessionPhase::UserLoading, _) | (SessionPhase::ChatsLoading, None) => rsx! {
                        div { class: "shimmer-line",
                            span { class: "shimmer-text", "Loading…" }
                        }
                    },
                    (SessionPhase::Anonymous, _) | (SessionPhase::TokenSet, _) => rsx! {
                        div { class: "empty-state",
                            p { "Sign in from Settings to see your chats." }
                        }
                    },
                    (_, Some(chat)) => rsx! { ChatThread { chat } },
                    (_, None) => rsx! {
                        div { class: "empty-state",
                            p { "Start a new chat to begin." }
                        }
                    },
                }}
            }
        }
    }
}

#[component]
fn ChatSidebar(
    chats: Vec<Chat>,
    #[props(!optional)] selected: Option<RecordId>,
    logged_in: bool,
) -> Element {
    let store = use_context::<SessionStore>();
    let on_new_chat = move |_| {
        let store = store.clone();
        spawn(async move {
            store.create_new_chat().await;
        });
    };

    rsx! {
        aside { class: "sidebar",
            button {
                class: "btn btn-primary new-chat",
                r#type: "button",
                disabled: !logged_in,
                onclick: on_new_chat,
                "+ New Chat"
            }
            div { class: "chat-list",
                for chat in chats.iter() {
                    ChatListItem {
                        key: "{chat.id}",
                        id: chat.id.clone(),
                        label: chat.preview(),
                        updated: chat.updated_at.clone(),
                        active: selected.as_ref() == Some(&chat.id),
                    }
                }
            }
        }
    }
}

#[component]
fn ChatListItem(
    id: RecordId,
    label: String,
    #[props(!optional)] updated: Option<String>,
    active: bool,
) -> Element {
    let store = use_context::<SessionStore>();
    let class = if active { "chat-item active" } else { "chat-item" };
    rsx! {
        div {
            class: class,
            onclick: move |_| {
                store.select_chat(&id);
            },
            p { class: "chat-item-title", "{label}" }
            if let Some(updated) = updated {
                span { class: "chat-item-meta", "{updated}" }
            }
        }
    }
}

#[component]
fn ChatThread(chat: Chat) -> Element {
    rsx! {
        div { id: "chat-list", class: "chat-thread",
            if chat.messages.is_empty() {
                div { class: "empty-state", p { "Ask me anything." } }
            }
            for (i, message) in chat.messages.iter().enumerate() {
                MessageBubble { key: "{i}", message: message.clone() }
            }
        }
    }
}
