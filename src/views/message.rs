use crate::clock::now_millis;
use crate::render::{BubbleBody, HighlightCache, copy_action_available, render_message};
use crate::types::Message;
use dioxus::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

#[component]
pub fn MessageBubble(message: Message) -> Element {
    // highlighting reruns only when the content differs from the last render
    let cache = use_hook(|| Rc::new(RefCell::new(HighlightCache::default())));
    let rendered = render_message(&message, now_millis(), &mut cache.borrow_mut());
    let side = rendered.side_class();
    let full_time = rendered.full_time.unwrap_or_default();

    let body = match rendered.body {
        BubbleBody::Plain(text) => rsx! {
            p { class: "bubble-text", "{text}" }
        },
        BubbleBody::Image { src } => rsx! {
            img { class: "bubble-image", src: "{src}", alt: "Generated" }
        },
        BubbleBody::Markdown(html) => rsx! {
            if copy_action_available() {
                CopyButton { raw: message.content.clone() }
            }
            div { class: "md", dangerous_inner_html: "{html}" }
        },
    };
    let avatar = match side {
        "user" => "U",
        _ => "AI",
    };

    rsx! {
        div { class: "message-row {side}",
            if side == "assistant" {
                div { class: "avatar assistant", "{avatar}" }
            }
            div { class: "bubble {side}",
                {body}
                span { class: "message-timestamp", title: "{full_time}", "{rendered.relative_time}" }
            }
            if side == "user" {
                div { class: "avatar user", "{avatar}" }
            }
        }
    }
}

#[component]
fn CopyButton(raw: String) -> Element {
    let on_copy = move |_| {
        let raw = raw.clone();
        spawn(async move {
            #[cfg(any(feature = "desktop", feature = "mobile"))]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    let _ = cb.set_text(raw);
                }
            }
            #[cfg(not(any(feature = "desktop", feature = "mobile")))]
            drop(raw);
        });
    };
    rsx! {
        div { class: "bubble-controls",
            button { class: "action-btn", title: "Copy markdown", onclick: on_copy, "Copy" }
        }
    }
}
