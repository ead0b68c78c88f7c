use crate::clock;
use crate::notify::{NOTICE_TTL, Notice, NoticeLevel};
use crate::session::{SessionState, SessionStore};
use dioxus::prelude::*;

#[component]
pub fn Toaster(session: Signal<SessionState>) -> Element {
    let notices = session().notices.items().to_vec();
    rsx! {
        div { class: "toaster", aria_live: "polite",
            for notice in notices {
                Toast { key: "{notice.id}", notice: notice.clone() }
            }
        }
    }
}

#[component]
fn Toast(notice: Notice) -> Element {
    let store = use_context::<SessionStore>();
    let id = notice.id;

    let timer_store = store.clone();
    use_hook(move || {
        spawn(async move {
            clock::sleep(NOTICE_TTL).await;
            timer_store.dismiss_notice(id);
        });
    });

    let level = match notice.level {
        NoticeLevel::Error => "toast error",
        NoticeLevel::Info => "toast info",
    };
    rsx! {
        div {
            class: level,
            role: "status",
            onclick: move |_| store.dismiss_notice(id),
            "{notice.text}"
        }
    }
}
