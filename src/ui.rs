use crate::api::{ChatApi, HttpChatApi};
use crate::config::ClientConfig;
use crate::session::{Route, SessionState, SessionStore};
use crate::storage::platform_store;
use crate::theme::{apply_document_theme, theme_definition};
use crate::types::ThemeMode;
use crate::views::{ChatView, SettingsView, Toaster};
use dioxus::prelude::*;
use std::sync::Arc;
use tracing::warn;

const APP_CSS: Asset = asset!("/assets/chatfront.css");

fn build_store() -> SessionStore {
    let config = ClientConfig::from_env().unwrap_or_else(|err| {
        warn!("invalid configuration, using defaults: {err}");
        ClientConfig::default()
    });
    let api: Arc<dyn ChatApi> = Arc::new(HttpChatApi::new(&config));
    SessionStore::new(api, platform_store(), config.chat_bootstrap)
}

#[component]
pub fn App() -> Element {
    let store = use_context_provider(build_store);
    let session = use_signal(|| store.snapshot());

    use_session_sync(store, session);
    use_effect(move || apply_document_theme(session().theme));

    let state = session();
    rsx! {
        ThemeStyles { theme: state.theme }
        div { class: "{state.theme.root_class()}",
            AppHeader { route: state.route, theme: state.theme }
            RoutePanels { session }
            Toaster { session }
        }
    }
}

/// Mirror store updates into a signal and run the startup load chain once.
fn use_session_sync(store: SessionStore, session: Signal<SessionState>) {
    use_hook(move || {
        let mut session = session;
        let mut updates = store.subscribe();
        spawn(async move {
            while updates.changed().await.is_ok() {
                let snapshot = updates.borrow_and_update().clone();
                session.set(snapshot);
            }
        });
        spawn(async move {
            store.start().await;
        });
    });
}

#[component]
fn ThemeStyles(theme: ThemeMode) -> Element {
    let definition = theme_definition(theme);
    rsx! {
        document::Link { rel: "stylesheet", href: APP_CSS }
        style { dangerous_inner_html: "{definition.css}" }
    }
}

#[component]
fn AppHeader(route: Route, theme: ThemeMode) -> Element {
    let theme = theme_definition(theme);
    rsx! {
        div { class: "header no-divider",
            div { class: "header-content",
                span { class: "{theme.logo_class}", "chatfront" }
                div { class: "tabs",
                    TabButton { current: route, tab: Route::Home, label: "Chat" }
                    TabButton { current: route, tab: Route::Settings, label: "Settings" }
                }
            }
        }
    }
}

#[component]
fn TabButton(current: Route, tab: Route, label: &'static str) -> Element {
    let store = use_context::<SessionStore>();
    let class = if current == tab { "tab active" } else { "tab" };
    rsx! {
        h1 {
            class: class,
            onclick: move |_| store.navigate(tab),
            "{label}"
        }
    }
}

#[component]
fn RoutePanels(session: Signal<SessionState>) -> Element {
    let route = session().route;
    rsx! {
        div { class: "tab-panels",
            {match route {
                Route::Home => rsx! { ChatView { session } },
                Route::Settings => rsx! { SettingsView { session } },
            }}
        }
    }
}
