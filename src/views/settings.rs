use crate::session::{SessionState, SessionStore};
use crate::types::ThemeMode;
use dioxus::prelude::*;

#[component]
pub fn SettingsView(session: Signal<SessionState>) -> Element {
    let store = use_context::<SessionStore>();
    let state = session();
    let theme_store = store.clone();

    rsx! {
        div { class: "main-container",
            div { class: "settings-section",
                h3 { class: "section-title", "Display" }
                div { class: "theme-toggle",
                    for (mode, label) in [(ThemeMode::Light, "Light"), (ThemeMode::Dark, "Dark")] {
                        ThemeOption { mode, label, active: state.theme == mode }
                    }
                    button {
                        class: "btn btn-ghost",
                        r#type: "button",
                        onclick: move |_| {
                            theme_store.toggle_theme();
                        },
                        "Toggle"
                    }
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "Account" }
                if let Some(user) = state.user.clone() {
                    AccountCard {
                        name: user.name,
                        email: user.email,
                        credits: user.credits,
                    }
                } else {
                    SignInForm { loading: state.loading_user }
                }
            }
        }
    }
}

#[component]
fn ThemeOption(mode: ThemeMode, label: &'static str, active: bool) -> Element {
    let store = use_context::<SessionStore>();
    rsx! {
        button {
            class: format_args!("theme-option {}", if active { "active" } else { "" }),
            r#type: "button",
            onclick: move |_| store.set_theme(mode),
            "{label}"
        }
    }
}

#[component]
fn AccountCard(
    name: String,
    #[props(!optional)] email: Option<String>,
    #[props(!optional)] credits: Option<i64>,
) -> Element {
    let store = use_context::<SessionStore>();
    let on_logout = move |_| {
        let store = store.clone();
        spawn(async move {
            store.logout().await;
        });
    };
    rsx! {
        div { class: "account-card",
            p { class: "account-name", "{name}" }
            if let Some(email) = email {
                p { class: "text-muted", "{email}" }
            }
            if let Some(credits) = credits {
                p { class: "text-muted", "Credits: {credits}" }
            }
            button { class: "btn", r#type: "button", onclick: on_logout, "Logout" }
        }
    }
}

#[component]
fn SignInForm(loading: bool) -> Element {
    let store = use_context::<SessionStore>();
    let mut token_input = use_signal(String::new);
    let on_sign_in = move |_| {
        let token = token_input().trim().to_string();
        if token.is_empty() {
            return;
        }
        token_input.set(String::new());
        let store = store.clone();
        spawn(async move {
            store.set_token(Some(token)).await;
        });
    };
    rsx! {
        div { class: "hstack", style: "gap: 0.5rem; width: 100%;",
            input {
                r#type: "password",
                placeholder: "Session token",
                value: "{token_input}",
                oninput: move |ev| token_input.set(ev.value()),
                disabled: loading,
            }
            button {
                class: "btn btn-primary",
                r#type: "button",
                disabled: loading || token_input().trim().is_empty(),
                onclick: on_sign_in,
                "Sign in"
            }
        }
    }
}
