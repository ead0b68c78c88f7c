use crate::types::ThemeMode;

pub struct ThemeDefinition {
    pub css: &'static str,
    pub logo_class: &'static str,
}

pub fn theme_definition(mode: ThemeMode) -> ThemeDefinition {
    match mode {
        ThemeMode::Dark => ThemeDefinition {
            css: DARK_THEME,
            logo_class: "header-logo header-logo-dark",
        },
        ThemeMode::Light => ThemeDefinition {
            css: LIGHT_THEME,
            logo_class: "header-logo",
        },
    }
}

/// Class toggled on `<html>` so page-level styles follow the theme.
pub const DARK_MARKER: &str = "dark";

/// Put the dark marker on the document element, or take it off.
#[cfg(target_arch = "wasm32")]
pub fn apply_document_theme(mode: ThemeMode) {
    let Some(root) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.document_element())
    else {
        return;
    };
    let class_list = root.class_list();
    let _ = match mode {
        ThemeMode::Dark => class_list.add_1(DARK_MARKER),
        ThemeMode::Light => class_list.remove_1(DARK_MARKER),
    };
}

/// Native webviews style the app root `div` instead.
#[cfg(not(target_arch = "wasm32"))]
pub fn apply_document_theme(mode: ThemeMode) {
    let _ = mode;
}

const DARK_THEME: &str = r#"
:root {
    --color-bg-primary: #242124;
    --color-bg-secondary: #1a161f;
    --color-bg-overlay: rgba(0, 0, 0, 0.85);
    --color-text-primary: #f3f4f6;
    --color-text-muted: #9ca3af;
    --color-border: rgba(128, 105, 255, 0.3);
    --color-surface-muted: rgba(87, 49, 124, 0.3);
    --color-chat-user-bg: rgba(87, 49, 124, 0.3);
    --color-chat-user-text: #f3f4f6;
    --color-chat-assistant-bg: linear-gradient(to right, rgba(87, 49, 124, 0.2), rgba(45, 11, 79, 0.2));
    --color-chat-assistant-text: #f3f4f6;
    --color-inline-code: #a855f7;
    --color-timestamp: #9ca3af;
    --color-toast-error-bg: #7f1d1d;
    --color-toast-info-bg: #312e81;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.sidebar { background: var(--color-bg-secondary); }
.btn:hover,
.chat-item:hover { background: var(--color-surface-muted); }
"#;

const LIGHT_THEME: &str = r#"
:root {
    --color-bg-primary: #ffffff;
    --color-bg-secondary: #f8fafc;
    --color-bg-overlay: rgba(255, 255, 255, 0.92);
    --color-text-primary: #111827;
    --color-text-muted: #6b7280;
    --color-border: rgba(128, 105, 255, 0.3);
    --color-surface-muted: #f1f5f9;
    --color-chat-user-bg: #f1f5f9;
    --color-chat-user-text: #111827;
    --color-chat-assistant-bg: linear-gradient(to right, #faf5ff, #f3e8ff);
    --color-chat-assistant-text: #111827;
    --color-inline-code: #a855f7;
    --color-timestamp: #6b7280;
    --color-toast-error-bg: #fee2e2;
    --color-toast-info-bg: #e0e7ff;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.sidebar { background: var(--color-bg-secondary); }
.btn:hover,
.chat-item:hover { background: var(--color-surface-muted); }
"#;
