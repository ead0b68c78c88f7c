//! Front-end client for an AI chat service: session state synced with a REST
//! backend, and chat bubbles rendered from markdown.

pub mod api;
pub mod clock;
pub mod config;
pub mod notify;
pub mod render;
pub mod session;
pub mod storage;
pub mod theme;
pub mod types;

#[cfg(feature = "dioxus")]
pub mod ui;
#[cfg(feature = "dioxus")]
pub mod views;
