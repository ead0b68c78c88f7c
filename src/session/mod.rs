//! Session store: user, token, chats, selection and theme, kept in sync with
//! the backend and local storage.
//!
//! The store is a cheap clonable handle. State lives in a `watch` channel so
//! the UI can subscribe; all mutation goes through the methods here. The load
//! chain is explicit: a token change fetches the user, a user change fetches
//! the chat list.
mod chats;
mod state;

pub use chats::{ChatSync, CreateChat};
pub use state::{PendingNavigation, Route, SessionPhase, SessionState};

use crate::api::ChatApi;
use crate::config::RetryPolicy;
use crate::notify::NoticeLevel;
use crate::storage::{LocalStore, THEME_KEY, TOKEN_KEY};
use crate::types::{Chat, RecordId, ThemeMode, User};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Result of a single request made by the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Applied(T),
    /// A newer token or user superseded the request; its response was dropped.
    Stale,
    Failed(String),
    NoSession,
}

struct Inner {
    state: watch::Sender<SessionState>,
    api: Arc<dyn ChatApi>,
    storage: Arc<dyn LocalStore>,
    chat_bootstrap: RetryPolicy,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Restore `token` and `theme` from local storage. Call [`SessionStore::start`]
    /// to run the load chain.
    pub fn new(
        api: Arc<dyn ChatApi>,
        storage: Arc<dyn LocalStore>,
        chat_bootstrap: RetryPolicy,
    ) -> Self {
        let token = storage.get(TOKEN_KEY).filter(|token| !token.is_empty());
        let theme = storage
            .get(THEME_KEY)
            .map(|value| ThemeMode::parse(&value))
            .unwrap_or_default();
        let (state, _) = watch::channel(SessionState::initial(token, theme));
        Self {
            inner: Arc::new(Inner {
                state,
                api,
                storage,
                chat_bootstrap,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().phase()
    }

    /// Run the token effect once for the restored token.
    pub async fn start(&self) -> SessionPhase {
        self.on_token_changed().await;
        self.phase()
    }

    // ---------------
    // Token and user
    // ---------------

    /// Store a new token (or clear it) and run the load chain. Setting the
    /// current value again is a no-op.
    pub async fn set_token(&self, token: Option<String>) -> SessionPhase {
        let token = token.filter(|token| !token.is_empty());
        let changed = self.inner.state.send_if_modified(|state| {
            if state.token == token {
                return false;
            }
            state.token = token.clone();
            state.epoch += 1;
            true
        });
        if !changed {
            return self.phase();
        }

        let persisted = match &token {
            Some(value) => self.inner.storage.set(TOKEN_KEY, value),
            None => self.inner.storage.remove(TOKEN_KEY),
        };
        if let Err(err) = persisted {
            warn!("failed to persist token: {err:#}");
        }

        self.on_token_changed().await;
        self.phase()
    }

    pub async fn logout(&self) -> SessionPhase {
        info!("logging out");
        self.set_token(None).await
    }

    async fn on_token_changed(&self) {
        let has_token = self.inner.state.borrow().token.is_some();
        if has_token {
            self.fetch_user().await;
        } else {
            self.inner.state.send_modify(|state| {
                if state.user.is_some() {
                    state.clear_user();
                }
                state.loading_user = false;
            });
        }
    }

    /// Fetch the user for the current token. On success the user is set and
    /// the chat list is loaded; on failure a notice is shown and the user is
    /// left as it was. The loading flag is cleared either way.
    pub async fn fetch_user(&self) -> Outcome<User> {
        let request = {
            let state = self.inner.state.borrow();
            state.token.clone().map(|token| (token, state.epoch))
        };
        let Some((token, epoch)) = request else {
            self.inner.state.send_modify(|state| state.loading_user = false);
            return Outcome::NoSession;
        };

        self.inner.state.send_modify(|state| state.loading_user = true);
        debug!(epoch, "fetching user");
        let result = self.inner.api.fetch_user(&token).await;

        let applied = self.inner.state.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            state.loading_user = false;
            match &result {
                Ok(user) => {
                    state.user = Some(user.clone());
                    state.epoch += 1;
                }
                Err(err) => {
                    state.notices.push(NoticeLevel::Error, err.user_message());
                }
            }
            true
        });
        if !applied {
            debug!(epoch, "dropping stale user response");
            return Outcome::Stale;
        }

        match result {
            Ok(user) => {
                info!(user = %user.id, "user loaded");
                self.on_user_changed().await;
                Outcome::Applied(user)
            }
            Err(err) => {
                warn!("user fetch failed: {err}");
                Outcome::Failed(err.user_message())
            }
        }
    }

    /// Replace the user. A present user loads its chats, an absent one clears them.
    pub async fn set_user(&self, user: Option<User>) -> ChatSync {
        self.inner.state.send_modify(|state| match user {
            Some(user) => {
                state.user = Some(user);
                state.loading_user = false;
                state.epoch += 1;
            }
            None => state.clear_user(),
        });
        self.on_user_changed().await
    }

    async fn on_user_changed(&self) -> ChatSync {
        let has_user = self.inner.state.borrow().user.is_some();
        if has_user {
            self.fetch_users_chats().await
        } else {
            self.inner.state.send_modify(|state| {
                state.chats.clear();
                state.selected_chat = None;
            });
            ChatSync::NoSession
        }
    }

    // ---------------
    // Plain setters
    // ---------------

    pub fn set_chats(&self, chats: Vec<Chat>) {
        self.inner.state.send_modify(|state| state.chats = chats);
    }

    /// Select a chat from the loaded list. Returns false for an unknown id.
    pub fn select_chat(&self, id: &RecordId) -> bool {
        self.inner.state.send_if_modified(|state| {
            match state.chats.iter().find(|chat| &chat.id == id) {
                Some(chat) => {
                    state.selected_chat = Some(chat.clone());
                    true
                }
                None => false,
            }
        })
    }

    pub fn set_theme(&self, theme: ThemeMode) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.theme != theme;
            state.theme = theme;
            changed
        });
        if let Err(err) = self.inner.storage.set(THEME_KEY, theme.as_str()) {
            warn!("failed to persist theme: {err:#}");
        }
    }

    pub fn toggle_theme(&self) -> ThemeMode {
        let next = self.inner.state.borrow().theme.toggled();
        self.set_theme(next);
        next
    }

    /// User-driven navigation. Confirms any pending optimistic move.
    pub fn navigate(&self, route: Route) {
        self.inner.state.send_modify(|state| {
            state.route = route;
            state.pending_navigation = None;
        });
    }

    pub fn dismiss_notice(&self, id: u64) {
        self.inner.state.send_modify(|state| state.notices.dismiss(id));
    }
}
