use crate::notify::Notices;
use crate::types::{Chat, RecordId, ThemeMode, User};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Home,
    Settings,
}

/// Where the session is in its load chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    /// A token is stored but no user is loaded, e.g. after a failed user fetch.
    TokenSet,
    UserLoading,
    UserLoaded,
    ChatsLoading,
    ChatsReady,
}

/// An optimistic route change waiting for the backend to confirm it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingNavigation {
    pub from: Route,
    pub ticket: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub chats: Vec<Chat>,
    pub selected_chat: Option<Chat>,
    pub theme: ThemeMode,
    pub loading_user: bool,
    pub loading_chats: bool,
    pub route: Route,
    pub pending_navigation: Option<PendingNavigation>,
    pub notices: Notices,
    /// Bumped on every token or user change; responses from older epochs are dropped.
    pub(crate) epoch: u64,
    /// Bumped per chat-list load so only the newest load applies.
    pub(crate) chat_seq: u64,
    pub(crate) nav_seq: u64,
}

impl SessionState {
    pub(crate) fn initial(token: Option<String>, theme: ThemeMode) -> Self {
        Self {
            user: None,
            token,
            chats: Vec::new(),
            selected_chat: None,
            theme,
            loading_user: true,
            loading_chats: false,
            route: Route::Home,
            pending_navigation: None,
            notices: Notices::default(),
            epoch: 0,
            chat_seq: 0,
            nav_seq: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.token.is_none() {
            return SessionPhase::Anonymous;
        }
        if self.loading_user {
            return SessionPhase::UserLoading;
        }
        if self.user.is_none() {
            return SessionPhase::TokenSet;
        }
        if self.loading_chats {
            SessionPhase::ChatsLoading
        } else if self.chats.is_empty() {
            SessionPhase::UserLoaded
        } else {
            SessionPhase::ChatsReady
        }
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selected_chat
            .as_ref()
            .is_some_and(|chat| &chat.id == id)
    }

    /// Drop the user together with everything derived from it. Any user
    /// fetch still in flight belongs to the old epoch, so nothing is loading.
    pub(crate) fn clear_user(&mut self) {
        self.user = None;
        self.loading_user = false;
        self.chats.clear();
        self.selected_chat = None;
        self.loading_chats = false;
        self.epoch += 1;
    }
}
