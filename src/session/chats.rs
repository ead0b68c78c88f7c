use super::state::{PendingNavigation, Route};
use super::SessionStore;
use crate::clock;
use crate::notify::NoticeLevel;
use tracing::{debug, info, warn};

const LOGIN_REQUIRED: &str = "Login to create a new chat";
const BOOTSTRAP_EXHAUSTED: &str = "Could not create a chat, please try again later";

/// Result of loading the chat list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatSync {
    /// The list is non-empty and its first chat is selected.
    Ready { chats: usize, created: u32 },
    /// The backend kept returning an empty list after every allowed creation.
    Exhausted { attempts: u32 },
    Stale,
    Failed(String),
    NoSession,
}

/// Result of the user-triggered "New Chat" action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateChat {
    Created(ChatSync),
    NotLoggedIn,
    /// The creation failed; the optimistic navigation was rolled back.
    Failed(String),
    Stale,
}

#[derive(Clone, Copy)]
struct ChatTicket {
    epoch: u64,
    seq: u64,
}

impl SessionStore {
    fn begin_chat_load(&self) -> Option<(String, ChatTicket)> {
        let mut request = None;
        self.inner.state.send_if_modified(|state| {
            let (Some(token), Some(_)) = (state.token.clone(), state.user.as_ref()) else {
                return false;
            };
            state.chat_seq += 1;
            state.loading_chats = true;
            request = Some((
                token,
                ChatTicket {
                    epoch: state.epoch,
                    seq: state.chat_seq,
                },
            ));
            true
        });
        request
    }

    /// Apply `f` only while `ticket` is still the newest chat load of the
    /// current session. Returns whether it was applied.
    fn apply_chat_result<F>(&self, ticket: ChatTicket, f: F) -> bool
    where
        F: FnOnce(&mut super::SessionState),
    {
        self.inner.state.send_if_modified(|state| {
            if state.epoch != ticket.epoch || state.chat_seq != ticket.seq {
                return false;
            }
            f(state);
            true
        })
    }

    /// Load the user's chats and select the first one.
    ///
    /// An empty list bootstraps a chat: create, refetch, and back off between
    /// attempts, at most `max_attempts` creations in total.
    pub async fn fetch_users_chats(&self) -> ChatSync {
        let Some((token, ticket)) = self.begin_chat_load() else {
            return ChatSync::NoSession;
        };
        let policy = self.inner.chat_bootstrap;
        let mut created = 0u32;

        loop {
            debug!(seq = ticket.seq, created, "fetching chat list");
            let chats = match self.inner.api.fetch_chats(&token).await {
                Ok(chats) => chats,
                Err(err) => {
                    let message = err.user_message();
                    let applied = self.apply_chat_result(ticket, |state| {
                        state.loading_chats = false;
                        state.notices.push(NoticeLevel::Error, message.clone());
                    });
                    if !applied {
                        return ChatSync::Stale;
                    }
                    warn!("chat list fetch failed: {err}");
                    return ChatSync::Failed(message);
                }
            };

            if !chats.is_empty() {
                let count = chats.len();
                let applied = self.apply_chat_result(ticket, |state| {
                    state.selected_chat = chats.first().cloned();
                    state.chats = chats;
                    state.loading_chats = false;
                });
                if !applied {
                    debug!(seq = ticket.seq, "dropping stale chat list");
                    return ChatSync::Stale;
                }
                info!(count, created, "chat list ready");
                return ChatSync::Ready {
                    chats: count,
                    created,
                };
            }

            let applied = self.apply_chat_result(ticket, |state| state.chats.clear());
            if !applied {
                return ChatSync::Stale;
            }

            if created >= policy.max_attempts {
                self.apply_chat_result(ticket, |state| {
                    state.loading_chats = false;
                    state
                        .notices
                        .push(NoticeLevel::Error, BOOTSTRAP_EXHAUSTED);
                });
                warn!(attempts = created, "chat list still empty after creating chats");
                return ChatSync::Exhausted { attempts: created };
            }

            if created > 0 {
                clock::sleep(policy.delay_for(created - 1)).await;
            }

            if let Err(err) = self.inner.api.create_chat(&token).await {
                let message = err.user_message();
                let applied = self.apply_chat_result(ticket, |state| {
                    state.loading_chats = false;
                    state.notices.push(NoticeLevel::Error, message.clone());
                });
                if !applied {
                    return ChatSync::Stale;
                }
                warn!("chat creation failed: {err}");
                return ChatSync::Failed(message);
            }
            created += 1;
        }
    }

    /// Create a chat on behalf of the user.
    ///
    /// Navigation to the root route happens before the request (optimistic);
    /// a successful response confirms it and reloads the list, a failure
    /// restores the previous route unless the user has moved on since.
    pub async fn create_new_chat(&self) -> CreateChat {
        let mut request = None;
        self.inner.state.send_modify(|state| {
            let (Some(token), Some(_)) = (state.token.clone(), state.user.as_ref()) else {
                state.notices.push(NoticeLevel::Error, LOGIN_REQUIRED);
                return;
            };
            state.nav_seq += 1;
            let pending = PendingNavigation {
                from: state.route,
                ticket: state.nav_seq,
            };
            state.route = Route::Home;
            state.pending_navigation = Some(pending);
            request = Some((token, pending, state.epoch));
        });
        let Some((token, pending, epoch)) = request else {
            return CreateChat::NotLoggedIn;
        };

        match self.inner.api.create_chat(&token).await {
            Ok(()) => {
                let mut current = false;
                self.inner.state.send_modify(|state| {
                    if state.pending_navigation == Some(pending) {
                        state.pending_navigation = None;
                    }
                    current = state.epoch == epoch;
                });
                if !current {
                    return CreateChat::Stale;
                }
                info!("chat created");
                CreateChat::Created(self.fetch_users_chats().await)
            }
            Err(err) => {
                let message = err.user_message();
                self.inner.state.send_modify(|state| {
                    if state.pending_navigation == Some(pending) {
                        state.route = pending.from;
                        state.pending_navigation = None;
                    }
                    if state.epoch == epoch {
                        state.notices.push(NoticeLevel::Error, message.clone());
                    }
                });
                warn!("chat creation failed, navigation rolled back: {err}");
                CreateChat::Failed(message)
            }
        }
    }
}
