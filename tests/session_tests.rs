//! Session store behaviour against a scripted in-memory backend
//!
//! Covers the token → user → chats load chain, the bounded chat bootstrap,
//! optimistic navigation, stale responses, and theme persistence.

use async_trait::async_trait;
use chatfront::api::{ApiError, ApiResult, ChatApi};
use chatfront::config::RetryPolicy;
use chatfront::notify::NoticeLevel;
use chatfront::session::{ChatSync, CreateChat, Outcome, Route, SessionPhase, SessionStore};
use chatfront::storage::{FileStore, LocalStore, MemoryStore, THEME_KEY, TOKEN_KEY};
use chatfront::types::{Chat, RecordId, ThemeMode, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Default)]
struct FakeBackend {
    users: Mutex<HashMap<String, User>>,
    chats: Mutex<Vec<Chat>>,
    chat_list_error: Mutex<Option<String>>,
    create_adds_chat: AtomicBool,
    create_error: Mutex<Option<String>>,
    user_gates: Mutex<HashMap<String, Arc<Notify>>>,
    chat_gate: Mutex<Option<Arc<Notify>>>,
    user_calls: AtomicUsize,
    chat_calls: AtomicUsize,
    create_calls: AtomicUsize,
    create_times: Mutex<Vec<Instant>>,
    seen_tokens: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        let backend = Self::default();
        backend.create_adds_chat.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    fn with_user(self: Arc<Self>, token: &str, id: u64, name: &str) -> Arc<Self> {
        self.users.lock().unwrap().insert(token.to_string(), user(id, name));
        self
    }

    fn with_chats(self: Arc<Self>, ids: &[u64]) -> Arc<Self> {
        *self.chats.lock().unwrap() = ids.iter().map(|id| Chat::new(*id)).collect();
        self
    }

    fn gate_user(&self, token: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.user_gates
            .lock()
            .unwrap()
            .insert(token.to_string(), gate.clone());
        gate
    }

    fn gate_chats(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.chat_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn calls(&self) -> (usize, usize, usize) {
        (
            self.user_calls.load(Ordering::SeqCst),
            self.chat_calls.load(Ordering::SeqCst),
            self.create_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl ChatApi for FakeBackend {
    async fn fetch_user(&self, token: &str) -> ApiResult<User> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().unwrap().push(token.to_string());
        let gate = self.user_gates.lock().unwrap().get(token).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.users
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::Rejected("Not authorized".into()))
    }

    async fn fetch_chats(&self, _token: &str) -> ApiResult<Vec<Chat>> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.chat_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(message) = self.chat_list_error.lock().unwrap().clone() {
            return Err(ApiError::Rejected(message));
        }
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn create_chat(&self, _token: &str) -> ApiResult<()> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) as u64;
        self.create_times.lock().unwrap().push(Instant::now());
        if let Some(message) = self.create_error.lock().unwrap().clone() {
            return Err(ApiError::Http {
                status: 403,
                message,
            });
        }
        if self.create_adds_chat.load(Ordering::SeqCst) {
            // newest first, like the backend's sort order
            self.chats.lock().unwrap().insert(0, Chat::new(1000 + n));
        }
        Ok(())
    }
}

fn user(id: u64, name: &str) -> User {
    User {
        id: RecordId::Num(id),
        name: name.to_string(),
        email: None,
        credits: None,
    }
}

fn store_on(backend: &Arc<FakeBackend>, storage: &MemoryStore) -> SessionStore {
    SessionStore::new(
        backend.clone(),
        Arc::new(storage.clone()),
        RetryPolicy::immediate(3),
    )
}

mod token_chain {
    use super::*;

    #[tokio::test]
    async fn example_token_loads_user() {
        let backend = FakeBackend::new()
            .with_user("abc123", 1, "Al")
            .with_chats(&[10]);
        let storage = MemoryStore::new();
        let store = store_on(&backend, &storage);

        assert_eq!(store.start().await, SessionPhase::Anonymous);
        assert!(!store.snapshot().loading_user);

        store.set_token(Some("abc123".into())).await;

        let state = store.snapshot();
        assert_eq!(state.user, Some(user(1, "Al")));
        assert!(!state.loading_user);
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("abc123"));
        assert_eq!(*backend.seen_tokens.lock().unwrap(), vec!["abc123".to_string()]);
    }

    #[tokio::test]
    async fn setting_token_fetches_user_exactly_once() {
        let backend = FakeBackend::new()
            .with_user("abc123", 1, "Al")
            .with_chats(&[10]);
        let store = store_on(&backend, &MemoryStore::new());
        store.start().await;

        store.set_token(Some("abc123".into())).await;
        assert_eq!(backend.calls().0, 1);

        // same value again is not a change
        store.set_token(Some("abc123".into())).await;
        assert_eq!(backend.calls().0, 1);
    }

    #[tokio::test]
    async fn rejected_token_shows_notice_and_keeps_token() {
        let backend = FakeBackend::new();
        let storage = MemoryStore::new();
        let store = store_on(&backend, &storage);
        store.start().await;

        let phase = store.set_token(Some("bad".into())).await;

        let state = store.snapshot();
        assert_eq!(phase, SessionPhase::TokenSet);
        assert!(state.user.is_none());
        assert!(!state.loading_user);
        assert_eq!(state.token.as_deref(), Some("bad"));
        let errors: Vec<_> = state.notices.errors().map(|n| n.text.clone()).collect();
        assert_eq!(errors, vec!["Not authorized".to_string()]);
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("bad"));
    }

    #[tokio::test]
    async fn clearing_token_clears_user_and_chats() {
        let backend = FakeBackend::new()
            .with_user("abc123", 1, "Al")
            .with_chats(&[10, 11]);
        let storage = MemoryStore::new();
        let store = store_on(&backend, &storage);
        store.set_token(Some("abc123".into())).await;
        assert_eq!(store.phase(), SessionPhase::ChatsReady);

        let phase = store.logout().await;

        let state = store.snapshot();
        assert_eq!(phase, SessionPhase::Anonymous);
        assert!(state.user.is_none());
        assert!(!state.loading_user);
        assert!(state.chats.is_empty());
        assert!(state.selected_chat.is_none());
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn restored_token_runs_chain_on_start() {
        let backend = FakeBackend::new()
            .with_user("abc123", 1, "Al")
            .with_chats(&[10]);
        let storage = MemoryStore::with_entries([(TOKEN_KEY, "abc123")]);
        let store = store_on(&backend, &storage);

        let initial = store.snapshot();
        assert!(initial.loading_user);
        assert_eq!(initial.phase(), SessionPhase::UserLoading);

        assert_eq!(store.start().await, SessionPhase::ChatsReady);
        assert_eq!(backend.calls().0, 1);
    }

    #[tokio::test]
    async fn fetch_user_without_token_is_no_session() {
        let backend = FakeBackend::new();
        let store = store_on(&backend, &MemoryStore::new());
        assert_eq!(store.fetch_user().await, Outcome::NoSession);
        assert!(!store.snapshot().loading_user);
        assert_eq!(backend.calls().0, 0);
    }

    #[tokio::test]
    async fn stale_user_response_is_dropped() {
        let backend = FakeBackend::new()
            .with_user("slow", 1, "Slow")
            .with_user("fast", 2, "Fast")
            .with_chats(&[10]);
        let gate = backend.gate_user("slow");
        let store = store_on(&backend, &MemoryStore::new());
        store.start().await;

        let slow = store.clone();
        let fast = store.clone();
        let watcher = backend.clone();
        tokio::join!(slow.set_token(Some("slow".into())), async move {
            while watcher.calls().0 < 1 {
                tokio::task::yield_now().await;
            }
            fast.set_token(Some("fast".into())).await;
            gate.notify_one();
        });

        let state = store.snapshot();
        assert_eq!(state.user, Some(user(2, "Fast")));
        assert_eq!(state.token.as_deref(), Some("fast"));
        assert!(state.notices.is_empty());
    }

    #[tokio::test]
    async fn clearing_user_mid_fetch_stops_loading() {
        let backend = FakeBackend::new().with_user("abc123", 1, "Al");
        let gate = backend.gate_user("abc123");
        let storage = MemoryStore::with_entries([(TOKEN_KEY, "abc123")]);
        let store = store_on(&backend, &storage);

        let fetching = store.clone();
        let clearing = store.clone();
        let watcher = backend.clone();
        let (outcome, _) = tokio::join!(fetching.fetch_user(), async move {
            while watcher.calls().0 < 1 {
                tokio::task::yield_now().await;
            }
            assert!(clearing.snapshot().loading_user);
            clearing.set_user(None).await;
            gate.notify_one();
        });

        assert_eq!(outcome, Outcome::Stale);
        let state = store.snapshot();
        assert!(state.user.is_none());
        assert!(!state.loading_user);
        assert_eq!(state.phase(), SessionPhase::TokenSet);
    }
}

mod chat_list {
    use super::*;

    fn logged_in_store(backend: &Arc<FakeBackend>) -> SessionStore {
        let storage = MemoryStore::with_entries([(TOKEN_KEY, "abc123")]);
        store_on(backend, &storage)
    }

    #[tokio::test]
    async fn selected_chat_is_first_of_list() {
        let backend = FakeBackend::new().with_chats(&[5, 6, 7]);
        let store = logged_in_store(&backend);

        let sync = store.set_user(Some(user(1, "Al"))).await;

        assert_eq!(
            sync,
            ChatSync::Ready {
                chats: 3,
                created: 0
            }
        );
        let state = store.snapshot();
        assert_eq!(state.selected_chat, Some(Chat::new(5)));
        assert_eq!(state.selected_chat.as_ref(), state.chats.first());
        assert_eq!(backend.calls().2, 0);
    }

    #[tokio::test]
    async fn empty_list_bootstraps_a_chat() {
        let backend = FakeBackend::new();
        let store = logged_in_store(&backend);

        let sync = store.set_user(Some(user(1, "Al"))).await;

        assert_eq!(
            sync,
            ChatSync::Ready {
                chats: 1,
                created: 1
            }
        );
        let state = store.snapshot();
        assert_eq!(state.chats.len(), 1);
        assert_eq!(state.selected_chat.as_ref(), state.chats.first());
        assert_eq!(backend.calls(), (0, 2, 1));
    }

    #[tokio::test]
    async fn bootstrap_stops_after_max_attempts() {
        let backend = FakeBackend::new();
        backend.create_adds_chat.store(false, Ordering::SeqCst);
        let store = logged_in_store(&backend);

        let sync = store.set_user(Some(user(1, "Al"))).await;

        assert_eq!(sync, ChatSync::Exhausted { attempts: 3 });
        let (_, chat_calls, create_calls) = backend.calls();
        assert_eq!(create_calls, 3);
        assert_eq!(chat_calls, 4);
        let state = store.snapshot();
        assert!(state.chats.is_empty());
        assert!(!state.loading_chats);
        assert_eq!(state.notices.errors().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_backs_off_exponentially_between_creations() {
        let backend = FakeBackend::new();
        backend.create_adds_chat.store(false, Ordering::SeqCst);
        let storage = MemoryStore::with_entries([(TOKEN_KEY, "abc123")]);
        let store = SessionStore::new(
            backend.clone(),
            Arc::new(storage),
            RetryPolicy::new(4, Duration::from_millis(100)),
        );
        let started = Instant::now();

        let sync = store.set_user(Some(user(1, "Al"))).await;

        assert_eq!(sync, ChatSync::Exhausted { attempts: 4 });
        let times = backend.create_times.lock().unwrap().clone();
        assert_eq!(times.len(), 4);
        // first creation is immediate, then 100ms, 200ms, 400ms
        assert_eq!(times[0] - started, Duration::ZERO);
        let gaps: Vec<Duration> = times.windows(2).map(|pair| pair[1] - pair[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    #[tokio::test]
    async fn list_failure_is_reported_without_dropping_user() {
        let backend = FakeBackend::new();
        *backend.chat_list_error.lock().unwrap() = Some("Database unavailable".into());
        let store = logged_in_store(&backend);

        let sync = store.set_user(Some(user(1, "Al"))).await;

        assert_eq!(sync, ChatSync::Failed("Database unavailable".into()));
        let state = store.snapshot();
        assert_eq!(state.user, Some(user(1, "Al")));
        assert_eq!(state.phase(), SessionPhase::UserLoaded);
        assert_eq!(state.notices.items()[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn clearing_user_empties_chats() {
        let backend = FakeBackend::new().with_chats(&[1, 2]);
        let store = logged_in_store(&backend);
        store.set_user(Some(user(1, "Al"))).await;

        assert_eq!(store.set_user(None).await, ChatSync::NoSession);
        let state = store.snapshot();
        assert!(state.chats.is_empty());
        assert!(state.selected_chat.is_none());
    }

    #[tokio::test]
    async fn logout_during_chat_load_drops_the_response() {
        let backend = FakeBackend::new()
            .with_user("abc123", 1, "Al")
            .with_chats(&[10]);
        let gate = backend.gate_chats();
        let store = store_on(&backend, &MemoryStore::new());
        store.start().await;

        let login = store.clone();
        let logout = store.clone();
        let watcher = backend.clone();
        tokio::join!(login.set_token(Some("abc123".into())), async move {
            while watcher.calls().1 < 1 {
                tokio::task::yield_now().await;
            }
            logout.logout().await;
            gate.notify_one();
        });

        let state = store.snapshot();
        assert!(state.user.is_none());
        assert!(state.chats.is_empty());
        assert_eq!(state.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn set_chats_replaces_list_then_select_finds_it() {
        let backend = FakeBackend::new().with_chats(&[1]);
        let store = logged_in_store(&backend);
        store.set_user(Some(user(1, "Al"))).await;

        store.set_chats(vec![Chat::new(7), Chat::new(8)]);

        assert_eq!(store.snapshot().chats.len(), 2);
        assert!(store.select_chat(&RecordId::Num(8)));
        assert!(!store.select_chat(&RecordId::Num(1)));
    }

    #[tokio::test]
    async fn select_chat_by_id() {
        let backend = FakeBackend::new().with_chats(&[1, 2]);
        let store = logged_in_store(&backend);
        store.set_user(Some(user(1, "Al"))).await;

        assert!(store.select_chat(&RecordId::Num(2)));
        assert!(store.snapshot().is_selected(&RecordId::Num(2)));
        assert!(!store.select_chat(&RecordId::Num(99)));
        assert!(store.snapshot().is_selected(&RecordId::Num(2)));
    }
}

mod new_chat {
    use super::*;

    #[tokio::test]
    async fn requires_a_user() {
        let backend = FakeBackend::new();
        let store = store_on(&backend, &MemoryStore::new());
        store.start().await;
        store.navigate(Route::Settings);

        assert_eq!(store.create_new_chat().await, CreateChat::NotLoggedIn);

        let state = store.snapshot();
        assert_eq!(state.route, Route::Settings);
        assert_eq!(state.notices.items()[0].text, "Login to create a new chat");
        assert_eq!(backend.calls().2, 0);
    }

    #[tokio::test]
    async fn navigates_home_and_refreshes_list() {
        let backend = FakeBackend::new()
            .with_user("abc123", 1, "Al")
            .with_chats(&[10]);
        let store = store_on(&backend, &MemoryStore::new());
        store.set_token(Some("abc123".into())).await;
        store.navigate(Route::Settings);

        let result = store.create_new_chat().await;

        assert_eq!(
            result,
            CreateChat::Created(ChatSync::Ready {
                chats: 2,
                created: 0
            })
        );
        let state = store.snapshot();
        assert_eq!(state.route, Route::Home);
        assert!(state.pending_navigation.is_none());
        assert_eq!(state.selected_chat.as_ref(), state.chats.first());
        assert_eq!(state.chats.len(), 2);
    }

    #[tokio::test]
    async fn failure_rolls_back_navigation() {
        let backend = FakeBackend::new()
            .with_user("abc123", 1, "Al")
            .with_chats(&[10]);
        let store = store_on(&backend, &MemoryStore::new());
        store.set_token(Some("abc123".into())).await;
        store.navigate(Route::Settings);
        *backend.create_error.lock().unwrap() = Some("Chat limit reached".into());

        let result = store.create_new_chat().await;

        assert_eq!(result, CreateChat::Failed("Chat limit reached".into()));
        let state = store.snapshot();
        assert_eq!(state.route, Route::Settings);
        assert!(state.pending_navigation.is_none());
        assert_eq!(state.chats.len(), 1);
        assert!(
            state
                .notices
                .errors()
                .any(|notice| notice.text == "Chat limit reached")
        );
    }
}

mod theme {
    use super::*;

    #[tokio::test]
    async fn dark_theme_survives_reload() {
        let backend = FakeBackend::new();
        let storage = MemoryStore::new();
        let store = store_on(&backend, &storage);
        assert_eq!(store.snapshot().theme, ThemeMode::Light);

        store.set_theme(ThemeMode::Dark);
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("dark"));

        let reloaded = store_on(&backend, &storage);
        let theme = reloaded.snapshot().theme;
        assert_eq!(theme, ThemeMode::Dark);
        assert!(theme.root_class().split_whitespace().any(|c| c == "dark"));
    }

    #[tokio::test]
    async fn dark_theme_survives_restart_on_disk() {
        let root = std::env::temp_dir().join(format!(
            "chatfront-session-theme-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        let backend = FakeBackend::new();
        let policy = RetryPolicy::immediate(3);

        let first = SessionStore::new(backend.clone(), Arc::new(FileStore::new(&root)), policy);
        first.set_theme(ThemeMode::Dark);
        drop(first);

        // a separate store instance reads only what reached the disk
        let restarted = SessionStore::new(backend.clone(), Arc::new(FileStore::new(&root)), policy);
        assert_eq!(restarted.snapshot().theme, ThemeMode::Dark);

        std::fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn toggle_flips_and_notifies_subscribers() {
        let backend = FakeBackend::new();
        let storage = MemoryStore::with_entries([(THEME_KEY, "dark")]);
        let store = store_on(&backend, &storage);
        let mut updates = store.subscribe();
        updates.borrow_and_update();

        assert_eq!(store.toggle_theme(), ThemeMode::Light);
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().theme, ThemeMode::Light);
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("light"));
    }
}
