//! Local persistent storage for the browser-style `theme` and `token` keys.
//!
//! Native builds keep one file per key under the platform data directory,
//! web builds use the browser's `localStorage`, and tests use the in-memory
//! store.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[cfg(not(target_arch = "wasm32"))]
use std::{fs, path::PathBuf};

pub const THEME_KEY: &str = "theme";
pub const TOKEN_KEY: &str = "token";

/// Key/value persistence shared by the session store.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Sanitize storage key for filesystem use
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

/// In-memory storage. Clones share the same map, so a "reload" in tests is a
/// new session store built on a clone.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.entries.lock() {
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        }
        store
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

/// File-backed storage, one file per key.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under the platform's local data directory, or `cache/` when there is none.
    pub fn in_data_dir() -> Self {
        if let Some(data_dir) = dirs::data_local_dir() {
            return Self::new(data_dir.join("chatfront").join("local_storage"));
        }
        Self::new(PathBuf::from("cache").join("local_storage"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.txt", sanitize_key(key)))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("failed to create storage directory {}", self.root.display())
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("failed to write {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Browser `localStorage`, looked up on each call so the handle stays `Send`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct WebStore;

#[cfg(target_arch = "wasm32")]
impl WebStore {
    fn storage() -> Result<web_sys::Storage> {
        web_sys::window()
            .context("no browser window")?
            .local_storage()
            .map_err(|err| anyhow::anyhow!("localStorage unavailable: {err:?}"))?
            .context("localStorage disabled")
    }
}

#[cfg(target_arch = "wasm32")]
impl LocalStore for WebStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| anyhow::anyhow!("failed to write {key}: {err:?}"))
    }

    fn remove(&self, key: &str) -> Result<()> {
        Self::storage()?
            .remove_item(key)
            .map_err(|err| anyhow::anyhow!("failed to remove {key}: {err:?}"))
    }
}

/// Default store for the current platform.
pub fn platform_store() -> Arc<dyn LocalStore> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        Arc::new(FileStore::in_data_dir())
    }
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(WebStore)
    }
}
