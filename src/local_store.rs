//! Persistent string key/value storage with change notifications.
//!
//! Several handles may share one store; each handle is a separate origin
//! (think browser tab). Writes publish a [`StorageEvent`] that every handle
//! can observe, tagged with the origin that made the change.

use crate::models::{ProfileData, User};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, warn};

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user_data";
pub const PROFILE_KEY: &str = "profile_data";

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub origin: u64,
    pub key: String,
    pub new_value: Option<String>,
}

struct Shared {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    next_origin: AtomicU64,
}

#[derive(Clone)]
pub struct LocalStore {
    shared: Arc<Shared>,
    origin: u64,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("path", &self.shared.path)
            .field("origin", &self.origin)
            .finish()
    }
}

impl LocalStore {
    /// Opens the store backed by `path`. A missing or unreadable file starts empty.
    pub async fn open(path: &Path) -> Self {
        let entries = match fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                error!("failed to parse local storage file: {err}");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                error!("failed to read local storage file: {err}");
                BTreeMap::new()
            }
        };
        Self::with_entries(Some(path.to_path_buf()), entries)
    }

    pub fn in_memory() -> Self {
        Self::with_entries(None, BTreeMap::new())
    }

    fn with_entries(path: Option<PathBuf>, entries: BTreeMap<String, String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                path,
                entries: Mutex::new(entries),
                events,
                next_origin: AtomicU64::new(1),
            }),
            origin: 0,
        }
    }

    /// Another handle onto the same storage with its own origin id.
    pub fn new_tab(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            origin: self.shared.next_origin.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.shared.events.subscribe()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.shared.entries.lock().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) -> std::io::Result<()> {
        let value = value.into();
        let mut entries = self.shared.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.clone());
        self.commit(&mut entries, next).await?;
        self.publish(key, Some(value));
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> std::io::Result<()> {
        let mut entries = self.shared.entries.lock().await;
        let mut next = entries.clone();
        if next.remove(key).is_none() {
            return Ok(());
        }
        self.commit(&mut entries, next).await?;
        self.publish(key, None);
        Ok(())
    }

    /// Drops the token, cached user and cached profile together.
    pub async fn clear_auth(&self) -> std::io::Result<()> {
        let mut entries = self.shared.entries.lock().await;
        let mut next = entries.clone();
        let removed: Vec<&str> = [AUTH_TOKEN_KEY, USER_KEY, PROFILE_KEY]
            .into_iter()
            .filter(|key| next.remove(*key).is_some())
            .collect();
        if removed.is_empty() {
            return Ok(());
        }
        self.commit(&mut entries, next).await?;
        for key in removed {
            self.publish(key, None);
        }
        Ok(())
    }

    pub async fn load_user(&self) -> Option<User> {
        self.load_json(USER_KEY).await
    }

    pub async fn save_user(&self, user: &User) -> std::io::Result<()> {
        self.save_json(USER_KEY, user).await
    }

    pub async fn load_profile(&self) -> Option<ProfileData> {
        self.load_json(PROFILE_KEY).await
    }

    pub async fn save_profile(&self, profile: &ProfileData) -> std::io::Result<()> {
        self.save_json(PROFILE_KEY, profile).await
    }

    /// Reads a JSON entry; a corrupt entry is deleted and treated as absent.
    async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("discarding corrupt '{key}' entry: {err}");
                if let Err(err) = self.remove(key).await {
                    error!("failed to remove corrupt '{key}' entry: {err}");
                }
                None
            }
        }
    }

    async fn save_json<T: Serialize>(&self, key: &str, value: &T) -> std::io::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw).await
    }

    /// Writes `next` to disk and only then makes it the live map.
    async fn commit(
        &self,
        entries: &mut BTreeMap<String, String>,
        next: BTreeMap<String, String>,
    ) -> std::io::Result<()> {
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
        let Some(path) = &self.shared.path else {
            return Ok(());
        };
        let payload = serde_json::to_vec_pretty(entries)?;
        crate::storage::ensure_parent(path).await?;
        fs::write(path, payload).await
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        // No subscribers is fine.
        let _ = self.shared.events.send(StorageEvent {
            origin: self.origin,
            key: key.to_string(),
            new_value,
        });
    }
}
