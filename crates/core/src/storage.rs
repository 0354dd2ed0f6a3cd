//! Durable client-side session storage.
//!
//! The browser original kept everything in localStorage; here the same
//! contract is a trait so the client can run against a file on disk or an
//! in-memory map in tests.

use crate::CoreResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Well-known storage keys, bit-compatible with the browser client.
pub mod keys {
    /// The raw bearer token.
    pub const TOKEN: &str = "dailyfeed_token";
    pub const USER_EMAIL: &str = "user_email";
    pub const USER_HANDLE: &str = "user_handle";
    pub const USER_MEMBER_ID: &str = "user_member_id";
    pub const USER_AVATAR_URL: &str = "user_avatar_url";
}

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> CoreResult<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> CoreResult<()>;
    async fn remove(&self, key: &str) -> CoreResult<()>;
    async fn clear(&self) -> CoreResult<()>;
}

/// In-memory storage, the default for tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> CoreResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// File-backed storage: a single JSON object rewritten on every update.
///
/// Reads go back to the file each time, matching the original's re-read of
/// localStorage on every access.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileStorage {
    path: std::path::PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Storage under the platform data directory, e.g.
    /// `~/.local/share/dailyfeed/session.json`.
    pub fn in_data_dir() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("dailyfeed");
        Self::new(dir.join("session.json"))
    }

    async fn load(&self) -> CoreResult<HashMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn store(&self, entries: &HashMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl SessionStorage for FileStorage {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.load().await?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries).await
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.remove(key);
        self.store(&entries).await
    }

    async fn clear(&self) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store(&HashMap::new()).await
    }
}

// Mock implementation for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub SessionStorage {}

        #[async_trait]
        impl SessionStorage for SessionStorage {
            async fn get(&self, key: &str) -> CoreResult<Option<String>>;
            async fn put(&self, key: &str, value: &str) -> CoreResult<()>;
            async fn remove(&self, key: &str) -> CoreResult<()>;
            async fn clear(&self) -> CoreResult<()>;
        }
    }
}
