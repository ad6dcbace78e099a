use crate::core::cache::KeyValueCollection;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection, used for tests and when no data directory is usable.
#[derive(Default)]
pub struct MemoryCollection {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.inner.lock().await;
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!("Storage HIT for key: {key}");
        } else {
            debug!("Storage MISS for key: {key}");
        }
        value
    }

    async fn put(&self, key: &str, value: &str) {
        let mut entries = self.inner.lock().await;
        debug!("Storage PUT for key: {key}");
        entries.insert(key.to_string(), value.to_string());
    }

    async fn remove(&self, key: &str) {
        let mut entries = self.inner.lock().await;
        entries.remove(key);
        debug!("Storage REMOVE for key: {key}");
    }
}
