pub mod disk;
pub mod memory;

use crate::core::cache::{KeyValueCollection, Store};
use disk::{DiskCollection, LockedKeyspace};
use fjall::PartitionCreateOptions;
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::warn;

/// A thread-safe key-value store that can hold multiple collections.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Arc<LockedKeyspace>>,
}

impl KeyValueStore {
    /// Opens a store whose persistent collections live under `data_dir`.
    /// If the directory cannot be opened or another process holds it,
    /// persistent collections are unavailable and callers fall back to memory.
    pub fn open(data_dir: &Path) -> Self {
        let keyspace = match LockedKeyspace::open(data_dir) {
            Ok(keyspace) => Some(Arc::new(keyspace)),
            Err(e) => {
                warn!("Could not open storage, using memory only: {e:#}");
                None
            }
        };

        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    /// A store without any persistent backing.
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }

    /// Returns the persistent collection `name`, or an in-memory one when
    /// persistence is unavailable.
    pub fn collection_or_memory(&self, name: &str) -> Arc<dyn KeyValueCollection> {
        self.get_collection(name, true, true)
            .or_else(|| self.get_collection(name, false, true))
            .unwrap_or_else(|| Arc::new(MemoryCollection::new()))
    }
}

impl Store for KeyValueStore {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(existing) = collections.get(name) {
            return Some(Arc::clone(existing));
        }
        if !create_if_missing {
            return None;
        }

        let created: Arc<dyn KeyValueCollection> = if persist {
            let keyspace = self.keyspace.as_ref()?;
            match keyspace.open_partition(name, PartitionCreateOptions::default()) {
                Ok(partition) => Arc::new(DiskCollection::new(Arc::clone(keyspace), partition)),
                Err(e) => {
                    warn!("Could not open partition {name}: {e}");
                    return None;
                }
            }
        } else {
            Arc::new(MemoryCollection::new())
        };

        collections.insert(name.to_string(), Arc::clone(&created));
        Some(created)
    }
}
