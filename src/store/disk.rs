use crate::core::cache::KeyValueCollection;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use std::fs::{self, File, OpenOptions, TryLockError};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A `fjall` keyspace owned by this process. The keyspace is not safe to
/// share between processes, so an exclusive lock on `storage.lock` is held
/// for as long as the keyspace is open.
pub struct LockedKeyspace {
    keyspace: Keyspace,
    _lock: File,
}

impl LockedKeyspace {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let lock = lock_data_dir(data_dir)?;
        let keyspace = fjall::Config::new(data_dir.join("storage")).open()?;
        debug!("Opened storage at {}", data_dir.display());
        Ok(Self {
            keyspace,
            _lock: lock,
        })
    }
}

/// Takes the exclusive lock on `data_dir`, released when the file is dropped.
fn lock_data_dir(data_dir: &Path) -> Result<File> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let lock_path = data_dir.join("storage.lock");
    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("Failed to open {}", lock_path.display()))?;
    match lock.try_lock() {
        Ok(()) => Ok(lock),
        Err(TryLockError::WouldBlock) => bail!(
            "Storage at {} is in use by another hunian process",
            data_dir.display()
        ),
        Err(TryLockError::Error(e)) => Err(e).context("Failed to lock storage"),
    }
}

impl Deref for LockedKeyspace {
    type Target = Keyspace;

    fn deref(&self) -> &Keyspace {
        &self.keyspace
    }
}

/// Collection persisted to a `fjall` partition. Errors are logged and
/// swallowed so a broken data directory degrades to "nothing cached".
pub struct DiskCollection {
    keyspace: Arc<LockedKeyspace>,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(keyspace: Arc<LockedKeyspace>, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }

    fn flush(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &str) -> Option<String> {
        let res: Result<Option<String>> = (|| {
            let Some(raw) = self.partition.get(key.as_bytes())? else {
                return Ok(None);
            };
            Ok(Some(String::from_utf8(raw.to_vec())?))
        })();

        match res {
            Ok(Some(value)) => {
                debug!("Storage HIT for key: {key}");
                Some(value)
            }
            Ok(None) => {
                debug!("Storage MISS for key: {key}");
                None
            }
            Err(e) => {
                debug!("DiskCollection get error for {key}: {e}");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &str) {
        let res: Result<()> = (|| {
            self.partition.insert(key.as_bytes(), value.as_bytes())?;
            self.flush()
        })();
        match res {
            Ok(()) => debug!("Storage PUT for key: {key}"),
            Err(e) => debug!("DiskCollection put error for {key}: {e}"),
        }
    }

    async fn remove(&self, key: &str) {
        let res: Result<()> = (|| {
            self.partition.remove(key.as_bytes())?;
            self.flush()
        })();
        if let Err(e) = res {
            debug!("DiskCollection remove error for {key}: {e}");
        }
    }
}
