//! # Durable JSON Swap Store
//!
//! One pretty-printed JSON file per order (`<order_hash>.json`) inside a
//! store directory. Fill bookkeeping of parent orders lives next to them
//! under `orders/`. Writes go to a temp file that is synced and renamed
//! over the old record, so a crash leaves either the old or the new record.
//!
//! The directory is held under an exclusive `fs2` lock for the lifetime of
//! the store; a second process opening the same directory fails fast.

use crate::domain::{Hash, PartialFillState, StoreError, SwapRecord};
use crate::ports::SwapStore;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed swap store.
pub struct JsonFileSwapStore {
    dir: PathBuf,
    lock: File,
}

impl JsonFileSwapStore {
    /// Lock file name
    const LOCK_FILE: &'static str = "LOCK";
    /// Parent-order subdirectory
    const ORDERS_DIR: &'static str = "orders";

    /// Open (creating if needed) a store directory and take its lock.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(dir.join(Self::ORDERS_DIR))?;

        let lock_path = dir.join(Self::LOCK_FILE);
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| StoreError::Locked(lock_path.display().to_string()))?;

        debug!(dir = %dir.display(), "[xswap] Swap store opened");
        Ok(Self { dir, lock })
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, order_hash: &Hash) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(order_hash)))
    }

    fn order_path(&self, order_hash: &Hash) -> PathBuf {
        self.dir
            .join(Self::ORDERS_DIR)
            .join(format!("{}.json", hex::encode(order_hash)))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    let mut file = File::create(&tmp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl SwapStore for JsonFileSwapStore {
    fn get(&self, order_hash: &Hash) -> Result<Option<SwapRecord>, StoreError> {
        read_json(&self.record_path(order_hash))
    }

    fn put(&self, record: &SwapRecord) -> Result<(), StoreError> {
        write_json(&self.record_path(&record.order_hash), record)
    }

    fn list(&self) -> Result<Vec<SwapRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            records.push(serde_json::from_slice::<SwapRecord>(&bytes)?);
        }
        records.sort_by_key(|r| (r.created_at, r.order_hash));
        Ok(records)
    }

    fn get_order(&self, order_hash: &Hash) -> Result<Option<PartialFillState>, StoreError> {
        read_json(&self.order_path(order_hash))
    }

    fn put_order(&self, state: &PartialFillState) -> Result<(), StoreError> {
        write_json(&self.order_path(&state.order_hash), state)
    }
}

impl Drop for JsonFileSwapStore {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock);
    }
}
