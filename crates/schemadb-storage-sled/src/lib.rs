//! sled-backed `KvStore` for the schemadb schema registry.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use schemadb_types::{KvStore, StoreError};

const REGISTRY_TREE: &str = "registry";

/// Durable substrate over a sled tree. Conditional writes map directly
/// onto `sled::Tree::compare_and_swap`, so version reservations stay
/// race-free across concurrent writers sharing the same database.
pub struct SledKv {
    db: sled::Db,
    tree: sled::Tree,
    ops_since_flush: AtomicU64,
    flush_every: u64,
}

impl SledKv {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        let tree = db
            .open_tree(REGISTRY_TREE)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            db,
            tree,
            ops_since_flush: AtomicU64::new(0),
            flush_every: 100,
        })
    }

    fn note_write(&self) -> Result<(), StoreError> {
        if self.ops_since_flush.fetch_add(1, Ordering::Relaxed) + 1 >= self.flush_every {
            self.tree
                .flush()
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            self.db
                .flush()
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            self.ops_since_flush.store(0, Ordering::Relaxed);
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for SledKv {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self
            .tree
            .get(key)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.tree
            .insert(key, value)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.note_write()
    }

    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        proposed: Option<&[u8]>,
    ) -> Result<bool, StoreError> {
        let outcome = self
            .tree
            .compare_and_swap(key, expected, proposed)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match outcome {
            Ok(()) => {
                self.note_write()?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.tree
            .remove(key)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.note_write()
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut items = Vec::new();
        for entry in self.tree.scan_prefix(prefix) {
            let (key, value) = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
            items.push((key.to_vec(), value.to_vec()));
        }
        Ok(items)
    }
}
