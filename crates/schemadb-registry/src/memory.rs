//! In-memory key-value substrate (for testing and development).

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use schemadb_types::{KvStore, StoreError};

/// `KvStore` backed by a `BTreeMap`, so prefix scans come out in key order
/// like the durable backends.
pub struct MemoryKv {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))?;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        proposed: Option<&[u8]>,
    ) -> Result<bool, StoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))?;
        if data.get(key).map(|v| v.as_slice()) != expected {
            return Ok(false);
        }
        match proposed {
            Some(value) => {
                data.insert(key.to_vec(), value.to_vec());
            }
            None => {
                data.remove(key);
            }
        }
        Ok(true)
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))?;
        data.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))?;
        let mut items = Vec::new();
        for (key, value) in data.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            items.push((key.clone(), value.clone()));
        }
        Ok(items)
    }
}
