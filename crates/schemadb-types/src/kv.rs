//! Key-value substrate port.
//!
//! The only I/O dependency of the schema store. Implement this trait to
//! plug in any backend that supports point reads/writes, a conditional
//! write, and prefix enumeration.

use async_trait::async_trait;

use crate::error::StoreError;

#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Retrieve bytes for a key.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Put bytes under `key`, unconditionally.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Conditional write: applies only when the current value equals
    /// `expected` (`None` meaning the key is absent). `proposed = None`
    /// deletes the key. Returns whether the swap applied.
    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        proposed: Option<&[u8]>,
    ) -> Result<bool, StoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Enumerate key-value pairs whose key starts with `prefix`, in
    /// lexicographic key order.
    async fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}
