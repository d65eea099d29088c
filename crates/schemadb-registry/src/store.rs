//! Schema persistence on top of the key-value substrate.
//!
//! Key layout (subject names cannot contain `/`, and versions are
//! zero-padded so lexicographic key order equals numeric version order):
//!
//! ```text
//! schema/<subject>/<version:010>   JSON-encoded Schema record
//! id/<schema-id>                   pointer to (subject, version)
//! config/<subject>                 JSON-encoded SubjectConfig
//! vseq/<subject>                   highest version ever reserved
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use schemadb_types::{
    KvStore, NewSchema, Schema, StoreError, SubjectConfig, SubjectInfo,
};

fn schema_key(subject: &str, version: u32) -> Vec<u8> {
    format!("schema/{}/{:010}", subject, version).into_bytes()
}

fn subject_prefix(subject: &str) -> Vec<u8> {
    format!("schema/{}/", subject).into_bytes()
}

fn id_key(id: &str) -> Vec<u8> {
    format!("id/{}", id).into_bytes()
}

fn config_key(subject: &str) -> Vec<u8> {
    format!("config/{}", subject).into_bytes()
}

fn vseq_key(subject: &str) -> Vec<u8> {
    format!("vseq/{}", subject).into_bytes()
}

/// Side index entry resolving a schema id to its primary key.
#[derive(Debug, Serialize, Deserialize)]
struct IdPointer {
    subject: String,
    version: u32,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<'a, T: Deserialize<'a>>(raw: &'a [u8]) -> Result<T, StoreError> {
    serde_json::from_slice(raw).map_err(|e| StoreError::Deserialization(e.to_string()))
}

/// Durable schema, configuration and version-counter storage.
///
/// No business rules live here; the store only guarantees that versions
/// are never overwritten and that version reservation is race-free.
pub struct SchemaStore {
    kv: Arc<dyn KvStore>,
}

impl SchemaStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Persist a new immutable version, assigning its id and timestamps.
    ///
    /// Fails with `Conflict` if `(subject, version)` already exists; the
    /// store never silently overwrites a version. The schema record and
    /// its id index land together: if the index write fails, the record
    /// is removed again before the error is surfaced.
    pub async fn save_schema(
        &self,
        submission: &NewSchema,
        version: u32,
    ) -> Result<Schema, StoreError> {
        let now = Utc::now();
        let schema = Schema {
            id: Uuid::new_v4().to_string(),
            subject: submission.subject.clone(),
            version,
            schema_type: submission.schema_type,
            content: submission.content.clone(),
            references: submission.references.clone(),
            metadata: submission.metadata.clone(),
            created_at: now,
            updated_at: now,
        };

        let key = schema_key(&schema.subject, schema.version);
        let record = encode(&schema)?;
        let inserted = self.kv.compare_and_swap(&key, None, Some(&record)).await?;
        if !inserted {
            return Err(StoreError::Conflict);
        }

        let pointer = encode(&IdPointer {
            subject: schema.subject.clone(),
            version: schema.version,
        })?;
        if let Err(err) = self.kv.put(&id_key(&schema.id), &pointer).await {
            if let Err(rollback) = self.kv.delete(&key).await {
                warn!(
                    subject = %schema.subject,
                    version = schema.version,
                    error = %rollback,
                    "failed to roll back schema record after index write failure"
                );
            }
            return Err(err);
        }

        debug!(subject = %schema.subject, version = schema.version, id = %schema.id, "schema saved");
        Ok(schema)
    }

    pub async fn get_schema(
        &self,
        subject: &str,
        version: u32,
    ) -> Result<Option<Schema>, StoreError> {
        match self.kv.get(&schema_key(subject, version)).await? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Resolve a schema through the id index maintained at save time.
    pub async fn get_schema_by_id(&self, id: &str) -> Result<Option<Schema>, StoreError> {
        let Some(raw) = self.kv.get(&id_key(id)).await? else {
            return Ok(None);
        };
        let pointer: IdPointer = decode(&raw)?;
        self.get_schema(&pointer.subject, pointer.version).await
    }

    /// The schema with the maximum live version for the subject.
    pub async fn get_latest_schema(&self, subject: &str) -> Result<Option<Schema>, StoreError> {
        let entries = self.kv.scan_prefix(&subject_prefix(subject)).await?;
        match entries.last() {
            Some((_, raw)) => Ok(Some(decode(raw)?)),
            None => Ok(None),
        }
    }

    /// Ascending live version numbers; empty (not an error) for an
    /// unknown subject.
    pub async fn list_versions(&self, subject: &str) -> Result<Vec<u32>, StoreError> {
        let entries = self.kv.scan_prefix(&subject_prefix(subject)).await?;
        let mut versions = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            if let Some(version) = parse_version(&key) {
                versions.push(version);
            }
        }
        Ok(versions)
    }

    /// Remove a version and its id index entry. Returns the removed
    /// schema; an absent version is `NotFound`.
    pub async fn delete_schema(&self, subject: &str, version: u32) -> Result<Schema, StoreError> {
        let key = schema_key(subject, version);
        let Some(raw) = self.kv.get(&key).await? else {
            return Err(StoreError::NotFound);
        };
        let schema: Schema = decode(&raw)?;
        self.kv.delete(&key).await?;
        self.kv.delete(&id_key(&schema.id)).await?;
        debug!(subject, version, id = %schema.id, "schema deleted");
        Ok(schema)
    }

    /// Sorted distinct subject names with at least one live version.
    pub async fn list_subjects(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.kv.scan_prefix(b"schema/").await?;
        let mut subjects = BTreeSet::new();
        for (key, _) in entries {
            if let Some(subject) = parse_subject(&key) {
                subjects.insert(subject.to_string());
            }
        }
        Ok(subjects.into_iter().collect())
    }

    /// Last-write-wins per subject.
    pub async fn save_config(&self, config: &SubjectConfig) -> Result<(), StoreError> {
        let record = encode(config)?;
        self.kv.put(&config_key(&config.subject), &record).await?;
        debug!(subject = %config.subject, compatibility = %config.compatibility, "config saved");
        Ok(())
    }

    /// The effective configuration; an unset subject yields the default
    /// BACKWARD policy, never `NotFound`.
    pub async fn get_config(&self, subject: &str) -> Result<SubjectConfig, StoreError> {
        match self.kv.get(&config_key(subject)).await? {
            Some(raw) => decode(&raw),
            None => Ok(SubjectConfig::default_for(subject)),
        }
    }

    /// DELETE semantics: write the default record back rather than
    /// removing it.
    pub async fn reset_config(&self, subject: &str) -> Result<SubjectConfig, StoreError> {
        let config = SubjectConfig::default_for(subject);
        self.save_config(&config).await?;
        Ok(config)
    }

    /// Atomically reserve the next version number for a subject via a
    /// compare-and-swap on the per-subject counter record. A lost race
    /// surfaces `Conflict` and the caller retries with a fresh read. The
    /// counter is never decremented, so deleted versions are never
    /// reissued; a reservation abandoned mid-registration just leaves a
    /// benign gap.
    pub async fn next_version(&self, subject: &str) -> Result<u32, StoreError> {
        let key = vseq_key(subject);
        let current = self.kv.get(&key).await?;
        let next = match &current {
            Some(raw) => parse_counter(raw, subject)? + 1,
            None => 1,
        };
        let proposed = next.to_string();
        let applied = self
            .kv
            .compare_and_swap(&key, current.as_deref(), Some(proposed.as_bytes()))
            .await?;
        if applied {
            Ok(next)
        } else {
            Err(StoreError::Conflict)
        }
    }

    /// Best-effort return of an unused reservation. Applies only when no
    /// later reservation happened in the meantime; otherwise the number
    /// stays skipped, which is a benign gap. Never rolls the counter
    /// below the value observed at reservation time, so persisted or
    /// deleted version numbers can never be reissued through this path.
    pub async fn release_version(&self, subject: &str, version: u32) -> Result<bool, StoreError> {
        let key = vseq_key(subject);
        let expected = version.to_string();
        let proposed = (version - 1).to_string();
        self.kv
            .compare_and_swap(&key, Some(expected.as_bytes()), Some(proposed.as_bytes()))
            .await
    }

    /// One-scan summary of a subject, or `None` when it has no live
    /// versions.
    pub async fn subject_overview(&self, subject: &str) -> Result<Option<SubjectInfo>, StoreError> {
        let entries = self.kv.scan_prefix(&subject_prefix(subject)).await?;
        let (Some((_, first_raw)), Some((_, last_raw))) = (entries.first(), entries.last()) else {
            return Ok(None);
        };
        let first: Schema = decode(first_raw)?;
        let latest: Schema = decode(last_raw)?;
        let config = self.get_config(subject).await?;
        Ok(Some(SubjectInfo {
            subject: subject.to_string(),
            latest_version: latest.version,
            schema_id: latest.id,
            compatibility: config.compatibility,
            created_at: first.created_at,
            updated_at: latest.updated_at,
        }))
    }
}

fn parse_counter(raw: &[u8], subject: &str) -> Result<u32, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| {
            StoreError::Deserialization(format!("invalid version counter for '{}'", subject))
        })
}

fn parse_version(key: &[u8]) -> Option<u32> {
    let key = std::str::from_utf8(key).ok()?;
    key.rsplit('/').next()?.parse().ok()
}

fn parse_subject(key: &[u8]) -> Option<&str> {
    let key = std::str::from_utf8(key).ok()?;
    key.strip_prefix("schema/")?.split('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKv;
    use schemadb_types::CompatibilityLevel;

    fn store() -> SchemaStore {
        SchemaStore::new(Arc::new(MemoryKv::new()))
    }

    fn submission(subject: &str, content: &str) -> NewSchema {
        NewSchema::new(subject, content)
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let store = store();
        let saved = store
            .save_schema(&submission("orders", "{\"type\":\"object\"}"), 1)
            .await
            .unwrap();
        assert_eq!(saved.version, 1);
        assert!(!saved.id.is_empty());

        let fetched = store.get_schema("orders", 1).await.unwrap().unwrap();
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn save_never_overwrites_a_version() {
        let store = store();
        store
            .save_schema(&submission("orders", "{}"), 1)
            .await
            .unwrap();
        let err = store
            .save_schema(&submission("orders", "{\"changed\":true}"), 1)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict);

        // Original content untouched
        let kept = store.get_schema("orders", 1).await.unwrap().unwrap();
        assert_eq!(kept.content, "{}");
    }

    #[tokio::test]
    async fn lookup_by_id() {
        let store = store();
        let saved = store
            .save_schema(&submission("orders", "{}"), 1)
            .await
            .unwrap();

        let by_id = store.get_schema_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(by_id, saved);
        assert!(store.get_schema_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_is_maximum_live_version() {
        let store = store();
        for version in 1..=3 {
            store
                .save_schema(&submission("orders", "{}"), version)
                .await
                .unwrap();
        }
        let latest = store.get_latest_schema("orders").await.unwrap().unwrap();
        assert_eq!(latest.version, 3);

        store.delete_schema("orders", 3).await.unwrap();
        let latest = store.get_latest_schema("orders").await.unwrap().unwrap();
        assert_eq!(latest.version, 2);
    }

    #[tokio::test]
    async fn list_versions_ascending_and_empty_for_unknown() {
        let store = store();
        for version in [1, 2, 3] {
            store
                .save_schema(&submission("orders", "{}"), version)
                .await
                .unwrap();
        }
        store.delete_schema("orders", 2).await.unwrap();

        assert_eq!(store.list_versions("orders").await.unwrap(), vec![1, 3]);
        assert!(store
            .list_versions("unknown.subject")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn delete_removes_record_and_id_index() {
        let store = store();
        let saved = store
            .save_schema(&submission("orders", "{}"), 1)
            .await
            .unwrap();

        let removed = store.delete_schema("orders", 1).await.unwrap();
        assert_eq!(removed.id, saved.id);
        assert!(store.get_schema("orders", 1).await.unwrap().is_none());
        assert!(store.get_schema_by_id(&saved.id).await.unwrap().is_none());

        let err = store.delete_schema("orders", 1).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn list_subjects_sorted_distinct() {
        let store = store();
        store
            .save_schema(&submission("zebra", "{}"), 1)
            .await
            .unwrap();
        store
            .save_schema(&submission("alpha", "{}"), 1)
            .await
            .unwrap();
        store
            .save_schema(&submission("alpha", "{}"), 2)
            .await
            .unwrap();

        assert_eq!(store.list_subjects().await.unwrap(), vec!["alpha", "zebra"]);
    }

    #[tokio::test]
    async fn config_defaults_to_backward() {
        let store = store();
        let config = store.get_config("orders").await.unwrap();
        assert_eq!(config.compatibility, CompatibilityLevel::Backward);

        store
            .save_config(&SubjectConfig {
                subject: "orders".to_string(),
                compatibility: CompatibilityLevel::Full,
            })
            .await
            .unwrap();
        let config = store.get_config("orders").await.unwrap();
        assert_eq!(config.compatibility, CompatibilityLevel::Full);

        let reset = store.reset_config("orders").await.unwrap();
        assert_eq!(reset.compatibility, CompatibilityLevel::Backward);
        let config = store.get_config("orders").await.unwrap();
        assert_eq!(config.compatibility, CompatibilityLevel::Backward);
    }

    #[tokio::test]
    async fn next_version_counts_up_and_never_back() {
        let store = store();
        assert_eq!(store.next_version("orders").await.unwrap(), 1);
        store
            .save_schema(&submission("orders", "{}"), 1)
            .await
            .unwrap();
        assert_eq!(store.next_version("orders").await.unwrap(), 2);
        store
            .save_schema(&submission("orders", "{}"), 2)
            .await
            .unwrap();

        // Deleting the top version must not release its number.
        store.delete_schema("orders", 2).await.unwrap();
        assert_eq!(store.next_version("orders").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn release_returns_only_the_top_reservation() {
        let store = store();
        let reserved = store.next_version("orders").await.unwrap();
        assert_eq!(reserved, 1);
        assert!(store.release_version("orders", reserved).await.unwrap());
        // The released number is handed out again.
        assert_eq!(store.next_version("orders").await.unwrap(), 1);

        // A release after someone else reserved past us is a no-op.
        let stale = store.next_version("orders").await.unwrap();
        assert_eq!(stale, 2);
        store.next_version("orders").await.unwrap();
        assert!(!store.release_version("orders", stale).await.unwrap());
        assert_eq!(store.next_version("orders").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn subject_overview_summarizes_versions() {
        let store = store();
        assert!(store.subject_overview("orders").await.unwrap().is_none());

        store
            .save_schema(&submission("orders", "{}"), 1)
            .await
            .unwrap();
        let latest = store
            .save_schema(&submission("orders", "{}"), 2)
            .await
            .unwrap();

        let info = store.subject_overview("orders").await.unwrap().unwrap();
        assert_eq!(info.latest_version, 2);
        assert_eq!(info.schema_id, latest.id);
        assert_eq!(info.compatibility, CompatibilityLevel::Backward);
    }
}
