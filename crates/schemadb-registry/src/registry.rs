//! Registry orchestration: syntax check, version assignment,
//! compatibility check, persistence, event publication.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use schemadb_types::{
    is_valid_subject, DataValidator, EventBus, NewSchema, RegistryError, Schema, SchemaEvent,
    SchemaType, StoreError, SubjectConfig, SubjectInfo, SyntaxValidator, ValidationResult,
};

use crate::compatibility::CompatibilityEngine;
use crate::store::SchemaStore;

/// Tunables for the registration pipeline.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Bounded retries for the version-reservation compare-and-swap.
    /// Contention windows are short, so there is no backoff.
    pub max_version_retries: u32,
    /// Optional deadline applied to each store suspension point. An
    /// elapsed deadline surfaces `StorageUnavailable`; a registration
    /// aborted mid-retry leaves at most a skipped version number.
    pub op_timeout: Option<Duration>,
    /// Events are published on `<prefix>.<subject>`.
    pub event_topic_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_version_retries: 3,
            op_timeout: None,
            event_topic_prefix: "schema.events".to_string(),
        }
    }
}

/// The subject-facing registry. Sole writer of schema and configuration
/// state; safe to share across concurrent request handlers.
pub struct Registry {
    store: Arc<SchemaStore>,
    syntax: Arc<dyn SyntaxValidator>,
    data: Arc<dyn DataValidator>,
    events: Arc<dyn EventBus>,
    config: RegistryConfig,
}

impl Registry {
    pub fn new(
        store: Arc<SchemaStore>,
        syntax: Arc<dyn SyntaxValidator>,
        data: Arc<dyn DataValidator>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self::with_config(store, syntax, data, events, RegistryConfig::default())
    }

    pub fn with_config(
        store: Arc<SchemaStore>,
        syntax: Arc<dyn SyntaxValidator>,
        data: Arc<dyn DataValidator>,
        events: Arc<dyn EventBus>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            store,
            syntax,
            data,
            events,
            config,
        }
    }

    /// Register a new schema version for a subject.
    ///
    /// Pipeline: argument checks, syntax validation, config fetch,
    /// race-free version reservation (bounded retries), compatibility
    /// check against the latest schema observed after the reservation,
    /// persistence, then a best-effort `SCHEMA_CREATED` event.
    pub async fn register_schema(&self, submission: NewSchema) -> Result<Schema, RegistryError> {
        self.check_submission(&submission.subject, &submission.content)?;

        let syntax = self.syntax.check(submission.schema_type, &submission.content);
        if !syntax.valid {
            return Err(RegistryError::InvalidSchema {
                errors: syntax.errors,
            });
        }

        let config = self.bounded(self.store.get_config(&submission.subject)).await?;

        let mut restarted = false;
        loop {
            let version = self.reserve_version(&submission.subject).await?;
            // Compatibility is judged against whatever is latest after
            // our reservation committed, never a version not yet
            // observable.
            let latest = self
                .bounded(self.store.get_latest_schema(&submission.subject))
                .await?;
            let compat = CompatibilityEngine::check(config.compatibility, latest.as_ref(), &submission);
            for warning in &compat.warnings {
                warn!(subject = %submission.subject, %warning, "compatibility warning");
            }
            if !compat.valid {
                // Hand the unused reservation back when nobody raced past
                // us; a failed release just leaves a benign gap.
                if let Err(err) = self
                    .store
                    .release_version(&submission.subject, version)
                    .await
                {
                    warn!(
                        subject = %submission.subject,
                        version,
                        error = %err,
                        "failed to release unused version reservation"
                    );
                }
                return Err(RegistryError::IncompatibleSchema {
                    errors: compat.errors,
                });
            }

            match self.bounded(self.store.save_schema(&submission, version)).await {
                Ok(schema) => {
                    info!(
                        subject = %schema.subject,
                        version = schema.version,
                        id = %schema.id,
                        "schema registered"
                    );
                    self.emit(SchemaEvent::created(&schema));
                    return Ok(schema);
                }
                // Lost the race despite the reservation: restart from the
                // reservation step once, then give up.
                Err(RegistryError::Conflict(_)) if !restarted => {
                    restarted = true;
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Delete one version. Remaining versions are never renumbered and
    /// the deleted number is never reissued.
    pub async fn delete_schema(&self, subject: &str, version: u32) -> Result<Schema, RegistryError> {
        match self.bounded(self.store.delete_schema(subject, version)).await {
            Ok(schema) => {
                info!(subject = %schema.subject, version = schema.version, "schema deleted");
                self.emit(SchemaEvent::deleted(&schema));
                Ok(schema)
            }
            Err(RegistryError::NotFound(_)) => Err(RegistryError::NotFound(format!(
                "schema not found: {} version {}",
                subject, version
            ))),
            Err(err) => Err(err),
        }
    }

    pub async fn get_schema(&self, subject: &str, version: u32) -> Result<Schema, RegistryError> {
        self.bounded(self.store.get_schema(subject, version))
            .await?
            .ok_or_else(|| {
                RegistryError::NotFound(format!("schema not found: {} version {}", subject, version))
            })
    }

    pub async fn get_schema_by_id(&self, id: &str) -> Result<Schema, RegistryError> {
        self.bounded(self.store.get_schema_by_id(id))
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("schema not found: {}", id)))
    }

    pub async fn get_latest_schema(&self, subject: &str) -> Result<Schema, RegistryError> {
        self.bounded(self.store.get_latest_schema(subject))
            .await?
            .ok_or_else(|| {
                RegistryError::NotFound(format!("no schemas found for subject '{}'", subject))
            })
    }

    pub async fn list_subjects(&self) -> Result<Vec<String>, RegistryError> {
        self.bounded(self.store.list_subjects()).await
    }

    pub async fn list_versions(&self, subject: &str) -> Result<Vec<u32>, RegistryError> {
        self.bounded(self.store.list_versions(subject)).await
    }

    pub async fn subject_info(&self, subject: &str) -> Result<SubjectInfo, RegistryError> {
        self.bounded(self.store.subject_overview(subject))
            .await?
            .ok_or_else(|| {
                RegistryError::NotFound(format!("no schemas found for subject '{}'", subject))
            })
    }

    pub async fn get_config(&self, subject: &str) -> Result<SubjectConfig, RegistryError> {
        self.bounded(self.store.get_config(subject)).await
    }

    pub async fn set_config(&self, config: SubjectConfig) -> Result<(), RegistryError> {
        if !is_valid_subject(&config.subject) {
            return Err(RegistryError::InvalidArgument(format!(
                "invalid subject name '{}'",
                config.subject
            )));
        }
        self.bounded(self.store.save_config(&config)).await
    }

    /// DELETE on a subject's config resets it to the default policy.
    pub async fn delete_config(&self, subject: &str) -> Result<SubjectConfig, RegistryError> {
        self.bounded(self.store.reset_config(subject)).await
    }

    /// Dry-run of the registration pipeline: argument and syntax checks,
    /// then the compatibility verdict against the current latest schema.
    /// Nothing is reserved or persisted.
    pub async fn check_compatibility(
        &self,
        subject: &str,
        content: &str,
        schema_type: SchemaType,
    ) -> Result<ValidationResult, RegistryError> {
        self.check_submission(subject, content)?;

        let syntax = self.syntax.check(schema_type, content);
        if !syntax.valid {
            return Err(RegistryError::InvalidSchema {
                errors: syntax.errors,
            });
        }

        let submission = NewSchema::new(subject, content).with_type(schema_type);
        let config = self.bounded(self.store.get_config(subject)).await?;
        let latest = self.bounded(self.store.get_latest_schema(subject)).await?;
        Ok(CompatibilityEngine::check(
            config.compatibility,
            latest.as_ref(),
            &submission,
        ))
    }

    /// Structurally validate a payload against a stored version
    /// (`None` = latest).
    pub async fn validate_data(
        &self,
        subject: &str,
        version: Option<u32>,
        payload: &serde_json::Value,
    ) -> Result<ValidationResult, RegistryError> {
        let schema = match version {
            Some(version) => self.get_schema(subject, version).await?,
            None => self.get_latest_schema(subject).await?,
        };
        Ok(self.data.validate(&schema, payload))
    }

    fn check_submission(&self, subject: &str, content: &str) -> Result<(), RegistryError> {
        if !is_valid_subject(subject) {
            return Err(RegistryError::InvalidArgument(format!(
                "invalid subject name '{}'",
                subject
            )));
        }
        if content.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "schema content is empty".to_string(),
            ));
        }
        Ok(())
    }

    async fn reserve_version(&self, subject: &str) -> Result<u32, RegistryError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.bounded(self.store.next_version(subject)).await {
                Ok(version) => return Ok(version),
                Err(RegistryError::Conflict(_)) if attempts < self.config.max_version_retries => {
                    continue;
                }
                Err(RegistryError::Conflict(_)) => {
                    return Err(RegistryError::Conflict(format!(
                        "could not reserve a version for '{}' after {} attempts",
                        subject, attempts
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Fire-and-forget: the schema is already durable, so a publish
    /// failure is demoted to a warning and never alters the outcome.
    fn emit(&self, event: SchemaEvent) {
        let bus = Arc::clone(&self.events);
        let topic = event.topic(&self.config.event_topic_prefix);
        tokio::spawn(async move {
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%topic, error = %err, "failed to encode schema event");
                    return;
                }
            };
            if let Err(err) = bus.publish(&topic, &payload).await {
                warn!(%topic, error = %err, "failed to publish schema event");
            }
        });
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, RegistryError> {
        match self.config.op_timeout {
            Some(limit) => tokio::time::timeout(limit, op)
                .await
                .map_err(|_| {
                    RegistryError::StorageUnavailable("store operation timed out".to_string())
                })?
                .map_err(RegistryError::from),
            None => op.await.map_err(RegistryError::from),
        }
    }
}
