//! Error types for the schema registry.

use thiserror::Error;

/// Storage-facing errors produced by `KvStore` implementations and the
/// schema store built on top of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("failed to access underlying store: {0}")]
    Backend(String),

    #[error("failed to serialize record: {0}")]
    Serialization(String),

    #[error("failed to deserialize record: {0}")]
    Deserialization(String),

    #[error("record not found")]
    NotFound,

    #[error("conditional write conflict")]
    Conflict,
}

/// Caller-facing errors surfaced by the registry.
///
/// `InvalidSchema` and `IncompatibleSchema` carry the complete ordered
/// error list from the failing stage, never just the first error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("schema failed syntax validation: {errors:?}")]
    InvalidSchema { errors: Vec<String> },

    #[error("schema failed compatibility check: {errors:?}")]
    IncompatibleSchema { errors: Vec<String> },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => RegistryError::NotFound("record not found".to_string()),
            StoreError::Conflict => RegistryError::Conflict("storage write conflict".to_string()),
            other => RegistryError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Failure to hand an event to the bus. Publishing is best-effort, so
/// callers demote this to a warning rather than propagating it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event publish failed: {0}")]
pub struct EventBusError(pub String);
