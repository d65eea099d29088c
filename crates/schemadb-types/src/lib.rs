//! # schemadb-types
//!
//! Core domain types and ports for the schemadb schema registry.
//!
//! This crate provides the foundational types shared across all schemadb crates:
//! - Schema, subject configuration and event records
//! - The `KvStore` substrate port
//! - Validator and event-bus capability traits
//! - Error types
//!
//! ## Design Philosophy
//!
//! This crate intentionally has minimal dependencies to:
//! 1. Enable lightweight client libraries
//! 2. Allow mock implementations for testing
//! 3. Provide clear separation between domain types and implementation

pub mod error;
pub mod event;
pub mod kv;
pub mod schema;
pub mod validate;

// Re-exports for convenience
pub use error::{EventBusError, RegistryError, StoreError};
pub use event::{EventBus, SchemaEvent, SchemaEventType};
pub use kv::KvStore;
pub use schema::{
    is_valid_subject, CompatibilityLevel, NewSchema, Reference, Schema, SchemaType, SubjectConfig,
    SubjectInfo,
};
pub use validate::{DataValidator, SyntaxValidator, ValidationResult};
