//! # schemadb-registry
//!
//! Registration-and-compatibility engine for the schemadb schema registry.
//!
//! ## Features
//!
//! - **Versioned storage**: immutable schema versions per subject on a
//!   pluggable key-value substrate
//! - **Race-free version assignment**: per-subject counters reserved via
//!   compare-and-swap, never read-then-write
//! - **Compatibility**: BACKWARD, FORWARD, FULL and NONE policies over a
//!   structural field diff
//! - **Lifecycle events**: best-effort `SCHEMA_CREATED` / `SCHEMA_DELETED`
//!   publication to an event bus
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use schemadb_registry::{
//!     BuiltinSyntaxValidator, JsonDataValidator, BroadcastBus, MemoryKv, Registry, SchemaStore,
//! };
//! use schemadb_types::NewSchema;
//!
//! let store = Arc::new(SchemaStore::new(Arc::new(MemoryKv::new())));
//! let registry = Registry::new(
//!     store,
//!     Arc::new(BuiltinSyntaxValidator),
//!     Arc::new(JsonDataValidator),
//!     Arc::new(BroadcastBus::default()),
//! );
//!
//! // Register a schema
//! let schema = registry
//!     .register_schema(NewSchema::new("orders.created", r#"{"type":"object"}"#))
//!     .await?;
//!
//! // Dry-run a candidate against the subject's policy
//! let verdict = registry
//!     .check_compatibility("orders.created", r#"{"type":"object"}"#, Default::default())
//!     .await?;
//! ```

mod bus;
mod compatibility;
mod data;
mod fields;
mod memory;
mod registry;
mod store;
mod syntax;

pub use bus::{BroadcastBus, BusMessage};
pub use compatibility::CompatibilityEngine;
pub use data::JsonDataValidator;
pub use fields::{can_read, extract, Field, FieldSet};
pub use memory::MemoryKv;
pub use registry::{Registry, RegistryConfig};
pub use store::SchemaStore;
pub use syntax::BuiltinSyntaxValidator;
