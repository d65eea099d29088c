//! Schema lifecycle events and the event-bus port.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventBusError;
use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaEventType {
    #[serde(rename = "SCHEMA_CREATED")]
    SchemaCreated,
    #[serde(rename = "SCHEMA_DELETED")]
    SchemaDeleted,
}

impl fmt::Display for SchemaEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaEventType::SchemaCreated => write!(f, "SCHEMA_CREATED"),
            SchemaEventType::SchemaDeleted => write!(f, "SCHEMA_DELETED"),
        }
    }
}

/// Emitted on every registry state change. Never persisted by the core;
/// consumed by the external event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEvent {
    #[serde(rename = "type")]
    pub event_type: SchemaEventType,
    pub subject: String,
    pub version: u32,
    pub schema_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl SchemaEvent {
    pub fn created(schema: &Schema) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "schema_type".to_string(),
            Value::String(schema.schema_type.to_string()),
        );
        Self {
            event_type: SchemaEventType::SchemaCreated,
            subject: schema.subject.clone(),
            version: schema.version,
            schema_id: schema.id.clone(),
            timestamp: Utc::now(),
            metadata,
        }
    }

    pub fn deleted(schema: &Schema) -> Self {
        Self {
            event_type: SchemaEventType::SchemaDeleted,
            subject: schema.subject.clone(),
            version: schema.version,
            schema_id: schema.id.clone(),
            timestamp: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Topic the event is published on: `<prefix>.<subject>`.
    pub fn topic(&self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.subject)
    }
}

/// At-most-once, fire-and-forget notification port.
#[async_trait]
pub trait EventBus: Send + Sync + 'static {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), EventBusError>;
}
