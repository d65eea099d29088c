//! Schema, subject and configuration records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SUBJECT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)*$").expect("hard-coded subject pattern compiles")
});

/// Whether `subject` is a legal subject name (dot-separated segments of
/// letters, digits, `_` and `-`).
pub fn is_valid_subject(subject: &str) -> bool {
    SUBJECT_PATTERN.is_match(subject)
}

/// Format of a schema body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SchemaType {
    #[default]
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "AVRO")]
    Avro,
    #[serde(rename = "PROTOBUF")]
    Protobuf,
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Json => write!(f, "JSON"),
            SchemaType::Avro => write!(f, "AVRO"),
            SchemaType::Protobuf => write!(f, "PROTOBUF"),
        }
    }
}

/// Compatibility policy for schema evolution within a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompatibilityLevel {
    /// New schema can read data written under the previous schema (default).
    #[default]
    #[serde(rename = "BACKWARD")]
    Backward,
    /// Previous schema can read data produced under the new schema.
    #[serde(rename = "FORWARD")]
    Forward,
    /// Both directions must hold.
    #[serde(rename = "FULL")]
    Full,
    /// No compatibility checking.
    #[serde(rename = "NONE")]
    None,
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatibilityLevel::Backward => write!(f, "BACKWARD"),
            CompatibilityLevel::Forward => write!(f, "FORWARD"),
            CompatibilityLevel::Full => write!(f, "FULL"),
            CompatibilityLevel::None => write!(f, "NONE"),
        }
    }
}

/// Dependency pointer to another registered schema. Stored and exposed,
/// never dereferenced by the registry core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub subject: String,
    pub version: u32,
}

/// A registered, immutable schema version.
///
/// `id` and the timestamps are assigned by the store at save time and are
/// never set by callers. A persisted schema is never mutated; "updating" a
/// subject means registering a new version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub subject: String,
    pub version: u32,
    pub schema_type: SchemaType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A schema submitted for registration, before the store has assigned an
/// id, version or timestamps. `schema_type` defaults to JSON when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchema {
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub schema_type: SchemaType,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl NewSchema {
    pub fn new(subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
            schema_type: SchemaType::default(),
            references: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, schema_type: SchemaType) -> Self {
        self.schema_type = schema_type;
        self
    }
}

/// Per-subject compatibility policy. An absent record means BACKWARD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfig {
    pub subject: String,
    pub compatibility: CompatibilityLevel,
}

impl SubjectConfig {
    /// The implicit configuration for a subject that was never configured.
    pub fn default_for(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            compatibility: CompatibilityLevel::default(),
        }
    }
}

/// Summary of a subject for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub subject: String,
    pub latest_version: u32,
    pub schema_id: String,
    pub compatibility: CompatibilityLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
