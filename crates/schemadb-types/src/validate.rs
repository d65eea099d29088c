//! Validation results and validator capability traits.

use serde::{Deserialize, Serialize};

use crate::schema::{Schema, SchemaType};

/// Outcome of a syntax, compatibility or data check.
///
/// Non-empty `errors` implies `valid == false`; warnings never affect
/// validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Per-format well-formedness check, run before a submission becomes a
/// registration candidate. Pure and non-blocking.
pub trait SyntaxValidator: Send + Sync {
    fn check(&self, schema_type: SchemaType, content: &str) -> ValidationResult;
}

/// Structural validation of a payload against a stored schema. Pure and
/// non-blocking.
pub trait DataValidator: Send + Sync {
    fn validate(&self, schema: &Schema, payload: &serde_json::Value) -> ValidationResult;
}
