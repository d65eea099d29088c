//! Schema compatibility checking.
//!
//! Pure function of (policy, previous schema, candidate schema). The
//! engine diffs the declared field sets of both schemas; it owns no
//! state and performs no I/O.

use schemadb_types::{CompatibilityLevel, NewSchema, Schema, SchemaType, ValidationResult};

use crate::fields::{can_read, extract, FieldSet};

pub struct CompatibilityEngine;

impl CompatibilityEngine {
    /// Decide whether `candidate` is admissible after `previous` under
    /// `policy`.
    ///
    /// A `NONE` policy or a first version is always valid. A format
    /// without field extraction yields a single warning and validity
    /// `true`. Error output is sorted and deduplicated, so the same
    /// input pair always produces byte-identical diagnostics.
    pub fn check(
        policy: CompatibilityLevel,
        previous: Option<&Schema>,
        candidate: &NewSchema,
    ) -> ValidationResult {
        if policy == CompatibilityLevel::None {
            return ValidationResult::ok();
        }
        let Some(previous) = previous else {
            return ValidationResult::ok();
        };

        if previous.schema_type != candidate.schema_type {
            return ValidationResult::invalid(vec![format!(
                "schema type changed from {} to {}",
                previous.schema_type, candidate.schema_type
            )]);
        }

        let previous_fields = match extract(previous.schema_type, &previous.content) {
            Ok(fields) => fields,
            Err(err) => {
                return ValidationResult::invalid(vec![format!(
                    "previous schema (version {}): {}",
                    previous.version, err
                )])
            }
        };
        let candidate_fields = match extract(candidate.schema_type, &candidate.content) {
            Ok(fields) => fields,
            Err(err) => {
                return ValidationResult::invalid(vec![format!("candidate schema: {}", err)])
            }
        };

        let mut result = ValidationResult::ok();
        let (Some(previous_fields), Some(candidate_fields)) = (previous_fields, candidate_fields)
        else {
            result.push_warning(format!(
                "compatibility check unsupported for type {}",
                candidate.schema_type
            ));
            return result;
        };

        let format = candidate.schema_type;
        let mut errors = match policy {
            CompatibilityLevel::Backward => {
                backward_errors(&previous_fields, &candidate_fields, format)
            }
            CompatibilityLevel::Forward => {
                forward_errors(&previous_fields, &candidate_fields, format)
            }
            CompatibilityLevel::Full => {
                let mut errors = backward_errors(&previous_fields, &candidate_fields, format);
                errors.extend(forward_errors(&previous_fields, &candidate_fields, format));
                errors
            }
            CompatibilityLevel::None => Vec::new(),
        };
        errors.sort();
        errors.dedup();
        for error in errors {
            result.push_error(error);
        }
        result
    }
}

/// BACKWARD: the candidate must be able to read data written under the
/// previous schema. The candidate may add optional fields and drop
/// fields that were optional, but may not add a required field, remove
/// or demand a field the old data may lack, or narrow a field's type.
fn backward_errors(previous: &FieldSet, candidate: &FieldSet, format: SchemaType) -> Vec<String> {
    let mut errors = Vec::new();
    for (name, old) in &previous.fields {
        match candidate.fields.get(name) {
            None => {
                if old.required {
                    errors.push(format!("field '{}': required field removed", name));
                }
            }
            Some(new) => {
                if new.required && !old.required {
                    errors.push(format!("field '{}': optional field became required", name));
                }
                if !can_read(format, &new.ty, &old.ty) {
                    errors.push(format!(
                        "field '{}': type changed from '{}' to '{}'",
                        name, old.ty, new.ty
                    ));
                }
            }
        }
    }
    for (name, new) in &candidate.fields {
        if new.required && !previous.fields.contains_key(name) {
            errors.push(format!("field '{}': required field added", name));
        }
    }
    errors
}

/// FORWARD: the previous schema must be able to read data produced under
/// the candidate. The candidate may not drop or demote a field the
/// previous schema requires, nor produce a type it cannot read.
fn forward_errors(previous: &FieldSet, candidate: &FieldSet, format: SchemaType) -> Vec<String> {
    let mut errors = Vec::new();
    for (name, old) in &previous.fields {
        match candidate.fields.get(name) {
            None => {
                if old.required {
                    errors.push(format!("field '{}': required field removed", name));
                }
            }
            Some(new) => {
                if old.required && !new.required {
                    errors.push(format!("field '{}': required field became optional", name));
                }
                if !can_read(format, &old.ty, &new.ty) {
                    errors.push(format!(
                        "field '{}': type changed from '{}' to '{}'",
                        name, old.ty, new.ty
                    ));
                }
            }
        }
    }
    errors
}
