//! Built-in per-format syntax checks.

use schemadb_types::{SchemaType, SyntaxValidator, ValidationResult};
use serde_json::Value;

/// Well-formedness checks for the supported formats: JSON must parse,
/// Avro must parse and declare a `type`, Protobuf must declare a syntax
/// version and contain at least one message.
pub struct BuiltinSyntaxValidator;

impl SyntaxValidator for BuiltinSyntaxValidator {
    fn check(&self, schema_type: SchemaType, content: &str) -> ValidationResult {
        let mut result = ValidationResult::ok();
        match schema_type {
            SchemaType::Json => {
                if let Err(err) = serde_json::from_str::<Value>(content) {
                    result.push_error(format!("JSON schema validation failed: {}", err));
                }
            }
            SchemaType::Avro => match serde_json::from_str::<Value>(content) {
                Err(err) => {
                    result.push_error(format!("Avro schema validation failed: {}", err));
                }
                Ok(value) => {
                    if value.get("type").is_none() {
                        result.push_error(
                            "Avro schema validation failed: schema must have a 'type' field",
                        );
                    }
                }
            },
            SchemaType::Protobuf => {
                if !content.contains("syntax") {
                    result.push_error(
                        "Protobuf schema validation failed: schema must specify a syntax version",
                    );
                }
                if !content.contains("message") {
                    result.push_error(
                        "Protobuf schema validation failed: schema must contain at least one message",
                    );
                }
            }
        }
        result
    }
}
