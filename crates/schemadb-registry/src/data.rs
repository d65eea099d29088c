//! Built-in payload validation against stored schemas.

use schemadb_types::{DataValidator, Schema, SchemaType, ValidationResult};
use serde_json::Value;

use crate::fields;

/// Structural JSON payload checks: the payload must be an object, carry
/// every required field, and match the declared primitive types. Other
/// schema formats produce a warning rather than a failure.
pub struct JsonDataValidator;

impl DataValidator for JsonDataValidator {
    fn validate(&self, schema: &Schema, payload: &Value) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if schema.schema_type != SchemaType::Json {
            result.push_warning(format!(
                "data validation unsupported for type {}",
                schema.schema_type
            ));
            return result;
        }

        let field_set = match fields::extract(SchemaType::Json, &schema.content) {
            Ok(Some(field_set)) => field_set,
            Ok(None) => return result,
            Err(err) => {
                result.push_error(format!("stored schema is not checkable: {}", err));
                return result;
            }
        };

        let Some(object) = payload.as_object() else {
            result.push_error("payload must be a JSON object");
            return result;
        };

        for (name, field) in &field_set.fields {
            match object.get(name) {
                None => {
                    if field.required {
                        result.push_error(format!("field '{}': required field is missing", name));
                    }
                }
                Some(value) => {
                    if !value_matches(&field.ty, value) {
                        result.push_error(format!(
                            "field '{}': value does not match declared type '{}'",
                            name, field.ty
                        ));
                    }
                }
            }
        }
        result
    }
}

fn value_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn schema(schema_type: SchemaType, content: &str) -> Schema {
        Schema {
            id: "s".to_string(),
            subject: "orders".to_string(),
            version: 1,
            schema_type,
            content: content.to_string(),
            references: Vec::new(),
            metadata: BTreeMap::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    const ORDER: &str = r#"{"type":"object","required":["id"],"properties":{"id":{"type":"string"},"qty":{"type":"integer"}}}"#;

    #[test]
    fn accepts_conforming_payload() {
        let result =
            JsonDataValidator.validate(&schema(SchemaType::Json, ORDER), &json!({"id":"a","qty":2}));
        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn reports_missing_required_and_type_mismatch_together() {
        let result =
            JsonDataValidator.validate(&schema(SchemaType::Json, ORDER), &json!({"qty":"two"}));
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "field 'id': required field is missing",
                "field 'qty': value does not match declared type 'integer'"
            ]
        );
    }

    #[test]
    fn rejects_non_object_payload() {
        let result = JsonDataValidator.validate(&schema(SchemaType::Json, ORDER), &json!([1, 2]));
        assert_eq!(result.errors, vec!["payload must be a JSON object"]);
    }

    #[test]
    fn non_json_schema_is_a_warning() {
        let avro = schema(
            SchemaType::Avro,
            r#"{"type":"record","name":"A","fields":[]}"#,
        );
        let result = JsonDataValidator.validate(&avro, &json!({}));
        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec!["data validation unsupported for type AVRO"]
        );
    }
}
