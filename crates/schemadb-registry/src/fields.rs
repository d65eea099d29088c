//! Structural field extraction for compatibility and data checks.
//!
//! Compatibility is evaluated over a flat view of a schema's declared
//! fields with required/optional markers. Extraction is per-format:
//! JSON-Schema reads `properties` + `required`, Avro reads record
//! `fields` (required = no default and not nullable). Formats without an
//! extractor opt out of compatibility checking entirely.

use std::collections::BTreeMap;

use schemadb_types::SchemaType;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub ty: String,
    pub required: bool,
}

/// Declared fields keyed by name; `BTreeMap` so every traversal is in
/// lexicographic order and diagnostics come out deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    pub fields: BTreeMap<String, Field>,
}

/// Extract the field set for a schema body. `Ok(None)` means the format
/// has no extractor and compatibility checking is skipped for it.
pub fn extract(schema_type: SchemaType, content: &str) -> Result<Option<FieldSet>, String> {
    match schema_type {
        SchemaType::Json => extract_json(content).map(Some),
        SchemaType::Avro => extract_avro(content).map(Some),
        SchemaType::Protobuf => Ok(None),
    }
}

fn extract_json(content: &str) -> Result<FieldSet, String> {
    let root: Value =
        serde_json::from_str(content).map_err(|e| format!("schema is not valid JSON: {}", e))?;
    let object = root
        .as_object()
        .ok_or_else(|| "schema root must be a JSON object".to_string())?;

    let required: Vec<String> = object
        .get("required")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut fields = BTreeMap::new();
    if let Some(properties) = object.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            let ty = property
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("any")
                .to_string();
            fields.insert(
                name.clone(),
                Field {
                    ty,
                    required: required.iter().any(|r| r == name),
                },
            );
        }
    }
    // `required` entries without a property declaration still constrain
    // the data.
    for name in required {
        fields.entry(name).or_insert(Field {
            ty: "any".to_string(),
            required: true,
        });
    }

    Ok(FieldSet { fields })
}

fn extract_avro(content: &str) -> Result<FieldSet, String> {
    let root: Value =
        serde_json::from_str(content).map_err(|e| format!("schema is not valid JSON: {}", e))?;
    let object = root
        .as_object()
        .ok_or_else(|| "Avro schema root must be a JSON object".to_string())?;

    let mut fields = BTreeMap::new();
    if let Some(entries) = object.get("fields").and_then(Value::as_array) {
        for entry in entries {
            let field = entry
                .as_object()
                .ok_or_else(|| "Avro field entries must be objects".to_string())?;
            let name = field
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| "Avro field is missing a name".to_string())?;
            let (ty, nullable) = avro_field_type(field.get("type"));
            fields.insert(
                name.to_string(),
                Field {
                    ty,
                    required: !nullable && !field.contains_key("default"),
                },
            );
        }
    }

    Ok(FieldSet { fields })
}

fn avro_field_type(ty: Option<&Value>) -> (String, bool) {
    match ty {
        Some(Value::String(name)) => (name.clone(), false),
        // Union: nullable when "null" is a member; the declared type is
        // the first non-null member.
        Some(Value::Array(union)) => {
            let nullable = union.iter().any(|member| member.as_str() == Some("null"));
            let ty = union
                .iter()
                .filter_map(Value::as_str)
                .find(|member| *member != "null")
                .unwrap_or("union")
                .to_string();
            (ty, nullable)
        }
        Some(Value::Object(complex)) => (
            complex
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("record")
                .to_string(),
            false,
        ),
        _ => ("any".to_string(), false),
    }
}

/// Whether a reader declared as `reader` can read data written as
/// `writer`, per-format widening rules included.
pub fn can_read(schema_type: SchemaType, reader: &str, writer: &str) -> bool {
    if reader == writer || reader == "any" || writer == "any" {
        return true;
    }
    match schema_type {
        SchemaType::Json => matches!((reader, writer), ("number", "integer")),
        SchemaType::Avro => matches!(
            (reader, writer),
            ("long", "int")
                | ("float", "int")
                | ("float", "long")
                | ("double", "int")
                | ("double", "long")
                | ("double", "float")
        ),
        SchemaType::Protobuf => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_extraction_reads_properties_and_required() {
        let fields = extract(
            SchemaType::Json,
            r#"{"type":"object","required":["id"],"properties":{"id":{"type":"string"},"note":{"type":"string"}}}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(fields.fields["id"].ty, "string");
        assert!(fields.fields["id"].required);
        assert!(!fields.fields["note"].required);
    }

    #[test]
    fn json_required_without_property_is_kept() {
        let fields = extract(SchemaType::Json, r#"{"type":"object","required":["id"]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(fields.fields["id"].ty, "any");
        assert!(fields.fields["id"].required);
    }

    #[test]
    fn json_extraction_rejects_non_object_root() {
        let err = extract(SchemaType::Json, "[1,2,3]").unwrap_err();
        assert_eq!(err, "schema root must be a JSON object");
    }

    #[test]
    fn avro_extraction_reads_defaults_and_unions() {
        let fields = extract(
            SchemaType::Avro,
            r#"{"type":"record","name":"Order","fields":[
                {"name":"id","type":"string"},
                {"name":"note","type":["null","string"]},
                {"name":"qty","type":"int","default":1}
            ]}"#,
        )
        .unwrap()
        .unwrap();

        assert!(fields.fields["id"].required);
        assert_eq!(fields.fields["note"].ty, "string");
        assert!(!fields.fields["note"].required);
        assert!(!fields.fields["qty"].required);
    }

    #[test]
    fn protobuf_has_no_extractor() {
        assert_eq!(extract(SchemaType::Protobuf, "syntax = \"proto3\";"), Ok(None));
    }

    #[test]
    fn widening_rules_per_format() {
        assert!(can_read(SchemaType::Json, "number", "integer"));
        assert!(!can_read(SchemaType::Json, "integer", "number"));
        assert!(can_read(SchemaType::Avro, "long", "int"));
        assert!(can_read(SchemaType::Avro, "double", "float"));
        assert!(!can_read(SchemaType::Avro, "int", "long"));
        assert!(can_read(SchemaType::Json, "string", "string"));
    }
}
