//! Input schemas for tools.
//!
//! Each tool declares its input as a Rust struct deriving `JsonSchema`. The
//! generated schema is what the model sees, and raw model arguments are
//! checked against it before being decoded into the struct.

use crate::error::ToolError;
use schemars::gen::SchemaGenerator;
use schemars::schema::{
    InstanceType, Metadata, NumberValidation, RootSchema, Schema, SchemaObject, SingleOrVec,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON Schema for a tool input type.
pub fn input_schema<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null);
    if let Some(obj) = schema.as_object_mut() {
        // Tool declarations only need the object schema itself.
        obj.remove("$schema");
        obj.remove("title");
    }
    schema
}

/// Schema for a latitude in decimal degrees.
pub fn latitude(_: &mut SchemaGenerator) -> Schema {
    bounded_number("Latitude in decimal degrees", -90.0, 90.0)
}

/// Schema for a longitude in decimal degrees.
pub fn longitude(_: &mut SchemaGenerator) -> Schema {
    bounded_number("Longitude in decimal degrees", -180.0, 180.0)
}

fn bounded_number(description: &str, minimum: f64, maximum: f64) -> Schema {
    SchemaObject {
        metadata: Some(Box::new(Metadata {
            description: Some(description.to_string()),
            ..Default::default()
        })),
        instance_type: Some(InstanceType::Number.into()),
        number: Some(Box::new(NumberValidation {
            minimum: Some(minimum),
            maximum: Some(maximum),
            ..Default::default()
        })),
        ..Default::default()
    }
    .into()
}

/// Validate raw arguments against `T`'s schema, then decode them.
///
/// Reports every offending field at once: missing required properties, wrong
/// JSON types and numbers outside declared bounds.
pub fn validate_input<T>(tool: &str, raw: Value) -> Result<T, ToolError>
where
    T: JsonSchema + DeserializeOwned,
{
    let root: RootSchema = schemars::schema_for!(T);
    let mut problems: Vec<(String, String)> = Vec::new();

    match raw.as_object() {
        Some(args) => {
            if let Some(object) = root.schema.object.as_deref() {
                for name in &object.required {
                    if args.get(name).map_or(true, Value::is_null) {
                        problems.push((name.clone(), "is required".to_string()));
                    }
                }
                for (name, property) in &object.properties {
                    if problems.iter().any(|(field, _)| field == name) {
                        continue;
                    }
                    let (Some(value), Schema::Object(property)) = (args.get(name), property) else {
                        continue;
                    };
                    if let Some(problem) = check_property(property, value) {
                        problems.push((name.clone(), problem));
                    }
                }
            }
        }
        None => problems.push((
            "<input>".to_string(),
            format!("expected an object, got {}", json_type_name(&raw)),
        )),
    }

    if !problems.is_empty() {
        let message = problems
            .iter()
            .map(|(field, problem)| format!("{} {}", field, problem))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ToolError::Validation {
            tool: tool.to_string(),
            fields: problems.into_iter().map(|(field, _)| field).collect(),
            message,
        });
    }

    serde_json::from_value(raw).map_err(|e| ToolError::Validation {
        tool: tool.to_string(),
        fields: Vec::new(),
        message: e.to_string(),
    })
}

fn check_property(schema: &SchemaObject, value: &Value) -> Option<String> {
    if let Some(instance_type) = &schema.instance_type {
        let allowed: Vec<InstanceType> = match instance_type {
            SingleOrVec::Single(ty) => vec![**ty],
            SingleOrVec::Vec(types) => types.clone(),
        };
        if !allowed.iter().any(|ty| matches_type(ty, value)) {
            let expected = allowed
                .iter()
                .map(instance_type_name)
                .collect::<Vec<_>>()
                .join(" or ");
            return Some(format!(
                "expected {}, got {}",
                expected,
                json_type_name(value)
            ));
        }
    }

    if let (Some(bounds), Some(n)) = (schema.number.as_deref(), value.as_f64()) {
        if let Some(min) = bounds.minimum {
            if n < min {
                return Some(format!("must be at least {}", min));
            }
        }
        if let Some(max) = bounds.maximum {
            if n > max {
                return Some(format!("must be at most {}", max));
            }
        }
    }

    if let (Some(bounds), Some(s)) = (schema.string.as_deref(), value.as_str()) {
        if let Some(min) = bounds.min_length {
            if (s.chars().count() as u32) < min {
                return Some(format!("must be at least {} characters", min));
            }
        }
    }

    None
}

fn matches_type(ty: &InstanceType, value: &Value) -> bool {
    match ty {
        InstanceType::Null => value.is_null(),
        InstanceType::Boolean => value.is_boolean(),
        InstanceType::Object => value.is_object(),
        InstanceType::Array => value.is_array(),
        InstanceType::Number => value.is_number(),
        InstanceType::String => value.is_string(),
        InstanceType::Integer => value.is_i64() || value.is_u64(),
    }
}

fn instance_type_name(ty: &InstanceType) -> &'static str {
    match ty {
        InstanceType::Null => "null",
        InstanceType::Boolean => "boolean",
        InstanceType::Object => "object",
        InstanceType::Array => "array",
        InstanceType::Number => "number",
        InstanceType::String => "string",
        InstanceType::Integer => "integer",
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Point {
        #[schemars(schema_with = "latitude")]
        lat: f64,
        lon: f64,
        label: Option<String>,
    }

    #[test]
    fn test_schema_shape() {
        let schema = input_schema::<Point>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["lat"]["type"], "number");
        assert!(schema.get("$schema").is_none());
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("lat")));
        assert!(!required.contains(&json!("label")));
    }

    #[test]
    fn test_valid_input_decodes() {
        let point: Point = validate_input("t", json!({"lat": 35.68, "lon": 139.76})).unwrap();
        assert_eq!(point.lat, 35.68);
        assert!(point.label.is_none());
    }

    #[test]
    fn test_reports_all_bad_fields() {
        let err = validate_input::<Point>("t", json!({"lat": "north"})).unwrap_err();
        match err {
            ToolError::Validation { fields, message, .. } => {
                assert!(fields.contains(&"lat".to_string()));
                assert!(fields.contains(&"lon".to_string()));
                assert!(message.contains("lat expected number, got string"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range() {
        let err = validate_input::<Point>("t", json!({"lat": 120.0, "lon": 0.0})).unwrap_err();
        assert!(err.to_string().contains("lat must be at most 90"));
    }

    #[test]
    fn test_non_object_input() {
        let err = validate_input::<Point>("t", json!("35.6,139.7")).unwrap_err();
        match err {
            ToolError::Validation { fields, .. } => assert_eq!(fields, vec!["<input>".to_string()]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
