//! Static registry of the record types clients can submit.
//!
//! `/schema` serves the JSON schema of every entry. Adding a record type means
//! adding one descriptor to [`RECORD_TYPES`].

use serde_json::{Map, Value};
use utoipa::openapi::{RefOr, Schema};
use utoipa::ToSchema;

use crate::models::Lead;

/// Metadata of one submittable record type.
pub struct RecordDescriptor {
    /// Public model name, used as key in `/schema`.
    pub name: &'static str,
    /// Produces the field/constraint schema of the record.
    pub schema: fn() -> RefOr<Schema>,
}

fn schema_of<T: ToSchema<'static>>() -> RefOr<Schema> {
    T::schema().1
}

pub static RECORD_TYPES: &[RecordDescriptor] = &[RecordDescriptor {
    name: "Lead",
    schema: schema_of::<Lead>,
}];

/// Serializes every registered schema into `{name: json-schema}`.
///
/// A schema that fails to serialize is skipped and logged rather than failing
/// the whole listing.
pub fn model_schemas() -> Map<String, Value> {
    RECORD_TYPES
        .iter()
        .filter_map(|descriptor| match serde_json::to_value((descriptor.schema)()) {
            Ok(schema) => Some((descriptor.name.to_string(), schema)),
            Err(e) => {
                tracing::error!("Failed to serialize schema for {}: {}", descriptor.name, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lead_is_registered() {
        let names: Vec<&str> = RECORD_TYPES.iter().map(|d| d.name).collect();
        assert_eq!(names, ["Lead"]);
        assert_eq!(model_schemas().len(), 1);
    }

    #[test]
    fn lead_schema_lists_fields_and_required() {
        let models = model_schemas();
        let lead = &models["Lead"];
        let properties = lead["properties"].as_object().unwrap();
        for field in ["name", "email", "phone", "topic", "message"] {
            assert!(properties.contains_key(field), "missing {}", field);
        }
        let required: Vec<&str> = lead["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"name"));
        assert!(required.contains(&"email"));
        assert!(!required.contains(&"phone"));
    }
}
