//! Conversion between plain field values and their wire representation.
//!
//! Decoding never fails: a structured value without the expected key falls
//! back to `value`, and finally to the JSON rendering of the whole value.

use serde_json::{Map, Value, json};

use crate::record::FieldType;

/// Target type sent with entity references.
pub const WISSKI_INDIVIDUAL: &str = "wisski_individual";

/// Encodes a scalar for a field of type `field_type`. An absent type is
/// treated as an entity reference.
///
/// Entity references go out under `target_uri`; [`decode`] also accepts
/// `target_reference` and `target_id`.
pub fn encode(field_type: Option<&FieldType>, value: &str) -> Value {
    match field_type {
        None | Some(FieldType::EntityReference) => json!({
            "target_uri": value,
            "target_type": WISSKI_INDIVIDUAL,
        }),
        Some(FieldType::TextLong) => json!({
            "value": value,
            "format": "basic_html",
        }),
        Some(FieldType::Image) => json!({
            "target_id": value,
            "alt": null,
            "title": null,
            "target_type": "file",
        }),
        Some(FieldType::Link) => json!({
            "uri": value,
            "title": value,
            "options": [],
        }),
        Some(FieldType::String) | Some(FieldType::Other(_)) => json!({ "value": value }),
    }
}

/// Decodes a wire value of a field of type `field_type` back into a scalar.
pub fn decode(field_type: Option<&FieldType>, structured: &Value) -> String {
    let preferred: &[&str] = match field_type {
        None | Some(FieldType::EntityReference) => &["target_uri", "target_reference", "target_id"],
        Some(FieldType::Image) => &["target_id"],
        Some(FieldType::Link) => &["uri"],
        Some(FieldType::String) | Some(FieldType::TextLong) | Some(FieldType::Other(_)) => &[],
    };

    let Value::Object(map) = structured else {
        return render(structured);
    };

    preferred
        .iter()
        .chain(std::iter::once(&"value"))
        .find_map(|key| lookup(map, key))
        .unwrap_or_else(|| render(structured))
}

fn lookup(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        other => Some(render(other)),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
