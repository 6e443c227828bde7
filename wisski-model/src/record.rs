use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Parent id that places a path directly under the tree root.
pub const ROOT_ID: &str = "0";

/// One path of a pathbuilder: either a group (bundle boundary) or a field.
///
/// Records are decoded leniently from the remote representation, which
/// encodes booleans as `"1"`/`"0"` and may send ids as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    #[serde(deserialize_with = "flexible_string")]
    pub id: String,
    #[serde(
        rename = "parent",
        alias = "parent_id",
        default = "root_parent",
        deserialize_with = "flexible_string"
    )]
    pub parent_id: String,
    #[serde(rename = "bundle", alias = "bundle_id", deserialize_with = "flexible_string")]
    pub bundle_id: String,
    /// Equal to `bundle_id` when the record is the bundle itself.
    #[serde(rename = "field", alias = "field_id", deserialize_with = "flexible_string")]
    pub field_id: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_group: bool,
    #[serde(default = "enabled_by_default", deserialize_with = "flexible_bool")]
    pub enabled: bool,
    #[serde(
        rename = "fieldtype",
        alias = "field_type",
        default,
        deserialize_with = "optional_field_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_type: Option<FieldType>,
}

impl PathRecord {
    /// Shorthand for a group that denotes a bundle (`field_id == bundle_id`).
    pub fn group(id: &str, parent_id: &str, bundle_id: &str) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            bundle_id: bundle_id.into(),
            field_id: bundle_id.into(),
            is_group: true,
            enabled: true,
            field_type: None,
        }
    }

    /// Shorthand for a sub-group: a reference field `field_id` in the parent
    /// bundle whose targets are entities of `bundle_id`.
    pub fn sub_group(id: &str, parent_id: &str, field_id: &str, bundle_id: &str) -> Self {
        Self {
            field_id: field_id.into(),
            field_type: Some(FieldType::EntityReference),
            ..Self::group(id, parent_id, bundle_id)
        }
    }

    /// Shorthand for a leaf field of `bundle_id`.
    pub fn field(
        id: &str,
        parent_id: &str,
        bundle_id: &str,
        field_id: &str,
        field_type: FieldType,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            bundle_id: bundle_id.into(),
            field_id: field_id.into(),
            is_group: false,
            enabled: true,
            field_type: Some(field_type),
        }
    }

    /// Returns a copy with the `enabled` flag replaced.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// True if the record attaches directly under the root.
    pub fn has_root_parent(&self) -> bool {
        is_root_id(&self.parent_id)
    }

    /// True if values of this path are entities rather than scalars.
    pub fn holds_entities(&self) -> bool {
        self.is_group || matches!(self.field_type, None | Some(FieldType::EntityReference))
    }
}

/// True for the root sentinel, and for an empty parent id.
pub fn is_root_id(id: &str) -> bool {
    id.is_empty() || id == ROOT_ID
}

/// The type tag of a field, governing how its values are encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    TextLong,
    EntityReference,
    Image,
    Link,
    /// Any type outside the known vocabulary; encoded as a plain `{value}`.
    Other(String),
}

impl FieldType {
    /// The remote name of this type.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::TextLong => "text_long",
            FieldType::EntityReference => "entity_reference",
            FieldType::Image => "image",
            FieldType::Link => "link",
            FieldType::Other(name) => name,
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name {
            "string" => FieldType::String,
            "text_long" => FieldType::TextLong,
            "entity_reference" => FieldType::EntityReference,
            "image" => FieldType::Image,
            "link" => FieldType::Link,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FieldType::from(name.as_str()))
    }
}

fn root_parent() -> String {
    ROOT_ID.to_string()
}

fn enabled_by_default() -> bool {
    true
}

fn flexible_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(s) => Ok(matches!(s.trim(), "1" | "true" | "TRUE" | "True")),
        Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected boolean flag, got {other}"
        ))),
    }
}

fn optional_field_type<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<FieldType>, D::Error> {
    let name: Option<String> = Option::deserialize(deserializer)?;
    Ok(name
        .filter(|n| !n.trim().is_empty())
        .map(|n| FieldType::from(n.as_str())))
}
