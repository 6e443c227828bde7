use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use crate::codec;
use crate::error::{ModelError, ModelResult};
use crate::persist::EntityPersister;
use crate::tree::{PathTree, TreeNode};

/// Target type of the bundle marker.
pub const WISSKI_BUNDLE: &str = "wisski_bundle";
/// Wire key holding the bundle marker.
pub const BUNDLE_KEY: &str = "bundle";
/// Wire key holding the entity URI.
pub const URI_KEY: &str = "wisski_uri";
/// Wire key wrapping a nested entity inside a field value.
pub const ENTITY_KEY: &str = "entity";

/// One value of an entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    /// A sub-entity, exclusively owned by the parent.
    Entity(Entity),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            FieldValue::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            FieldValue::Entity(e) => Some(e),
            FieldValue::Scalar(_) => None,
        }
    }

    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            FieldValue::Entity(e) => Some(e),
            FieldValue::Scalar(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<Entity> for FieldValue {
    fn from(entity: Entity) -> Self {
        FieldValue::Entity(entity)
    }
}

/// An instance of a bundle, possibly holding nested entities.
///
/// The entity does not own its schema: every schema-aware operation takes
/// the [`PathTree`] it should be interpreted against.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    pub bundle_id: String,
    /// `None` until the entity has been persisted.
    pub uri: Option<String>,
    pub fields: IndexMap<String, Vec<FieldValue>>,
    /// Wire fields with no path in the loaded schema, kept verbatim.
    pub unused_fields: Map<String, Value>,
    fingerprint: Option<String>,
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.bundle_id == other.bundle_id
            && self.uri == other.uri
            && self.fields == other.fields
            && self.unused_fields == other.unused_fields
    }
}

impl Entity {
    pub fn new(bundle_id: &str) -> Self {
        Self {
            bundle_id: bundle_id.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: &str) -> Self {
        self.uri = Some(uri.to_string());
        self
    }

    #[must_use]
    pub fn with_field<V: Into<FieldValue>>(
        mut self,
        field_id: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.set_field(field_id, values);
        self
    }

    /// Replaces all values of a field.
    pub fn set_field<V: Into<FieldValue>>(
        &mut self,
        field_id: &str,
        values: impl IntoIterator<Item = V>,
    ) {
        self.fields
            .insert(field_id.to_string(), values.into_iter().map(Into::into).collect());
    }

    /// Appends one value to a field.
    pub fn push_value(&mut self, field_id: &str, value: impl Into<FieldValue>) {
        self.fields
            .entry(field_id.to_string())
            .or_default()
            .push(value.into());
    }

    pub fn field(&self, field_id: &str) -> Option<&[FieldValue]> {
        self.fields.get(field_id).map(Vec::as_slice)
    }

    /// Scalar values of a field; sub-entities are skipped.
    pub fn scalars(&self, field_id: &str) -> Vec<&str> {
        self.field(field_id)
            .unwrap_or_default()
            .iter()
            .filter_map(FieldValue::as_scalar)
            .collect()
    }

    /// Sub-entities of a field; scalars are skipped.
    pub fn sub_entities(&self, field_id: &str) -> Vec<&Entity> {
        self.field(field_id)
            .unwrap_or_default()
            .iter()
            .filter_map(FieldValue::as_entity)
            .collect()
    }

    /// True if no field holds a value. A sub-entity only counts as a value
    /// when it is not empty itself.
    pub fn is_empty(&self) -> bool {
        self.fields.values().flatten().all(|value| match value {
            FieldValue::Scalar(_) => false,
            FieldValue::Entity(child) => child.is_empty(),
        })
    }

    /// Builds an entity of `bundle_id` from a flat `field_id -> values` map.
    ///
    /// Every sub-bundle of the schema becomes a nested entity filled from the
    /// same map; fields without a value get an empty list.
    pub fn build(
        tree: &PathTree,
        bundle_id: &str,
        values: &IndexMap<String, Vec<String>>,
        uri: Option<String>,
    ) -> ModelResult<Self> {
        let node = tree.get_subtree_for_field_id(bundle_id)?;
        let mut entity = Entity::new(bundle_id);
        entity.uri = uri;
        entity.fill_from(tree, node, values);
        Ok(entity)
    }

    fn fill_from(&mut self, tree: &PathTree, node: &TreeNode, values: &IndexMap<String, Vec<String>>) {
        for path in tree.children(node) {
            if path.is_group {
                let mut child = Entity::new(&path.bundle_id);
                if let Some(child_node) = tree.node(&path.id) {
                    child.fill_from(tree, child_node, values);
                }
                self.push_value(&path.field_id, child);
                continue;
            }
            let field_values = values
                .get(&path.field_id)
                .map(|vs| vs.iter().cloned().map(FieldValue::Scalar).collect())
                .unwrap_or_default();
            self.fields.insert(path.field_id.clone(), field_values);
        }
    }

    /// Serializes this entity and its sub-entities into the wire format.
    ///
    /// Empty sub-entities are left out, and unused fields are merged back in
    /// unchanged.
    pub fn serialize(&self, tree: &PathTree) -> ModelResult<Value> {
        let bundle = tree.get_subtree_for_field_id(&self.bundle_id)?;

        let mut wire = Map::new();
        wire.insert(
            BUNDLE_KEY.to_string(),
            json!([{ "target_id": self.bundle_id, "target_type": WISSKI_BUNDLE }]),
        );
        if let Some(uri) = &self.uri {
            wire.insert(URI_KEY.to_string(), json!([{ "value": uri }]));
        }

        for path in tree.children(bundle) {
            let Some(values) = self.fields.get(&path.field_id) else {
                continue;
            };
            let mut field_data = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    FieldValue::Entity(child) if path.holds_entities() => {
                        if child.is_empty() {
                            continue;
                        }
                        let mut wrapped = Map::new();
                        wrapped.insert(ENTITY_KEY.to_string(), child.serialize(tree)?);
                        field_data.push(Value::Object(wrapped));
                    }
                    FieldValue::Entity(_) => {
                        return Err(ModelError::SchemaTypeMismatch {
                            field_id: path.field_id.clone(),
                            expected: "a scalar value".to_string(),
                        });
                    }
                    FieldValue::Scalar(s) => {
                        field_data.push(codec::encode(path.field_type.as_ref(), s));
                    }
                }
            }
            if !field_data.is_empty() {
                wire.insert(path.field_id.clone(), Value::Array(field_data));
            }
        }

        for (key, raw) in &self.unused_fields {
            wire.entry(key.clone()).or_insert_with(|| raw.clone());
        }

        Ok(Value::Object(wire))
    }

    /// Creates an entity from wire data. See [`Entity::load`].
    pub fn from_wire(tree: &PathTree, wire: &Value, modified: bool) -> ModelResult<Self> {
        let mut entity = Entity::default();
        entity.load(tree, wire, modified)?;
        Ok(entity)
    }

    /// Replaces this entity's content with wire data.
    ///
    /// Fields without a path in `tree` go to `unused_fields`. With
    /// `modified == false` the loaded state is recorded as persisted.
    pub fn load(&mut self, tree: &PathTree, wire: &Value, modified: bool) -> ModelResult<&mut Self> {
        let Value::Object(map) = wire else {
            return Err(ModelError::InvalidWireData(format!(
                "entity must be a JSON object, got {wire}"
            )));
        };

        let mut bundle_id = None;
        let mut uri = None;
        let mut fields = IndexMap::new();
        let mut unused = Map::new();

        for (key, raw) in map {
            match key.as_str() {
                BUNDLE_KEY => bundle_id = first_str(raw, "target_id"),
                URI_KEY => uri = first_str(raw, "value"),
                _ => {
                    let Some(path) = tree.get_path_for_id(key) else {
                        unused.insert(key.clone(), raw.clone());
                        continue;
                    };
                    let mut values = Vec::new();
                    for item in items(raw) {
                        match item.get(ENTITY_KEY) {
                            Some(nested) if nested.is_object() => {
                                values.push(FieldValue::Entity(Entity::from_wire(tree, nested, modified)?));
                            }
                            _ => values.push(FieldValue::Scalar(codec::decode(path.field_type.as_ref(), item))),
                        }
                    }
                    if !values.is_empty() {
                        fields.insert(key.clone(), values);
                    }
                }
            }
        }

        match bundle_id {
            Some(bundle_id) => self.bundle_id = bundle_id,
            None if self.bundle_id.is_empty() => {
                return Err(ModelError::InvalidWireData(format!(
                    "entity has no `{BUNDLE_KEY}` marker"
                )));
            }
            None => {}
        }
        if uri.is_some() {
            self.uri = uri;
        }

        order_by_schema(tree, &self.bundle_id, &mut fields);
        self.fields = fields;
        self.unused_fields = unused;

        if !modified {
            self.mark_saved(tree)?;
        }
        Ok(self)
    }

    /// Stable digest of the current serialization.
    pub fn fingerprint(&self, tree: &PathTree) -> ModelResult<String> {
        let wire = self.serialize(tree)?;
        let digest = Sha256::digest(canonical_json(&wire).as_bytes());
        Ok(hex::encode(digest))
    }

    /// Records the current state as the persisted one.
    pub fn mark_saved(&mut self, tree: &PathTree) -> ModelResult<()> {
        self.fingerprint = Some(self.fingerprint(tree)?);
        Ok(())
    }

    /// True if the entity was never persisted or changed since.
    pub fn is_modified(&self, tree: &PathTree) -> bool {
        match &self.fingerprint {
            None => true,
            Some(saved) => self.fingerprint(tree).map_or(true, |current| &current != saved),
        }
    }

    /// Hands the entity to `persister` unless it is unchanged and `force` is
    /// false. Returns whether a save was attempted.
    ///
    /// Refreshing the persisted state is up to the persister, which knows the
    /// server-confirmed representation.
    pub fn save<P>(&mut self, persister: &P, force: bool) -> Result<bool, P::Error>
    where
        P: EntityPersister + ?Sized,
    {
        if !force && !self.is_modified(persister.tree()) {
            return Ok(false);
        }
        persister.persist(std::slice::from_mut(self), true)?;
        Ok(true)
    }

    /// All scalar values of this entity and its sub-entities, keyed by field.
    pub fn flatten_values(&self) -> IndexMap<String, Vec<String>> {
        let mut flat = IndexMap::new();
        self.collect_values(&mut flat);
        flat
    }

    fn collect_values(&self, flat: &mut IndexMap<String, Vec<String>>) {
        for (field_id, values) in &self.fields {
            for value in values {
                match value {
                    FieldValue::Scalar(s) => flat.entry(field_id.clone()).or_default().push(s.clone()),
                    FieldValue::Entity(child) => child.collect_values(flat),
                }
            }
        }
    }
}

fn items(raw: &Value) -> Vec<&Value> {
    match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn first_str(raw: &Value, key: &str) -> Option<String> {
    items(raw)
        .first()
        .and_then(|item| item.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn order_by_schema(tree: &PathTree, bundle_id: &str, fields: &mut IndexMap<String, Vec<FieldValue>>) {
    let Ok(schema_fields) = tree.bundle_fields(bundle_id) else {
        return;
    };
    let position: HashMap<&str, usize> = schema_fields
        .iter()
        .enumerate()
        .map(|(i, path)| (path.field_id.as_str(), i))
        .collect();
    let rank = |field_id: &str| position.get(field_id).copied().unwrap_or(usize::MAX);
    fields.sort_by(|a, _, b, _| rank(a).cmp(&rank(b)));
}

/// JSON text with object keys sorted at every level.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body = entries
                .into_iter()
                .map(|(key, v)| format!("{}:{}", Value::String(key.clone()), canonical_json(v)))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{body}}}")
        }
        Value::Array(items) => {
            let body = items.iter().map(canonical_json).collect::<Vec<_>>().join(",");
            format!("[{body}]")
        }
        other => other.to_string(),
    }
}
