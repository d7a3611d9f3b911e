//! Serialized record shapes.

use crate::state::{DEFAULT_STATE_NAME, StateField};
use floorplan_types::{ClassTag, EntityFlags, EntityId, StateId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// Dumped form of one entity.
///
/// Field entries are flattened next to the fixed keys. Keys this version
/// does not know are kept in `fields` and ignored by load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub class_tag: ClassTag,
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "EntityFlags::is_empty")]
    pub flags: EntityFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EntityRecord {
    #[must_use]
    pub fn new(class_tag: ClassTag, id: EntityId) -> Self {
        Self {
            class_tag,
            id,
            flags: EntityFlags::empty(),
            parent: None,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The StateField id a state-backed field references, if it is a
    /// well-formed reference.
    #[must_use]
    pub fn state_ref(&self, name: &str) -> Option<StateId> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .and_then(|s| StateId::parse(s).ok())
    }
}

/// Dumped form of one StateField.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    pub id: StateId,
    #[serde(default)]
    pub value: Value,
    #[serde(default = "default_state_name", skip_serializing_if = "is_default_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub local_id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_editable: bool,
}

impl StateRecord {
    /// Captures a StateField's persisted attributes.
    #[must_use]
    pub fn from_state(state: &StateField) -> Self {
        Self {
            id: state.id(),
            value: state.value().clone(),
            name: state.name().to_string(),
            local_id: state.local_id().to_string(),
            is_editable: state.is_editable(),
        }
    }

    /// Rebuilds an unbound StateField under `id`.
    #[must_use]
    pub fn to_state(&self, id: StateId) -> StateField {
        StateField::with_id(id, self.value.clone())
            .with_name(self.name.clone())
            .with_local_id(self.local_id.clone())
            .editable(self.is_editable)
    }
}

fn default_state_name() -> String {
    DEFAULT_STATE_NAME.to_string()
}

fn is_default_name(name: &str) -> bool {
    name == DEFAULT_STATE_NAME
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

/// Dumped form of a whole document.
///
/// Entities and states are kept as raw JSON so that one malformed record
/// does not prevent the rest from loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub version: u32,
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default)]
    pub states: Vec<Value>,
}

impl Default for DocumentRecord {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            entities: Vec::new(),
            states: Vec::new(),
        }
    }
}
