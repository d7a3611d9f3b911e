use super::{existing, live, parse_args, types};
use crate::error::{TxnError, TxnResult};
use crate::request::Request;
use floorplan_model::Document;
use floorplan_types::{ClassTag, EntityId, RequestType};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Creates an entity. Undo marks it removed; redo resurrects it.
pub struct CreateEntityRequest {
    class_tag: ClassTag,
    values: Map<String, Value>,
    parent: Option<EntityId>,
    created: Option<EntityId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArgs {
    class_tag: ClassTag,
    #[serde(default)]
    values: Map<String, Value>,
    #[serde(default)]
    parent: Option<EntityId>,
}

impl CreateEntityRequest {
    #[must_use]
    pub fn new(class_tag: ClassTag) -> Self {
        Self {
            class_tag,
            values: Map::new(),
            parent: None,
            created: None,
        }
    }

    #[must_use]
    pub fn with_values(mut self, values: Map<String, Value>) -> Self {
        self.values = values;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds the request from `{"classTag", "values"?, "parent"?}`.
    pub fn from_args(args: &Value) -> TxnResult<Self> {
        let args: CreateArgs = parse_args(types::CREATE_ENTITY, args)?;
        Ok(Self {
            class_tag: args.class_tag,
            values: args.values,
            parent: args.parent,
            created: None,
        })
    }

    /// Id of the created entity, once committed.
    #[must_use]
    pub fn created(&self) -> Option<EntityId> {
        self.created
    }
}

impl Request for CreateEntityRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static(types::CREATE_ENTITY)
    }

    fn description(&self) -> String {
        format!("Create {}", self.class_tag)
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(parent) = self.parent {
            live(doc, parent)?;
        }
        let id = doc.create_entity_with(self.class_tag.as_str(), &self.values, self.parent)?;
        debug!(entity = %id, class_tag = %self.class_tag, "Created entity");
        self.created = Some(id);
        Ok(())
    }

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(id) = self.created {
            doc.mark_removed(id)?;
        }
        Ok(())
    }

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(id) = self.created {
            doc.resurrect(id)?;
        }
        Ok(())
    }
}

/// Marks an entity and its live descendants removed.
pub struct RemoveEntityRequest {
    entity: EntityId,
    removed: Vec<EntityId>,
}

#[derive(Deserialize)]
struct RemoveArgs {
    entity: EntityId,
}

impl RemoveEntityRequest {
    #[must_use]
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            removed: Vec::new(),
        }
    }

    /// Builds the request from `{"entity"}`.
    pub fn from_args(args: &Value) -> TxnResult<Self> {
        let args: RemoveArgs = parse_args(types::REMOVE_ENTITY, args)?;
        Ok(Self::new(args.entity))
    }

    /// Every entity this request removed, target first.
    #[must_use]
    pub fn removed(&self) -> &[EntityId] {
        &self.removed
    }
}

impl Request for RemoveEntityRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static(types::REMOVE_ENTITY)
    }

    fn description(&self) -> String {
        format!("Remove {}", self.entity)
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        if existing(doc, self.entity)?.is_removed() {
            return Err(TxnError::PreconditionFailed {
                entity: self.entity,
                reason: "entity is already removed".to_string(),
            });
        }
        let mut removed = vec![self.entity];
        removed.extend(
            doc.descendants(self.entity)
                .into_iter()
                .filter(|id| doc.entity(*id).is_some_and(|e| !e.is_removed())),
        );
        for id in &removed {
            doc.mark_removed(*id)?;
        }
        debug!(entity = %self.entity, cascade = removed.len() - 1, "Removed entity");
        self.removed = removed;
        Ok(())
    }

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        for id in self.removed.iter().rev() {
            doc.resurrect(*id)?;
        }
        Ok(())
    }

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        for id in &self.removed {
            doc.mark_removed(*id)?;
        }
        Ok(())
    }
}
