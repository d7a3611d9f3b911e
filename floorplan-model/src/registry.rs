//! Class-tag registry.
//!
//! Maps each [`ClassTag`] to its [`EntityClass`]. The registry is populated
//! once at startup and shared read-only (behind an `Arc`) by every document.

use crate::class::EntityClass;
use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use floorplan_types::{ClassTag, EntityId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Registry of entity classes, keyed by class tag.
#[derive(Clone, Default)]
pub struct EntityRegistry {
    classes: HashMap<ClassTag, Arc<dyn EntityClass>>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class under its own tag.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateClass` if the tag is already registered.
    pub fn register(&mut self, class: impl EntityClass + 'static) -> ModelResult<()> {
        self.register_arc(Arc::new(class))
    }

    /// Registers a shared class instance.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateClass` if the tag is already registered.
    pub fn register_arc(&mut self, class: Arc<dyn EntityClass>) -> ModelResult<()> {
        let tag = class.tag().clone();
        if self.classes.contains_key(&tag) {
            return Err(ModelError::DuplicateClass(tag));
        }
        debug!(class_tag = %tag, fields = class.fields().len(), "Registered entity class");
        self.classes.insert(tag, class);
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, tag: &str) -> bool {
        self.classes.contains_key(tag)
    }

    /// Looks up the class registered under `tag`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if nothing is registered under the tag.
    pub fn class(&self, tag: &str) -> ModelResult<Arc<dyn EntityClass>> {
        self.classes
            .get(tag)
            .cloned()
            .ok_or_else(|| ModelError::UnknownEntityType(tag.to_string()))
    }

    /// Constructs a new, unattached entity of the given class.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if nothing is registered under the tag.
    pub fn create(&self, tag: &str) -> ModelResult<Entity> {
        self.create_with_id(tag, EntityId::new())
    }

    /// Constructs a new, unattached entity with a given id (used when loading).
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if nothing is registered under the tag.
    pub fn create_with_id(&self, tag: &str, id: EntityId) -> ModelResult<Entity> {
        let class = self.class(tag)?;
        Ok(Entity::new(id, class.tag().clone()))
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&ClassTag> {
        let mut tags: Vec<_> = self.classes.keys().collect();
        tags.sort();
        tags
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("classes", &self.tags())
            .finish()
    }
}
