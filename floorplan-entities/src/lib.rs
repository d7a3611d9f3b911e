//! Concrete entity kinds built on the floorplan model.
//!
//! Each kind is a thin [`EntityClass`](floorplan_model::EntityClass): a field
//! table plus whatever verification or dirty mapping it adds. Content kinds
//! form a chain (`Content` -> `PBox` -> `Molding`) whose dumps and loads walk
//! the parent tables first.

mod chain;
pub mod content;
pub mod layer;
pub mod molding;
pub mod pbox;
pub mod spotlight;

pub use chain::FieldChain;
pub use content::ContentClass;
pub use layer::LayerClass;
pub use molding::MoldingClass;
pub use pbox::PBoxClass;
pub use spotlight::SpotLightClass;

use floorplan_model::{EntityRegistry, ModelResult};
use std::sync::Arc;
use tracing::info;

/// Class tags of the built-in kinds.
pub mod tags {
    pub const CONTENT: &str = "Content";
    pub const PBOX: &str = "PBox";
    pub const MOLDING: &str = "Molding";
    pub const SPOTLIGHT: &str = "SpotLight";
    pub const LAYER: &str = "Layer";
}

/// Registers every built-in kind.
///
/// # Errors
///
/// Returns `DuplicateClass` if one of the tags is already taken.
pub fn register_builtin_classes(registry: &mut EntityRegistry) -> ModelResult<()> {
    registry.register(ContentClass::new())?;
    registry.register(PBoxClass::new())?;
    registry.register(MoldingClass::new())?;
    registry.register(SpotLightClass::new())?;
    registry.register(LayerClass::new())?;
    info!(classes = registry.len(), "Registered built-in entity classes");
    Ok(())
}

/// A registry holding only the built-in kinds.
pub fn builtin_registry() -> ModelResult<Arc<EntityRegistry>> {
    let mut registry = EntityRegistry::new();
    register_builtin_classes(&mut registry)?;
    Ok(Arc::new(registry))
}
