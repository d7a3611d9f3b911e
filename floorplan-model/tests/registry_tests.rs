mod common;

use common::{BlockClass, GroupClass, registry};
use floorplan_model::{EntityLifecycle, EntityRegistry, ModelError};
use floorplan_types::EntityId;
use pretty_assertions::assert_eq;

#[test]
fn register_and_look_up() {
    let mut registry = EntityRegistry::new();
    registry.register(BlockClass::new()).unwrap();

    assert!(registry.is_registered("Block"));
    assert!(!registry.is_registered("Group"));
    assert_eq!(registry.class("Block").unwrap().tag(), "Block");
    assert_eq!(registry.len(), 1);
}

#[test]
fn duplicate_registration_fails() {
    let mut registry = EntityRegistry::new();
    registry.register(BlockClass::new()).unwrap();
    let err = registry.register(BlockClass::new()).unwrap_err();
    assert!(matches!(err, ModelError::DuplicateClass(ref t) if t == "Block"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn unknown_tag_fails() {
    let registry = EntityRegistry::new();
    assert!(registry.is_empty());
    assert!(matches!(
        registry.create("Block"),
        Err(ModelError::UnknownEntityType(_))
    ));
    assert!(matches!(
        registry.class("Block"),
        Err(ModelError::UnknownEntityType(_))
    ));
}

#[test]
fn create_returns_constructed_entity() {
    let registry = registry();
    let entity = registry.create("Group").unwrap();
    assert_eq!(entity.class_tag(), "Group");
    assert_eq!(entity.lifecycle(), EntityLifecycle::Constructed);
    assert!(entity.state_bindings().next().is_none());
}

#[test]
fn create_with_id_keeps_id() {
    let registry = registry();
    let id = EntityId::new();
    assert_eq!(registry.create_with_id("Block", id).unwrap().id(), id);
}

#[test]
fn tags_are_sorted() {
    let mut registry = EntityRegistry::new();
    registry.register(GroupClass::new()).unwrap();
    registry.register(BlockClass::new()).unwrap();
    let tags: Vec<&str> = registry.tags().into_iter().map(|t| t.as_str()).collect();
    assert_eq!(tags, vec!["Block", "Group"]);
}

#[test]
fn class_field_lookup() {
    let registry = registry();
    let class = registry.class("TallBlock").unwrap();
    assert_eq!(class.fields().len(), 5);
    assert!(class.field("Height").is_some());
    assert!(class.field("XLength").unwrap().is_state());
    assert!(!class.field("Label").unwrap().is_state());
    assert!(class.field("Depth").is_none());
}
