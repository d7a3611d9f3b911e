use floorplan_types::{EntityId, StateId};
use std::collections::HashSet;
use std::str::FromStr;

// ── EntityId ──────────────────────────────────────────────────────

#[test]
fn entity_id_new_is_unique() {
    let a = EntityId::new();
    let b = EntityId::new();
    assert_ne!(a, b);
}

#[test]
fn entity_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = EntityId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn entity_id_display_and_parse() {
    let id = EntityId::new();
    let parsed = EntityId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn entity_id_parse_invalid() {
    assert!(EntityId::parse("not-a-uuid").is_err());
    assert!(EntityId::from_str("garbage").is_err());
}

#[test]
fn entity_id_serializes_as_plain_string() {
    let id = EntityId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    let parsed: EntityId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn entity_ids_are_time_ordered() {
    let first = EntityId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = EntityId::new();
    assert!(first < second);
}

// ── StateId ───────────────────────────────────────────────────────

#[test]
fn state_id_default_is_unique() {
    let a = StateId::default();
    let b = StateId::default();
    assert_ne!(a, b);
}

#[test]
fn state_id_from_str_roundtrip() {
    let id = StateId::new();
    let parsed: StateId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn state_id_hash_and_eq() {
    let id = StateId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn state_id_rejects_non_string_json() {
    assert!(serde_json::from_str::<StateId>("42").is_err());
}
