use floorplan_types::{ClassTag, DirtyKind, DirtyKinds, EntityFlags, RequestType};
use proptest::prelude::*;

// ── EntityFlags ───────────────────────────────────────────────────

#[test]
fn flag_bits_match_document_format() {
    assert_eq!(EntityFlags::SELECTED.bits(), 2);
    assert_eq!(EntityFlags::REMOVED.bits(), 4);
    assert_eq!(EntityFlags::FROZEN.bits(), 8);
    assert_eq!(EntityFlags::HIDDEN.bits(), 16);
    assert_eq!(EntityFlags::UNSELECTABLE.bits(), 32);
    assert_eq!(EntityFlags::EDIT_LIGHT.bits(), 64);
    assert_eq!(EntityFlags::LOCKED.bits(), 128);
}

#[test]
fn flags_serialize_as_integer() {
    let flags = EntityFlags::REMOVED | EntityFlags::HIDDEN;
    assert_eq!(serde_json::to_string(&flags).unwrap(), "20");
    let parsed: EntityFlags = serde_json::from_str("20").unwrap();
    assert_eq!(parsed, flags);
}

#[test]
fn unknown_flag_bits_are_retained() {
    let parsed: EntityFlags = serde_json::from_str("1028").unwrap();
    assert!(parsed.is_removed());
    assert_eq!(parsed.bits(), 1028);
}

#[test]
fn edit_blocking_covers_frozen_and_locked() {
    assert!(EntityFlags::EDIT_BLOCKING.contains(EntityFlags::FROZEN));
    assert!(EntityFlags::EDIT_BLOCKING.contains(EntityFlags::LOCKED));
    assert!(!EntityFlags::EDIT_BLOCKING.contains(EntityFlags::HIDDEN));
}

// ── DirtyKinds ────────────────────────────────────────────────────

#[test]
fn dirty_kind_converts_to_single_bit() {
    for kind in [
        DirtyKind::Display,
        DirtyKind::Geometry,
        DirtyKind::Material,
        DirtyKind::Position,
        DirtyKind::Preview,
    ] {
        assert_eq!(DirtyKinds::from(kind).bits().count_ones(), 1, "{kind}");
    }
}

#[test]
fn dirty_kind_serde_is_snake_case() {
    assert_eq!(serde_json::to_string(&DirtyKind::Geometry).unwrap(), "\"geometry\"");
}

// ── Tags ──────────────────────────────────────────────────────────

#[test]
fn class_tag_rejects_blank() {
    assert!(ClassTag::new("").is_err());
    assert!(ClassTag::new("   ").is_err());
    assert_eq!(ClassTag::new("PBox").unwrap(), "PBox");
}

#[test]
fn request_type_display() {
    let ty = RequestType::from_static("SetField");
    assert_eq!(ty.to_string(), "SetField");
    assert_eq!(serde_json::to_string(&ty).unwrap(), "\"SetField\"");
}

proptest! {
    #[test]
    fn flags_integer_roundtrip(bits in any::<u32>()) {
        let flags = EntityFlags::from_bits_retain(bits);
        let json = serde_json::to_string(&flags).unwrap();
        let parsed: EntityFlags = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed.bits(), bits);
    }
}
