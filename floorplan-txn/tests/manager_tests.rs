mod common;

use common::{
    FailingRequest, LABEL, StubbornRequest, Y_LENGTH, document_with_box, set_length, x_length,
};
use floorplan_txn::{
    CommitOptions, PurgeRemovedRequest, RemoveEntityRequest, SessionOptions, SetFieldRequest,
    TransactionConfig, TransactionManager, TxnError,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn set_width(entity: floorplan_types::EntityId, value: f64) -> Box<SetFieldRequest> {
    Box::new(SetFieldRequest::new(entity, "YLength", json!(value)))
}

// ── Commit / undo / redo ─────────────────────────────────────────

#[test]
fn undo_and_redo_restore_value_and_bump_generation_once_each() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(doc.dirty_generation(id), Some(0));

    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    assert_eq!(x_length(&doc, id), 200.0);
    assert_eq!(doc.dirty_generation(id), Some(1));

    assert!(manager.undo(&mut doc).unwrap());
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(doc.dirty_generation(id), Some(2));

    assert!(manager.redo(&mut doc).unwrap());
    assert_eq!(x_length(&doc, id), 200.0);
    assert_eq!(doc.dirty_generation(id), Some(3));
}

#[test]
fn undo_and_redo_on_empty_stacks_do_nothing() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    assert!(!manager.undo(&mut doc).unwrap());
    assert!(!manager.redo(&mut doc).unwrap());
    assert_eq!(doc.dirty_generation(id), Some(0));
}

#[test]
fn commit_clears_redo_stack() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.undo(&mut doc).unwrap();
    assert!(manager.can_redo());

    manager.commit(&mut doc, set_length(id, 300.0)).unwrap();
    assert!(!manager.can_redo());
    assert!(!manager.redo(&mut doc).unwrap());
    assert_eq!(x_length(&doc, id), 300.0);
}

#[test]
fn failed_commit_leaves_document_and_history_untouched() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    let err = manager.commit(&mut doc, set_length(id, -5.0)).unwrap_err();
    assert!(matches!(err, TxnError::PreconditionFailed { entity, .. } if entity == id));
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(doc.dirty_generation(id), Some(0));
    assert!(!manager.can_undo());
}

#[test]
fn descriptions_list_most_recent_first() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();
    assert_eq!(manager.undo_descriptions(), vec!["Set YLength", "Set XLength"]);

    manager.undo(&mut doc).unwrap();
    assert_eq!(manager.undo_descriptions(), vec!["Set XLength"]);
    assert_eq!(manager.redo_descriptions(), vec!["Set YLength"]);
}

#[test]
fn oldest_units_are_evicted_past_the_cap() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::new(TransactionConfig {
        max_undo_steps: 3,
        ..TransactionConfig::default()
    });

    for length in [110.0, 120.0, 130.0, 140.0, 150.0] {
        manager.commit(&mut doc, set_length(id, length)).unwrap();
    }
    assert_eq!(manager.undo_descriptions().len(), 3);

    while manager.undo(&mut doc).unwrap() {}
    assert_eq!(x_length(&doc, id), 120.0);
}

#[test]
fn commit_new_builds_through_the_factory() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    manager
        .commit_new(
            &mut doc,
            "SetField",
            &json!({"entity": id, "field": "XLength", "value": 250.0}),
        )
        .unwrap();
    assert_eq!(x_length(&doc, id), 250.0);

    let err = manager.commit_new(&mut doc, "Teleport", &json!({})).unwrap_err();
    assert!(matches!(err, TxnError::UnknownRequestType(ref t) if t == "Teleport"));
}

#[test]
fn failed_undo_keeps_the_unit_for_retry() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();
    let allowed = Arc::new(AtomicBool::new(false));

    manager
        .commit(
            &mut doc,
            Box::new(StubbornRequest {
                entity: id,
                undo_allowed: Arc::clone(&allowed),
            }),
        )
        .unwrap();
    assert_eq!(doc.get(id, LABEL).unwrap(), "stubborn");

    assert!(manager.undo(&mut doc).is_err());
    assert!(manager.can_undo());
    assert_eq!(doc.get(id, LABEL).unwrap(), "stubborn");

    allowed.store(true, Ordering::SeqCst);
    assert!(manager.undo(&mut doc).unwrap());
    assert_eq!(doc.get(id, LABEL).unwrap(), "");
}

// ── Sessions ─────────────────────────────────────────────────────

#[test]
fn merged_session_undoes_as_one_unit() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    let session = manager.start_session(SessionOptions::default());
    assert_eq!(manager.active_session(), session);
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();
    manager.commit_session(session, CommitOptions::default()).unwrap();

    assert_eq!(manager.session_count(), 1);
    assert_eq!(manager.undo_descriptions(), vec!["Set XLength, Set YLength"]);

    manager.undo(&mut doc).unwrap();
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(doc.get(id, Y_LENGTH).unwrap(), 60.0);

    manager.redo(&mut doc).unwrap();
    assert_eq!(x_length(&doc, id), 200.0);
    assert_eq!(doc.get(id, Y_LENGTH).unwrap(), 80.0);
}

#[test]
fn merged_session_undo_bumps_generation_once() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();
    manager.commit_session(session, CommitOptions::default()).unwrap();
    assert_eq!(doc.dirty_generation(id), Some(2));

    manager.undo(&mut doc).unwrap();
    assert_eq!(doc.dirty_generation(id), Some(3));
}

#[test]
fn session_description_names_the_merged_unit() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    let session = manager.start_session(SessionOptions {
        description: Some("Resize box".to_string()),
        ..SessionOptions::default()
    });
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit_session(session, CommitOptions::default()).unwrap();

    assert_eq!(manager.undo_descriptions(), vec!["Resize box"]);
}

#[test]
fn unmerged_session_keeps_each_unit() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();
    manager
        .commit_session(session, CommitOptions { merge: false })
        .unwrap();

    assert_eq!(manager.undo_descriptions().len(), 2);
    manager.undo(&mut doc).unwrap();
    assert_eq!(x_length(&doc, id), 200.0);
    assert_eq!(doc.get(id, Y_LENGTH).unwrap(), 60.0);
}

#[test]
fn session_without_undo_leaves_effects_but_no_unit() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    manager.commit(&mut doc, set_length(id, 150.0)).unwrap();
    manager.undo(&mut doc).unwrap();
    assert!(manager.can_redo());

    let session = manager.start_session(SessionOptions {
        undo_redo: false,
        ..SessionOptions::default()
    });
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit_session(session, CommitOptions::default()).unwrap();

    assert_eq!(x_length(&doc, id), 200.0);
    assert!(!manager.can_undo());
    assert!(!manager.can_redo());
}

#[test]
fn abort_session_reverts_its_requests() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit(&mut doc, set_length(id, 300.0)).unwrap();
    manager.abort_session(&mut doc, session).unwrap();

    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(manager.session_count(), 1);
    assert!(!manager.can_undo());
}

#[test]
fn end_session_keeps_effects_without_undo_entries() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.end_session(session).unwrap();

    assert_eq!(x_length(&doc, id), 200.0);
    assert!(!manager.can_undo());
}

#[test]
fn failure_inside_session_rolls_the_session_back() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit(&mut doc, set_length(id, 300.0)).unwrap();
    let err = manager.commit(&mut doc, Box::new(FailingRequest)).unwrap_err();

    match err {
        TxnError::SessionRolledBack {
            session: rolled,
            source,
        } => {
            assert_eq!(rolled, session);
            assert!(matches!(*source, TxnError::InvalidArgs { .. }));
        }
        other => panic!("expected a rollback, got {other:?}"),
    }
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(manager.session_count(), 1);
    // The unit committed before the session survives.
    assert_eq!(manager.undo_descriptions(), vec!["Set YLength"]);
}

#[test]
fn disabled_manager_still_rolls_sessions_back() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();
    manager.disable();

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();
    let err = manager.commit(&mut doc, Box::new(FailingRequest)).unwrap_err();

    assert!(matches!(err, TxnError::SessionRolledBack { session: s, .. } if s == session));
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(doc.value(id, "YLength").unwrap(), &json!(60.0));
    assert_eq!(manager.session_count(), 1);
    assert!(!manager.can_undo());
}

#[test]
fn disabled_manager_aborts_sessions_fully() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();
    manager.disable();

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager.abort_session(&mut doc, session).unwrap();
    assert_eq!(x_length(&doc, id), 100.0);

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 300.0)).unwrap();
    manager
        .commit_session(session, CommitOptions { merge: true })
        .unwrap();
    assert_eq!(x_length(&doc, id), 300.0);
    assert!(!manager.can_undo());
}

#[test]
fn session_refuses_requests_that_cannot_be_undone() {
    let (mut doc, id) = document_with_box();
    let other = doc.create_entity("Box").unwrap();
    let mut manager = TransactionManager::default();
    manager
        .commit(&mut doc, Box::new(RemoveEntityRequest::new(other)))
        .unwrap();

    let session = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    let err = manager
        .commit(&mut doc, Box::new(PurgeRemovedRequest::new()))
        .unwrap_err();

    match err {
        TxnError::SessionRolledBack {
            session: rolled,
            source,
        } => {
            assert_eq!(rolled, session);
            assert!(matches!(*source, TxnError::NotUndoable(_)));
        }
        other => panic!("expected a rollback, got {other:?}"),
    }
    assert_eq!(x_length(&doc, id), 100.0);
    // Nothing was purged and the removal before the session is still undoable.
    assert!(doc.contains(other));
    assert_eq!(manager.session_count(), 1);
    assert!(manager.undo(&mut doc).unwrap());
    assert!(!doc.entity(other).unwrap().is_removed());
}

#[test]
fn only_the_innermost_session_can_be_closed() {
    let (mut doc, _) = document_with_box();
    let mut manager = TransactionManager::default();

    let outer = manager.start_session(SessionOptions::default());
    let inner = manager.start_session(SessionOptions::default());

    let err = manager
        .commit_session(outer, CommitOptions::default())
        .unwrap_err();
    assert!(matches!(err, TxnError::SessionNotActive(s) if s == outer));
    assert!(manager.abort_session(&mut doc, outer).is_err());

    manager.commit_session(inner, CommitOptions::default()).unwrap();
    let err = manager.end_session(inner).unwrap_err();
    assert!(matches!(err, TxnError::SessionNotActive(s) if s == inner));
    manager.commit_session(outer, CommitOptions::default()).unwrap();
}

#[test]
fn nested_session_merges_into_its_parent() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    let outer = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    let inner = manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();
    manager.commit_session(inner, CommitOptions::default()).unwrap();
    manager.commit_session(outer, CommitOptions::default()).unwrap();

    assert_eq!(manager.undo_descriptions().len(), 1);
    manager.undo(&mut doc).unwrap();
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(doc.get(id, Y_LENGTH).unwrap(), 60.0);
}

#[test]
fn undo_inside_open_session_uses_its_own_stack() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();

    manager.start_session(SessionOptions::default());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    assert!(manager.undo(&mut doc).unwrap());
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(doc.get(id, Y_LENGTH).unwrap(), 80.0);
    assert_eq!(manager.session_count(), 2);
    assert!(!manager.undo(&mut doc).unwrap());
}

#[test]
fn undo_aborts_sessions_without_undo_above_the_target() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();
    manager.commit(&mut doc, set_width(id, 80.0)).unwrap();

    manager.start_session(SessionOptions {
        undo_redo: false,
        ..SessionOptions::default()
    });
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();

    assert!(manager.undo(&mut doc).unwrap());
    assert_eq!(manager.session_count(), 1);
    assert_eq!(x_length(&doc, id), 100.0);
    assert_eq!(doc.get(id, Y_LENGTH).unwrap(), 60.0);
}

// ── Switches ─────────────────────────────────────────────────────

#[test]
fn blocked_undo_redo_is_rejected_until_every_block_is_released() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();

    manager.block_undo_redo();
    manager.block_undo_redo();
    assert!(!manager.can_undo());
    assert!(matches!(manager.undo(&mut doc), Err(TxnError::UndoRedoBlocked)));

    manager.unblock_undo_redo();
    assert!(manager.is_undo_redo_blocked());
    manager.unblock_undo_redo();
    assert!(manager.undo(&mut doc).unwrap());
    assert_eq!(x_length(&doc, id), 100.0);
}

#[test]
fn disabled_manager_applies_without_recording() {
    let (mut doc, id) = document_with_box();
    let mut manager = TransactionManager::default();

    manager.disable();
    assert!(!manager.is_enabled());
    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    assert_eq!(x_length(&doc, id), 200.0);
    assert!(!manager.can_undo());

    manager.enable();
    manager.commit(&mut doc, set_length(id, 300.0)).unwrap();
    manager.undo(&mut doc).unwrap();
    assert_eq!(x_length(&doc, id), 200.0);
}

#[test]
fn purge_clears_all_history() {
    let (mut doc, id) = document_with_box();
    let other = doc.create_entity("Box").unwrap();
    let mut manager = TransactionManager::default();

    manager.commit(&mut doc, set_length(id, 200.0)).unwrap();
    manager
        .commit(&mut doc, Box::new(RemoveEntityRequest::new(other)))
        .unwrap();
    manager.undo(&mut doc).unwrap();
    manager.redo(&mut doc).unwrap();

    manager
        .commit(&mut doc, Box::new(PurgeRemovedRequest::new()))
        .unwrap();
    assert!(!doc.contains(other));
    assert!(!manager.can_undo());
    assert!(!manager.can_redo());
    assert_eq!(x_length(&doc, id), 200.0);
}

#[test]
fn config_deserializes_with_defaults() {
    let config: TransactionConfig = serde_json::from_value(json!({"max_undo_steps": 3})).unwrap();
    assert_eq!(config.max_undo_steps, 3);
    assert!(config.enabled);
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn undo_all_restores_original_and_redo_all_replays(
        lengths in prop::collection::vec(1.0f64..1000.0, 1..12)
    ) {
        let (mut doc, id) = document_with_box();
        let mut manager = TransactionManager::default();
        for length in &lengths {
            manager.commit(&mut doc, set_length(id, *length)).unwrap();
        }
        let last = x_length(&doc, id);

        while manager.undo(&mut doc).unwrap() {}
        prop_assert_eq!(x_length(&doc, id), 100.0);
        prop_assert!(!manager.undo(&mut doc).unwrap());
        prop_assert_eq!(x_length(&doc, id), 100.0);

        while manager.redo(&mut doc).unwrap() {}
        prop_assert_eq!(x_length(&doc, id), last);
    }
}
