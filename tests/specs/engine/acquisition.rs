//! End-to-end acquire/release flows through the engine facade.

use crate::prelude::*;
use latch_core::strategy::{
    Behavior, ExecutionMode, Priority, PriorityInfo, SingleExecutionInfo,
};
use latch_core::{Acquisition, CancelReason, StrategyId, LockInfo};
use std::sync::Arc;

#[test]
fn duplicate_action_is_rejected_while_held() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("single-execution");

    let handle = engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(SingleExecutionInfo::new("sync-profile")),
        )
        .unwrap()
        .into_handle()
        .unwrap();

    let duplicate = engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(SingleExecutionInfo::new("sync-profile")),
        )
        .unwrap();
    match duplicate.rejection() {
        Some(CancelReason::KeyConflict { key, .. }) => assert_eq!(key.as_str(), "sync-profile"),
        other => panic!("expected a key conflict, got {other:?}"),
    }

    handle.unlock();
    assert!(engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(SingleExecutionInfo::new("sync-profile")),
        )
        .unwrap()
        .is_granted());
}

#[test]
fn boundary_mode_blocks_unrelated_keys_in_one_boundary_only() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("single-execution");
    let exclusive = |key: &str| {
        Arc::new(SingleExecutionInfo::new(key).with_mode(ExecutionMode::Boundary))
            as Arc<dyn LockInfo>
    };

    let _held = engine
        .acquire(&main_boundary(), &id, exclusive("deploy"))
        .unwrap()
        .into_handle()
        .unwrap();

    // Any key inside the boundary is refused.
    assert!(!engine
        .acquire(&main_boundary(), &id, exclusive("status"))
        .unwrap()
        .is_granted());

    // A different boundary is untouched.
    let elsewhere = latch_core::BoundaryId::from("staging");
    assert!(engine
        .acquire(&elsewhere, &id, exclusive("deploy"))
        .unwrap()
        .is_granted());
}

#[test]
fn high_priority_preempts_and_both_sides_unwind() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("priority-based");

    let background =
        PriorityInfo::new("index-rebuild", Priority::Low(Behavior::Replaceable));
    let background_instance = background.instance_id().clone();
    let background_handle = engine
        .acquire(&main_boundary(), &id, Arc::new(background))
        .unwrap()
        .into_handle()
        .unwrap();

    let urgent = engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(PriorityInfo::new(
                "user-save",
                Priority::High(Behavior::Exclusive),
            )),
        )
        .unwrap();

    let (urgent_handle, cancellation) = match urgent {
        Acquisition::GrantedWithPreemption { handle, cancellation } => (handle, cancellation),
        other => panic!("expected preemption, got {other:?}"),
    };
    assert_eq!(cancellation.targets.len(), 1);
    assert_eq!(cancellation.targets[0].instance_id, background_instance);

    // The preempted holder honors the advisory cancellation.
    background_handle.unlock();
    urgent_handle.unlock();
    assert!(engine.current_locks(&id).unwrap().is_empty());
}

#[test]
fn mismatched_info_type_is_rejected_not_panicked() {
    let engine = engine_with_builtins();

    // Priority info sent to the single-execution strategy.
    let wrong: Arc<dyn LockInfo> = Arc::new(PriorityInfo::new(
        "oops",
        Priority::High(Behavior::Exclusive),
    ));
    let acquisition = engine
        .acquire(&main_boundary(), &StrategyId::from("single-execution"), wrong)
        .unwrap();

    match acquisition.rejection() {
        Some(CancelReason::StrategyMismatch { expected }) => {
            assert!(expected.contains("SingleExecutionInfo"));
        }
        other => panic!("expected a strategy mismatch, got {other:?}"),
    }
}

#[test]
fn unknown_strategy_id_is_a_registry_error() {
    let engine = engine_with_builtins();
    let missing = StrategyId::from("not-registered");

    let err = engine
        .acquire(
            &main_boundary(),
            &missing,
            Arc::new(SingleExecutionInfo::new("anything")),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "strategy 'not-registered' is not registered");
}
