// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::strategy::priority::{Behavior, Priority, PriorityBasedStrategy, PriorityInfo};
use crate::strategy::single::{ExecutionMode, SingleExecutionInfo, SingleExecutionStrategy};

fn boundary() -> BoundaryId {
    BoundaryId::from("main")
}

#[test]
fn erased_strategy_forwards_typed_calls() {
    let erased = ErasedStrategy::new(SingleExecutionStrategy::new());
    let info = SingleExecutionInfo::new("fetch").with_mode(ExecutionMode::Boundary);

    assert_eq!(erased.can_lock(&boundary(), &info), Decision::Success);
    erased.lock(&boundary(), &info);

    let duplicate = SingleExecutionInfo::new("other").with_mode(ExecutionMode::Boundary);
    assert!(erased.can_lock(&boundary(), &duplicate).is_cancel());

    erased.unlock(&boundary(), &info);
    assert_eq!(erased.can_lock(&boundary(), &duplicate), Decision::Success);
}

#[test]
fn mismatched_info_type_cancels_without_touching_state() {
    let erased = ErasedStrategy::new(SingleExecutionStrategy::new());
    let wrong = PriorityInfo::new("fetch", Priority::High(Behavior::Exclusive));

    match erased.can_lock(&boundary(), &wrong) {
        Decision::Cancel(CancelReason::StrategyMismatch { expected }) => {
            assert!(expected.contains("SingleExecutionInfo"));
        }
        other => panic!("expected mismatch cancel, got {other:?}"),
    }

    // lock/unlock with the wrong type are warned no-ops.
    erased.lock(&boundary(), &wrong);
    erased.unlock(&boundary(), &wrong);
    assert!(erased.current_locks().is_empty());
}

#[test]
fn from_arc_shares_the_underlying_strategy() {
    let shared = Arc::new(PriorityBasedStrategy::new());
    let erased = ErasedStrategy::from_arc(Arc::clone(&shared));

    let info = PriorityInfo::new("fetch", Priority::High(Behavior::Exclusive));
    erased.lock(&boundary(), &info);

    // Visible through the typed handle too.
    let held = shared.current_locks();
    assert_eq!(held.get(&boundary()).map(Vec::len), Some(1));
}

#[test]
fn debug_names_both_concrete_types() {
    let erased = ErasedStrategy::new(SingleExecutionStrategy::new());
    let rendered = format!("{erased:?}");
    assert!(rendered.contains("SingleExecutionStrategy"));
    assert!(rendered.contains("SingleExecutionInfo"));
}

#[test]
fn clean_up_reaches_the_wrapped_strategy() {
    let erased = ErasedStrategy::new(SingleExecutionStrategy::new());
    let info = SingleExecutionInfo::new("fetch");
    erased.lock(&boundary(), &info);

    erased.clean_up();
    assert!(erased.current_locks().is_empty());
}
