//! Cross-strategy scenarios mirroring how applications compose policies.

use crate::prelude::*;
use latch_core::strategy::{
    CompositeInfo, CompositeStrategy, ConditionInfo, DynamicConditionStrategy, GroupInfo,
    LeaderPolicy, SingleExecutionInfo, SingleExecutionStrategy,
};
use latch_core::{Acquisition, CancelReason, LockInfo, StrategyId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn wizard_group_lifecycle_with_takeover() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("group-coordination");

    // A member cannot start before its leader.
    let early = engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(GroupInfo::member("step-1", "signup")),
        )
        .unwrap();
    assert!(matches!(
        early.rejection(),
        Some(CancelReason::NoActiveLeader { .. })
    ));

    let leader_handle = engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(GroupInfo::leader("signup-flow", "signup")),
        )
        .unwrap()
        .into_handle()
        .unwrap();
    let member_handle = engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(GroupInfo::member("step-1", "signup")),
        )
        .unwrap()
        .into_handle()
        .unwrap();

    // A takeover leader flags the whole group, then the old participants
    // honor the advisory cancellation.
    let takeover = engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(
                GroupInfo::leader("signup-flow-v2", "signup")
                    .with_policy(LeaderPolicy::Takeover),
            ),
        )
        .unwrap();
    let (new_leader, cancellation) = match takeover {
        Acquisition::GrantedWithPreemption { handle, cancellation } => (handle, cancellation),
        other => panic!("expected takeover, got {other:?}"),
    };
    assert_eq!(cancellation.targets.len(), 2);

    leader_handle.unlock();
    member_handle.unlock();

    // The new leader now anchors the group alone.
    let late_member = engine
        .acquire(
            &main_boundary(),
            &id,
            Arc::new(GroupInfo::member("step-2", "signup")),
        )
        .unwrap();
    assert!(late_member.is_granted());

    late_member.into_handle().unwrap().unlock();
    new_leader.unlock();
    assert!(engine.current_locks(&id).unwrap().is_empty());
}

#[test]
fn condition_gate_reflects_ambient_state_per_attempt() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("dynamic-condition");
    let online = Arc::new(AtomicBool::new(false));

    let attempt = |engine: &latch_core::Engine| {
        let online = Arc::clone(&online);
        let info: Arc<dyn LockInfo> = Arc::new(ConditionInfo::new("upload", move || {
            if online.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err("offline".to_string())
            }
        }));
        engine.acquire(&main_boundary(), &id, info).unwrap()
    };

    assert!(matches!(
        attempt(&engine).rejection(),
        Some(CancelReason::ConditionNotMet { hint }) if hint == "offline"
    ));

    online.store(true, Ordering::SeqCst);
    let granted = attempt(&engine);
    assert!(granted.is_granted());
    granted.into_handle().unwrap().unlock();
}

#[test]
fn composite_policy_runs_through_the_registry() {
    let engine = engine_with_builtins();
    let composite = CompositeStrategy::new((
        DynamicConditionStrategy::new(),
        SingleExecutionStrategy::new(),
    ));
    engine.registry().register("gated-single", composite).unwrap();
    let id = StrategyId::from("gated-single");

    let info = |key: &str, pass: bool| {
        Arc::new(CompositeInfo::new(
            key,
            (
                ConditionInfo::new(key, move || {
                    if pass {
                        Ok(())
                    } else {
                        Err("feature disabled".to_string())
                    }
                }),
                SingleExecutionInfo::new(key),
            ),
        )) as Arc<dyn LockInfo>
    };

    // Gate closed: refused by the first component.
    assert!(matches!(
        engine
            .acquire(&main_boundary(), &id, info("export", false))
            .unwrap()
            .rejection(),
        Some(CancelReason::ConditionNotMet { .. })
    ));

    // Gate open: granted, and the single-execution component now holds it.
    let handle = engine
        .acquire(&main_boundary(), &id, info("export", true))
        .unwrap()
        .into_handle()
        .unwrap();
    assert!(matches!(
        engine
            .acquire(&main_boundary(), &id, info("export", true))
            .unwrap()
            .rejection(),
        Some(CancelReason::KeyConflict { .. })
    ));

    handle.unlock();
    assert!(engine.current_locks(&id).unwrap().is_empty());
}

#[test]
fn strategies_keep_independent_state_per_registration() {
    let engine = engine_with_builtins();
    engine
        .registry()
        .register("single-secondary", SingleExecutionStrategy::new())
        .unwrap();

    let primary = StrategyId::from("single-execution");
    let secondary = StrategyId::from("single-secondary");
    let info = |key: &str| Arc::new(SingleExecutionInfo::new(key)) as Arc<dyn LockInfo>;

    let _held = engine
        .acquire(&main_boundary(), &primary, info("job"))
        .unwrap()
        .into_handle()
        .unwrap();

    // Same key under a separate registration is an independent ledger.
    assert!(engine
        .acquire(&main_boundary(), &secondary, info("job"))
        .unwrap()
        .is_granted());
}
