//! Concurrency stress: many threads racing acquire on shared boundaries.

use crate::prelude::*;
use latch_core::strategy::SingleExecutionInfo;
use latch_core::{LockInfo, StrategyId};
use std::sync::Arc;
use std::thread;

#[test]
fn one_thousand_distinct_keys_all_land() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("single-execution");

    let handles: Vec<_> = (0..1000)
        .map(|n| {
            let engine = engine.clone();
            let id = id.clone();
            thread::spawn(move || {
                let info: Arc<dyn LockInfo> =
                    Arc::new(SingleExecutionInfo::new(format!("task-{n}")));
                engine
                    .acquire(&main_boundary(), &id, info)
                    .unwrap()
                    .is_granted()
            })
        })
        .collect();

    let granted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&granted| granted)
        .count();
    assert_eq!(granted, 1000);

    let held = engine.current_locks(&id).unwrap();
    assert_eq!(held.get(&main_boundary()).map(Vec::len), Some(1000));
}

#[test]
fn same_key_race_grants_exactly_one() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("single-execution");

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let engine = engine.clone();
            let id = id.clone();
            thread::spawn(move || {
                let info: Arc<dyn LockInfo> =
                    Arc::new(SingleExecutionInfo::new("contested"));
                engine
                    .acquire(&main_boundary(), &id, info)
                    .unwrap()
                    .is_granted()
            })
        })
        .collect();

    let granted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&granted| granted)
        .count();
    assert_eq!(granted, 1);
}

#[test]
fn acquire_and_release_cycles_leave_no_residue() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("single-execution");

    let workers: Vec<_> = (0..16)
        .map(|n| {
            let engine = engine.clone();
            let id = id.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    let info: Arc<dyn LockInfo> =
                        Arc::new(SingleExecutionInfo::new(format!("w{n}-i{i}")));
                    let handle = engine
                        .acquire(&main_boundary(), &id, info)
                        .unwrap()
                        .into_handle()
                        .unwrap();
                    handle.unlock();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(engine.current_locks(&id).unwrap().is_empty());
}

#[test]
fn distinct_boundaries_do_not_interfere() {
    let engine = engine_with_builtins();
    let id = StrategyId::from("single-execution");

    let handles: Vec<_> = (0..32)
        .map(|n| {
            let engine = engine.clone();
            let id = id.clone();
            thread::spawn(move || {
                let boundary = latch_core::BoundaryId::from(format!("screen-{n}"));
                let info: Arc<dyn LockInfo> = Arc::new(SingleExecutionInfo::new("refresh"));
                engine
                    .acquire(&boundary, &id, info)
                    .unwrap()
                    .is_granted()
            })
        })
        .collect();

    // Same key everywhere, but every boundary admits its own.
    let granted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&granted| granted)
        .count();
    assert_eq!(granted, 32);
}
