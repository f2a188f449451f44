//! Batch registration atomicity at the application level.

use crate::prelude::*;
use latch_core::strategy::{
    ErasedStrategy, PriorityBasedStrategy, SingleExecutionStrategy,
};
use latch_core::{Engine, StrategyId};

#[test]
fn whole_stack_registers_in_one_batch() {
    let engine = Engine::new();
    engine
        .registry()
        .register_all(vec![
            (
                StrategyId::from("single-execution"),
                ErasedStrategy::new(SingleExecutionStrategy::new()),
            ),
            (
                StrategyId::from("priority-based"),
                ErasedStrategy::new(PriorityBasedStrategy::new()),
            ),
        ])
        .unwrap();

    assert_eq!(engine.registry().strategy_count(), 2);
}

#[test]
fn conflicting_batch_leaves_existing_registrations_untouched() {
    let engine = engine_with_builtins();
    let before = engine.registry().strategy_count();

    let result = engine.registry().register_all(vec![
        (
            StrategyId::from("fresh"),
            ErasedStrategy::new(SingleExecutionStrategy::new()),
        ),
        (
            // Collides with a builtin.
            StrategyId::from("single-execution"),
            ErasedStrategy::new(SingleExecutionStrategy::new()),
        ),
    ]);

    assert!(result.is_err());
    assert_eq!(engine.registry().strategy_count(), before);
    assert!(!engine
        .registry()
        .is_registered(&StrategyId::from("fresh")));
}

#[test]
fn batch_with_internal_duplicate_is_fully_rejected() {
    let engine = Engine::new();
    let result = engine.registry().register_all(vec![
        (
            StrategyId::from("dup"),
            ErasedStrategy::new(SingleExecutionStrategy::new()),
        ),
        (
            StrategyId::from("dup"),
            ErasedStrategy::new(PriorityBasedStrategy::new()),
        ),
    ]);

    assert!(result.is_err());
    assert_eq!(engine.registry().strategy_count(), 0);
}
