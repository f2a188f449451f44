//! Shared helpers for behavioral specs.

use latch_core::strategy::{
    DynamicConditionStrategy, GroupCoordinationStrategy, PriorityBasedStrategy,
    SingleExecutionStrategy,
};
use latch_core::{BoundaryId, Engine};

/// Engine with every built-in strategy registered under its default id
pub fn engine_with_builtins() -> Engine {
    let engine = Engine::new();
    engine
        .registry()
        .register("single-execution", SingleExecutionStrategy::new())
        .unwrap();
    engine
        .registry()
        .register("priority-based", PriorityBasedStrategy::new())
        .unwrap();
    engine
        .registry()
        .register("dynamic-condition", DynamicConditionStrategy::new())
        .unwrap();
    engine
        .registry()
        .register("group-coordination", GroupCoordinationStrategy::new())
        .unwrap();
    engine
}

pub fn main_boundary() -> BoundaryId {
    BoundaryId::from("main")
}
