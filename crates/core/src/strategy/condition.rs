// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dynamic-condition strategy
//!
//! Gates admission on a synchronous, side-effect-free predicate evaluated at
//! decision time only. Predicates must be pure functions of ambient state
//! with no captured shared mutable state: they are evaluated synchronously
//! and must not block.

use crate::boundary::BoundaryId;
use crate::decision::{CancelReason, Decision};
use crate::id::{ActionKey, InstanceId, StrategyId};
use crate::ledger::LockLedger;
use crate::strategy::{LockInfo, LockSnapshot, Strategy};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Outcome of a condition check: `Err` carries the declared failure hint
pub type ConditionResult = Result<(), String>;

/// Attempt record for [`DynamicConditionStrategy`]
///
/// The predicate runs during `can_lock` only, never during `lock`/`unlock`.
#[derive(Clone)]
pub struct ConditionInfo {
    strategy_id: StrategyId,
    key: ActionKey,
    instance_id: InstanceId,
    condition: Arc<dyn Fn() -> ConditionResult + Send + Sync>,
}

impl ConditionInfo {
    pub fn new(
        key: impl Into<ActionKey>,
        condition: impl Fn() -> ConditionResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            strategy_id: StrategyId::from("dynamic-condition"),
            key: key.into(),
            instance_id: InstanceId::new(),
            condition: Arc::new(condition),
        }
    }

    pub fn with_instance_id(mut self, instance_id: InstanceId) -> Self {
        self.instance_id = instance_id;
        self
    }

    pub fn with_strategy_id(mut self, strategy_id: impl Into<StrategyId>) -> Self {
        self.strategy_id = strategy_id.into();
        self
    }

    /// Evaluate the wrapped predicate
    pub fn check(&self) -> ConditionResult {
        (self.condition)()
    }
}

impl fmt::Debug for ConditionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionInfo")
            .field("strategy_id", &self.strategy_id)
            .field("key", &self.key)
            .field("instance_id", &self.instance_id)
            .finish_non_exhaustive()
    }
}

impl LockInfo for ConditionInfo {
    fn strategy_id(&self) -> &StrategyId {
        &self.strategy_id
    }

    fn key(&self) -> &ActionKey {
        &self.key
    }

    fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Admits an attempt iff its predicate signals success
///
/// No ledger record is created on failure. Composes with other strategies
/// (via the composite strategy) to add conditional gating atop them.
pub struct DynamicConditionStrategy {
    ledger: LockLedger<ConditionInfo>,
}

impl DynamicConditionStrategy {
    pub fn new() -> Self {
        Self {
            ledger: LockLedger::new(),
        }
    }
}

impl Default for DynamicConditionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for DynamicConditionStrategy {
    type Info = ConditionInfo;

    fn can_lock(&self, _boundary: &BoundaryId, info: &Self::Info) -> Decision {
        match info.check() {
            Ok(()) => Decision::Success,
            Err(hint) => Decision::Cancel(CancelReason::ConditionNotMet { hint }),
        }
    }

    fn lock(&self, boundary: &BoundaryId, info: &Self::Info) {
        self.ledger.add(boundary, info.clone());
    }

    fn unlock(&self, boundary: &BoundaryId, info: &Self::Info) {
        self.ledger.remove(boundary, info);
    }

    fn clean_up(&self) {
        self.ledger.remove_all();
    }

    fn clean_up_boundary(&self, boundary: &BoundaryId) {
        self.ledger.remove_all_in(boundary);
    }

    fn current_locks(&self) -> LockSnapshot {
        self.ledger.snapshot()
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
