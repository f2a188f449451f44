// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-execution strategy
//!
//! Prevents duplicate execution: at most one active record per boundary
//! (`Boundary` mode) or per boundary/key pair (`Action` mode). `None` mode
//! always admits and leaves no trace.

use crate::boundary::BoundaryId;
use crate::decision::{CancelReason, Decision};
use crate::id::{ActionKey, InstanceId, StrategyId};
use crate::ledger::LockLedger;
use crate::strategy::{LockInfo, LockSnapshot, Strategy};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// How strictly a single-execution attempt excludes others
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Always succeeds; the attempt is not tracked
    None,
    /// At most one active record per boundary, regardless of key
    Boundary,
    /// At most one active record per (boundary, key); distinct keys run concurrently
    #[default]
    Action,
}

/// Attempt record for [`SingleExecutionStrategy`]
#[derive(Clone, Debug)]
pub struct SingleExecutionInfo {
    strategy_id: StrategyId,
    key: ActionKey,
    instance_id: InstanceId,
    mode: ExecutionMode,
}

impl SingleExecutionInfo {
    pub fn new(key: impl Into<ActionKey>) -> Self {
        Self {
            strategy_id: StrategyId::from("single-execution"),
            key: key.into(),
            instance_id: InstanceId::new(),
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_instance_id(mut self, instance_id: InstanceId) -> Self {
        self.instance_id = instance_id;
        self
    }

    pub fn with_strategy_id(mut self, strategy_id: impl Into<StrategyId>) -> Self {
        self.strategy_id = strategy_id.into();
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

impl LockInfo for SingleExecutionInfo {
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

/// Admits an attempt only while no conflicting record is active
pub struct SingleExecutionStrategy {
    ledger: LockLedger<SingleExecutionInfo>,
}

impl SingleExecutionStrategy {
    pub fn new() -> Self {
        Self {
            ledger: LockLedger::new(),
        }
    }
}

impl Default for SingleExecutionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for SingleExecutionStrategy {
    type Info = SingleExecutionInfo;

    fn can_lock(&self, boundary: &BoundaryId, info: &Self::Info) -> Decision {
        let blocking = match info.mode {
            ExecutionMode::None => None,
            ExecutionMode::Boundary => self.ledger.records(boundary).into_iter().next(),
            ExecutionMode::Action => self
                .ledger
                .records_by_key(boundary, info.key())
                .into_iter()
                .next(),
        };

        match blocking {
            Some(existing) => Decision::Cancel(CancelReason::KeyConflict {
                boundary: boundary.clone(),
                key: existing.key().clone(),
            }),
            None => Decision::Success,
        }
    }

    fn lock(&self, boundary: &BoundaryId, info: &Self::Info) {
        if info.mode == ExecutionMode::None {
            return;
        }
        self.ledger.add(boundary, info.clone());
    }

    fn unlock(&self, boundary: &BoundaryId, info: &Self::Info) {
        if info.mode == ExecutionMode::None {
            return;
        }
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
#[path = "single_tests.rs"]
mod tests;
