// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pluggable lock-decision strategies
//!
//! This module provides:
//! - **Strategy** - The lock-decision contract every policy implements
//! - **SingleExecution** - At most one active record per boundary or key
//! - **PriorityBased** - Tiered preemption with exclusive/replaceable behavior
//! - **DynamicCondition** - Predicate-gated admission
//! - **GroupCoordination** - Leader/member group lifecycles
//! - **Composite** - Ordered combination of 2..=5 component strategies
//! - **ErasedStrategy** - Type-erased wrapper so one registry holds them all

pub mod composite;
pub mod condition;
pub mod erased;
pub mod group;
pub mod priority;
pub mod single;

pub use composite::{CompositeInfo, CompositeStrategy};
pub use condition::{ConditionInfo, DynamicConditionStrategy};
pub use erased::ErasedStrategy;
pub use group::{GroupCoordinationStrategy, GroupId, GroupInfo, GroupRole, LeaderPolicy};
pub use priority::{Behavior, Priority, PriorityBasedStrategy, PriorityInfo};
pub use single::{ExecutionMode, SingleExecutionInfo, SingleExecutionStrategy};

use crate::boundary::BoundaryId;
use crate::decision::Decision;
use crate::id::{ActionKey, InstanceId, StrategyId};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Immutable record describing one lock attempt
///
/// Concrete info types carry the strategy-specific payload (mode, priority,
/// predicate, role). Object-safe so ledgers and snapshots can hold attempts
/// from unrelated strategies.
pub trait LockInfo: fmt::Debug + Send + Sync + 'static {
    /// Registry identifier of the strategy this attempt targets
    fn strategy_id(&self) -> &StrategyId;

    /// Key grouping related attempts for same-key exclusion rules
    fn key(&self) -> &ActionKey;

    /// Identifier unique to this individual attempt
    fn instance_id(&self) -> &InstanceId;

    /// Erased self-access for downcasting inside type-erased wrappers
    fn as_any(&self) -> &dyn Any;

    /// One-line description for logs and debug snapshots
    fn debug_description(&self) -> String {
        format!("{self:?}")
    }
}

/// Introspection snapshot: active records per boundary, type-erased
pub type LockSnapshot = HashMap<BoundaryId, Vec<Arc<dyn LockInfo>>>;

/// A pluggable lock-decision policy
///
/// `can_lock` is pure: it never mutates strategy state. `lock` records the
/// grant (its precondition is that an equivalent `can_lock` did not cancel),
/// and `unlock` removes the matching record, tolerating absence since
/// concurrent preemption legitimately produces double-unlock races.
pub trait Strategy: Send + Sync + 'static {
    /// The info type this strategy's decisions are based on
    type Info: LockInfo + Clone;

    /// Evaluate whether an attempt may proceed; no mutation
    fn can_lock(&self, boundary: &BoundaryId, info: &Self::Info) -> Decision;

    /// Record a granted attempt in the ledger
    fn lock(&self, boundary: &BoundaryId, info: &Self::Info);

    /// Remove the matching record; safe no-op if already removed
    fn unlock(&self, boundary: &BoundaryId, info: &Self::Info);

    /// Forced clear of all state, for recovery and test isolation
    fn clean_up(&self);

    /// Forced clear of one boundary's state
    fn clean_up_boundary(&self, boundary: &BoundaryId);

    /// Read-only snapshot of currently held records per boundary
    fn current_locks(&self) -> LockSnapshot;
}
