// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority-based strategy
//!
//! Tiered preemption: `None < Low < High`. A higher tier preempts a lower
//! one regardless of behavior; within a tier the outcome depends on whether
//! either side is exclusive. The resolution policy lives in one explicit
//! lookup table ([`resolve`]) so a future policy change edits rows instead
//! of re-deriving branch logic.

use crate::boundary::BoundaryId;
use crate::decision::{CancelReason, CancelTarget, Decision, PrecedingCancellation};
use crate::id::{ActionKey, InstanceId, StrategyId};
use crate::ledger::LockLedger;
use crate::strategy::{LockInfo, LockSnapshot, Strategy};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// How a prioritized record behaves against same-tier contention
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Same-tier newcomers are rejected
    Exclusive,
    /// A same-tier replaceable newcomer replaces this record
    Replaceable,
}

/// Priority carried by an attempt; ordering is `None < Low < High`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    /// Participates in no contention: always admitted, never preempted
    None,
    Low(Behavior),
    High(Behavior),
}

impl Priority {
    pub fn is_none(self) -> bool {
        matches!(self, Priority::None)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::None => write!(f, "none"),
            Priority::Low(Behavior::Exclusive) => write!(f, "low (exclusive)"),
            Priority::Low(Behavior::Replaceable) => write!(f, "low (replaceable)"),
            Priority::High(Behavior::Exclusive) => write!(f, "high (exclusive)"),
            Priority::High(Behavior::Replaceable) => write!(f, "high (replaceable)"),
        }
    }
}

/// Outcome of ranking a new prioritized attempt against the held one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    /// Admit alongside; no contention
    Admit,
    /// Admit, flagging the held record for cancellation
    Preempt(PreemptKind),
    /// Reject the new attempt
    Reject(RejectKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PreemptKind {
    HigherTier,
    ReplaceableSameTier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RejectKind {
    HigherTierHeld,
    ExclusiveSameTier,
}

/// The priority-resolution table, one row per (new, held) combination
///
/// Cross-tier preemption ignores behavior by design; same-tier conflict
/// depends on it. Rows are mirrored one-to-one by the parameterized tests.
fn resolve(new: Priority, held: Priority) -> Resolution {
    use Behavior::{Exclusive, Replaceable};
    use Priority::{High, Low, None};

    match (new, held) {
        // A None newcomer contends with nothing.
        (None, _) => Resolution::Admit,
        // A None holder is never a cancellation target.
        (Low(_) | High(_), None) => Resolution::Admit,

        // Cross-tier: tier wins unconditionally.
        (High(_), Low(_)) => Resolution::Preempt(PreemptKind::HigherTier),
        (Low(_), High(_)) => Resolution::Reject(RejectKind::HigherTierHeld),

        // Same tier: any exclusive side blocks; two replaceables swap.
        (High(Exclusive), High(Exclusive))
        | (High(Exclusive), High(Replaceable))
        | (High(Replaceable), High(Exclusive)) => Resolution::Reject(RejectKind::ExclusiveSameTier),
        (High(Replaceable), High(Replaceable)) => {
            Resolution::Preempt(PreemptKind::ReplaceableSameTier)
        }
        (Low(Exclusive), Low(Exclusive))
        | (Low(Exclusive), Low(Replaceable))
        | (Low(Replaceable), Low(Exclusive)) => Resolution::Reject(RejectKind::ExclusiveSameTier),
        (Low(Replaceable), Low(Replaceable)) => {
            Resolution::Preempt(PreemptKind::ReplaceableSameTier)
        }
    }
}

/// Attempt record for [`PriorityBasedStrategy`]
#[derive(Clone, Debug)]
pub struct PriorityInfo {
    strategy_id: StrategyId,
    key: ActionKey,
    instance_id: InstanceId,
    priority: Priority,
}

impl PriorityInfo {
    pub fn new(key: impl Into<ActionKey>, priority: Priority) -> Self {
        Self {
            strategy_id: StrategyId::from("priority-based"),
            key: key.into(),
            instance_id: InstanceId::new(),
            priority,
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

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl LockInfo for PriorityInfo {
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

/// Admits, rejects, or preempts based on the priority-resolution table
///
/// Decisions rank the newcomer against the most recently admitted non-None
/// record. A preempted record stays in the ledger until its holder unlocks
/// (cancellation is advisory), so two prioritized records can coexist
/// transiently; ranking against the newest keeps decisions consistent.
pub struct PriorityBasedStrategy {
    ledger: LockLedger<PriorityInfo>,
}

impl PriorityBasedStrategy {
    pub fn new() -> Self {
        Self {
            ledger: LockLedger::new(),
        }
    }

    fn active_prioritized(&self, boundary: &BoundaryId) -> Option<PriorityInfo> {
        self.ledger
            .records(boundary)
            .into_iter()
            .filter(|record| !record.priority.is_none())
            .next_back()
    }
}

impl Default for PriorityBasedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for PriorityBasedStrategy {
    type Info = PriorityInfo;

    fn can_lock(&self, boundary: &BoundaryId, info: &Self::Info) -> Decision {
        let Some(held) = self.active_prioritized(boundary) else {
            return Decision::Success;
        };

        match resolve(info.priority, held.priority) {
            Resolution::Admit => Decision::Success,
            Resolution::Preempt(kind) => {
                let reason = match kind {
                    PreemptKind::HigherTier => CancelReason::PreemptedByHigherPriority {
                        key: info.key().clone(),
                    },
                    PreemptKind::ReplaceableSameTier => CancelReason::ReplacedBySamePriority {
                        key: info.key().clone(),
                    },
                };
                Decision::SuccessWithPrecedingCancellation(PrecedingCancellation::single(
                    reason,
                    CancelTarget {
                        boundary: boundary.clone(),
                        key: held.key().clone(),
                        instance_id: held.instance_id().clone(),
                    },
                ))
            }
            Resolution::Reject(kind) => {
                let reason = match kind {
                    RejectKind::HigherTierHeld => CancelReason::HigherPriorityActive {
                        key: held.key().clone(),
                    },
                    RejectKind::ExclusiveSameTier => CancelReason::SamePriorityExclusive {
                        key: held.key().clone(),
                    },
                };
                Decision::Cancel(reason)
            }
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
#[path = "priority_tests.rs"]
mod tests;
