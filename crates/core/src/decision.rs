// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock decisions and cancellation reasons
//!
//! "Cannot lock now" is an expected, frequent outcome, so decisions are
//! first-class return values rather than errors. Only registration problems
//! surface through `Result` (see the registry module).

use crate::boundary::BoundaryId;
use crate::id::{ActionKey, InstanceId};
use thiserror::Error;

/// Why a request was rejected, or why a preceding request is being cancelled
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CancelReason {
    /// Another record with a conflicting key is active in the boundary
    #[error("blocked by key '{key}' in boundary {boundary}")]
    KeyConflict { boundary: BoundaryId, key: ActionKey },

    /// A higher-priority record is already active
    #[error("preceded by higher-priority key '{key}'")]
    HigherPriorityActive { key: ActionKey },

    /// A same-priority record holds an exclusive claim
    #[error("same-priority key '{key}' is exclusive")]
    SamePriorityExclusive { key: ActionKey },

    /// The new request preempts a lower-ranked active record
    #[error("preempted by higher-priority key '{key}'")]
    PreemptedByHigherPriority { key: ActionKey },

    /// The new request replaces a same-priority replaceable record
    #[error("replaced by same-priority key '{key}'")]
    ReplacedBySamePriority { key: ActionKey },

    /// A dynamic condition signalled failure
    #[error("condition not met: {hint}")]
    ConditionNotMet { hint: String },

    /// A member request arrived while no leader is active for its group
    #[error("no active leader for group '{group}'")]
    NoActiveLeader { group: String },

    /// A leader request was rejected because the group already has a leader
    #[error("group '{group}' already has an active leader")]
    LeaderAlreadyActive { group: String },

    /// A new leader is taking over the group; all participants are cancelled
    #[error("group '{group}' taken over by a new leader")]
    GroupTakenOver { group: String },

    /// An erased strategy received an info record of the wrong type
    #[error("info type mismatch: strategy expects {expected}")]
    StrategyMismatch { expected: &'static str },
}

/// A specific active record flagged for cancellation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelTarget {
    pub boundary: BoundaryId,
    pub key: ActionKey,
    pub instance_id: InstanceId,
}

/// Cancellation intent attached to a preempting grant
///
/// Aborting the preceding unit of work is the caller's responsibility; the
/// engine only records the intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecedingCancellation {
    pub reason: CancelReason,
    pub targets: Vec<CancelTarget>,
}

impl PrecedingCancellation {
    pub fn single(reason: CancelReason, target: CancelTarget) -> Self {
        Self {
            reason,
            targets: vec![target],
        }
    }
}

/// Outcome of evaluating a lock request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed
    Success,
    /// The request may proceed once the named preceding records are cancelled
    SuccessWithPrecedingCancellation(PrecedingCancellation),
    /// The request must not proceed
    Cancel(CancelReason),
}

impl Decision {
    /// Whether the request was admitted (with or without preemption)
    pub fn is_success(&self) -> bool {
        !matches!(self, Decision::Cancel(_))
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Decision::Cancel(_))
    }

    /// Get the decision name for logging/debugging
    pub fn name(&self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::SuccessWithPrecedingCancellation(_) => {
                "success_with_preceding_cancellation"
            }
            Decision::Cancel(_) => "cancel",
        }
    }

    /// The rejection reason, if this decision is a cancel
    pub fn cancel_reason(&self) -> Option<&CancelReason> {
        match self {
            Decision::Cancel(reason) => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Success => write!(f, "success"),
            Decision::SuccessWithPrecedingCancellation(cancellation) => {
                write!(f, "success, cancelling preceding: {}", cancellation.reason)
            }
            Decision::Cancel(reason) => write!(f, "cancel: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_not_cancel() {
        assert!(Decision::Success.is_success());
        assert!(!Decision::Success.is_cancel());
        assert!(Decision::Success.cancel_reason().is_none());
    }

    #[test]
    fn preempting_grant_counts_as_success() {
        let decision = Decision::SuccessWithPrecedingCancellation(PrecedingCancellation::single(
            CancelReason::PreemptedByHigherPriority {
                key: ActionKey::from("sync"),
            },
            CancelTarget {
                boundary: BoundaryId::from("main"),
                key: ActionKey::from("fetch"),
                instance_id: InstanceId::from("a-1"),
            },
        ));
        assert!(decision.is_success());
        assert_eq!(decision.name(), "success_with_preceding_cancellation");
    }

    #[test]
    fn cancel_exposes_its_reason() {
        let decision = Decision::Cancel(CancelReason::ConditionNotMet {
            hint: "offline".to_string(),
        });
        assert!(decision.is_cancel());
        assert_eq!(
            decision.cancel_reason(),
            Some(&CancelReason::ConditionNotMet {
                hint: "offline".to_string()
            })
        );
    }

    #[test]
    fn reasons_render_for_logs() {
        let reason = CancelReason::KeyConflict {
            boundary: BoundaryId::from("main"),
            key: ActionKey::from("fetch"),
        };
        assert_eq!(
            reason.to_string(),
            "blocked by key 'fetch' in boundary \"main\""
        );

        let reason = CancelReason::NoActiveLeader {
            group: "onboarding".to_string(),
        };
        assert_eq!(reason.to_string(), "no active leader for group 'onboarding'");

        assert_eq!(Decision::Success.to_string(), "success");
        assert_eq!(
            Decision::Cancel(reason).to_string(),
            "cancel: no active leader for group 'onboarding'"
        );
    }
}
