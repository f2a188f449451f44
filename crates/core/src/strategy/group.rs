// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group-coordination strategy
//!
//! Coordinates cooperating operations around an application-chosen group id.
//! A group comes alive when a leader locks successfully and persists while
//! any participant holds a record tagged with that group id; its bookkeeping
//! entry is pruned once the participant count reaches zero.

use crate::boundary::BoundaryId;
use crate::decision::{CancelReason, CancelTarget, Decision, PrecedingCancellation};
use crate::id::{ActionKey, InstanceId, StrategyId};
use crate::ledger::LockLedger;
use crate::strategy::{LockInfo, LockSnapshot, Strategy};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Application-chosen identifier for a cooperating group
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        GroupId(s.to_string())
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        GroupId(s)
    }
}

/// What an incoming leader does when the group already has an active leader
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderPolicy {
    /// Reject the incoming leader
    #[default]
    Reject,
    /// Admit the incoming leader and flag every current participant for cancellation
    Takeover,
    /// Admit the incoming leader alongside the existing one
    Join,
}

/// Role an attempt plays within its group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupRole {
    Leader(LeaderPolicy),
    Member,
}

/// Attempt record for [`GroupCoordinationStrategy`]
#[derive(Clone, Debug)]
pub struct GroupInfo {
    strategy_id: StrategyId,
    key: ActionKey,
    instance_id: InstanceId,
    group: GroupId,
    role: GroupRole,
}

impl GroupInfo {
    pub fn leader(key: impl Into<ActionKey>, group: impl Into<GroupId>) -> Self {
        Self::new(key, group, GroupRole::Leader(LeaderPolicy::default()))
    }

    pub fn member(key: impl Into<ActionKey>, group: impl Into<GroupId>) -> Self {
        Self::new(key, group, GroupRole::Member)
    }

    pub fn new(
        key: impl Into<ActionKey>,
        group: impl Into<GroupId>,
        role: GroupRole,
    ) -> Self {
        Self {
            strategy_id: StrategyId::from("group-coordination"),
            key: key.into(),
            instance_id: InstanceId::new(),
            group: group.into(),
            role,
        }
    }

    pub fn with_policy(mut self, policy: LeaderPolicy) -> Self {
        self.role = GroupRole::Leader(policy);
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

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn role(&self) -> GroupRole {
        self.role
    }
}

impl LockInfo for GroupInfo {
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

/// Per-group bookkeeping: which leaders and members currently hold records
#[derive(Debug, Default)]
struct GroupState {
    leaders: HashSet<InstanceId>,
    members: HashSet<InstanceId>,
}

impl GroupState {
    fn participant_count(&self) -> usize {
        self.leaders.len() + self.members.len()
    }

    fn has_leader(&self) -> bool {
        !self.leaders.is_empty()
    }
}

/// Admits members only under an active leader; leader entry is policy-driven
pub struct GroupCoordinationStrategy {
    ledger: LockLedger<GroupInfo>,
    groups: RwLock<HashMap<(BoundaryId, GroupId), GroupState>>,
}

impl GroupCoordinationStrategy {
    pub fn new() -> Self {
        Self {
            ledger: LockLedger::new(),
            groups: RwLock::new(HashMap::new()),
        }
    }

    fn read_groups(
        &self,
    ) -> RwLockReadGuard<'_, HashMap<(BoundaryId, GroupId), GroupState>> {
        self.groups.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_groups(
        &self,
    ) -> RwLockWriteGuard<'_, HashMap<(BoundaryId, GroupId), GroupState>> {
        self.groups.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether a leader currently holds a record for the group
    pub fn is_leader_active(&self, boundary: &BoundaryId, group: &GroupId) -> bool {
        self.read_groups()
            .get(&(boundary.clone(), group.clone()))
            .is_some_and(GroupState::has_leader)
    }

    /// Groups that currently have at least one participant
    pub fn active_groups(&self) -> Vec<(BoundaryId, GroupId)> {
        self.read_groups().keys().cloned().collect()
    }

    fn participants(&self, boundary: &BoundaryId, group: &GroupId) -> Vec<GroupInfo> {
        self.ledger
            .records(boundary)
            .into_iter()
            .filter(|record| record.group == *group)
            .collect()
    }
}

impl Default for GroupCoordinationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for GroupCoordinationStrategy {
    type Info = GroupInfo;

    fn can_lock(&self, boundary: &BoundaryId, info: &Self::Info) -> Decision {
        let leader_active = self.is_leader_active(boundary, &info.group);

        match info.role {
            GroupRole::Member => {
                if leader_active {
                    Decision::Success
                } else {
                    Decision::Cancel(CancelReason::NoActiveLeader {
                        group: info.group.0.clone(),
                    })
                }
            }
            // Policy applies only against an active leader; a lingering
            // leaderless group (members still unwinding) admits a new leader.
            GroupRole::Leader(_) if !leader_active => Decision::Success,
            GroupRole::Leader(LeaderPolicy::Reject) => {
                Decision::Cancel(CancelReason::LeaderAlreadyActive {
                    group: info.group.0.clone(),
                })
            }
            GroupRole::Leader(LeaderPolicy::Join) => Decision::Success,
            GroupRole::Leader(LeaderPolicy::Takeover) => {
                let targets = self
                    .participants(boundary, &info.group)
                    .into_iter()
                    .map(|record| CancelTarget {
                        boundary: boundary.clone(),
                        key: record.key().clone(),
                        instance_id: record.instance_id().clone(),
                    })
                    .collect();
                Decision::SuccessWithPrecedingCancellation(PrecedingCancellation {
                    reason: CancelReason::GroupTakenOver {
                        group: info.group.0.clone(),
                    },
                    targets,
                })
            }
        }
    }

    fn lock(&self, boundary: &BoundaryId, info: &Self::Info) {
        self.ledger.add(boundary, info.clone());

        let mut groups = self.write_groups();
        let state = groups
            .entry((boundary.clone(), info.group.clone()))
            .or_default();
        match info.role {
            GroupRole::Leader(_) => {
                state.leaders.insert(info.instance_id().clone());
            }
            GroupRole::Member => {
                state.members.insert(info.instance_id().clone());
            }
        }
    }

    fn unlock(&self, boundary: &BoundaryId, info: &Self::Info) {
        if !self.ledger.remove(boundary, info) {
            warn!(%boundary, key = %info.key(), "unlock for a record that is not held");
            return;
        }

        let mut groups = self.write_groups();
        let group_key = (boundary.clone(), info.group.clone());
        if let Some(state) = groups.get_mut(&group_key) {
            state.leaders.remove(info.instance_id());
            state.members.remove(info.instance_id());
            if state.participant_count() == 0 {
                groups.remove(&group_key);
            }
        }
    }

    fn clean_up(&self) {
        self.ledger.remove_all();
        self.write_groups().clear();
    }

    fn clean_up_boundary(&self, boundary: &BoundaryId) {
        self.ledger.remove_all_in(boundary);
        self.write_groups()
            .retain(|(group_boundary, _), _| group_boundary != boundary);
    }

    fn current_locks(&self) -> LockSnapshot {
        self.ledger.snapshot()
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
