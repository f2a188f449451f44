// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composite strategy
//!
//! Combines 2..=5 component strategies atomically. `can_lock` walks the
//! components in declared order and short-circuits on the first cancel;
//! absent a cancel, the first preempting component's decision wins. `lock`
//! applies components 1→N and `unlock` unwinds in strict reverse order N→1,
//! so the most recently acquired component releases first. `clean_up`
//! always reaches every component, regardless of individual outcomes.
//!
//! One generic implementation over tuples of strategies replaces
//! arity-specific variants; supported arities are exactly the tuple sizes
//! implementing [`ComponentSet`].

use crate::boundary::BoundaryId;
use crate::decision::Decision;
use crate::id::{ActionKey, InstanceId, StrategyId};
use crate::strategy::{LockInfo, LockSnapshot, Strategy};
use std::any::Any;
use std::fmt;

/// An ordered, heterogeneous set of component strategies
///
/// Implemented for tuples of 2..=5 [`Strategy`] values; the paired
/// `Infos` tuple carries one info per component, checked at compile time.
pub trait ComponentSet: Send + Sync + 'static {
    /// Parallel per-component info records
    type Infos: Clone + Send + Sync + fmt::Debug + 'static;

    fn can_lock(&self, boundary: &BoundaryId, infos: &Self::Infos) -> Decision;
    fn lock(&self, boundary: &BoundaryId, infos: &Self::Infos);
    fn unlock(&self, boundary: &BoundaryId, infos: &Self::Infos);
    fn clean_up(&self);
    fn clean_up_boundary(&self, boundary: &BoundaryId);
    fn current_locks(&self) -> LockSnapshot;
    fn arity(&self) -> usize;
}

macro_rules! impl_component_set {
    ($arity:literal => [$(($S:ident, $fwd:tt)),+] unlock [$($rev:tt),+]) => {
        impl<$($S: Strategy),+> ComponentSet for ($($S,)+) {
            type Infos = ($($S::Info,)+);

            fn can_lock(&self, boundary: &BoundaryId, infos: &Self::Infos) -> Decision {
                let mut preceding = None;
                $(
                    match self.$fwd.can_lock(boundary, &infos.$fwd) {
                        // First cancel is the overall result; later
                        // components are not evaluated.
                        Decision::Cancel(reason) => return Decision::Cancel(reason),
                        Decision::SuccessWithPrecedingCancellation(cancellation) => {
                            if preceding.is_none() {
                                preceding = Some(cancellation);
                            }
                        }
                        Decision::Success => {}
                    }
                )+
                match preceding {
                    Some(cancellation) => {
                        Decision::SuccessWithPrecedingCancellation(cancellation)
                    }
                    None => Decision::Success,
                }
            }

            fn lock(&self, boundary: &BoundaryId, infos: &Self::Infos) {
                $( self.$fwd.lock(boundary, &infos.$fwd); )+
            }

            fn unlock(&self, boundary: &BoundaryId, infos: &Self::Infos) {
                $( self.$rev.unlock(boundary, &infos.$rev); )+
            }

            fn clean_up(&self) {
                $( self.$fwd.clean_up(); )+
            }

            fn clean_up_boundary(&self, boundary: &BoundaryId) {
                $( self.$fwd.clean_up_boundary(boundary); )+
            }

            fn current_locks(&self) -> LockSnapshot {
                let mut merged = LockSnapshot::new();
                $(
                    for (found_boundary, infos) in self.$fwd.current_locks() {
                        merged.entry(found_boundary).or_default().extend(infos);
                    }
                )+
                merged
            }

            fn arity(&self) -> usize {
                $arity
            }
        }
    };
}

impl_component_set!(2 => [(S0, 0), (S1, 1)] unlock [1, 0]);
impl_component_set!(3 => [(S0, 0), (S1, 1), (S2, 2)] unlock [2, 1, 0]);
impl_component_set!(4 => [(S0, 0), (S1, 1), (S2, 2), (S3, 3)] unlock [3, 2, 1, 0]);
impl_component_set!(5 => [(S0, 0), (S1, 1), (S2, 2), (S3, 3), (S4, 4)] unlock [4, 3, 2, 1, 0]);

/// Attempt record for [`CompositeStrategy`]: one info per component
#[derive(Clone, Debug)]
pub struct CompositeInfo<IS> {
    strategy_id: StrategyId,
    key: ActionKey,
    instance_id: InstanceId,
    infos: IS,
}

impl<IS> CompositeInfo<IS> {
    pub fn new(key: impl Into<ActionKey>, infos: IS) -> Self {
        Self {
            strategy_id: StrategyId::from("composite"),
            key: key.into(),
            instance_id: InstanceId::new(),
            infos,
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

    pub fn infos(&self) -> &IS {
        &self.infos
    }
}

impl<IS> LockInfo for CompositeInfo<IS>
where
    IS: Clone + Send + Sync + fmt::Debug + 'static,
{
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

/// Applies an ordered tuple of component strategies as one atomic policy
pub struct CompositeStrategy<CS> {
    components: CS,
}

impl<CS: ComponentSet> CompositeStrategy<CS> {
    pub fn new(components: CS) -> Self {
        Self { components }
    }

    /// Number of component strategies
    pub fn arity(&self) -> usize {
        self.components.arity()
    }
}

impl<CS: ComponentSet> Strategy for CompositeStrategy<CS> {
    type Info = CompositeInfo<CS::Infos>;

    fn can_lock(&self, boundary: &BoundaryId, info: &Self::Info) -> Decision {
        self.components.can_lock(boundary, &info.infos)
    }

    fn lock(&self, boundary: &BoundaryId, info: &Self::Info) {
        self.components.lock(boundary, &info.infos);
    }

    fn unlock(&self, boundary: &BoundaryId, info: &Self::Info) {
        self.components.unlock(boundary, &info.infos);
    }

    fn clean_up(&self) {
        self.components.clean_up();
    }

    fn clean_up_boundary(&self, boundary: &BoundaryId) {
        self.components.clean_up_boundary(boundary);
    }

    fn current_locks(&self) -> LockSnapshot {
        self.components.current_locks()
    }
}

#[cfg(test)]
#[path = "composite_tests.rs"]
mod tests;
