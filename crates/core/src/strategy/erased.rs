// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Type-erased strategy wrapper
//!
//! One registry must hold many unrelated concrete strategy types. The
//! erasure happens here, at construction time, so call sites building the
//! wrapper keep compile-time type checking; inside, info records are
//! downcast back to the concrete type the wrapped strategy expects.

use crate::boundary::BoundaryId;
use crate::decision::{CancelReason, Decision};
use crate::strategy::{LockInfo, LockSnapshot, Strategy};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Object-safe shim over a concrete [`Strategy`]
trait DynStrategy: Send + Sync {
    fn strategy_type_name(&self) -> &'static str;
    fn info_type_name(&self) -> &'static str;
    fn can_lock(&self, boundary: &BoundaryId, info: &dyn LockInfo) -> Decision;
    fn lock(&self, boundary: &BoundaryId, info: &dyn LockInfo);
    fn unlock(&self, boundary: &BoundaryId, info: &dyn LockInfo);
    fn clean_up(&self);
    fn clean_up_boundary(&self, boundary: &BoundaryId);
    fn current_locks(&self) -> LockSnapshot;
}

struct Erased<S: Strategy> {
    inner: Arc<S>,
}

impl<S: Strategy> Erased<S> {
    fn downcast<'a>(&self, info: &'a dyn LockInfo) -> Option<&'a S::Info> {
        info.as_any().downcast_ref::<S::Info>()
    }
}

impl<S: Strategy> DynStrategy for Erased<S> {
    fn strategy_type_name(&self) -> &'static str {
        type_name::<S>()
    }

    fn info_type_name(&self) -> &'static str {
        type_name::<S::Info>()
    }

    fn can_lock(&self, boundary: &BoundaryId, info: &dyn LockInfo) -> Decision {
        match self.downcast(info) {
            Some(typed) => self.inner.can_lock(boundary, typed),
            None => {
                warn!(
                    expected = self.info_type_name(),
                    got = %info.debug_description(),
                    "can_lock called with mismatched info type"
                );
                Decision::Cancel(CancelReason::StrategyMismatch {
                    expected: self.info_type_name(),
                })
            }
        }
    }

    fn lock(&self, boundary: &BoundaryId, info: &dyn LockInfo) {
        match self.downcast(info) {
            Some(typed) => self.inner.lock(boundary, typed),
            None => warn!(
                expected = self.info_type_name(),
                "lock called with mismatched info type; ignoring"
            ),
        }
    }

    fn unlock(&self, boundary: &BoundaryId, info: &dyn LockInfo) {
        match self.downcast(info) {
            Some(typed) => self.inner.unlock(boundary, typed),
            None => warn!(
                expected = self.info_type_name(),
                "unlock called with mismatched info type; ignoring"
            ),
        }
    }

    fn clean_up(&self) {
        self.inner.clean_up();
    }

    fn clean_up_boundary(&self, boundary: &BoundaryId) {
        self.inner.clean_up_boundary(boundary);
    }

    fn current_locks(&self) -> LockSnapshot {
        self.inner.current_locks()
    }
}

/// Cheap-clone handle to a type-erased strategy instance
#[derive(Clone)]
pub struct ErasedStrategy {
    inner: Arc<dyn DynStrategy>,
}

impl ErasedStrategy {
    pub fn new<S: Strategy>(strategy: S) -> Self {
        Self::from_arc(Arc::new(strategy))
    }

    /// Erase an already-shared strategy without another allocation
    pub fn from_arc<S: Strategy>(strategy: Arc<S>) -> Self {
        Self {
            inner: Arc::new(Erased { inner: strategy }),
        }
    }

    /// Concrete type name of the wrapped strategy
    pub fn strategy_type_name(&self) -> &'static str {
        self.inner.strategy_type_name()
    }

    /// Concrete type name of the info records the strategy expects
    pub fn info_type_name(&self) -> &'static str {
        self.inner.info_type_name()
    }

    pub fn can_lock(&self, boundary: &BoundaryId, info: &dyn LockInfo) -> Decision {
        self.inner.can_lock(boundary, info)
    }

    pub fn lock(&self, boundary: &BoundaryId, info: &dyn LockInfo) {
        self.inner.lock(boundary, info);
    }

    pub fn unlock(&self, boundary: &BoundaryId, info: &dyn LockInfo) {
        self.inner.unlock(boundary, info);
    }

    pub fn clean_up(&self) {
        self.inner.clean_up();
    }

    pub fn clean_up_boundary(&self, boundary: &BoundaryId) {
        self.inner.clean_up_boundary(boundary);
    }

    pub fn current_locks(&self) -> LockSnapshot {
        self.inner.current_locks()
    }
}

impl fmt::Debug for ErasedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedStrategy")
            .field("strategy", &self.strategy_type_name())
            .field("info", &self.info_type_name())
            .finish()
    }
}

#[cfg(test)]
#[path = "erased_tests.rs"]
mod tests;
