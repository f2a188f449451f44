// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine facade
//!
//! Ties the registry and the per-boundary serializer together behind one
//! constructible context object. `acquire` is the primary entry point: it
//! resolves the strategy, runs the decide-then-record sequence atomically
//! for the boundary, and hands back an [`UnlockHandle`] on success.
//!
//! There is no process-wide singleton; callers construct engines and share
//! them via `Arc` (or clone the handle, which shares the same state).

use crate::boundary::BoundaryId;
use crate::decision::{CancelReason, Decision, PrecedingCancellation};
use crate::id::StrategyId;
use crate::registry::{RegistryError, StrategyRegistry};
use crate::serializer::BoundarySerializer;
use crate::strategy::{ErasedStrategy, LockInfo, LockSnapshot};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of [`Engine::acquire`]
#[derive(Debug)]
pub enum Acquisition {
    /// The lock was granted cleanly
    Granted(UnlockHandle),
    /// Granted, and the listed holders must be cancelled by the caller
    GrantedWithPreemption {
        handle: UnlockHandle,
        cancellation: PrecedingCancellation,
    },
    /// Refused; no state was recorded
    Rejected(CancelReason),
}

impl Acquisition {
    pub fn is_granted(&self) -> bool {
        !matches!(self, Acquisition::Rejected(_))
    }

    /// The unlock handle, if the lock was granted
    pub fn into_handle(self) -> Option<UnlockHandle> {
        match self {
            Acquisition::Granted(handle)
            | Acquisition::GrantedWithPreemption { handle, .. } => Some(handle),
            Acquisition::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&CancelReason> {
        match self {
            Acquisition::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Explicit release token for a granted lock
///
/// Callable from any thread and idempotent: the first `unlock` releases,
/// later calls are no-ops. Dropping the handle does NOT release the lock;
/// release is always explicit, matching the advisory-cancellation model
/// where a preempted holder may still be unwinding when the handle drops.
pub struct UnlockHandle {
    strategy: ErasedStrategy,
    serializer: Arc<BoundarySerializer>,
    boundary: BoundaryId,
    info: Arc<dyn LockInfo>,
    released: AtomicBool,
}

impl UnlockHandle {
    /// Release the lock; safe to call more than once
    pub fn unlock(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.serializer.serialize(&self.boundary, || {
            self.strategy.unlock(&self.boundary, self.info.as_ref());
        });
        debug!(boundary = %self.boundary, key = %self.info.key(), "released lock");
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn boundary(&self) -> &BoundaryId {
        &self.boundary
    }

    pub fn info(&self) -> &dyn LockInfo {
        self.info.as_ref()
    }
}

impl fmt::Debug for UnlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockHandle")
            .field("boundary", &self.boundary)
            .field("key", self.info.key())
            .field("instance_id", self.info.instance_id())
            .field("released", &self.is_released())
            .finish()
    }
}

/// Constructible concurrency-control context
///
/// Cloning shares the registry and serializer, so clones observe the same
/// lock state.
#[derive(Clone, Default)]
pub struct Engine {
    registry: Arc<StrategyRegistry>,
    serializer: Arc<BoundarySerializer>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine around an existing registry
    pub fn with_registry(registry: Arc<StrategyRegistry>) -> Self {
        Self {
            registry,
            serializer: Arc::new(BoundarySerializer::new()),
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Decide and, on success, record a lock atomically for the boundary
    ///
    /// Competing acquires on the same boundary are serialized, so the
    /// decision each one sees reflects every earlier grant.
    pub fn acquire(
        &self,
        boundary: &BoundaryId,
        strategy_id: &StrategyId,
        info: Arc<dyn LockInfo>,
    ) -> Result<Acquisition, RegistryError> {
        let strategy = self.resolve(strategy_id)?;

        let acquisition = self.serializer.serialize(boundary, || {
            match strategy.can_lock(boundary, info.as_ref()) {
                Decision::Success => {
                    strategy.lock(boundary, info.as_ref());
                    Acquisition::Granted(self.handle(&strategy, boundary, &info))
                }
                Decision::SuccessWithPrecedingCancellation(cancellation) => {
                    strategy.lock(boundary, info.as_ref());
                    Acquisition::GrantedWithPreemption {
                        handle: self.handle(&strategy, boundary, &info),
                        cancellation,
                    }
                }
                Decision::Cancel(reason) => Acquisition::Rejected(reason),
            }
        });

        debug!(
            boundary = %boundary,
            strategy = %strategy_id,
            key = %info.key(),
            granted = acquisition.is_granted(),
            "acquire"
        );
        Ok(acquisition)
    }

    fn handle(
        &self,
        strategy: &ErasedStrategy,
        boundary: &BoundaryId,
        info: &Arc<dyn LockInfo>,
    ) -> UnlockHandle {
        UnlockHandle {
            strategy: strategy.clone(),
            serializer: Arc::clone(&self.serializer),
            boundary: boundary.clone(),
            info: Arc::clone(info),
            released: AtomicBool::new(false),
        }
    }

    /// Decision phase only; no state changes
    pub fn can_lock(
        &self,
        boundary: &BoundaryId,
        strategy_id: &StrategyId,
        info: &dyn LockInfo,
    ) -> Result<Decision, RegistryError> {
        let strategy = self.resolve(strategy_id)?;
        Ok(self.serializer.serialize(boundary, || strategy.can_lock(boundary, info)))
    }

    /// Record phase for callers driving the two phases themselves
    pub fn lock(
        &self,
        boundary: &BoundaryId,
        strategy_id: &StrategyId,
        info: &dyn LockInfo,
    ) -> Result<(), RegistryError> {
        let strategy = self.resolve(strategy_id)?;
        self.serializer.serialize(boundary, || strategy.lock(boundary, info));
        Ok(())
    }

    /// Release without a handle; safe when the record is already gone
    pub fn unlock(
        &self,
        boundary: &BoundaryId,
        strategy_id: &StrategyId,
        info: &dyn LockInfo,
    ) -> Result<(), RegistryError> {
        let strategy = self.resolve(strategy_id)?;
        self.serializer.serialize(boundary, || strategy.unlock(boundary, info));
        Ok(())
    }

    /// Snapshot of one strategy's held locks
    pub fn current_locks(
        &self,
        strategy_id: &StrategyId,
    ) -> Result<LockSnapshot, RegistryError> {
        Ok(self.resolve(strategy_id)?.current_locks())
    }

    /// Clear every registered strategy's state
    ///
    /// Each known boundary is swept under its serializer mutex, so a
    /// decision in flight finishes before its boundary is cleared. The
    /// final sweep catches state for boundaries with no mutex allocated;
    /// such boundaries cannot have serialized work in flight.
    pub fn clean_up(&self) {
        warn!("forced clean-up of all strategies");
        for boundary in self.serializer.boundaries() {
            self.serializer.serialize(&boundary, || {
                self.registry.clean_up_boundary(&boundary);
            });
        }
        self.registry.clean_up();
    }

    /// Clear one boundary's state across all registered strategies
    pub fn clean_up_boundary(&self, boundary: &BoundaryId) {
        warn!(%boundary, "forced clean-up of boundary");
        self.serializer.serialize(boundary, || {
            self.registry.clean_up_boundary(boundary);
        });
        self.serializer.forget(boundary);
    }

    /// Run `f` against a substitute engine, then force-clean it
    ///
    /// Keeps test scenarios isolated without any global state to swap.
    pub fn scoped<R>(substitute: Engine, f: impl FnOnce(&Engine) -> R) -> R {
        let result = f(&substitute);
        substitute.clean_up();
        result
    }

    fn resolve(&self, strategy_id: &StrategyId) -> Result<ErasedStrategy, RegistryError> {
        self.registry.resolve(strategy_id)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("strategies", &self.registry.strategy_count())
            .field("boundaries", &self.serializer.tracked_boundaries())
            .finish()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
