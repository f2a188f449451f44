// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-boundary serialization primitive
//!
//! One mutual-exclusion primitive per boundary identifier. All ledger and
//! strategy operations for a boundary are funneled through its mutex, held
//! for the duration of one `can_lock`/`lock`/`unlock`/`clean_up` call.
//! Distinct boundaries never contend.

use crate::boundary::BoundaryId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, TryLockError};

/// Serializes all engine operations on a given boundary
///
/// Critical sections are short and CPU-bound; callers are never parked
/// waiting for work to finish, only for a concurrent map update.
pub struct BoundarySerializer {
    guards: Mutex<HashMap<BoundaryId, Arc<Mutex<()>>>>,
}

impl BoundarySerializer {
    pub fn new() -> Self {
        Self {
            guards: Mutex::new(HashMap::new()),
        }
    }

    fn guard_for(&self, boundary: &BoundaryId) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().unwrap_or_else(|e| e.into_inner());
        guards
            .entry(boundary.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding this boundary's mutex
    ///
    /// Concurrent `can_lock`-then-`lock` sequences on one boundary cannot
    /// both observe "available" when wrapped in a single `serialize` call.
    pub fn serialize<R>(&self, boundary: &BoundaryId, f: impl FnOnce() -> R) -> R {
        // A guard fetched from the map can be pruned by `forget` before it
        // is locked. Re-check after locking; on a mismatch the map holds a
        // replacement mutex, so contend on that one instead.
        loop {
            let guard = self.guard_for(boundary);
            let held = guard.lock().unwrap_or_else(|e| e.into_inner());
            if Arc::ptr_eq(&guard, &self.guard_for(boundary)) {
                let result = f();
                drop(held);
                return result;
            }
            drop(held);
        }
    }

    /// Drop the mutex kept for a boundary (used when a boundary is pruned)
    ///
    /// Prunes only an idle mutex: while the boundary's section is held the
    /// entry stays put, so rivals keep contending on the same lock. The map
    /// mutex is held across the check and the removal, and `serialize`
    /// re-validates after locking, so a caller holding a stale Arc never
    /// runs alongside one holding the replacement.
    pub fn forget(&self, boundary: &BoundaryId) {
        let mut guards = self.guards.lock().unwrap_or_else(|e| e.into_inner());
        let Some(guard) = guards.get(boundary).cloned() else {
            return;
        };
        let _held = match guard.try_lock() {
            Ok(held) => held,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        guards.remove(boundary);
    }

    /// Number of boundaries that currently have a mutex allocated
    pub fn tracked_boundaries(&self) -> usize {
        self.guards.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Boundaries that currently have a mutex allocated
    pub fn boundaries(&self) -> Vec<BoundaryId> {
        self.guards
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for BoundarySerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "serializer_tests.rs"]
mod tests;
