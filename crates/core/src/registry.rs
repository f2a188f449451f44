// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy registry
//!
//! Maps stable [`StrategyId`]s to type-erased strategy instances. Lookups
//! hand out cheap clones of the erased handle; the registry itself is the
//! single owner of the id space and refuses duplicate registrations.

use crate::boundary::BoundaryId;
use crate::id::StrategyId;
use crate::strategy::{ErasedStrategy, Strategy};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::debug;

/// Registration failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("strategy '{0}' is already registered")]
    AlreadyRegistered(StrategyId),

    #[error("strategy '{0}' is not registered")]
    NotRegistered(StrategyId),

    #[error("duplicate strategy id '{0}' within one registration batch")]
    DuplicateInBatch(StrategyId),
}

/// One registered strategy plus bookkeeping
#[derive(Debug, Clone)]
pub struct StrategyEntry {
    strategy: ErasedStrategy,
    registered_at: Instant,
}

impl StrategyEntry {
    fn new(strategy: ErasedStrategy) -> Self {
        Self {
            strategy,
            registered_at: Instant::now(),
        }
    }

    pub fn strategy(&self) -> &ErasedStrategy {
        &self.strategy
    }

    pub fn registered_at(&self) -> Instant {
        self.registered_at
    }
}

/// Thread-safe id-to-strategy map
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    entries: RwLock<HashMap<StrategyId, StrategyEntry>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<StrategyId, StrategyEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<StrategyId, StrategyEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a concrete strategy under `id`
    ///
    /// Fails without side effects when the id is taken.
    pub fn register<S: Strategy>(
        &self,
        id: impl Into<StrategyId>,
        strategy: S,
    ) -> Result<(), RegistryError> {
        self.register_erased(id, ErasedStrategy::new(strategy))
    }

    /// Register an already-erased strategy under `id`
    pub fn register_erased(
        &self,
        id: impl Into<StrategyId>,
        strategy: ErasedStrategy,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        let mut entries = self.write_entries();
        if entries.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        debug!(strategy = %id, kind = strategy.strategy_type_name(), "registered strategy");
        entries.insert(id, StrategyEntry::new(strategy));
        Ok(())
    }

    /// Register a batch atomically
    ///
    /// Either every pair lands or none does: a duplicate id within the
    /// batch, or a collision with an existing registration, rejects the
    /// whole batch and leaves the registry untouched.
    pub fn register_all(
        &self,
        batch: Vec<(StrategyId, ErasedStrategy)>,
    ) -> Result<(), RegistryError> {
        let mut entries = self.write_entries();

        let mut seen = std::collections::HashSet::new();
        for (id, _) in &batch {
            if !seen.insert(id.clone()) {
                return Err(RegistryError::DuplicateInBatch(id.clone()));
            }
            if entries.contains_key(id) {
                return Err(RegistryError::AlreadyRegistered(id.clone()));
            }
        }

        for (id, strategy) in batch {
            debug!(strategy = %id, kind = strategy.strategy_type_name(), "registered strategy");
            entries.insert(id, StrategyEntry::new(strategy));
        }
        Ok(())
    }

    /// Look up a strategy; the returned handle shares the registered instance
    pub fn resolve(&self, id: &StrategyId) -> Result<ErasedStrategy, RegistryError> {
        self.read_entries()
            .get(id)
            .map(|entry| entry.strategy.clone())
            .ok_or_else(|| RegistryError::NotRegistered(id.clone()))
    }

    /// Full entry for diagnostics
    pub fn entry(&self, id: &StrategyId) -> Option<StrategyEntry> {
        self.read_entries().get(id).cloned()
    }

    pub fn is_registered(&self, id: &StrategyId) -> bool {
        self.read_entries().contains_key(id)
    }

    /// Remove one registration; the strategy's held locks are untouched
    pub fn unregister(&self, id: &StrategyId) -> Result<ErasedStrategy, RegistryError> {
        let mut entries = self.write_entries();
        match entries.remove(id) {
            Some(entry) => {
                debug!(strategy = %id, "unregistered strategy");
                Ok(entry.strategy)
            }
            None => Err(RegistryError::NotRegistered(id.clone())),
        }
    }

    /// Drop every registration without touching strategy state
    pub fn remove_all(&self) {
        self.write_entries().clear();
    }

    pub fn strategy_count(&self) -> usize {
        self.read_entries().len()
    }

    pub fn registered_ids(&self) -> Vec<StrategyId> {
        self.read_entries().keys().cloned().collect()
    }

    /// Ask every registered strategy to drop all held state
    pub fn clean_up(&self) {
        for entry in self.read_entries().values() {
            entry.strategy.clean_up();
        }
    }

    /// Ask every registered strategy to drop state for one boundary
    pub fn clean_up_boundary(&self, boundary: &BoundaryId) {
        for entry in self.read_entries().values() {
            entry.strategy.clean_up_boundary(boundary);
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
