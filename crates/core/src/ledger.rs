// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent lock ledger
//!
//! Per-boundary ordered collection of active lock records, dual-indexed by
//! insertion order and by action key. Membership and counts are O(1);
//! removing every record sharing a key is O(k) via the secondary index.
//! Records carry a monotonic sequence number, so mutation stays O(1) and
//! read-side queries sort by sequence to present insertion order.

use crate::boundary::BoundaryId;
use crate::id::{ActionKey, InstanceId};
use crate::strategy::{LockInfo, LockSnapshot};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

struct Sequenced<I> {
    seq: u64,
    info: I,
}

struct BoundaryRecords<I> {
    records: HashMap<InstanceId, Sequenced<I>>,
    by_key: HashMap<ActionKey, HashSet<InstanceId>>,
}

impl<I> BoundaryRecords<I> {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            by_key: HashMap::new(),
        }
    }
}

struct LedgerInner<I> {
    boundaries: HashMap<BoundaryId, BoundaryRecords<I>>,
    next_seq: u64,
}

/// Thread-safe store of active lock records, one table per boundary
///
/// A record exists from successful `lock` until the matching `unlock`;
/// boundaries with zero records are pruned, never left as empty tables.
pub struct LockLedger<I> {
    inner: RwLock<LedgerInner<I>>,
}

impl<I: LockInfo + Clone> LockLedger<I> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                boundaries: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerInner<I>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerInner<I>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a record; O(1) plus index update
    pub fn add(&self, boundary: &BoundaryId, info: I) {
        let mut inner = self.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;

        let table = inner
            .boundaries
            .entry(boundary.clone())
            .or_insert_with(BoundaryRecords::new);

        trace!(%boundary, key = %info.key(), instance = %info.instance_id(), "ledger add");
        table
            .by_key
            .entry(info.key().clone())
            .or_default()
            .insert(info.instance_id().clone());
        table
            .records
            .insert(info.instance_id().clone(), Sequenced { seq, info });
    }

    /// Remove exactly the record matching this info's instance id
    ///
    /// Returns false if no such record exists (benign: double-unlock races
    /// are expected under preemption).
    pub fn remove(&self, boundary: &BoundaryId, info: &I) -> bool {
        let mut inner = self.write();
        let Some(table) = inner.boundaries.get_mut(boundary) else {
            return false;
        };

        let removed = table.records.remove(info.instance_id());
        if let Some(record) = &removed {
            trace!(
                %boundary,
                key = %record.info.key(),
                instance = %info.instance_id(),
                "ledger remove"
            );
            if let Some(ids) = table.by_key.get_mut(record.info.key()) {
                ids.remove(info.instance_id());
                if ids.is_empty() {
                    table.by_key.remove(record.info.key());
                }
            }
        }
        if table.records.is_empty() {
            inner.boundaries.remove(boundary);
        }
        removed.is_some()
    }

    /// Remove all records sharing a key; O(k) via the secondary index
    pub fn remove_all_by_key(&self, boundary: &BoundaryId, key: &ActionKey) -> usize {
        let mut inner = self.write();
        let Some(table) = inner.boundaries.get_mut(boundary) else {
            return 0;
        };

        let Some(ids) = table.by_key.remove(key) else {
            return 0;
        };
        let removed = ids.len();
        for id in ids {
            table.records.remove(&id);
        }
        trace!(%boundary, %key, removed, "ledger remove by key");
        if table.records.is_empty() {
            inner.boundaries.remove(boundary);
        }
        removed
    }

    /// Clear every record in one boundary
    pub fn remove_all_in(&self, boundary: &BoundaryId) {
        let mut inner = self.write();
        if inner.boundaries.remove(boundary).is_some() {
            trace!(%boundary, "ledger boundary cleared");
        }
    }

    /// Clear every record in every boundary
    pub fn remove_all(&self) {
        let mut inner = self.write();
        if !inner.boundaries.is_empty() {
            trace!("ledger cleared");
        }
        inner.boundaries.clear();
    }

    /// Whether any record is active in the boundary
    pub fn contains(&self, boundary: &BoundaryId) -> bool {
        self.read().boundaries.contains_key(boundary)
    }

    /// Whether any record with this key is active in the boundary
    pub fn contains_key(&self, boundary: &BoundaryId, key: &ActionKey) -> bool {
        self.read()
            .boundaries
            .get(boundary)
            .is_some_and(|table| table.by_key.contains_key(key))
    }

    /// Whether the specific attempt is active
    pub fn contains_instance(&self, boundary: &BoundaryId, instance_id: &InstanceId) -> bool {
        self.read()
            .boundaries
            .get(boundary)
            .is_some_and(|table| table.records.contains_key(instance_id))
    }

    /// Number of active records in the boundary
    pub fn count(&self, boundary: &BoundaryId) -> usize {
        self.read()
            .boundaries
            .get(boundary)
            .map_or(0, |table| table.records.len())
    }

    /// Number of active records with this key in the boundary
    pub fn count_by_key(&self, boundary: &BoundaryId, key: &ActionKey) -> usize {
        self.read()
            .boundaries
            .get(boundary)
            .and_then(|table| table.by_key.get(key))
            .map_or(0, HashSet::len)
    }

    /// Active records in insertion order
    pub fn records(&self, boundary: &BoundaryId) -> Vec<I> {
        let inner = self.read();
        let Some(table) = inner.boundaries.get(boundary) else {
            return Vec::new();
        };
        let mut entries: Vec<_> = table.records.values().collect();
        entries.sort_by_key(|record| record.seq);
        entries.into_iter().map(|record| record.info.clone()).collect()
    }

    /// Active records with this key, in relative insertion order
    pub fn records_by_key(&self, boundary: &BoundaryId, key: &ActionKey) -> Vec<I> {
        let inner = self.read();
        let Some(table) = inner.boundaries.get(boundary) else {
            return Vec::new();
        };
        let Some(ids) = table.by_key.get(key) else {
            return Vec::new();
        };
        let mut entries: Vec<_> = ids
            .iter()
            .filter_map(|id| table.records.get(id))
            .collect();
        entries.sort_by_key(|record| record.seq);
        entries.into_iter().map(|record| record.info.clone()).collect()
    }

    /// Boundaries that currently hold at least one record
    pub fn boundaries(&self) -> Vec<BoundaryId> {
        self.read().boundaries.keys().cloned().collect()
    }

    /// Type-erased snapshot of every boundary's records, in insertion order
    pub fn snapshot(&self) -> LockSnapshot {
        let inner = self.read();
        inner
            .boundaries
            .iter()
            .map(|(boundary, table)| {
                let mut entries: Vec<_> = table.records.values().collect();
                entries.sort_by_key(|record| record.seq);
                let infos = entries
                    .into_iter()
                    .map(|record| Arc::new(record.info.clone()) as Arc<dyn LockInfo>)
                    .collect();
                (boundary.clone(), infos)
            })
            .collect()
    }
}

impl<I: LockInfo + Clone> Default for LockLedger<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
