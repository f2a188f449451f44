// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types for strategies, keys, and lock attempts

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier under which a strategy is registered
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StrategyId(pub String);

impl StrategyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StrategyId {
    fn from(s: String) -> Self {
        StrategyId(s)
    }
}

impl From<&str> for StrategyId {
    fn from(s: &str) -> Self {
        StrategyId(s.to_string())
    }
}

/// Key grouping related lock attempts (e.g. a logical operation name)
///
/// Two attempts sharing a key are subject to same-key exclusion rules but
/// remain distinct records (see [`InstanceId`]).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionKey(pub String);

impl ActionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ActionKey {
    fn from(s: String) -> Self {
        ActionKey(s)
    }
}

impl From<&str> for ActionKey {
    fn from(s: &str) -> Self {
        ActionKey(s.to_string())
    }
}

/// Identifier distinguishing each individual lock attempt
///
/// Unique per attempt: two attempts with the same [`ActionKey`] still carry
/// distinct instance ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    /// Create a fresh, globally unique instance id
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        InstanceId(s)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        InstanceId(s.to_string())
    }
}

/// Sequential instance-id generator for deterministic tests
#[derive(Clone)]
pub struct SequentialInstanceIds {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialInstanceIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next(&self) -> InstanceId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        InstanceId(format!("{}-{}", self.prefix, n))
    }
}

impl Default for SequentialInstanceIds {
    fn default() -> Self {
        Self::new("attempt")
    }
}
