// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Type-erased boundary identifiers
//!
//! A boundary names the scope within which exclusion and priority rules are
//! evaluated. Any hashable value can act as a boundary id; equality is
//! type-aware, so two different concrete types with equal representations
//! are never considered the same boundary.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A value usable as a boundary identifier
///
/// Blanket-implemented for every `Eq + Hash + Debug + Send + Sync + 'static`
/// type, so callers construct boundaries from their own domain types.
pub trait BoundaryValue: Any + Send + Sync + fmt::Debug {
    fn dyn_eq(&self, other: &dyn BoundaryValue) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn as_any(&self) -> &dyn Any;
}

impl<T> BoundaryValue for T
where
    T: Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn dyn_eq(&self, other: &dyn BoundaryValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        // Hash the concrete type first so equal representations of
        // different types land in different buckets.
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Opaque, hashable, type-erased scope identifier
///
/// Cheap to clone; the wrapped value is shared behind an `Arc`.
#[derive(Clone)]
pub struct BoundaryId(Arc<dyn BoundaryValue>);

impl BoundaryId {
    pub fn new(value: impl BoundaryValue) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the wrapped value if it is of type `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for BoundaryId {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}

impl Eq for BoundaryId {}

impl Hash for BoundaryId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundaryId({:?})", self.0)
    }
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&str> for BoundaryId {
    fn from(s: &str) -> Self {
        BoundaryId::new(s.to_string())
    }
}

impl From<String> for BoundaryId {
    fn from(s: String) -> Self {
        BoundaryId::new(s)
    }
}
