// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Latch concurrency-control engine
//!
//! Decides, per named boundary, whether an operation may run: admitted,
//! rejected, or admitted while flagging lower-ranked holders for
//! cancellation. Policies are pluggable strategies resolved through a
//! type-erased registry; an engine facade makes each decide-then-record
//! sequence atomic per boundary.

mod boundary;
mod decision;
mod engine;
mod id;
mod ledger;
mod registry;
mod serializer;
pub mod strategy;

pub use boundary::{BoundaryId, BoundaryValue};
pub use decision::{CancelReason, CancelTarget, Decision, PrecedingCancellation};
pub use engine::{Acquisition, Engine, UnlockHandle};
pub use id::{ActionKey, InstanceId, SequentialInstanceIds, StrategyId};
pub use ledger::LockLedger;
pub use registry::{RegistryError, StrategyEntry, StrategyRegistry};
pub use serializer::BoundarySerializer;
pub use strategy::{LockInfo, LockSnapshot, Strategy};
