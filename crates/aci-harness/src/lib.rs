//! Deterministic test harness for broker ACI sessions.
//!
//! An in-memory model kernel implementing the session layer's `Transport`,
//! information record fixtures, seeded page plans and an oracle-checked
//! scenario runner.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod kernel;
pub mod plan;
pub mod scenario;

pub use kernel::{Call, CommandCall, Fault, SimKernel};
pub use plan::PagePlan;
pub use scenario::{RunnableScenario, Scenario, World};
