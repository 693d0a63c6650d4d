//! Scenario tests with mandatory oracles.
//!
//! A scenario configures a [`SimKernel`](crate::kernel::SimKernel), opens a
//! CIS session against it, runs a script and hands the resulting
//! [`World`] to an oracle. A scenario cannot run without an oracle.
//!
//! ```ignore
//! Scenario::new("paged clients")
//!     .objects(ObjectType::Client, fixtures::clients(5)?)
//!     .page_plan(ObjectType::Client, PagePlan::sizes([2, 3]))
//!     .oracle(oracle::all_of(vec![oracle::records_read(5), oracle::follow_up_receives(1)]))
//!     .run(|world| world.read(ObjectType::Client, &InfoSelector::default()).map(|_| ()))?;
//! ```

mod builder;
pub mod oracle;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::World;

/// Verification run against the final world.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
