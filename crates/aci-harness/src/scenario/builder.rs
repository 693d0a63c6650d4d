//! Scenario builder API.
//!
//! Declares the kernel's contents and faults up front; the script and the
//! oracle are the only moving parts of a test.

use std::sync::Arc;

use aci_core::{Cis, CisConfig, Transport};
use aci_proto::{Function, Record, cis::ObjectType};

use crate::{
    kernel::{Fault, SimKernel},
    plan::PagePlan,
    scenario::{OracleFn, World},
};

/// Scenario builder.
///
/// Must call `.oracle()` to get a [`RunnableScenario`].
pub struct Scenario {
    name: String,
    config: CisConfig,
    kernel: SimKernel,
}

impl Scenario {
    /// Empty kernel, default CIS configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), config: CisConfig::default(), kernel: SimKernel::new() }
    }

    /// CIS configuration of the session under test.
    pub fn config(mut self, config: CisConfig) -> Self {
        self.config = config;
        self
    }

    /// Kernel version text reported by KERNELVERS.
    pub fn kernel_version(mut self, text: &str) -> Self {
        self.kernel = self.kernel.with_kernel_version(text);
        self
    }

    /// Interface version the stub reports.
    pub fn api_version(mut self, version: u8) -> Self {
        self.kernel = self.kernel.with_api_version(version);
        self
    }

    /// Information objects the kernel knows.
    pub fn objects(self, object_type: ObjectType, records: impl IntoIterator<Item = Record>) -> Self {
        self.kernel.add_objects(object_type, records);
        self
    }

    /// Page split for `object_type`.
    pub fn page_plan(self, object_type: ObjectType, plan: PagePlan) -> Self {
        self.kernel.set_page_plan(object_type, plan);
        self
    }

    /// Replace the first call of `function` after the session opened.
    pub fn fault(self, function: Function, fault: Fault) -> Self {
        self.kernel.inject(function, fault);
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Open a session, run `script`, log off, then run the oracle.
    ///
    /// Faults are armed only once the session is open, so VERSION, KERNELVERS
    /// and LOGON during open never consume them. A script error does not end
    /// the scenario; it is recorded in the world for the oracle to judge.
    pub fn run(self, script: impl FnOnce(&mut World) -> aci_core::Result<()>) -> Result<(), String> {
        let Scenario { name, config, kernel } = self.scenario;
        let faults = kernel.take_faults();
        let kernel = Arc::new(kernel);

        let transport: Arc<dyn Transport> = kernel.clone();
        let mut cis =
            Cis::new(config, transport).map_err(|e| format!("Scenario '{name}': session setup failed: {e}"))?;
        cis.open().map_err(|e| format!("Scenario '{name}': open failed: {e}"))?;
        for (function, fault) in faults {
            kernel.inject(function, fault);
        }

        let mut world = World::new(kernel, cis);
        if let Err(err) = script(&mut world) {
            world.fail(err);
        }
        world.close();

        (self.oracle)(&world).map_err(|e| format!("Scenario '{name}': {e}"))
    }
}
