//! Boundary to the broker stub.
//!
//! One blocking round trip per call. All four buffers are fixed-size and
//! mutated in place; the return value is the stub's native return code,
//! 0 on local success. Kernel-level failures are reported inside the
//! control block, not through the return code.
//!
//! Production binds the vendor stub; tests use the model kernel from
//! `aci-harness`. Any closure with the right shape is a transport too.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{AciError, Result};

/// A broker stub.
pub trait Transport: Send + Sync {
    /// Perform one ACI call.
    fn call(&self, control: &mut [u8], send: &mut [u8], receive: &mut [u8], errtext: &mut [u8]) -> i32;
}

impl<F> Transport for F
where
    F: Fn(&mut [u8], &mut [u8], &mut [u8], &mut [u8]) -> i32 + Send + Sync,
{
    fn call(&self, control: &mut [u8], send: &mut [u8], receive: &mut [u8], errtext: &mut [u8]) -> i32 {
        self(control, send, receive, errtext)
    }
}

static INSTALLED: OnceCell<Arc<dyn Transport>> = OnceCell::new();

/// Install the process-wide transport. May succeed once per process.
pub fn install(transport: Arc<dyn Transport>) -> Result<()> {
    INSTALLED.set(transport).map_err(|_| AciError::TransportAlreadyInstalled)
}

/// The process-wide transport.
pub fn installed() -> Result<Arc<dyn Transport>> {
    INSTALLED.get().cloned().ok_or(AciError::TransportNotInstalled)
}
