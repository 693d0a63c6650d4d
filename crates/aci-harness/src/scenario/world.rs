//! World state for scenario execution.
//!
//! Holds the model kernel, the CIS session under test and everything the
//! script read, so oracles can compare what the client saw with what the
//! kernel recorded.

use std::sync::Arc;

use aci_core::{AciError, Cis, InfoSelector};
use aci_proto::cis::{InfoRecord, ObjectType};

use crate::kernel::SimKernel;

/// Final and intermediate state of one scenario.
pub struct World {
    kernel: Arc<SimKernel>,
    cis: Option<Cis>,
    records: Vec<InfoRecord>,
    failure: Option<AciError>,
    close_failure: Option<AciError>,
}

impl World {
    pub(crate) fn new(kernel: Arc<SimKernel>, cis: Cis) -> Self {
        Self { kernel, cis: Some(cis), records: Vec::new(), failure: None, close_failure: None }
    }

    /// The model kernel.
    pub fn kernel(&self) -> &SimKernel {
        &self.kernel
    }

    /// The open CIS session, `None` once the scenario closed it.
    pub fn cis(&mut self) -> Option<&mut Cis> {
        self.cis.as_mut()
    }

    /// Read all objects of `object_type` matching `selector`, keeping them
    /// in the world. Returns how many were read.
    ///
    /// Records read before an error are kept.
    pub fn read(&mut self, object_type: ObjectType, selector: &InfoSelector) -> aci_core::Result<usize> {
        let cis = self.cis.as_mut().ok_or_else(|| AciError::Config("session already closed".to_owned()))?;
        let mut count = 0;
        for record in cis.iread(object_type, selector)? {
            self.records.push(record?);
            count += 1;
        }
        Ok(count)
    }

    /// Every record read so far.
    pub fn records(&self) -> &[InfoRecord] {
        &self.records
    }

    /// Error the script returned, if any.
    pub fn failure(&self) -> Option<&AciError> {
        self.failure.as_ref()
    }

    /// Error from logging off at the end of the scenario, if any.
    pub fn close_failure(&self) -> Option<&AciError> {
        self.close_failure.as_ref()
    }

    pub(crate) fn fail(&mut self, err: AciError) {
        self.failure = Some(err);
    }

    /// Log off. Later calls do nothing.
    pub(crate) fn close(&mut self) {
        if let Some(cis) = self.cis.take() {
            if let Err(err) = cis.close() {
                self.close_failure = Some(err);
            }
        }
    }
}
