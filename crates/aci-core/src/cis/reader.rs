//! Paged information reads.
//!
//! An [`InfoReader`] owns a dedicated [`Broker`] session whose conversation
//! carries one information request. The first page is already in the
//! receive buffer when the reader is built; further pages are fetched with
//! plain RECEIVE calls as the caller drains the records.
//!
//! ```text
//!   send(NEW) ──> page 1 ──> RECEIVE ──> page 2 ──> ... ──> page n
//!                   │                      │                  │
//!                 records                records          records
//!                                                             │
//!                                           remaining == 0 ──> EOC
//! ```
//!
//! Each record is copied out of the receive buffer before the next RECEIVE
//! overwrites it. The conversation is ended exactly once: when the declared
//! total has been received, when an error occurs, or when the reader is
//! dropped early.

use std::collections::VecDeque;

use aci_proto::{
    Layout, Record,
    cis::{
        InfoRecord, ObjectType, Page,
        codes::{NOTHING_FOUND, info_error_text},
    },
};
use tracing::{debug, warn};

use crate::{
    broker::Broker,
    error::{AciError, CisError, Result},
};

/// Lazy, forward-only sequence of information records.
#[derive(Debug)]
pub struct InfoReader {
    broker: Broker,
    object_type: ObjectType,
    layout: &'static Layout,
    request: Record,
    pending: VecDeque<InfoRecord>,
    total: u32,
    remaining: u32,
    pages: u32,
    open: bool,
    done: bool,
    deferred: Option<AciError>,
}

impl InfoReader {
    /// Take over `broker` after the request was sent and load the first page.
    ///
    /// On error the conversation is already ended.
    pub(crate) fn start(
        broker: Broker,
        object_type: ObjectType,
        layout: &'static Layout,
        request: Record,
    ) -> Result<Self> {
        let mut reader = Self {
            broker,
            object_type,
            layout,
            request,
            pending: VecDeque::new(),
            total: 0,
            remaining: 0,
            pages: 0,
            open: true,
            done: false,
            deferred: None,
        };
        match reader.load_page() {
            Ok(()) => Ok(reader),
            Err(err) => Err(reader.fail(err)),
        }
    }

    /// Object type being read.
    pub const fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Objects in the whole result, as declared by the first page.
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Objects not yet received from the kernel.
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Pages received so far.
    pub const fn pages(&self) -> u32 {
        self.pages
    }

    /// True while the dedicated conversation is still open.
    pub const fn is_open(&self) -> bool {
        self.open
    }

    fn load_page(&mut self) -> Result<()> {
        let page = Page::parse(self.broker.received(), self.layout)?;
        let header = page.header();
        let first = self.pages == 0;
        self.pages += 1;

        match header.error_code() {
            0 => {},
            NOTHING_FOUND if first => {
                let etb = header.etb_error_code();
                if !etb.is_empty() && etb != "00000000" {
                    debug!(etb_error_code = %etb, etb_error_text = %header.etb_error_text(), "nothing found");
                }
                self.close_when_done();
                return Ok(());
            },
            code => {
                let text = info_error_text(code).map_or_else(|| header.etb_error_text(), str::to_owned);
                return Err(self.cis_error(format!("Broker Information Service Error {code}: {text}"), code, Some(page)));
            },
        }

        if first {
            self.total = header.totobj();
            self.remaining = self.total;
        }
        let curobj = header.curobj();
        if curobj > self.remaining {
            return Err(self.cis_error(
                format!("page {} holds {curobj} objects but only {} remain", self.pages, self.remaining),
                0,
                Some(page),
            ));
        }
        if curobj == 0 && self.remaining > 0 {
            return Err(self.cis_error(
                format!("page {} is empty with {} objects remaining", self.pages, self.remaining),
                0,
                Some(page),
            ));
        }

        for record in page.records() {
            self.pending.push_back(InfoRecord::new(self.object_type, record?));
        }
        self.remaining -= curobj;
        debug!(object_type = %self.object_type, page = self.pages, curobj, remaining = self.remaining, "cis page");

        self.close_when_done();
        Ok(())
    }

    fn cis_error(&self, message: String, code: u32, page: Option<Page<'_>>) -> AciError {
        CisError {
            message,
            code,
            object_type: self.object_type,
            request: self.request.clone(),
            header: page.map(|p| p.header().clone()),
        }
        .into()
    }

    fn close_when_done(&mut self) {
        if self.remaining == 0 {
            if let Err(err) = self.close() {
                self.deferred = Some(err);
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.broker.end_conversation(None)
    }

    fn fail(&mut self, err: AciError) -> AciError {
        if let Err(close_err) = self.close() {
            warn!(error = %close_err, "failed to end information conversation");
        }
        self.pending.clear();
        self.done = true;
        err
    }

    fn fetch(&mut self) -> Result<()> {
        self.broker.receive(None, None, None)?;
        self.load_page()
    }
}

impl Iterator for InfoReader {
    type Item = Result<InfoRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if let Some(err) = self.deferred.take() {
                self.done = true;
                return Some(Err(err));
            }
            if self.done || self.remaining == 0 {
                return None;
            }
            if let Err(err) = self.fetch() {
                return Some(Err(self.fail(err)));
            }
        }
    }
}

impl std::iter::FusedIterator for InfoReader {}

impl Drop for InfoReader {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, object_type = %self.object_type, "failed to end information conversation");
        }
    }
}
