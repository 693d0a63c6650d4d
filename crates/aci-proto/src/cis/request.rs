//! CIS command and information request records.
//!
//! Both requests travel in the ACI send buffer. Empty text selectors mean
//! "no filter"; a set selector restricts what the kernel returns.

use std::ops::{Deref, DerefMut};

use once_cell::sync::OnceCell;

use crate::{
    errors::Result,
    field::{Field, Format},
    layout::Layout,
    record::Record,
    value::Value,
};

/// Highest CIS interface version this crate knows.
pub const CIS_VERSION_MAX: u16 = 10;

/// CIS interface version used against kernels older than version 10.
pub const CIS_VERSION_LEGACY: u16 = 8;

/// CIS interface version that introduced UOW statistics.
pub const CIS_VERSION_UOW_STATISTICS: u16 = 9;

#[rustfmt::skip]
const COMMAND_FIELDS: &[Field] = &[
    Field::uint("version", 2).input(),
    Field::uint("object_type", 2).input().format(Format::ObjectType),
    Field::uint("command", 2).input().format(Format::Command),
    Field::uint("option", 2).input().format(Format::CisOption),
    Field::bytes("puid", 28),
    Field::text("uowid", 16).input(),
    Field::text("topic", 96).input(),
    Field::text("uid", 32).input(),
    Field::text("token", 32).input(),
    Field::text("server_class", 32).input(),
    Field::text("server", 32).input(),
    Field::text("service", 32).input(),
    Field::filler("reserved", 32),
    Field::text("conv_id", 16).input().at(340),
    Field::text("transportid", 3).input(),
    Field::uint("exclude_attach", 1).input(),
    Field::uint("seqno", 4).input(),
    Field::uint("error_number", 4).input(),
];

#[rustfmt::skip]
const INFO_FIELDS: &[Field] = &[
    Field::uint("block_length", 4),
    Field::uint("version", 2),
    Field::filler("reserved1", 2),
    Field::uint("object_type", 2).format(Format::ObjectType),
    Field::text("uid", 32),
    Field::bytes("puid", 28),
    Field::text("token", 32),
    Field::text("server_class", 32),
    Field::text("server", 32),
    Field::text("service", 32),
    Field::text("conv_id", 16),
    Field::filler("reserved2", 2),
    Field::text("uowid", 16).at(216),
    Field::uint("uowstatus", 1).format(Format::UowStatus),
    Field::text("userstatus", 32),
    Field::text("recvuid", 32),
    Field::text("recvtoken", 32),
    Field::text("recvserver", 32),
    Field::text("recvservice", 32),
    Field::text("recvclass", 32),
    Field::filler("reserved3", 3),
    Field::text("topic", 96).at(428),
    Field::text("publicationid", 16),
    Field::uint("subscriptiontype", 2),
    Field::filler("reserved4", 2),
    Field::uint("conv_type", 2),
    Field::filler("reserved5", 2),
];

const COMMAND_TEXT_SELECTORS: &[&str] =
    &["conv_id", "server_class", "server", "service", "token", "topic", "transportid", "uid", "uowid"];

const INFO_TEXT_SELECTORS: &[&str] = &[
    "uid",
    "token",
    "server_class",
    "server",
    "service",
    "conv_id",
    "uowid",
    "userstatus",
    "recvuid",
    "recvtoken",
    "recvserver",
    "recvservice",
    "recvclass",
    "topic",
    "publicationid",
];

static COMMAND: OnceCell<Layout> = OnceCell::new();
static INFO: OnceCell<Layout> = OnceCell::new();

/// Command request layout (368 bytes).
pub fn command_layout() -> Result<&'static Layout> {
    COMMAND.get_or_try_init(|| Layout::define("Cisreq", COMMAND_FIELDS))
}

/// Information request layout (548 bytes).
pub fn info_layout() -> Result<&'static Layout> {
    INFO.get_or_try_init(|| Layout::define("Infreq", INFO_FIELDS))
}

fn clear(record: &mut Record, selectors: &[&str], version: u16) -> Result<()> {
    record.set("version", version)?;
    for name in selectors {
        record.set(name, Value::Text(String::new()))?;
    }
    Ok(())
}

/// Administrative command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest(Record);

impl CommandRequest {
    /// Fresh request at CIS interface `version` with all selectors empty.
    pub fn new(version: u16) -> Result<Self> {
        let mut req = Self(Record::new(command_layout()?));
        req.reset(version)?;
        Ok(req)
    }

    /// Clear text selectors and the sequence number, set `version`.
    pub fn reset(&mut self, version: u16) -> Result<()> {
        clear(&mut self.0, COMMAND_TEXT_SELECTORS, version)?;
        self.0.set("seqno", 0u32)
    }

    /// Underlying record.
    pub fn into_record(self) -> Record {
        self.0
    }
}

impl Deref for CommandRequest {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.0
    }
}

impl DerefMut for CommandRequest {
    fn deref_mut(&mut self) -> &mut Record {
        &mut self.0
    }
}

/// Information request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRequest(Record);

impl InfoRequest {
    /// Fresh request at CIS interface `version` that asks for at most
    /// `block_length` bytes of records per page.
    pub fn new(version: u16, block_length: u32) -> Result<Self> {
        let mut req = Self(Record::new(info_layout()?));
        req.reset(version)?;
        req.0.set("block_length", block_length)?;
        Ok(req)
    }

    /// Clear text selectors, set `version`.
    pub fn reset(&mut self, version: u16) -> Result<()> {
        clear(&mut self.0, INFO_TEXT_SELECTORS, version)
    }

    /// Underlying record.
    pub fn into_record(self) -> Record {
        self.0
    }
}

impl Deref for InfoRequest {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.0
    }
}

impl DerefMut for InfoRequest {
    fn deref_mut(&mut self) -> &mut Record {
        &mut self.0
    }
}
