//! Broker ACI session layer
//!
//! Drives conversations, units of work and CIS queries over the wire
//! layouts of `aci-proto`.
//!
//! # Architecture
//!
//! Every session owns one control block and its buffers. Calls go through
//! a [`Transport`], a single blocking round trip to the broker stub; the
//! library never reaches for ambient state unless the caller asks for the
//! process-wide transport explicitly.
//!
//! The control block is sticky: each operation writes only the fields it
//! owns and everything else keeps its previous value. Concurrent work needs
//! separate sessions, which is also how paged CIS reads stay off the
//! caller's conversation.
//!
//! # Components
//!
//! - [`transport`]: Stub boundary and the process-wide slot
//! - [`control`]: Control block, `invoke()` and error classification
//! - [`broker`]: Conversation and UOW operations
//! - [`cis`]: CIS sessions, commands, single fetches and paged reads
//! - [`explorer`]: Service and client report built on CIS reads
//! - [`config`]: Session settings
//! - [`error`]: Error types
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod broker;
pub mod cis;
pub mod config;
pub mod control;
pub mod error;
pub mod explorer;
pub mod transport;

pub use broker::{Broker, KernelInfo};
pub use cis::{Cis, CommandSelector, InfoReader, InfoSelector};
pub use config::{CisConfig, CisService, SessionConfig};
pub use control::ControlBlock;
pub use error::{AciError, CisError, Result};
pub use transport::Transport;
