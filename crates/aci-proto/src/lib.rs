//! Wire layouts for the broker Advanced Communication Interface (ACI).
//!
//! Every ACI call exchanges one fixed-layout control block plus a send, a
//! receive and an error-text buffer with the broker stub. This crate
//! describes those layouts and moves typed values in and out of them. It
//! performs no I/O.
//!
//! # Layers
//!
//! - [`field`] / [`layout`] / [`record`]: the generic fixed-offset codec.
//!   Layouts are `const` field tables checked once at definition time.
//! - [`control_block`]: the control block, ten interface versions, each one
//!   a strict prefix of the next.
//! - [`cis`]: command and information requests, the response header, the
//!   info record layouts and page framing.
//! - [`codes`], [`kernel_errors`]: closed enumerations and error texts.
//! - [`display`], [`dump`]: rendering for humans and trace output.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cis;
pub mod codes;
pub mod control_block;
pub mod display;
pub mod dump;
pub mod errors;
pub mod field;
pub mod kernel_errors;
pub mod layout;
pub mod record;
pub mod value;

pub use codes::{AciOption, ConvStat, ErrorCode, Function, UowStatus};
pub use errors::{LayoutError, Result};
pub use field::{Direction, Field, Format, Kind};
pub use layout::Layout;
pub use record::Record;
pub use value::Value;
