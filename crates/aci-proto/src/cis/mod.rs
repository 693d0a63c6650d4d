//! Command & Information Service (CIS) records.
//!
//! A CIS exchange sends a [`request::CommandRequest`] or
//! [`request::InfoRequest`] and receives a buffer that starts with a
//! [`header::CisHeader`]. Information responses pack `curobj` fixed-width
//! [`info`] records after the header; further pages are fetched with plain
//! RECEIVE calls on the same conversation.

pub mod codes;
pub mod header;
pub mod info;
pub mod page;
pub mod request;

pub use codes::{CisOption, Command, ObjectType};
pub use header::{CisHeader, HEADER_LEN};
pub use info::InfoRecord;
pub use page::{Page, PageBuilder};
pub use request::{CommandRequest, InfoRequest};
