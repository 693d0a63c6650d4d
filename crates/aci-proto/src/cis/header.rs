//! CIS response header.
//!
//! Every receive buffer returned for a CIS request, including the buffers of
//! follow-up RECEIVE calls, starts with this 100-byte header.

use once_cell::sync::OnceCell;

use crate::{
    errors::Result,
    field::{Field, Format},
    layout::Layout,
    record::Record,
};

/// Header length in bytes.
pub const HEADER_LEN: usize = 100;

#[rustfmt::skip]
const FIELDS: &[Field] = &[
    Field::uint("error_code", 4),
    Field::uint("totobj", 4),
    Field::uint("curobj", 4),
    Field::uint("max_sc_len", 4),
    Field::uint("max_sn_len", 4),
    Field::uint("max_sv_len", 4),
    Field::uint("max_uid_len", 4),
    Field::uint("max_tk_len", 4),
    Field::uint("max_topic_len", 4),
    Field::uint("requesttime", 4).format(Format::LocalTime),
    Field::filler("reserved", 4),
    Field::text("etb_error_code", 8).at(44),
    Field::text("etb_error_text", 40),
    Field::uint("max_ppc_lib_len", 4),
    Field::uint("max_ppc_pgm_len", 4),
];

static LAYOUT: OnceCell<Layout> = OnceCell::new();

/// Header layout.
pub fn layout() -> Result<&'static Layout> {
    LAYOUT.get_or_try_init(|| Layout::define("Cishdr", FIELDS))
}

/// Decoded copy of a response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CisHeader(Record);

impl CisHeader {
    /// Copy the header from the start of a receive buffer.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        Ok(Self(Record::from_bytes(layout()?, buf)?))
    }

    /// Empty header, for building responses.
    pub fn new() -> Result<Self> {
        Ok(Self(Record::new(layout()?)))
    }

    fn u32_field(&self, name: &str) -> u32 {
        // Every header integer is four bytes wide.
        self.0.uint(name).map_or(0, |n| n as u32)
    }

    /// CIS result code, 0 on success.
    pub fn error_code(&self) -> u32 {
        self.u32_field("error_code")
    }

    /// Objects in the whole result, across all pages.
    pub fn totobj(&self) -> u32 {
        self.u32_field("totobj")
    }

    /// Objects in this page.
    pub fn curobj(&self) -> u32 {
        self.u32_field("curobj")
    }

    /// Secondary kernel error code.
    pub fn etb_error_code(&self) -> String {
        self.0.text("etb_error_code").unwrap_or_default()
    }

    /// Secondary kernel error text.
    pub fn etb_error_text(&self) -> String {
        self.0.text("etb_error_text").unwrap_or_default()
    }

    /// Underlying record.
    pub const fn record(&self) -> &Record {
        &self.0
    }

    /// Mutable underlying record.
    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn header_length() {
        assert_eq!(layout().unwrap().len(), HEADER_LEN);
    }

    #[test]
    fn parse_counts() {
        let mut buf = vec![0u8; 128];
        buf[..12].copy_from_slice(&hex!("00000000 00000005 00000002"));
        buf[44..52].copy_from_slice(b"00000000");
        let hdr = CisHeader::parse(&buf).unwrap();
        assert_eq!(hdr.error_code(), 0);
        assert_eq!(hdr.totobj(), 5);
        assert_eq!(hdr.curobj(), 2);
        assert_eq!(hdr.etb_error_code(), "00000000");
        assert_eq!(hdr.etb_error_text(), "");
    }

    #[test]
    fn short_buffer_rejected() {
        assert!(CisHeader::parse(&[0u8; 99]).is_err());
    }
}
