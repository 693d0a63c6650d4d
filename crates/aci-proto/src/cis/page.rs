//! CIS response pages: a header followed by `curobj` packed records.

use bytes::{BufMut, Bytes, BytesMut};

use super::header::{CisHeader, HEADER_LEN};
use crate::{
    errors::{LayoutError, Result},
    layout::Layout,
    record::Record,
};

/// A received page, borrowed from the receive buffer.
#[derive(Debug)]
pub struct Page<'a> {
    header: CisHeader,
    body: &'a [u8],
    layout: &'static Layout,
}

impl<'a> Page<'a> {
    /// Split `buf` into header and `curobj` records of `layout`.
    ///
    /// Bytes past the last record are ignored; a buffer too short for the
    /// declared count is an error.
    pub fn parse(buf: &'a [u8], layout: &'static Layout) -> Result<Self> {
        if layout.is_empty() {
            return Err(LayoutError::InvalidWidth { layout: layout.name(), field: "record", width: 0 });
        }
        let header = CisHeader::parse(buf)?;
        let count = usize::try_from(header.curobj()).unwrap_or(usize::MAX);
        let required = count.saturating_mul(layout.len()).saturating_add(HEADER_LEN);
        let body = buf.get(HEADER_LEN..required).ok_or(LayoutError::BufferTooShort {
            layout: layout.name(),
            required,
            actual: buf.len(),
        })?;
        Ok(Self { header, body, layout })
    }

    /// Page header.
    pub const fn header(&self) -> &CisHeader {
        &self.header
    }

    /// Number of records on this page.
    pub fn len(&self) -> usize {
        self.body.len() / self.layout.len()
    }

    /// True for a page without records.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Records of this page, each copied out of the receive buffer.
    pub fn records(&self) -> impl Iterator<Item = Result<Record>> + '_ {
        self.body.chunks_exact(self.layout.len()).map(|chunk| Record::from_bytes(self.layout, chunk))
    }
}

/// Assembles the bytes of one response page.
#[derive(Debug)]
pub struct PageBuilder {
    header: CisHeader,
    body: BytesMut,
    count: u32,
}

impl PageBuilder {
    /// Page of a result with `totobj` objects in total.
    pub fn new(totobj: u32) -> Result<Self> {
        let mut header = CisHeader::new()?;
        header.record_mut().set("totobj", totobj)?;
        header.record_mut().set("etb_error_code", "00000000")?;
        Ok(Self { header, body: BytesMut::new(), count: 0 })
    }

    /// Page carrying only a CIS error code and no records.
    pub fn error(code: u32) -> Result<Self> {
        let mut page = Self::new(0)?;
        page.header.record_mut().set("error_code", code)?;
        Ok(page)
    }

    /// Mutable header, for setting the secondary error or width hints.
    pub fn header_mut(&mut self) -> &mut CisHeader {
        &mut self.header
    }

    /// Append one record.
    pub fn push(&mut self, record: &Record) -> &mut Self {
        self.body.put_slice(record.as_bytes());
        self.count += 1;
        self
    }

    /// Header bytes with `curobj` set, followed by the records.
    pub fn finish(mut self) -> Result<Bytes> {
        self.header.record_mut().set("curobj", self.count)?;
        let mut out = BytesMut::with_capacity(HEADER_LEN + self.body.len());
        out.put_slice(self.header.record().as_bytes());
        out.put(self.body);
        Ok(out.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cis::{codes::ObjectType, info};

    fn service(name: &str) -> Record {
        let mut rec = Record::new(info::layout(ObjectType::Service).unwrap().unwrap());
        rec.set("service", name).unwrap();
        rec
    }

    #[test]
    fn build_then_parse() {
        let layout = info::layout(ObjectType::Service).unwrap().unwrap();
        let mut page = PageBuilder::new(5).unwrap();
        page.push(&service("A")).push(&service("B"));
        let bytes = page.finish().unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 2 * layout.len());

        let parsed = Page::parse(&bytes, layout).unwrap();
        assert_eq!(parsed.header().totobj(), 5);
        assert_eq!(parsed.header().curobj(), 2);
        assert_eq!(parsed.len(), 2);
        let names: Vec<String> = parsed.records().map(|r| r.unwrap().text("service").unwrap()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn trailing_bytes_ignored() {
        let layout = info::layout(ObjectType::Service).unwrap().unwrap();
        let mut page = PageBuilder::new(1).unwrap();
        page.push(&service("A"));
        let mut buf = page.finish().unwrap().to_vec();
        buf.resize(8192, 0xff);
        assert_eq!(Page::parse(&buf, layout).unwrap().len(), 1);
    }

    #[test]
    fn overstated_count_rejected() {
        let layout = info::layout(ObjectType::Service).unwrap().unwrap();
        let mut page = PageBuilder::new(3).unwrap();
        page.push(&service("A"));
        let mut buf = page.finish().unwrap().to_vec();
        buf[11] = 3;
        assert!(matches!(Page::parse(&buf, layout), Err(LayoutError::BufferTooShort { .. })));
    }

    #[test]
    fn error_page() {
        let layout = info::layout(ObjectType::Broker).unwrap().unwrap();
        let buf = PageBuilder::error(4).unwrap().finish().unwrap();
        let parsed = Page::parse(&buf, layout).unwrap();
        assert_eq!(parsed.header().error_code(), 4);
        assert!(parsed.is_empty());
    }
}
