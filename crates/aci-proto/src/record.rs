//! A layout bound to an owned byte buffer.

use crate::{
    display,
    errors::{LayoutError, Result},
    field::Format,
    layout::Layout,
    value::Value,
};

/// One record instance: a layout plus exactly one buffer sized for it.
///
/// The buffer may be longer than the active layout when the layout has been
/// restricted to an older interface version; bytes past the active length
/// are kept but never exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    layout: &'static Layout,
    buf: Vec<u8>,
}

impl Record {
    /// Zero-filled record.
    pub fn new(layout: &'static Layout) -> Self {
        Self { layout, buf: vec![0; layout.len()] }
    }

    /// Record holding a copy of the first `layout.len()` bytes of `bytes`.
    pub fn from_bytes(layout: &'static Layout, bytes: &[u8]) -> Result<Self> {
        let len = layout.len();
        let src = bytes.get(..len).ok_or(LayoutError::BufferTooShort {
            layout: layout.name(),
            required: len,
            actual: bytes.len(),
        })?;
        Ok(Self { layout, buf: src.to_vec() })
    }

    /// Swap in another view of the same field table, typically an older
    /// interface version. The buffer never shrinks.
    pub fn restrict(&mut self, layout: &'static Layout) {
        if self.buf.len() < layout.len() {
            self.buf.resize(layout.len(), 0);
        }
        self.layout = layout;
    }

    /// Active layout.
    pub const fn layout(&self) -> &'static Layout {
        self.layout
    }

    /// Record bytes at the active layout length.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.layout.len()]
    }

    /// Mutable record bytes at the active layout length.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.layout.len();
        &mut self.buf[..len]
    }

    /// Read a field.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.layout.read(self.as_bytes(), name)
    }

    /// Write a field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let layout = self.layout;
        layout.write(self.as_bytes_mut(), name, &value)
    }

    /// Write several fields, leaving all others untouched.
    pub fn update(&mut self, values: &[(&str, Value)]) -> Result<()> {
        let layout = self.layout;
        layout.encode(self.as_bytes_mut(), values)
    }

    /// Read every kernel-set field.
    pub fn decode(&self) -> Result<Vec<(&'static str, Value)>> {
        self.layout.decode(self.as_bytes())
    }

    /// Read a text field.
    pub fn text(&self, name: &str) -> Result<String> {
        match self.get(name)? {
            Value::Text(s) => Ok(s),
            _ => Err(self.mismatch(name, "text")),
        }
    }

    /// Read an integer field.
    pub fn uint(&self, name: &str) -> Result<u64> {
        match self.get(name)? {
            Value::Uint(n) => Ok(n),
            _ => Err(self.mismatch(name, "unsigned integer")),
        }
    }

    /// Read a byte field.
    pub fn bytes(&self, name: &str) -> Result<Vec<u8>> {
        match self.get(name)? {
            Value::Bytes(b) => Ok(b),
            _ => Err(self.mismatch(name, "bytes")),
        }
    }

    fn mismatch(&self, name: &str, expected: &'static str) -> LayoutError {
        let field = self.layout.slot(name).map_or("?", |s| s.field.name);
        LayoutError::KindMismatch { field, expected }
    }

    /// Name/value pairs for display.
    ///
    /// With `select`, only the named fields are rendered, in `select` order;
    /// unknown names are skipped. Hidden fields and filler never appear.
    pub fn display_fields(&self, select: Option<&[&str]>) -> Vec<(&'static str, String)> {
        let render = |name: &str| -> Option<(&'static str, String)> {
            let slot = self.layout.slot(name).ok()?;
            if slot.field.format == Format::Hidden {
                return None;
            }
            let value = self.get(name).ok()?;
            display::render(slot.field.format, &value, self).map(|s| (slot.field.name, s))
        };

        match select {
            Some(names) => names.iter().filter_map(|&n| render(n)).collect(),
            None => self.layout.slots().filter_map(|s| render(s.field.name)).collect(),
        }
    }

    /// Multi-line `name = value` rendering.
    pub fn dump_fields(&self, select: Option<&[&str]>) -> String {
        let fields = self.display_fields(select);
        let width = fields.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        fields.iter().map(|(n, v)| format!("  {n:<width$} = {v}\n")).collect()
    }

    /// Single-row rendering of the selected fields, space separated.
    ///
    /// Each column is as wide as the larger of the field name and its value,
    /// so rows printed below [`Record::header_line`] line up.
    pub fn line(&self, select: Option<&[&str]>) -> String {
        self.display_fields(select)
            .iter()
            .map(|(n, v)| format!("{v:<w$}", w = n.len().max(v.len())))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Column header matching [`Record::line`].
    pub fn header_line(&self, select: Option<&[&str]>) -> String {
        self.display_fields(select)
            .iter()
            .map(|(n, v)| format!("{n:<w$}", w = n.len().max(v.len())))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use super::*;
    use crate::field::Field;

    static PERSON: Lazy<Layout> = Lazy::new(|| {
        Layout::define(
            "Person",
            &[
                Field::text("server_class", 4).hidden(),
                Field::text("server", 4).hidden(),
                Field::text("service", 8).format(Format::ServicePath),
                Field::uint("age", 4).format(Format::Interval),
                Field::text("secret", 8).hidden(),
                Field::filler("pad", 2),
                Field::uint("flags", 2).format(Format::Hex),
            ],
        )
        .unwrap()
    });

    fn person() -> Record {
        let mut r = Record::new(&PERSON);
        r.set("server_class", "SAG").unwrap();
        r.set("server", "CIS").unwrap();
        r.set("service", "INFO").unwrap();
        r.set("age", 3661u32).unwrap();
        r.set("secret", "pw").unwrap();
        r.set("flags", 255u16).unwrap();
        r
    }

    #[test]
    fn hidden_fields_are_not_displayed() {
        let names: Vec<&str> = person().display_fields(None).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["service", "age", "flags"]);
    }

    #[test]
    fn formatters_applied() {
        let fields = person().display_fields(None);
        assert_eq!(fields[0].1, "SAG/CIS/INFO");
        assert_eq!(fields[1].1, "01:01:01");
        assert_eq!(fields[2].1, "0xff");
    }

    #[test]
    fn selection_order_and_unknown_names() {
        let fields = person().display_fields(Some(&["flags", "nope", "age"]));
        let names: Vec<&str> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["flags", "age"]);
    }

    #[test]
    fn line_and_header_align() {
        let r = person();
        let select: &[&str] = &["age", "flags"];
        assert_eq!(r.header_line(Some(select)), format!("{:<8} {}", "age", "flags"));
        assert_eq!(r.line(Some(select)), "01:01:01 0xff ");
        assert_eq!(
            r.dump_fields(None),
            "  service = SAG/CIS/INFO\n  age     = 01:01:01\n  flags   = 0xff\n"
        );
    }

    #[test]
    fn from_bytes_copies_prefix() {
        let bytes = person().as_bytes().to_vec();
        let mut longer = bytes.clone();
        longer.extend_from_slice(b"trailing");
        let copy = Record::from_bytes(&PERSON, &longer).unwrap();
        assert_eq!(copy.as_bytes(), &bytes[..]);
        assert!(Record::from_bytes(&PERSON, &bytes[..3]).is_err());
    }

    #[test]
    fn typed_accessors_check_kind() {
        let r = person();
        assert_eq!(r.uint("age").unwrap(), 3661);
        assert!(matches!(r.text("age"), Err(LayoutError::KindMismatch { field: "age", .. })));
    }
}
