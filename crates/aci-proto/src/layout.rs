//! Fixed-offset record layouts.
//!
//! A [`Layout`] is an ordered, contiguous list of [`Field`]s with computed
//! offsets. It is immutable once defined and carries no buffer of its own:
//! every operation takes the caller's buffer and touches only the byte
//! ranges of the fields involved. Fields that are not written keep whatever
//! bytes the buffer already held, which is what makes a long-lived control
//! block "sticky" between calls.
//!
//! # Encoding
//!
//! - Text is Latin-1. Writes are blank padded and truncated to the field
//!   width; reads drop trailing blanks and NULs.
//! - Bytes are zero padded and truncated on write and returned at full width.
//! - Integers are unsigned big-endian and range checked against the width.
//! - Filler is never written and never decoded.
//!
//! # Versions
//!
//! Every field records the interface version that introduced it. A layout
//! restricted with [`Layout::for_version`] keeps the full field table for
//! diagnostics but reports fields newer than the active version as
//! [`LayoutError::NotInVersion`] and shrinks its length accordingly.

use std::ops::Range;

use zerocopy::{
    FromBytes, IntoBytes,
    byteorder::big_endian::{U16, U32, U64},
};

use crate::{
    errors::{LayoutError, Result},
    field::{Field, Kind},
    value::Value,
};

/// Largest record any layout may describe.
pub const MAX_RECORD_LEN: usize = 64 * 1024;

/// Version marker for layouts without version restriction.
pub const ALL_VERSIONS: u8 = u8::MAX;

/// A field together with its resolved offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Field descriptor
    pub field: Field,
    /// Byte offset from the start of the record
    pub offset: usize,
}

impl Slot {
    /// Byte range of the field within the record.
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.field.width
    }
}

/// Ordered, contiguous field table with resolved offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    name: &'static str,
    slots: Vec<Slot>,
    active: u8,
    len: usize,
}

impl Layout {
    /// Build a layout from an ordered field list.
    ///
    /// # Errors
    ///
    /// - `DuplicateField` if two fields share a name
    /// - `InvalidWidth` for zero widths or integer widths other than 1/2/4/8
    /// - `Overlap` / `Gap` if a pinned offset disagrees with the running offset
    /// - `TooLarge` if the total exceeds [`MAX_RECORD_LEN`]
    pub fn define(name: &'static str, fields: &[Field]) -> Result<Self> {
        let mut slots: Vec<Slot> = Vec::with_capacity(fields.len());
        let mut offset = 0usize;

        for field in fields {
            if slots.iter().any(|s| s.field.name == field.name) {
                return Err(LayoutError::DuplicateField { layout: name, field: field.name });
            }

            let width_ok = match field.kind {
                Kind::Uint => matches!(field.width, 1 | 2 | 4 | 8),
                _ => field.width > 0,
            };
            if !width_ok {
                return Err(LayoutError::InvalidWidth {
                    layout: name,
                    field: field.name,
                    width: field.width,
                });
            }

            if let Some(pinned) = field.pinned {
                if pinned < offset {
                    return Err(LayoutError::Overlap {
                        layout: name,
                        field: field.name,
                        pinned,
                        end: offset,
                    });
                }
                if pinned > offset {
                    return Err(LayoutError::Gap { layout: name, field: field.name, pinned, end: offset });
                }
            }

            slots.push(Slot { field: *field, offset });
            offset += field.width;

            if offset > MAX_RECORD_LEN {
                return Err(LayoutError::TooLarge { layout: name, len: offset, max: MAX_RECORD_LEN });
            }
        }

        Ok(Self { name, slots, active: ALL_VERSIONS, len: offset })
    }

    /// Same field table restricted to fields introduced at or before
    /// `version`.
    pub fn for_version(&self, version: u8) -> Self {
        let len = self
            .slots
            .iter()
            .filter(|s| s.field.since <= version)
            .map(|s| s.range().end)
            .max()
            .unwrap_or(0);
        Self { name: self.name, slots: self.slots.clone(), active: version, len }
    }

    /// Layout name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Total length in bytes at the active version.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if the layout has no bytes at the active version.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Active interface version, [`ALL_VERSIONS`] if unrestricted.
    pub const fn version(&self) -> u8 {
        self.active
    }

    /// Fields present at the active version, in order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.slots.iter().filter(move |s| s.field.since <= self.active)
    }

    /// Look up a field present at the active version.
    pub fn slot(&self, name: &str) -> Result<&Slot> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.field.name == name)
            .ok_or_else(|| LayoutError::UnknownField { layout: self.name, field: name.to_owned() })?;

        if slot.field.since > self.active {
            return Err(LayoutError::NotInVersion {
                field: slot.field.name,
                since: slot.field.since,
                active: self.active,
            });
        }
        Ok(slot)
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual < self.len {
            return Err(LayoutError::BufferTooShort {
                layout: self.name,
                required: self.len,
                actual,
            });
        }
        Ok(())
    }

    /// Read one field from `buf`.
    ///
    /// Filler reads back as raw bytes.
    pub fn read(&self, buf: &[u8], name: &str) -> Result<Value> {
        self.check_len(buf.len())?;
        let slot = self.slot(name)?;
        Ok(read_slot(slot, &buf[slot.range()]))
    }

    /// Write one field into `buf`, leaving every other byte untouched.
    pub fn write(&self, buf: &mut [u8], name: &str, value: &Value) -> Result<()> {
        self.check_len(buf.len())?;
        let slot = self.slot(name)?;
        write_slot(slot, &mut buf[slot.range()], value)
    }

    /// Write each present value at its offset.
    ///
    /// Fields absent from `values` keep their prior bytes.
    pub fn encode(&self, buf: &mut [u8], values: &[(&str, Value)]) -> Result<()> {
        for (name, value) in values {
            self.write(buf, name, value)?;
        }
        Ok(())
    }

    /// Read every field the kernel may set, in layout order.
    pub fn decode(&self, buf: &[u8]) -> Result<Vec<(&'static str, Value)>> {
        self.check_len(buf.len())?;
        Ok(self
            .slots()
            .filter(|s| s.field.kind != Kind::Filler && s.field.is_output())
            .map(|s| (s.field.name, read_slot(s, &buf[s.range()])))
            .collect())
    }
}

fn read_slot(slot: &Slot, bytes: &[u8]) -> Value {
    match slot.field.kind {
        Kind::Text => Value::Text(decode_text(bytes)),
        Kind::Bytes | Kind::Filler => Value::Bytes(bytes.to_vec()),
        Kind::Uint => Value::Uint(read_uint(bytes)),
    }
}

fn write_slot(slot: &Slot, dst: &mut [u8], value: &Value) -> Result<()> {
    let field = &slot.field;
    match (field.kind, value) {
        (Kind::Filler, _) => Err(LayoutError::NotWritable { field: field.name }),
        (Kind::Text, Value::Text(s)) => {
            encode_text(s, dst);
            Ok(())
        },
        (Kind::Bytes, Value::Bytes(b)) => {
            let n = b.len().min(dst.len());
            dst[..n].copy_from_slice(&b[..n]);
            dst[n..].fill(0);
            Ok(())
        },
        (Kind::Uint, Value::Uint(n)) => write_uint(field, dst, *n),
        (kind, _) => Err(LayoutError::KindMismatch { field: field.name, expected: kind.name() }),
    }
}

fn read_uint(bytes: &[u8]) -> u64 {
    match bytes.len() {
        1 => u64::from(bytes[0]),
        2 => U16::read_from_bytes(bytes).map_or(0, |v| u64::from(v.get())),
        4 => U32::read_from_bytes(bytes).map_or(0, |v| u64::from(v.get())),
        _ => U64::read_from_bytes(bytes).map_or(0, U64::get),
    }
}

fn write_uint(field: &Field, dst: &mut [u8], n: u64) -> Result<()> {
    let out_of_range = || LayoutError::OutOfRange { field: field.name, width: field.width, value: n };
    match dst.len() {
        1 => dst[0] = u8::try_from(n).map_err(|_| out_of_range())?,
        2 => {
            let v = u16::try_from(n).map_err(|_| out_of_range())?;
            dst.copy_from_slice(U16::new(v).as_bytes());
        },
        4 => {
            let v = u32::try_from(n).map_err(|_| out_of_range())?;
            dst.copy_from_slice(U32::new(v).as_bytes());
        },
        _ => dst.copy_from_slice(U64::new(n).as_bytes()),
    }
    Ok(())
}

/// Latin-1 encode `s` into `dst`, blank padded and truncated.
///
/// Characters outside Latin-1 become `?`.
pub fn encode_text(s: &str, dst: &mut [u8]) {
    let mut chars = s.chars();
    for byte in dst.iter_mut() {
        *byte = match chars.next() {
            Some(c) => u8::try_from(u32::from(c)).unwrap_or(b'?'),
            None => b' ',
        };
    }
}

/// Latin-1 decode `bytes`, dropping trailing blanks and NULs.
pub fn decode_text(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|&b| b != b' ' && b != 0).map_or(0, |i| i + 1);
    bytes[..end].iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;
    use crate::field::Field;

    const SAMPLE: &[Field] = &[
        Field::uint("kind", 1).input(),
        Field::filler("pad", 3),
        Field::uint("count", 4).output(),
        Field::text("name", 8),
        Field::bytes("id", 4).since(2),
        Field::uint("big", 8).since(3),
    ];

    fn sample() -> Layout {
        Layout::define("Sample", SAMPLE).unwrap()
    }

    #[test]
    fn offsets_are_contiguous() {
        let layout = sample();
        let offsets: Vec<usize> = layout.slots().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 1, 4, 8, 16, 20]);
        assert_eq!(layout.len(), 28);
    }

    #[test]
    fn duplicate_names_rejected() {
        let fields = [Field::uint("a", 1), Field::text("a", 4)];
        assert_eq!(
            Layout::define("Dup", &fields),
            Err(LayoutError::DuplicateField { layout: "Dup", field: "a" })
        );
    }

    #[test]
    fn integer_width_must_be_power_of_two() {
        let fields = [Field::uint("odd", 3)];
        assert!(matches!(Layout::define("Odd", &fields), Err(LayoutError::InvalidWidth { width: 3, .. })));
        let fields = [Field::text("empty", 0)];
        assert!(matches!(Layout::define("Empty", &fields), Err(LayoutError::InvalidWidth { .. })));
    }

    #[test]
    fn pinned_offsets_detect_overlap_and_gap() {
        let overlap = [Field::text("a", 8), Field::uint("b", 4).at(6)];
        assert_eq!(
            Layout::define("Overlap", &overlap),
            Err(LayoutError::Overlap { layout: "Overlap", field: "b", pinned: 6, end: 8 })
        );

        let gap = [Field::text("a", 8), Field::uint("b", 4).at(10)];
        assert_eq!(
            Layout::define("Gap", &gap),
            Err(LayoutError::Gap { layout: "Gap", field: "b", pinned: 10, end: 8 })
        );

        let exact = [Field::text("a", 8), Field::uint("b", 4).at(8)];
        assert!(Layout::define("Exact", &exact).is_ok());
    }

    #[test]
    fn oversized_layout_rejected() {
        let fields = [Field::bytes("blob", MAX_RECORD_LEN), Field::uint("one", 1)];
        assert!(matches!(Layout::define("Huge", &fields), Err(LayoutError::TooLarge { .. })));
    }

    #[test]
    fn integers_are_big_endian() {
        let layout = sample();
        let mut buf = vec![0u8; layout.len()];
        layout.write(&mut buf, "count", &Value::Uint(0x0102_0304)).unwrap();
        assert_eq!(buf[4..8], hex!("01020304"));
        assert_eq!(layout.read(&buf, "count").unwrap(), Value::Uint(0x0102_0304));
    }

    #[test]
    fn integer_range_checked() {
        let layout = sample();
        let mut buf = vec![0u8; layout.len()];
        assert_eq!(
            layout.write(&mut buf, "kind", &Value::Uint(256)),
            Err(LayoutError::OutOfRange { field: "kind", width: 1, value: 256 })
        );
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn text_padded_on_write_trimmed_on_read() {
        let layout = sample();
        let mut buf = vec![0u8; layout.len()];
        layout.write(&mut buf, "name", &Value::from("ab")).unwrap();
        assert_eq!(&buf[8..16], b"ab      ");
        assert_eq!(layout.read(&buf, "name").unwrap(), Value::from("ab"));

        layout.write(&mut buf, "name", &Value::from("abcdefghijk")).unwrap();
        assert_eq!(&buf[8..16], b"abcdefgh");
        assert_eq!(buf[16], 0, "neighbouring field untouched");
    }

    #[test]
    fn text_is_latin1() {
        let layout = sample();
        let mut buf = vec![0u8; layout.len()];
        layout.write(&mut buf, "name", &Value::from("Müller€")).unwrap();
        assert_eq!(&buf[8..16], b"M\xfcller? ");
        assert_eq!(layout.read(&buf, "name").unwrap(), Value::from("Müller?"));
    }

    #[test]
    fn nul_padding_trimmed() {
        let layout = sample();
        let mut buf = vec![0u8; layout.len()];
        buf[8..11].copy_from_slice(b"NEW");
        assert_eq!(layout.read(&buf, "name").unwrap(), Value::from("NEW"));
    }

    #[test]
    fn filler_not_writable_and_not_decoded() {
        let layout = sample();
        let mut buf = vec![0u8; layout.len()];
        assert_eq!(
            layout.write(&mut buf, "pad", &Value::Bytes(vec![1])),
            Err(LayoutError::NotWritable { field: "pad" })
        );
        let names: Vec<&str> = layout.decode(&buf).unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["count", "name", "id", "big"]);
    }

    #[test]
    fn kind_mismatch_rejected() {
        let layout = sample();
        let mut buf = vec![0u8; layout.len()];
        assert_eq!(
            layout.write(&mut buf, "name", &Value::Uint(1)),
            Err(LayoutError::KindMismatch { field: "name", expected: "text" })
        );
    }

    #[test]
    fn encode_keeps_absent_fields() {
        let layout = sample();
        let mut buf = vec![0u8; layout.len()];
        layout.encode(&mut buf, &[("name", Value::from("first")), ("count", Value::Uint(7))]).unwrap();
        layout.encode(&mut buf, &[("count", Value::Uint(8))]).unwrap();
        assert_eq!(layout.read(&buf, "name").unwrap(), Value::from("first"));
        assert_eq!(layout.read(&buf, "count").unwrap(), Value::Uint(8));
    }

    #[test]
    fn version_restriction_hides_newer_fields() {
        let v2 = sample().for_version(2);
        assert_eq!(v2.len(), 20);
        assert!(v2.slot("id").is_ok());
        assert_eq!(
            v2.slot("big").map(|s| s.offset),
            Err(LayoutError::NotInVersion { field: "big", since: 3, active: 2 })
        );
        let names: Vec<&str> = v2.slots().map(|s| s.field.name).collect();
        assert!(!names.contains(&"big"));
    }

    #[test]
    fn unknown_field_and_short_buffer() {
        let layout = sample();
        let buf = vec![0u8; 4];
        assert!(matches!(layout.read(&buf, "count"), Err(LayoutError::BufferTooShort { required: 28, .. })));
        let buf = vec![0u8; layout.len()];
        assert!(matches!(layout.read(&buf, "nope"), Err(LayoutError::UnknownField { .. })));
    }

    fn text_value() -> impl Strategy<Value = String> {
        // Latin-1 without trailing blanks/NULs, which reads would drop
        "[ -~\u{a1}-\u{ff}]{0,8}".prop_map(|s| s.trim_end_matches([' ', '\0']).to_owned())
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            count in any::<u32>(),
            name in text_value(),
            id in proptest::collection::vec(any::<u8>(), 4),
            big in any::<u64>(),
        ) {
            let layout = sample();
            let mut buf = vec![0u8; layout.len()];
            let values = vec![
                ("count", Value::Uint(u64::from(count))),
                ("name", Value::Text(name)),
                ("id", Value::Bytes(id)),
                ("big", Value::Uint(big)),
            ];
            layout.encode(&mut buf, &values).unwrap();
            prop_assert_eq!(layout.decode(&buf).unwrap(), values);
        }

        #[test]
        fn overlong_text_truncates_to_width(name in "[A-Z]{9,40}") {
            let layout = sample();
            let mut buf = vec![0u8; layout.len()];
            layout.write(&mut buf, "name", &Value::Text(name.clone())).unwrap();
            prop_assert_eq!(layout.read(&buf, "name").unwrap(), Value::Text(name[..8].to_owned()));
        }
    }
}
