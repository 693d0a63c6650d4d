//! Field descriptors.
//!
//! A field is a named byte range of fixed width. Descriptors are plain
//! `const` data so record tables can be written as static slices:
//!
//! ```
//! use aci_proto::field::{Field, Format};
//!
//! const FIELDS: &[Field] = &[
//!     Field::uint("api_type", 1).input(),
//!     Field::filler("reserved", 3),
//!     Field::text("conv_id", 16).since(2),
//!     Field::uint("adcount", 4).output().format(Format::Plain),
//! ];
//! assert_eq!(FIELDS.len(), 4);
//! ```

use bitflags::bitflags;

bitflags! {
    /// Which side of a call writes the field.
    ///
    /// The empty set marks fields that carry no value in either direction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        /// Set by the caller before the call
        const IN = 0b01;
        /// Set by the kernel on return
        const OUT = 0b10;
        /// Set by either side
        const INOUT = Self::IN.bits() | Self::OUT.bits();
    }
}

/// Encoding of a field's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Latin-1 text, blank padded.
    Text,
    /// Raw bytes, zero padded.
    Bytes,
    /// Unsigned big-endian integer of width 1, 2, 4 or 8.
    Uint,
    /// Padding. Occupies space, carries no value.
    Filler,
}

impl Kind {
    /// Short name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Uint => "unsigned integer",
            Self::Filler => "filler",
        }
    }
}

/// Display formatter applied when rendering a field for humans.
///
/// Formatting never affects the wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Value as is.
    Plain,
    /// Bytes as lowercase hex.
    Hex,
    /// Never rendered (passwords, components of a composite display).
    Hidden,
    /// Seconds as `[Nd ]HH:MM:SS`.
    Interval,
    /// Epoch seconds as local `YYYY-MM-DD HH:MM:SS`.
    LocalTime,
    /// ACI function name.
    Function,
    /// ACI option name.
    AciOption,
    /// Conversation status name.
    ConvStat,
    /// UOW status name.
    UowStatus,
    /// Persistent store kind.
    PStore,
    /// Participant waiting status.
    Waiting,
    /// CIS object type name.
    ObjectType,
    /// CIS command name.
    Command,
    /// CIS option name.
    CisOption,
    /// `class/server/service` built from the sibling fields of the record.
    ServicePath,
    /// Kernel commit timestamp `YYYYMMDDhhmmssmmm`.
    CommitTime,
}

/// One field of a record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    /// Field name, unique within its layout
    pub name: &'static str,
    /// Width in bytes
    pub width: usize,
    /// Byte encoding
    pub kind: Kind,
    /// Who sets the field
    pub direction: Direction,
    /// Interface version that introduced the field
    pub since: u8,
    /// Absolute offset the field must start at, checked by `Layout::define`
    pub pinned: Option<usize>,
    /// Display formatter
    pub format: Format,
}

impl Field {
    const fn new(name: &'static str, width: usize, kind: Kind) -> Self {
        Self {
            name,
            width,
            kind,
            direction: Direction::INOUT,
            since: 1,
            pinned: None,
            format: Format::Plain,
        }
    }

    /// Fixed-width text field.
    pub const fn text(name: &'static str, width: usize) -> Self {
        Self::new(name, width, Kind::Text)
    }

    /// Raw byte field, rendered as hex.
    pub const fn bytes(name: &'static str, width: usize) -> Self {
        Self::new(name, width, Kind::Bytes).format(Format::Hex)
    }

    /// Unsigned integer of `width` bytes.
    pub const fn uint(name: &'static str, width: usize) -> Self {
        Self::new(name, width, Kind::Uint)
    }

    /// Padding of `width` bytes.
    pub const fn filler(name: &'static str, width: usize) -> Self {
        let mut field = Self::new(name, width, Kind::Filler);
        field.direction = Direction::empty();
        field.format = Format::Hidden;
        field
    }

    /// Mark as caller input only.
    pub const fn input(mut self) -> Self {
        self.direction = Direction::IN;
        self
    }

    /// Mark as kernel output only.
    pub const fn output(mut self) -> Self {
        self.direction = Direction::OUT;
        self
    }

    /// Pin the field to an absolute offset.
    pub const fn at(mut self, offset: usize) -> Self {
        self.pinned = Some(offset);
        self
    }

    /// Interface version that introduced the field.
    pub const fn since(mut self, version: u8) -> Self {
        self.since = version;
        self
    }

    /// Display formatter.
    pub const fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Hide from display.
    pub const fn hidden(self) -> Self {
        self.format(Format::Hidden)
    }

    /// True if the kernel may write this field.
    pub const fn is_output(&self) -> bool {
        self.direction.contains(Direction::OUT)
    }

    /// True if the caller may write this field.
    pub const fn is_input(&self) -> bool {
        self.direction.contains(Direction::IN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_compose() {
        let f = Field::text("conv_id", 16).since(2).at(292).output();
        assert_eq!(f.kind, Kind::Text);
        assert_eq!(f.since, 2);
        assert_eq!(f.pinned, Some(292));
        assert!(f.is_output());
        assert!(!f.is_input());
    }

    #[test]
    fn filler_has_no_direction() {
        let f = Field::filler("reserved", 16);
        assert!(f.direction.is_empty());
        assert_eq!(f.format, Format::Hidden);
    }

    #[test]
    fn default_direction_is_both() {
        let f = Field::uint("option", 1);
        assert!(f.is_input() && f.is_output());
        assert_eq!(Field::bytes("puid", 28).format, Format::Hex);
    }
}
