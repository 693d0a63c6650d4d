//! Codec error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors raised while defining layouts or moving values in and out of
/// record buffers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Two fields in one layout share a name.
    #[error("layout {layout}: duplicate field {field}")]
    DuplicateField {
        /// Layout being defined
        layout: &'static str,
        /// Offending field
        field: &'static str,
    },

    /// Field width is zero or does not match its integer kind.
    #[error("layout {layout}: field {field} has invalid width {width}")]
    InvalidWidth {
        /// Layout being defined
        layout: &'static str,
        /// Offending field
        field: &'static str,
        /// Declared width
        width: usize,
    },

    /// A pinned field starts before the end of the previous field.
    #[error("layout {layout}: field {field} pinned at {pinned} overlaps previous field ending at {end}")]
    Overlap {
        /// Layout being defined
        layout: &'static str,
        /// Offending field
        field: &'static str,
        /// Offset the field is pinned to
        pinned: usize,
        /// End of the preceding field
        end: usize,
    },

    /// A pinned field starts after the end of the previous field.
    #[error("layout {layout}: gap before field {field}, pinned at {pinned} but previous field ends at {end}")]
    Gap {
        /// Layout being defined
        layout: &'static str,
        /// Offending field
        field: &'static str,
        /// Offset the field is pinned to
        pinned: usize,
        /// End of the preceding field
        end: usize,
    },

    /// Total record length exceeds [`crate::layout::MAX_RECORD_LEN`].
    #[error("layout {layout}: total length {len} exceeds maximum {max}")]
    TooLarge {
        /// Layout being defined
        layout: &'static str,
        /// Computed length
        len: usize,
        /// Permitted maximum
        max: usize,
    },

    /// No field of that name exists in the layout.
    #[error("layout {layout}: unknown field {field}")]
    UnknownField {
        /// Layout searched
        layout: &'static str,
        /// Requested field name
        field: String,
    },

    /// The field exists but was introduced after the active version.
    #[error("field {field} requires interface version {since}, active version is {active}")]
    NotInVersion {
        /// Requested field
        field: &'static str,
        /// Version that introduced the field
        since: u8,
        /// Version currently in effect
        active: u8,
    },

    /// Numeric value does not fit the field width.
    #[error("value {value} does not fit {width}-byte field {field}")]
    OutOfRange {
        /// Target field
        field: &'static str,
        /// Field width in bytes
        width: usize,
        /// Rejected value
        value: u64,
    },

    /// Filler fields carry no caller-visible value.
    #[error("field {field} is filler and cannot be written")]
    NotWritable {
        /// Target field
        field: &'static str,
    },

    /// Value variant does not match the field encoding.
    #[error("field {field} expects a {expected} value")]
    KindMismatch {
        /// Target field
        field: &'static str,
        /// Expected value kind
        expected: &'static str,
    },

    /// Requested interface version has no layout.
    #[error("layout {layout} has no interface version {version}")]
    UnsupportedVersion {
        /// Layout requested
        layout: &'static str,
        /// Requested version
        version: u8,
    },

    /// Buffer is shorter than the layout requires.
    #[error("buffer of {actual} bytes is too short for {layout} ({required} bytes)")]
    BufferTooShort {
        /// Layout applied
        layout: &'static str,
        /// Bytes required
        required: usize,
        /// Bytes available
        actual: usize,
    },
}
