//! Hex dump of raw buffers.
//!
//! Sixteen bytes per line, grouped in words of four, with the printable
//! ASCII rendering on the right:
//!
//! ```text
//! 0000  01070900 00000000 00000000 00000000  ................
//! ```

use std::fmt::Write as _;

const LINE: usize = 16;
const GROUP: usize = 4;
// 32 hex digits plus the three group separators
const HEX_COLUMN: usize = LINE * 2 + LINE / GROUP - 1;

/// Render `bytes` as a multi-line hex dump, one line per 16 bytes.
pub fn dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(LINE) * 72);
    for (n, line) in bytes.chunks(LINE).enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let hex: Vec<String> = line.chunks(GROUP).map(hex::encode).collect();
        let ascii: String =
            line.iter().map(|&b| if b.is_ascii_graphic() || b == b' ' { char::from(b) } else { '.' }).collect();
        let _ = write!(out, "{:04x}  {:<HEX_COLUMN$}  {ascii}", n * LINE, hex.join(" "));
    }
    out
}

/// Dump with a title line, as emitted in trace events.
pub fn dump_titled(title: &str, bytes: &[u8]) -> String {
    format!("{title} ({} bytes)\n{}", bytes.len(), dump(bytes))
}
