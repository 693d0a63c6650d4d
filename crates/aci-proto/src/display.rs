//! Human-readable rendering of field values.
//!
//! Each [`Format`] maps to a pure function of the value (and, for
//! [`Format::ServicePath`], of the sibling fields in the same record).

use chrono::{Local, TimeZone};

use crate::{
    cis::codes::{CisOption, Command, ObjectType},
    codes::{AciOption, ConvStat, Function, UowStatus},
    field::Format,
    record::Record,
    value::Value,
};

/// Render `value` with `format`.
///
/// Returns `None` for [`Format::Hidden`].
pub fn render(format: Format, value: &Value, record: &Record) -> Option<String> {
    let text = match (format, value) {
        (Format::Hidden, _) => return None,
        (Format::Interval, Value::Uint(n)) => interval(*n),
        (Format::LocalTime, Value::Uint(n)) => local_time(*n),
        (Format::Function, Value::Uint(n)) => named(*n, |r| Function::from_raw(r).map(Function::name)),
        (Format::AciOption, Value::Uint(n)) => named(*n, |r| AciOption::from_raw(r).map(AciOption::name)),
        (Format::ConvStat, Value::Uint(n)) => named(*n, |r| ConvStat::from_raw(r).map(ConvStat::name)),
        (Format::UowStatus, Value::Uint(n)) => named(*n, |r| UowStatus::from_raw(r).map(UowStatus::name)),
        (Format::PStore, Value::Uint(n)) => pstore(*n),
        (Format::Waiting, Value::Uint(n)) => waiting(*n),
        (Format::ObjectType, Value::Uint(n)) => {
            wide_named(*n, |r| ObjectType::from_raw(r).map(ObjectType::name))
        },
        (Format::Command, Value::Uint(n)) => wide_named(*n, |r| Command::from_raw(r).map(Command::name)),
        (Format::CisOption, Value::Uint(n)) => {
            wide_named(*n, |r| CisOption::from_raw(r).map(CisOption::name))
        },
        (Format::ServicePath, Value::Text(service)) => service_path(record, service),
        (Format::CommitTime, Value::Text(t)) => commit_time(t),
        (Format::Hex, Value::Uint(n)) => format!("{n:#x}"),
        (_, v) => v.to_string(),
    };
    Some(text)
}

fn named(raw: u64, lookup: impl Fn(u8) -> Option<&'static str>) -> String {
    u8::try_from(raw).ok().and_then(lookup).map_or_else(|| raw.to_string(), str::to_owned)
}

fn wide_named(raw: u64, lookup: impl Fn(u16) -> Option<&'static str>) -> String {
    u16::try_from(raw).ok().and_then(lookup).map_or_else(|| raw.to_string(), str::to_owned)
}

/// Seconds as `HH:MM:SS`, prefixed with `Nd ` when a day or longer.
pub fn interval(seconds: u64) -> String {
    let days = seconds / 86_400;
    let rest = seconds % 86_400;
    let hms = format!("{:02}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);
    if days > 0 { format!("{days}d {hms}") } else { hms }
}

/// Epoch seconds as local `YYYY-MM-DD HH:MM:SS`. Zero renders empty.
pub fn local_time(seconds: u64) -> String {
    if seconds == 0 {
        return String::new();
    }
    i64::try_from(seconds)
        .ok()
        .and_then(|s| Local.timestamp_opt(s, 0).single())
        .map_or_else(|| seconds.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Kernel commit time `YYYYMMDDhhmmssmmm` as `YYYY-MM-DD HH:MM:SS.mmm UTC+0`.
///
/// Blank or NUL-filled input renders empty; short input renders as is.
pub fn commit_time(raw: &str) -> String {
    let t = raw.trim_matches([' ', '\0']);
    if t.is_empty() {
        return String::new();
    }
    match (t.get(0..4), t.get(4..6), t.get(6..8), t.get(8..10), t.get(10..12), t.get(12..14), t.get(14..)) {
        (Some(y), Some(mo), Some(d), Some(h), Some(mi), Some(s), Some(ms)) => {
            format!("{y}-{mo}-{d} {h}:{mi}:{s}.{ms} UTC+0")
        },
        _ => t.to_owned(),
    }
}

/// Persistent store kind.
pub fn pstore(raw: u64) -> String {
    match raw {
        0 => "No".to_owned(),
        1 => "Hot".to_owned(),
        2 => "Cold".to_owned(),
        4 => "Warm".to_owned(),
        n => n.to_string(),
    }
}

/// Participant waiting status.
pub fn waiting(raw: u64) -> String {
    match raw {
        0 => "Not waiting".to_owned(),
        5 => "Waiting".to_owned(),
        n => n.to_string(),
    }
}

fn service_path(record: &Record, service: &str) -> String {
    let class = record.text("server_class").unwrap_or_default();
    let server = record.text("server").unwrap_or_default();
    format!("{class}/{server}/{service}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_formats() {
        assert_eq!(interval(0), "00:00:00");
        assert_eq!(interval(3661), "01:01:01");
        assert_eq!(interval(90_061), "1d 01:01:01");
    }

    #[test]
    fn commit_time_formats() {
        assert_eq!(commit_time("20180619180834123"), "2018-06-19 18:08:34.123 UTC+0");
        assert_eq!(commit_time("\0\0\0\0"), "");
        assert_eq!(commit_time("2018"), "2018");
    }

    #[test]
    fn local_time_shape() {
        assert_eq!(local_time(0), "");
        let s = local_time(1_500_000_000);
        assert_eq!(s.len(), 19);
        assert_eq!(&s[4..5], "-");
    }

    #[test]
    fn lookups_fall_back_to_number() {
        assert_eq!(pstore(2), "Cold");
        assert_eq!(pstore(3), "3");
        assert_eq!(waiting(5), "Waiting");
        assert_eq!(named(10, |r| AciOption::from_raw(r).map(AciOption::name)), "COMMIT");
        assert_eq!(named(99, |r| AciOption::from_raw(r).map(AciOption::name)), "99");
        assert_eq!(named(300, |r| AciOption::from_raw(r).map(AciOption::name)), "300");
    }
}
