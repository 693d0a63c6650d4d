//! ACI control block layout.
//!
//! The control block grew over ten interface versions. Each version only
//! appends fields, so offsets are stable: a version-`V` block is a prefix of
//! every later one. The first field of each version group is pinned to the
//! tail of the previous version so a mistake in the table fails at
//! definition time rather than on the wire.
//!
//! ```text
//! version   1    2    3    4    5    6    7    8    9   10
//! length  356  507  568  609  609  611  630  756  872  880
//! ```

use once_cell::sync::OnceCell;

use crate::{
    codes::{API_VERSION_MAX, API_VERSION_MIN},
    errors::{LayoutError, Result},
    field::{Field, Format},
    layout::Layout,
};

/// Length of the error-text buffer passed beside the control block.
pub const ERRTEXT_LEN: usize = 80;

/// Control-block length per interface version, index 0 is version 1.
pub const VERSION_LEN: [usize; 10] = [356, 507, 568, 609, 609, 611, 630, 756, 872, 880];

/// Conversation id requesting a new conversation.
pub const CONV_NEW: &str = "NEW";
/// Conversation id continuing the current conversation.
pub const CONV_OLD: &str = "OLD";
/// Conversation id binding to any pending conversation.
pub const CONV_ANY: &str = "ANY";
/// Conversation id for non-conversational calls.
pub const CONV_NONE: &str = "NONE";

/// `wait` value blocking until the kernel answers.
pub const WAIT_YES: &str = "YES";
/// `wait` value returning immediately.
pub const WAIT_NO: &str = "NO";

#[rustfmt::skip]
const FIELDS: &[Field] = &[
    Field::uint("api_type", 1).input(),
    Field::uint("api_version", 1).input(),
    Field::uint("function", 1).input().format(Format::Function),
    Field::uint("option", 1).input().format(Format::AciOption),
    Field::filler("reserved1", 16),
    Field::uint("send_length", 4).input().at(20),
    Field::uint("receive_length", 4).input(),
    Field::uint("return_length", 4).output(),
    Field::uint("errtext_length", 4).input(),
    Field::text("broker_id", 32).input().at(36),
    Field::text("server_class", 32),
    Field::text("server_name", 32),
    Field::text("service", 32),
    Field::text("user_id", 32).input(),
    Field::text("password", 32).input().hidden(),
    Field::text("token", 32).input(),
    Field::bytes("security_token", 32),
    Field::text("conv_id", 16).at(292),
    Field::text("wait", 8).input(),
    Field::text("error_code", 8).output(),
    Field::text("environment", 32).input(),

    Field::uint("adcount", 4).output().since(2).at(356),
    Field::bytes("user_data", 16).output().since(2),
    Field::bytes("msg_id", 32).since(2),
    Field::text("msg_type", 16).since(2),
    Field::text("ptime", 8).input().since(2),
    Field::bytes("newpassword", 32).input().since(2).hidden(),
    Field::text("adapt_err", 8).output().since(2),
    Field::text("client_uid", 32).output().since(2),
    Field::uint("conv_stat", 1).output().since(2).format(Format::ConvStat),
    Field::uint("store", 1).since(2),
    Field::uint("status", 1).since(2),

    Field::uint("uow_status", 1).since(3).at(507).format(Format::UowStatus),
    Field::text("uow_time", 8).input().since(3),
    Field::text("uow_id", 16).since(3),
    Field::text("user_status", 32).since(3),
    Field::uint("uow_status_persist", 1).input().since(3),
    Field::filler("reserved2", 3).since(3),

    Field::text("locale_string", 40).input().since(4).at(568),
    Field::uint("data_arch", 1).input().since(4),

    Field::text("force_logon", 1).input().since(6).at(609),
    Field::uint("encryption_level", 1).since(6),

    Field::text("kernel_security", 1).since(7).at(611),
    Field::text("commit_time", 17).output().since(7).format(Format::CommitTime),
    Field::text("compress", 1).input().since(7),

    Field::filler("reserved4", 6).since(8).at(630),
    Field::text("uow_status_time", 8).since(8),
    Field::text("topic", 96).since(8),
    Field::text("publication_id", 16).since(8),

    Field::filler("reserved5", 32).since(9).at(756),
    Field::filler("reserved6", 12).since(9),
    Field::uint("client_id", 4).output().since(9).at(800),
    Field::filler("reserved7", 32).since(9),
    Field::text("log_command", 1).since(9),
    Field::text("credentials_type", 1).since(9),
    Field::filler("reserved8", 34).since(9),

    Field::uint("varlist_offset", 4).since(10).at(872),
    Field::uint("long_broker_id_length", 4).since(10),
];

static LAYOUTS: OnceCell<Vec<Layout>> = OnceCell::new();

fn layouts() -> Result<&'static [Layout]> {
    let all = LAYOUTS.get_or_try_init(|| {
        let full = Layout::define("ControlBlock", FIELDS)?;
        Ok::<_, LayoutError>((API_VERSION_MIN..=API_VERSION_MAX).map(|v| full.for_version(v)).collect())
    })?;
    Ok(all.as_slice())
}

/// Control-block layout at interface `version` (1..=10).
pub fn layout(version: u8) -> Result<&'static Layout> {
    if !(API_VERSION_MIN..=API_VERSION_MAX).contains(&version) {
        return Err(LayoutError::UnsupportedVersion { layout: "ControlBlock", version });
    }
    layouts()?
        .get(usize::from(version - API_VERSION_MIN))
        .ok_or(LayoutError::UnsupportedVersion { layout: "ControlBlock", version })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record::Record, value::Value};

    #[test]
    fn version_lengths() {
        for v in API_VERSION_MIN..=API_VERSION_MAX {
            assert_eq!(layout(v).unwrap().len(), VERSION_LEN[usize::from(v - 1)], "version {v}");
        }
    }

    #[test]
    fn stable_offsets() {
        let cb = layout(10).unwrap();
        let at = |name: &str| cb.slot(name).unwrap().offset;
        assert_eq!(at("send_length"), 20);
        assert_eq!(at("broker_id"), 36);
        assert_eq!(at("conv_id"), 292);
        assert_eq!(at("wait"), 308);
        assert_eq!(at("error_code"), 316);
        assert_eq!(at("environment"), 324);
        assert_eq!(at("conv_stat"), 504);
        assert_eq!(at("uow_id"), 516);
        assert_eq!(at("commit_time"), 612);
        assert_eq!(at("client_id"), 800);
        assert_eq!(at("long_broker_id_length"), 876);
    }

    #[test]
    fn offsets_agree_across_versions() {
        let v1 = layout(1).unwrap();
        let v10 = layout(10).unwrap();
        for slot in v1.slots() {
            assert_eq!(v10.slot(slot.field.name).unwrap().offset, slot.offset);
        }
    }

    #[test]
    fn newer_fields_hidden_in_older_versions() {
        let v2 = layout(2).unwrap();
        assert!(v2.slot("conv_stat").is_ok());
        assert_eq!(
            v2.slot("uow_id").map(|s| s.offset),
            Err(LayoutError::NotInVersion { field: "uow_id", since: 3, active: 2 })
        );
        assert!(layout(7).unwrap().slot("commit_time").is_ok());
        assert!(layout(6).unwrap().slot("commit_time").is_err());
    }

    #[test]
    fn unsupported_versions() {
        assert!(matches!(layout(0), Err(LayoutError::UnsupportedVersion { version: 0, .. })));
        assert!(matches!(layout(11), Err(LayoutError::UnsupportedVersion { version: 11, .. })));
    }

    #[test]
    fn error_code_written_where_the_kernel_expects_it() {
        let mut cb = Record::new(layout(8).unwrap());
        cb.set("error_code", "00740074").unwrap();
        assert_eq!(&cb.as_bytes()[316..324], b"00740074");
        assert_eq!(cb.get("error_code").unwrap(), Value::from("00740074"));
    }
}
