//! ACI discriminators and status codes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident : $repr:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
        #[repr($repr)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// Wire value.
            pub const fn to_raw(self) -> $repr {
                self as $repr
            }

            /// Parse a wire value.
            pub const fn from_raw(raw: $repr) -> Option<Self> {
                match raw {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Upper-case name as used in broker documentation.
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub(crate) use code_enum;

/// Lowest interface version.
pub const API_VERSION_MIN: u8 = 1;

/// Highest interface version with a known layout.
pub const API_VERSION_MAX: u8 = 10;

/// Interface version sessions request unless configured otherwise.
pub const API_VERSION_DEFAULT: u8 = 7;

/// Value of the `api_type` field.
pub const API_TYPE: u8 = 1;

code_enum! {
    /// ACI function, the `function` field.
    Function: u8 {
        /// Send a message
        Send = 1 => "SEND",
        /// Receive a message
        Receive = 2 => "RECEIVE",
        /// Withdraw messages not yet received
        Undo = 4 => "UNDO",
        /// End conversation
        Eoc = 5 => "EOC",
        /// Advertise a service
        Register = 6 => "REGISTER",
        /// Withdraw a service
        Deregister = 7 => "DEREGISTER",
        /// Stub version
        Version = 8 => "VERSION",
        /// Open a kernel session
        Logon = 9 => "LOGON",
        /// Close a kernel session
        Logoff = 10 => "LOGOFF",
        /// Set a stub parameter
        Set = 11 => "SET",
        /// Get a stub parameter
        Get = 12 => "GET",
        /// Unit-of-work control
        Syncpoint = 13 => "SYNCPOINT",
        /// Kernel version
        KernelVers = 14 => "KERNELVERS",
        /// Locale translation
        LocTrans = 15 => "LOCTRANS",
        /// TLS parameters
        SetSslParms = 16 => "SETSSLPARMS",
        /// Publish
        SendPublication = 17 => "SENDPUBLICATION",
        /// Receive a publication
        RecvPublication = 18 => "RECVPUBLICATION",
        /// Subscribe to a topic
        Subscribe = 19 => "SUBSCRIBE",
        /// Unsubscribe from a topic
        Unsubscribe = 20 => "UNSUBSCRIBE",
        /// Publication control
        CntlPublication = 21 => "CNTLPUBLICATION",
        /// Reply with an error
        ReplyError = 22 => "REPLYERROR",
    }
}

code_enum! {
    /// ACI option, the `option` field.
    ///
    /// Zero means "no option" and has no variant.
    AciOption: u8 {
        /// Message mode
        Msg = 1 => "MSG",
        /// Hold
        Hold = 2 => "HOLD",
        /// Immediately
        Immed = 3 => "IMMED",
        /// After current work completes
        Quiesce = 4 => "QUIESCE",
        /// End of conversation
        Eoc = 5 => "EOC",
        /// Abort
        Cancel = 6 => "CANCEL",
        /// Last message
        Last = 7 => "LAST",
        /// Next message
        Next = 8 => "NEXT",
        /// Look without consuming
        Preview = 9 => "PREVIEW",
        /// Commit unit of work
        Commit = 10 => "COMMIT",
        /// Back out unit of work
        Backout = 11 => "BACKOUT",
        /// Synchronous
        Sync = 12 => "SYNC",
        /// Attach server
        Attach = 13 => "ATTACH",
        /// Delete
        Delete = 14 => "DELETE",
        /// End of conversation and cancel
        EocCancel = 15 => "EOCCANCEL",
        /// Query
        Query = 16 => "QUERY",
        /// Set user status
        SetUStatus = 17 => "SETUSTATUS",
        /// Any pending conversation
        Any = 18 => "ANY",
        /// Terminate
        Terminate = 19 => "TERMINATE",
        /// Durable subscription
        Durable = 20 => "DURABLE",
        /// Check service
        CheckService = 21 => "CHECKSERVICE",
        /// Extended reply
        Extended = 22 => "EXTENDED",
    }
}

code_enum! {
    /// Conversation status reported in `conv_stat`.
    ConvStat: u8 {
        /// First message of a new conversation
        New = 1 => "NEW",
        /// Message of an existing conversation
        Old = 2 => "OLD",
        /// Non-conversational
        None = 3 => "NONE",
    }
}

code_enum! {
    /// Unit-of-work status, the `uow_status` field.
    UowStatus: u8 {
        /// No unit of work received
        RecvNone = 0 => "RECV_NONE",
        /// Received
        Received = 1 => "RECEIVED",
        /// Accepted
        Accepted = 2 => "ACCEPTED",
        /// Delivered
        Delivered = 3 => "DELIVERED",
        /// Backed out
        Backedout = 4 => "BACKEDOUT",
        /// Processed
        Processed = 5 => "PROCESSED",
        /// Cancelled
        Cancelled = 6 => "CANCELLED",
        /// Timed out
        Timeout = 7 => "TIMEOUT",
        /// Discarded
        Discarded = 8 => "DISCARDED",
        /// First message of a multi-message unit
        RecvFirst = 9 => "RECV_FIRST",
        /// Middle message
        RecvMiddle = 10 => "RECV_MIDDLE",
        /// Last message
        RecvLast = 11 => "RECV_LAST",
        /// Only message
        RecvOnly = 12 => "RECV_ONLY",
    }
}

impl Default for UowStatus {
    fn default() -> Self {
        Self::RecvNone
    }
}

/// `store` field values.
pub mod store {
    /// Unit of work is not persistent
    pub const OFF: u8 = 1;
    /// Unit of work is persisted by the broker
    pub const BROKER: u8 = 2;
}

/// `status` field values.
pub mod status {
    /// Off
    pub const OFF: u8 = 1;
    /// Stored
    pub const STORED: u8 = 2;
    /// Delivery attempted
    pub const DELIVERY_ATTEMPT: u8 = 3;
    /// Delivered
    pub const DELIVERED: u8 = 4;
    /// Processed
    pub const PROCESSED: u8 = 5;
    /// Dead
    pub const DEAD: u8 = 6;
}

/// `uow_status_persist` field values.
pub mod uow_status_persist {
    /// Use the broker default
    pub const DEFAULT: u8 = 0x00;
    /// Status is not persistent
    pub const NO: u8 = 0xff;
}

/// `encryption_level` field values.
pub mod encryption_level {
    /// No encryption
    pub const NONE: u8 = 0;
    /// Encrypt up to the broker
    pub const TO_BROKER: u8 = 1;
    /// Encrypt up to the target
    pub const TO_TARGET: u8 = 2;
}

/// `force_logon` field values.
pub mod force_logon {
    /// Do not force
    pub const NO: &str = "N";
    /// Force
    pub const YES: &str = "Y";
    /// Server
    pub const S: &str = "S";
}

/// `kernel_security` field values, reported by the kernel.
pub mod kernel_security {
    /// No security
    pub const NO: &str = "N";
    /// Security
    pub const YES: &str = "Y";
    /// User exits
    pub const USER: &str = "U";
    /// Light
    pub const LIGHT: &str = "L";
}

/// `compress` field values: `"0"`..=`"9"`, or these.
pub mod compress {
    /// No compression
    pub const NO: &str = "N";
    /// Default compression
    pub const YES: &str = "Y";
}

/// Eight-digit kernel error code, `CCCCNNNN` (class, number).
///
/// Compared byte-wise against `"00000000"`, so blank or NUL codes written
/// by a stub that never reached the kernel count as success.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode([u8; 8]);

impl ErrorCode {
    /// All-zero success code.
    pub const SUCCESS: Self = Self(*b"00000000");
    /// Kernel wait timeout.
    pub const WAIT_TIMEOUT: Self = Self(*b"00740074");
    /// Transport timeout.
    pub const TRANSPORT_TIMEOUT: Self = Self(*b"02150373");

    /// Code from the text of the `error_code` field, blank padded to 8.
    pub fn from_text(text: &str) -> Self {
        let mut raw = [b' '; 8];
        crate::layout::encode_text(text, &mut raw);
        Self(raw)
    }

    /// Interface error code `0020nnnn` for a native return code.
    pub fn interface(rc: i32) -> Self {
        Self::from_text(&format!("0020{:04}", rc.unsigned_abs() % 10_000))
    }

    /// True if this code is greater than the success code.
    pub fn is_error(&self) -> bool {
        *self > Self::SUCCESS
    }

    /// True for the two timeout codes.
    pub fn is_timeout(&self) -> bool {
        *self == Self::WAIT_TIMEOUT || *self == Self::TRANSPORT_TIMEOUT
    }

    /// Error class, the first four digits.
    pub fn class(&self) -> Option<u16> {
        std::str::from_utf8(&self.0[..4]).ok()?.parse().ok()
    }

    /// Error number, the last four digits.
    pub fn number(&self) -> Option<u16> {
        std::str::from_utf8(&self.0[4..]).ok()?.parse().ok()
    }

    /// Raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::layout::decode_text(&self.0))
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorCode({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_round_trip() {
        for raw in 0u8..=30 {
            if let Some(f) = Function::from_raw(raw) {
                assert_eq!(f.to_raw(), raw);
            }
        }
        assert_eq!(Function::from_raw(3), None);
        assert_eq!(Function::KernelVers.name(), "KERNELVERS");
    }

    #[test]
    fn option_values_match_broker_constants() {
        assert_eq!(AciOption::Commit.to_raw(), 0x0a);
        assert_eq!(AciOption::Any.to_raw(), 0x12);
        assert_eq!(AciOption::Extended.to_raw(), 0x16);
        assert_eq!(AciOption::from_raw(0), None);
    }

    #[test]
    fn uow_status_names() {
        assert_eq!(UowStatus::default(), UowStatus::RecvNone);
        assert_eq!(UowStatus::from_raw(12).map(UowStatus::name), Some("RECV_ONLY"));
        assert_eq!(UowStatus::from_raw(13), None);
    }

    #[test]
    fn error_code_ordering() {
        assert!(!ErrorCode::SUCCESS.is_error());
        assert!(!ErrorCode::from_text("").is_error(), "blank code is success");
        assert!(ErrorCode::from_text("00000001").is_error());
        assert!(ErrorCode::WAIT_TIMEOUT.is_timeout());
        assert!(ErrorCode::from_text("02150373").is_timeout());
        assert!(!ErrorCode::from_text("02150374").is_timeout());
    }

    #[test]
    fn error_code_parts() {
        let code = ErrorCode::from_text("00740074");
        assert_eq!(code.class(), Some(74));
        assert_eq!(code.number(), Some(74));
        assert_eq!(code.to_string(), "00740074");
        assert_eq!(ErrorCode::interface(-5).to_string(), "00200005");
        assert_eq!(ErrorCode::from_text("").class(), None);
    }
}
