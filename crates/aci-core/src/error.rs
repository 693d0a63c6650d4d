//! Error types for ACI sessions.
//!
//! Kernel outcomes are classified in a fixed order: a non-zero
//! `error_code` wins over a non-zero native return code, because the
//! kernel's explanation is more specific than the stub's.

use aci_proto::{
    ErrorCode, Function, LayoutError, Record,
    cis::{CisHeader, ObjectType},
};
use thiserror::Error;

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, AciError>;

/// Errors raised by ACI and CIS operations.
#[derive(Debug, Error)]
pub enum AciError {
    /// Kernel wait timeout or transport timeout.
    ///
    /// Retryable by re-issuing the same logical operation.
    #[error("{function}: timeout {code}: {text}")]
    Timeout {
        /// Kernel error code, one of the two timeout codes
        code: ErrorCode,
        /// Explanation
        text: String,
        /// Content of the error-text buffer
        errtext: String,
        /// Function that timed out
        function: Function,
    },

    /// Kernel rejected the request.
    #[error("{function}: broker error {code}: {text}")]
    Broker {
        /// Kernel error code
        code: ErrorCode,
        /// Explanation
        text: String,
        /// Content of the error-text buffer
        errtext: String,
        /// Function that failed
        function: Function,
    },

    /// Local stub or transport failure; the kernel may never have seen the
    /// request.
    #[error("{function}: interface error {code} (return code {rc}): {text}")]
    Interface {
        /// Native return code of the transport call
        rc: i32,
        /// Derived code `0020nnnn`
        code: ErrorCode,
        /// Explanation
        text: String,
        /// Content of the error-text buffer
        errtext: String,
        /// Function that failed
        function: Function,
    },

    /// CIS-level semantic error.
    #[error(transparent)]
    Cis(Box<CisError>),

    /// Field access outside the negotiated layout, or a malformed buffer.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Invalid session or CIS configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// [`crate::transport::install`] was called twice.
    #[error("a process-wide transport is already installed")]
    TransportAlreadyInstalled,

    /// No transport given and none installed.
    #[error("no process-wide transport installed")]
    TransportNotInstalled,
}

impl AciError {
    /// Kernel or interface error code, if the error carries one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Timeout { code, .. } | Self::Broker { code, .. } | Self::Interface { code, .. } => {
                Some(*code)
            },
            _ => None,
        }
    }

    /// True for [`AciError::Timeout`].
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// CIS-level error with the request that caused it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CisError {
    /// Human-readable message, including the resolved code text
    pub message: String,
    /// CIS error code from the response header, 0 if the error is local
    pub code: u32,
    /// Object type of the request
    pub object_type: ObjectType,
    /// Snapshot of the originating request record
    pub request: Record,
    /// Response header, if one was received
    pub header: Option<CisHeader>,
}

impl From<CisError> for AciError {
    fn from(err: CisError) -> Self {
        Self::Cis(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_and_code() {
        let err = AciError::Timeout {
            code: ErrorCode::WAIT_TIMEOUT,
            text: "Wait timeout occurred".to_owned(),
            errtext: String::new(),
            function: Function::Receive,
        };
        assert!(err.is_timeout());
        assert_eq!(err.code(), Some(ErrorCode::WAIT_TIMEOUT));
        assert_eq!(err.to_string(), "RECEIVE: timeout 00740074: Wait timeout occurred");
    }

    #[test]
    fn layout_errors_convert() {
        let err: AciError = LayoutError::NotWritable { field: "reserved1" }.into();
        assert!(matches!(err, AciError::Layout(_)));
        assert_eq!(err.code(), None);
    }
}
