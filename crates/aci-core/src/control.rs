//! The control block and its call cycle.
//!
//! A [`ControlBlock`] is a long-lived, mutable session object: one record
//! of the control-block layout plus the send, receive and error-text
//! buffers, all allocated once. Every call writes only the fields it
//! changes; everything else keeps the value of the previous call. Callers
//! rely on this ("last value wins, untouched fields persist"), e.g. for
//! the conversation id and the wait time.
//!
//! # Call cycle
//!
//! ```text
//! overrides -> function -> api_version -> Transport::call -> classify
//! ```
//!
//! Classification order:
//!
//! 1. `error_code` greater than `00000000`: the two timeout codes give
//!    [`AciError::Timeout`], anything else [`AciError::Broker`].
//! 2. Non-zero native return code: [`AciError::Interface`] with code
//!    `0020nnnn`.
//! 3. Success.
//!
//! # Versions
//!
//! The interface version starts at the configured value and can only be
//! lowered, by [`ControlBlock::negotiate`] after VERSION or KERNELVERS.
//! Fields newer than the negotiated version are out of reach; the bytes
//! passed to the stub are exactly the negotiated layout length.

use std::{fmt, sync::Arc};

use aci_proto::{
    AciOption, ErrorCode, Function, Record, Value,
    codes::{API_TYPE, API_VERSION_MIN},
    control_block::{self, ERRTEXT_LEN},
    display,
    dump::dump_titled,
    kernel_errors,
    layout::decode_text,
};
use tracing::{Level, debug, enabled, trace};

use crate::{
    config::SessionConfig,
    error::{AciError, Result},
    transport::Transport,
};

/// Control block, its buffers and the transport they are passed to.
pub struct ControlBlock {
    record: Record,
    send: Vec<u8>,
    receive: Vec<u8>,
    errtext: [u8; ERRTEXT_LEN],
    transport: Arc<dyn Transport>,
}

impl ControlBlock {
    /// Allocate a control block and its buffers for `config`.
    pub fn new(config: &SessionConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let mut record = Record::new(control_block::layout(config.api_version)?);
        record.set("api_type", API_TYPE)?;
        record.set("api_version", config.api_version)?;
        record.set("errtext_length", ERRTEXT_LEN)?;
        record.set("send_length", config.send_length)?;
        record.set("receive_length", config.receive_length)?;
        record.set("broker_id", config.broker_id.as_str())?;
        record.set("user_id", config.user_id.as_str())?;
        if let Some(token) = &config.token {
            record.set("token", token.as_str())?;
        }

        Ok(Self {
            record,
            send: vec![0; config.send_length],
            receive: vec![0; config.receive_length],
            errtext: [0; ERRTEXT_LEN],
            transport,
        })
    }

    /// Negotiated interface version.
    pub fn version(&self) -> u8 {
        self.record.layout().version()
    }

    /// The control-block record.
    pub const fn record(&self) -> &Record {
        &self.record
    }

    /// Mutable control-block record, for fields without a dedicated setter.
    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    /// True if `name` exists at the negotiated version.
    pub fn has(&self, name: &str) -> bool {
        self.record.layout().slot(name).is_ok()
    }

    /// Write a field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        Ok(self.record.set(name, value)?)
    }

    /// Read a text field.
    pub fn text(&self, name: &str) -> Result<String> {
        Ok(self.record.text(name)?)
    }

    /// Read an integer field.
    pub fn uint(&self, name: &str) -> Result<u64> {
        Ok(self.record.uint(name)?)
    }

    /// Current `option` field, `None` for zero or an unknown value.
    pub fn option(&self) -> Option<AciOption> {
        let raw = self.record.uint("option").ok()?;
        AciOption::from_raw(u8::try_from(raw).ok()?)
    }

    /// Set the `option` field, zero for `None`.
    pub fn set_option(&mut self, option: Option<AciOption>) -> Result<()> {
        self.set("option", option.map_or(0, AciOption::to_raw))
    }

    /// Kernel error code of the last call.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from_text(&self.record.text("error_code").unwrap_or_default())
    }

    /// Copy `message` into the send buffer and set `send_length`.
    pub fn set_message(&mut self, message: &[u8]) -> Result<()> {
        let capacity = self.send.len();
        let dst = self.send.get_mut(..message.len()).ok_or_else(|| {
            AciError::Config(format!(
                "message of {} bytes exceeds the {}-byte send buffer",
                message.len(),
                capacity
            ))
        })?;
        dst.copy_from_slice(message);
        self.record.set("send_length", message.len())?;
        Ok(())
    }

    /// The whole send buffer.
    pub fn send_buffer(&self) -> &[u8] {
        &self.send
    }

    /// The whole receive buffer, including bytes past `return_length`.
    pub fn receive_buffer(&self) -> &[u8] {
        &self.receive
    }

    /// The part of the receive buffer filled by the last call.
    pub fn received(&self) -> &[u8] {
        let len = self.record.uint("return_length").map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        &self.receive[..len.min(self.receive.len())]
    }

    /// Error text written by the stub on the last call.
    pub fn errtext(&self) -> String {
        decode_text(&self.errtext)
    }

    /// Lower the interface version to `reported` if that is lower than the
    /// current one. Never raises it.
    pub fn negotiate(&mut self, reported: u64) -> Result<()> {
        let current = self.version();
        let target = u8::try_from(reported)
            .ok()
            .filter(|v| *v >= API_VERSION_MIN)
            .map_or(current, |v| v.min(current));

        if target != current {
            self.record.restrict(control_block::layout(target)?);
            debug!(from = current, to = target, "interface version negotiated down");
        }
        self.set("api_version", target)
    }

    /// Perform one ACI call.
    ///
    /// Applies `overrides`, sets `function`, passes the control block at the
    /// negotiated length to the transport and classifies the outcome. The
    /// stub's view of `error_code` and the error-text buffer is reset before
    /// the call so stale values from an earlier failure cannot leak into
    /// this one.
    pub fn invoke(&mut self, function: Function, overrides: &[(&str, Value)]) -> Result<()> {
        self.record.update(overrides)?;
        self.record.set("function", function.to_raw())?;
        let version = self.version();
        self.record.set("api_version", version)?;
        self.record.set("error_code", "")?;
        self.errtext.fill(0);

        if enabled!(Level::TRACE) {
            self.trace_buffers("before", function);
        }

        let rc = self.transport.call(self.record.as_bytes_mut(), &mut self.send, &mut self.receive, &mut self.errtext);

        if enabled!(Level::TRACE) {
            self.trace_buffers("after", function);
        }

        let code = self.error_code();
        debug!(
            function = function.name(),
            option = self.option().map_or("", AciOption::name),
            conv_id = %self.field_text("conv_id"),
            conv_stat = %self.field_display("conv_stat"),
            return_length = self.record.uint("return_length").unwrap_or(0),
            uow_id = %self.field_text("uow_id"),
            uow_status = %self.field_display("uow_status"),
            commit_time = %display::commit_time(&self.field_text("commit_time")),
            error_code = %code,
            rc,
            "aci call"
        );

        self.classify(function, code, rc)
    }

    fn classify(&self, function: Function, code: ErrorCode, rc: i32) -> Result<()> {
        let errtext = self.errtext();
        if code.is_error() {
            let text = explain(code, &errtext);
            return Err(if code.is_timeout() {
                AciError::Timeout { code, text, errtext, function }
            } else {
                AciError::Broker { code, text, errtext, function }
            });
        }
        if rc != 0 {
            let code = ErrorCode::interface(rc);
            let text = explain(code, &errtext);
            return Err(AciError::Interface { rc, code, text, errtext, function });
        }
        Ok(())
    }

    fn field_text(&self, name: &str) -> String {
        self.record.text(name).unwrap_or_default()
    }

    fn field_display(&self, name: &str) -> String {
        self.record.display_fields(Some(&[name])).pop().map(|(_, v)| v).unwrap_or_default()
    }

    fn trace_buffers(&self, when: &str, function: Function) {
        trace!(%function, "{when} call\n{}", dump_titled("control block", self.record.as_bytes()));
        trace!(%function, "{when} call\n{}", dump_titled("send buffer", &self.send));
        if when == "after" {
            trace!(%function, "{when} call\n{}", dump_titled("receive buffer", self.received()));
        }
        trace!(%function, "{when} call\n{}", dump_titled("error text buffer", &self.errtext));
    }
}

impl fmt::Debug for ControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlBlock")
            .field("version", &self.version())
            .field("conv_id", &self.field_text("conv_id"))
            .field("send_len", &self.send.len())
            .field("receive_len", &self.receive.len())
            .finish_non_exhaustive()
    }
}

/// Kernel text for `code`; the error-text buffer if the table has none.
fn explain(code: ErrorCode, errtext: &str) -> String {
    match (kernel_errors::message(code), errtext.is_empty()) {
        (Some(text), true) => text.to_owned(),
        (Some(text), false) => format!("{text} ({errtext})"),
        (None, false) => errtext.to_owned(),
        (None, true) => format!("error {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(api_version: u8, transport: impl Transport + 'static) -> ControlBlock {
        let config = SessionConfig { api_version, ..SessionConfig::default() };
        ControlBlock::new(&config, Arc::new(transport)).unwrap()
    }

    fn reply(code: &'static [u8; 8], rc: i32) -> impl Transport {
        move |cb: &mut [u8], _: &mut [u8], _: &mut [u8], errtext: &mut [u8]| {
            cb[316..324].copy_from_slice(code);
            errtext[..9].copy_from_slice(b"from stub");
            rc
        }
    }

    #[test]
    fn setup_fields() {
        let cb = block(7, reply(b"00000000", 0));
        assert_eq!(cb.version(), 7);
        assert_eq!(cb.uint("api_type").unwrap(), 1);
        assert_eq!(cb.uint("errtext_length").unwrap(), 80);
        assert_eq!(cb.uint("receive_length").unwrap(), 2048);
        assert_eq!(cb.text("broker_id").unwrap(), "localhost");
        assert_eq!(cb.record().as_bytes().len(), 630);
    }

    #[test]
    fn success() {
        let mut cb = block(7, reply(b"00000000", 0));
        cb.invoke(Function::Send, &[]).unwrap();
        assert_eq!(cb.uint("function").unwrap(), 1);
    }

    #[test]
    fn wait_timeout_is_timeout() {
        let mut cb = block(7, reply(b"00740074", 0));
        let err = cb.invoke(Function::Receive, &[]).unwrap_err();
        assert!(err.is_timeout(), "{err}");
    }

    #[test]
    fn transport_timeout_is_timeout() {
        let mut cb = block(7, reply(b"02150373", 0));
        assert!(cb.invoke(Function::Receive, &[]).unwrap_err().is_timeout());
    }

    #[test]
    fn kernel_error_wins_over_return_code() {
        let mut cb = block(7, reply(b"00070007", 5));
        let AciError::Broker { code, text, errtext, function } = cb.invoke(Function::Send, &[]).unwrap_err() else {
            unreachable!("expected a broker error");
        };
        assert_eq!(code.to_string(), "00070007");
        assert_eq!(text, "Service not registered (from stub)");
        assert_eq!(errtext, "from stub");
        assert_eq!(function, Function::Send);
    }

    #[test]
    fn unknown_kernel_code_uses_error_text() {
        let mut cb = block(7, reply(b"99990001", 0));
        let AciError::Broker { text, .. } = cb.invoke(Function::Send, &[]).unwrap_err() else {
            unreachable!("expected a broker error");
        };
        assert_eq!(text, "from stub");
    }

    #[test]
    fn return_code_alone_is_interface_error() {
        let mut cb = block(7, reply(b"00000000", 3));
        let AciError::Interface { rc, code, .. } = cb.invoke(Function::Logon, &[]).unwrap_err() else {
            unreachable!("expected an interface error");
        };
        assert_eq!(rc, 3);
        assert_eq!(code.to_string(), "00200003");
    }

    #[test]
    fn stale_error_code_cleared_before_call() {
        let mut cb = block(7, |_: &mut [u8], _: &mut [u8], _: &mut [u8], _: &mut [u8]| 0);
        cb.set("error_code", "00070007").unwrap();
        cb.invoke(Function::Send, &[]).unwrap();
    }

    #[test]
    fn overrides_applied_and_untouched_fields_persist() {
        let mut cb = block(7, reply(b"00000000", 0));
        cb.set("wait", "30S").unwrap();
        cb.invoke(Function::Receive, &[("conv_id", Value::from("NEW"))]).unwrap();
        cb.invoke(Function::Receive, &[]).unwrap();
        assert_eq!(cb.text("conv_id").unwrap(), "NEW");
        assert_eq!(cb.text("wait").unwrap(), "30S");
    }

    #[test]
    fn stub_sees_negotiated_length() {
        let mut cb = block(8, |cb: &mut [u8], _: &mut [u8], _: &mut [u8], _: &mut [u8]| {
            i32::from(cb.len() != 756)
        });
        cb.invoke(Function::Version, &[]).unwrap();
        cb.negotiate(4).unwrap();
        assert_eq!(cb.version(), 4);
        assert!(cb.invoke(Function::Version, &[]).is_err(), "stub now sees 609 bytes");
    }

    #[test]
    fn negotiation_never_goes_up() {
        let mut cb = block(7, reply(b"00000000", 0));
        cb.negotiate(10).unwrap();
        assert_eq!(cb.version(), 7);
        cb.negotiate(3).unwrap();
        assert_eq!(cb.version(), 3);
        cb.negotiate(7).unwrap();
        assert_eq!(cb.version(), 3);
        cb.negotiate(0).unwrap();
        assert_eq!(cb.version(), 3, "zero is not a version");
        assert!(!cb.has("locale_string"));
        assert!(cb.has("uow_id"));
    }

    #[test]
    fn oversized_message_rejected() {
        let mut cb = block(7, reply(b"00000000", 0));
        assert!(matches!(cb.set_message(&[0; 4096]), Err(AciError::Config(_))));
        cb.set_message(b"hello").unwrap();
        assert_eq!(cb.uint("send_length").unwrap(), 5);
        assert_eq!(&cb.send_buffer()[..5], b"hello");
    }
}
