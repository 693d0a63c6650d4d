//! Conversation and unit-of-work operations.
//!
//! Each operation sets `function` (and `option` where the operation owns
//! it), calls [`ControlBlock::invoke`] and applies its post-condition.
//! Optional arguments are written only when given, so the previous call's
//! values stay in effect otherwise.
//!
//! # Post-conditions
//!
//! | Operation                   | Cleared on success              |
//! |-----------------------------|---------------------------------|
//! | `send` with COMMIT          | UOW id and status               |
//! | `send` with EOC             | conversation id, UOW id, status |
//! | `syncpoint` with COMMIT     | UOW id and status               |
//! | `commit`, `backout`         | UOW id and status               |
//! | `commit_end_conversation`   | conversation id, UOW id, status |
//!
//! The COMMIT/EOC checks look at the `option` field after the call, which
//! may be a value left over from an earlier call.

use std::sync::Arc;

use aci_proto::{
    AciOption, Function, UowStatus,
    control_block::{CONV_NEW, CONV_NONE},
    layout::decode_text,
};
use tracing::info;

use crate::{
    config::SessionConfig,
    control::ControlBlock,
    error::Result,
    transport::{self, Transport},
};

/// Kernel identification returned by KERNELVERS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelInfo {
    /// Version text, e.g. `Version 9.12.0.1`
    pub version: String,
    /// Largest message the kernel accepts
    pub max_message_size: u64,
    /// Kernel security setting, empty before interface version 7
    pub kernel_security: String,
}

impl KernelInfo {
    /// Major version number from the version text.
    pub fn major(&self) -> Option<u32> {
        parse_major(&self.version)
    }
}

/// Major number of a `Version M.m.p.b` text.
pub fn parse_major(version: &str) -> Option<u32> {
    let (_, number) = version.trim().split_once(' ')?;
    number.trim_start().split('.').next()?.parse().ok()
}

/// A broker session: one control block with conversation/UOW operations.
#[derive(Debug)]
pub struct Broker {
    cb: ControlBlock,
}

impl Broker {
    /// Session using `transport`.
    pub fn new(config: &SessionConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self { cb: ControlBlock::new(config, transport)? })
    }

    /// Session using the process-wide transport.
    pub fn from_installed(config: &SessionConfig) -> Result<Self> {
        Self::new(config, transport::installed()?)
    }

    /// The underlying control block.
    pub const fn control_block(&self) -> &ControlBlock {
        &self.cb
    }

    /// Mutable control block, for fields without a dedicated setter.
    pub fn control_block_mut(&mut self) -> &mut ControlBlock {
        &mut self.cb
    }

    /// Current conversation id, empty if none.
    pub fn conv_id(&self) -> String {
        self.cb.text("conv_id").unwrap_or_default()
    }

    /// Set the conversation id for the next call.
    pub fn set_conv_id(&mut self, conv_id: &str) -> Result<()> {
        self.cb.set("conv_id", conv_id)
    }

    /// Set the wait time for the next call, e.g. `YES`, `NO` or `30S`.
    pub fn set_wait(&mut self, wait: &str) -> Result<()> {
        self.cb.set("wait", wait)
    }

    /// Set the service addressed by the next call.
    pub fn set_service(&mut self, server_class: &str, server_name: &str, service: &str) -> Result<()> {
        self.cb.set("server_class", server_class)?;
        self.cb.set("server_name", server_name)?;
        self.cb.set("service", service)
    }

    /// Current UOW id, empty if none or before interface version 3.
    pub fn uow_id(&self) -> String {
        self.cb.text("uow_id").unwrap_or_default()
    }

    /// Current UOW status, `RECV_NONE` before interface version 3.
    pub fn uow_status(&self) -> UowStatus {
        self.cb
            .uint("uow_status")
            .ok()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(UowStatus::from_raw)
            .unwrap_or_default()
    }

    /// Copy a message into the send buffer for the next SEND.
    pub fn set_message(&mut self, message: &[u8]) -> Result<()> {
        self.cb.set_message(message)
    }

    /// Data returned by the last call.
    pub fn received(&self) -> &[u8] {
        self.cb.received()
    }

    fn clear_uow(&mut self) -> Result<()> {
        if self.cb.has("uow_id") {
            self.cb.set("uow_id", "")?;
            self.cb.set("uow_status", UowStatus::RecvNone.to_raw())?;
        }
        Ok(())
    }

    fn clear_conversation(&mut self) -> Result<()> {
        self.cb.set("conv_id", "")?;
        self.clear_uow()
    }

    fn apply_optional(&mut self, conv_id: Option<&str>, option: Option<AciOption>) -> Result<()> {
        if let Some(conv_id) = conv_id {
            self.cb.set("conv_id", conv_id)?;
        }
        if option.is_some() {
            self.cb.set_option(option)?;
        }
        Ok(())
    }

    /// Open a session with the kernel, presenting `password` if given.
    pub fn logon(&mut self, password: Option<&str>) -> Result<()> {
        if let Some(password) = password {
            self.cb.set("password", password)?;
        }
        self.cb.set_option(None)?;
        self.cb.invoke(Function::Logon, &[])
    }

    /// Close the session with the kernel.
    pub fn logoff(&mut self) -> Result<()> {
        self.cb.set_option(Some(AciOption::Hold))?;
        self.cb.invoke(Function::Logoff, &[])
    }

    /// Advertise the configured service. ATTACH is the only meaningful
    /// option.
    pub fn register(&mut self, option: Option<AciOption>) -> Result<()> {
        self.cb.set_option(option)?;
        self.cb.invoke(Function::Register, &[])
    }

    /// Withdraw the configured service after current work completes.
    pub fn deregister(&mut self) -> Result<()> {
        self.cb.set_option(Some(AciOption::Quiesce))?;
        self.cb.invoke(Function::Deregister, &[])
    }

    /// Send the send buffer on `conv_id` (or the current conversation).
    pub fn send(&mut self, conv_id: Option<&str>, option: Option<AciOption>) -> Result<()> {
        self.apply_optional(conv_id, option)?;
        self.cb.invoke(Function::Send, &[])?;
        match self.cb.option() {
            Some(AciOption::Commit) => self.clear_uow(),
            Some(AciOption::Eoc) => self.clear_conversation(),
            _ => Ok(()),
        }
    }

    /// Receive a message into the receive buffer.
    pub fn receive(&mut self, conv_id: Option<&str>, option: Option<AciOption>, wait: Option<&str>) -> Result<()> {
        self.apply_optional(conv_id, option)?;
        if let Some(wait) = wait {
            self.cb.set("wait", wait)?;
        }
        self.cb.invoke(Function::Receive, &[])
    }

    /// Receive the first message of any new conversation.
    pub fn receive_new(&mut self, wait: Option<&str>) -> Result<()> {
        self.cb.set("conv_id", CONV_NEW)?;
        self.cb.set_option(Some(AciOption::Any))?;
        if let Some(wait) = wait {
            self.cb.set("wait", wait)?;
        }
        self.cb.invoke(Function::Receive, &[])
    }

    /// Unit-of-work control.
    pub fn syncpoint(&mut self, option: Option<AciOption>) -> Result<()> {
        self.apply_optional(None, option)?;
        self.cb.invoke(Function::Syncpoint, &[])?;
        if self.cb.option() == Some(AciOption::Commit) { self.clear_uow() } else { Ok(()) }
    }

    /// Commit the current UOW and keep the conversation.
    pub fn commit(&mut self) -> Result<()> {
        self.cb.set_option(Some(AciOption::Commit))?;
        self.cb.invoke(Function::Syncpoint, &[])?;
        self.clear_uow()
    }

    /// Back out the current UOW and keep the conversation.
    pub fn backout(&mut self) -> Result<()> {
        self.cb.set_option(Some(AciOption::Backout))?;
        self.cb.invoke(Function::Syncpoint, &[])?;
        self.clear_uow()
    }

    /// Commit the current UOW and end the conversation.
    pub fn commit_end_conversation(&mut self) -> Result<()> {
        self.cb.set_option(Some(AciOption::Eoc))?;
        self.cb.invoke(Function::Syncpoint, &[])?;
        self.clear_conversation()
    }

    /// End the current conversation. CANCEL aborts it.
    pub fn end_conversation(&mut self, option: Option<AciOption>) -> Result<()> {
        self.cb.set_option(option)?;
        self.cb.invoke(Function::Eoc, &[])
    }

    /// Remove messages sent but not yet received.
    pub fn undo(&mut self) -> Result<()> {
        self.cb.invoke(Function::Undo, &[])
    }

    /// Stub version text. Lowers the interface version to the stub's.
    pub fn version(&mut self) -> Result<String> {
        self.cb.invoke(Function::Version, &[])?;
        let reported = self.cb.uint("api_version")?;
        self.cb.negotiate(reported)?;
        let text = match self.cb.received() {
            [] => String::new(),
            [text @ .., _] => decode_text(text),
        };
        info!(stub = %text, api_version = self.cb.version(), "broker stub");
        Ok(text)
    }

    /// Kernel version text and limits. Lowers the interface version to
    /// the kernel's.
    pub fn kernel_version(&mut self) -> Result<KernelInfo> {
        self.cb.set_option(Some(AciOption::Extended))?;
        self.cb.invoke(Function::KernelVers, &[])?;
        let max_message_size = self.cb.uint("return_length")?;
        let reported = self.cb.uint("api_version")?;
        self.cb.negotiate(reported)?;
        let kernel = KernelInfo {
            version: self.cb.errtext(),
            max_message_size,
            kernel_security: self.cb.text("kernel_security").unwrap_or_default(),
        };
        info!(kernel = %kernel.version, max_message_size, api_version = self.cb.version(), "broker kernel");
        Ok(kernel)
    }

    /// Mark the control block as not part of any conversation.
    pub fn set_non_conversational(&mut self) -> Result<()> {
        self.cb.set("conv_id", CONV_NONE)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records each call's function/option and writes fixed outputs.
    fn recording(log: Arc<Mutex<Vec<(u8, u8)>>>) -> Arc<dyn Transport> {
        Arc::new(move |cb: &mut [u8], _: &mut [u8], receive: &mut [u8], errtext: &mut [u8]| {
            log.lock().unwrap().push((cb[2], cb[3]));
            match cb[2] {
                8 => {
                    receive[..11].copy_from_slice(b"STUB 10.5\0\0");
                    cb[28..32].copy_from_slice(&10u32.to_be_bytes());
                    cb[1] = 10;
                },
                14 => {
                    errtext[..16].copy_from_slice(b"Version 9.12.0.1");
                    cb[28..32].copy_from_slice(&1_048_576u32.to_be_bytes());
                    cb[1] = 9;
                },
                1 | 2 => {
                    cb[292..296].copy_from_slice(b"1234");
                    cb[516..520].copy_from_slice(b"UOW1");
                    cb[507] = 2;
                },
                _ => {},
            }
            0
        })
    }

    fn broker() -> (Broker, Arc<Mutex<Vec<(u8, u8)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let b = Broker::new(&SessionConfig::default(), recording(Arc::clone(&log))).unwrap();
        (b, log)
    }

    #[test]
    fn parse_major_versions() {
        assert_eq!(parse_major("Version 9.12.0.1"), Some(9));
        assert_eq!(parse_major("Version 10.3.0.0"), Some(10));
        assert_eq!(parse_major("garbage"), None);
    }

    #[test]
    fn version_strips_terminator_and_clamps() {
        let (mut b, _) = broker();
        assert_eq!(b.version().unwrap(), "STUB 10.5");
        assert_eq!(b.control_block().version(), 7, "stub reported 10, requested 7");
    }

    #[test]
    fn kernel_version_reads_error_text() {
        let (mut b, log) = broker();
        let k = b.kernel_version().unwrap();
        assert_eq!(k.version, "Version 9.12.0.1");
        assert_eq!(k.major(), Some(9));
        assert_eq!(k.max_message_size, 1_048_576);
        assert_eq!(log.lock().unwrap()[0], (14, 22));
    }

    #[test]
    fn operation_options() {
        let (mut b, log) = broker();
        b.logon(Some("secret")).unwrap();
        b.logoff().unwrap();
        b.register(None).unwrap();
        b.deregister().unwrap();
        b.end_conversation(Some(AciOption::Cancel)).unwrap();
        b.receive_new(None).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![(9, 0), (10, 2), (6, 0), (7, 4), (5, 6), (2, 18)]);
        assert_eq!(b.control_block().text("password").unwrap(), "secret");
    }

    #[test]
    fn send_commit_clears_uow_keeps_conversation() {
        let (mut b, _) = broker();
        b.send(Some(CONV_NEW), None).unwrap();
        assert_eq!(b.uow_id(), "UOW1");
        assert_eq!(b.uow_status(), UowStatus::Accepted);

        b.send(None, Some(AciOption::Commit)).unwrap();
        assert_eq!(b.uow_id(), "");
        assert_eq!(b.uow_status(), UowStatus::RecvNone);
        assert_eq!(b.conv_id(), "1234");
    }

    #[test]
    fn send_eoc_clears_conversation() {
        let (mut b, _) = broker();
        b.send(Some(CONV_NEW), Some(AciOption::Eoc)).unwrap();
        assert_eq!(b.conv_id(), "");
        assert_eq!(b.uow_id(), "");
    }

    #[test]
    fn optional_arguments_are_sticky() {
        let (mut b, log) = broker();
        b.receive(Some("OLD"), Some(AciOption::Last), Some("10S")).unwrap();
        b.receive(None, None, None).unwrap();
        assert_eq!(log.lock().unwrap()[1], (2, 7));
        assert_eq!(b.control_block().text("wait").unwrap(), "10S");
    }

    #[test]
    fn commit_end_conversation_clears_both() {
        let (mut b, log) = broker();
        b.receive(Some(CONV_NEW), None, Some("YES")).unwrap();
        b.commit_end_conversation().unwrap();
        assert_eq!(b.conv_id(), "");
        assert_eq!(b.uow_status(), UowStatus::RecvNone);
        assert_eq!(log.lock().unwrap()[1], (13, 5));
    }

    #[test]
    fn uow_fields_absent_before_version_3() {
        let config = SessionConfig { api_version: 2, ..SessionConfig::default() };
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut b = Broker::new(&config, recording(log)).unwrap();
        b.commit().unwrap();
        assert_eq!(b.uow_id(), "");
        assert_eq!(b.uow_status(), UowStatus::RecvNone);
    }
}
