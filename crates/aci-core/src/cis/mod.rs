//! Command & Information Service sessions.
//!
//! A [`Cis`] is a broker session logged on to one of the `SAG/ETBCIS`
//! services. Requests travel in the send buffer; responses start with a
//! CIS header.
//!
//! - [`Cis::icmd`] sends one administrative command, non-conversationally.
//! - [`Cis::iget`] fetches a single object on a short-lived conversation.
//! - [`Cis::iread`] streams objects page by page on a dedicated session, see
//!   [`InfoReader`].

mod reader;
mod selector;

use std::sync::Arc;

use aci_proto::{
    Layout, Record,
    cis::{
        self, CisHeader, CisOption, Command, CommandRequest, HEADER_LEN, InfoRecord, InfoRequest, ObjectType, Page,
        codes::{NOTHING_FOUND, command_error_text, info_error_text},
        request::{CIS_VERSION_LEGACY, CIS_VERSION_MAX, CIS_VERSION_UOW_STATISTICS, command_layout, info_layout},
    },
    control_block::{CONV_NEW, CONV_NONE, WAIT_YES},
};
use tracing::{info, warn};

pub use self::{
    reader::InfoReader,
    selector::{CommandSelector, InfoSelector},
};
use crate::{
    broker::{Broker, KernelInfo},
    config::{CisConfig, CisService},
    error::{AciError, CisError, Result},
    transport::{self, Transport},
};

const IGET_TYPES: &[ObjectType] = &[ObjectType::Broker, ObjectType::UowStatistics];

const IREAD_TYPES: &[ObjectType] = &[
    ObjectType::Client,
    ObjectType::Server,
    ObjectType::Conversation,
    ObjectType::Psf,
    ObjectType::Service,
    ObjectType::UowStatistics,
];

/// A session with a CIS service.
pub struct Cis {
    config: CisConfig,
    transport: Arc<dyn Transport>,
    broker: Broker,
    kernel: Option<KernelInfo>,
    cis_version: u16,
    logged_on: bool,
}

impl std::fmt::Debug for Cis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cis")
            .field("config", &self.config)
            .field("broker", &self.broker)
            .field("kernel", &self.kernel)
            .field("cis_version", &self.cis_version)
            .field("logged_on", &self.logged_on)
            .finish_non_exhaustive()
    }
}

impl Cis {
    /// Session using `transport`. Nothing is sent until [`Cis::open`].
    pub fn new(config: CisConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let send_length = command_layout()?.len().max(info_layout()?.len());
        let mut broker = Broker::new(&config.session(send_length), Arc::clone(&transport))?;
        broker.set_service(CisService::SERVER_CLASS, CisService::SERVER_NAME, config.service.name())?;
        Ok(Self { config, transport, broker, kernel: None, cis_version: CIS_VERSION_MAX, logged_on: false })
    }

    /// Session using the process-wide transport.
    pub fn from_installed(config: CisConfig) -> Result<Self> {
        let transport = transport::installed()?;
        Self::new(config, transport)
    }

    /// Query stub and kernel versions, pick the CIS interface version and
    /// log on.
    pub fn open(&mut self) -> Result<&KernelInfo> {
        let stub = self.broker.version()?;
        let kernel = self.broker.kernel_version()?;
        self.cis_version = match kernel.major() {
            Some(major) if major >= 10 => CIS_VERSION_MAX,
            _ => CIS_VERSION_LEGACY,
        };
        self.broker.logon(self.config.password.as_deref())?;
        self.logged_on = true;
        info!(
            broker_id = %self.config.broker_id,
            service = self.config.service.name(),
            %stub,
            kernel = %kernel.version,
            cis_version = self.cis_version,
            "cis session started"
        );
        Ok(self.kernel.insert(kernel))
    }

    /// Log off. Dropping an open session logs off too, ignoring errors.
    pub fn close(mut self) -> Result<()> {
        self.logoff()
    }

    fn logoff(&mut self) -> Result<()> {
        if !self.logged_on {
            return Ok(());
        }
        self.logged_on = false;
        self.broker.logoff()?;
        info!(broker_id = %self.config.broker_id, "cis session ended");
        Ok(())
    }

    /// Kernel information from [`Cis::open`].
    pub const fn kernel(&self) -> Option<&KernelInfo> {
        self.kernel.as_ref()
    }

    /// CIS interface version used for commands.
    pub const fn cis_version(&self) -> u16 {
        self.cis_version
    }

    /// The main broker session.
    pub const fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Send one command and return the response header.
    pub fn icmd(
        &mut self,
        object_type: ObjectType,
        command: Command,
        option: Option<CisOption>,
        selector: &CommandSelector,
    ) -> Result<CisHeader> {
        let mut request = CommandRequest::new(self.cis_version)?;
        request.set("object_type", object_type.to_raw())?;
        request.set("command", command.to_raw())?;
        request.set("option", option.map_or(0, CisOption::to_raw))?;
        selector.apply(&mut request)?;
        let request = request.into_record();

        if self.config.service.is_information() {
            return Err(local_error(
                format!("service {} does not accept commands", self.config.service.name()),
                object_type,
                request,
            ));
        }

        self.broker.set_conv_id(CONV_NONE)?;
        self.broker.set_wait(WAIT_YES)?;
        if command == Command::SetSingleConversation {
            self.broker.control_block_mut().set("token", selector.token.as_str())?;
        }
        self.broker.set_message(request.as_bytes())?;
        self.broker.send(None, None)?;

        let header = CisHeader::parse(self.broker.received())?;
        match header.error_code() {
            0 => {
                info!(%object_type, %command, "cis command");
                Ok(header)
            },
            code => {
                let text = command_error_text(code).map_or_else(|| header.etb_error_text(), str::to_owned);
                Err(CisError {
                    message: format!("Broker Command Service Error {code}: {text}"),
                    code,
                    object_type,
                    request,
                    header: Some(header),
                }
                .into())
            },
        }
    }

    /// Fetch one object. `Ok(None)` when the kernel found nothing.
    ///
    /// Only BROKER and UOW_STATISTICS describe a single object.
    pub fn iget(&mut self, object_type: ObjectType, selector: &InfoSelector) -> Result<Option<InfoRecord>> {
        let (layout, request) = info_request(object_type, selector, IGET_TYPES, self.config.receive_length)?;

        self.broker.set_wait(WAIT_YES)?;
        self.broker.set_message(request.as_bytes())?;
        self.broker.send(Some(CONV_NEW), None)?;

        let outcome = extract_single(self.broker.received(), layout, object_type, &request);
        let ended = self.broker.end_conversation(None);
        match (outcome, ended) {
            (Ok(found), Ok(())) => Ok(found),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), ended) => {
                if let Err(end_err) = ended {
                    warn!(error = %end_err, "failed to end information conversation");
                }
                Err(err)
            },
        }
    }

    /// Stream all objects of `object_type` matching `selector`.
    ///
    /// The read runs on its own session so the main session's conversation
    /// state is untouched.
    pub fn iread(&mut self, object_type: ObjectType, selector: &InfoSelector) -> Result<InfoReader> {
        let (layout, request) = info_request(object_type, selector, IREAD_TYPES, self.config.receive_length)?;

        let mut session = self.config.session(info_layout()?.len());
        session.api_version = self.broker.control_block().version();
        let service = if self.config.service.is_information() { self.config.service } else { CisService::Info };

        let mut reader = Broker::new(&session, Arc::clone(&self.transport))?;
        reader.set_service(CisService::SERVER_CLASS, CisService::SERVER_NAME, service.name())?;
        reader.set_wait(WAIT_YES)?;
        reader.set_message(request.as_bytes())?;
        reader.send(Some(CONV_NEW), None)?;

        InfoReader::start(reader, object_type, layout, request)
    }

    /// Switch the kernel trace on at `level` (1..=8, larger clamps to 8),
    /// or off for level 0.
    pub fn set_trace_level(&mut self, level: u8) -> Result<CisHeader> {
        match CisOption::trace_level(level) {
            Some(option) => self.icmd(ObjectType::Broker, Command::TraceOn, Some(option), &CommandSelector::default()),
            None => self.icmd(ObjectType::Broker, Command::TraceOff, None, &CommandSelector::default()),
        }
    }

    /// Purge a unit of work from the persistent store.
    pub fn purge_uow(&mut self, uowid: &str) -> Result<CisHeader> {
        let selector = CommandSelector { uowid: uowid.to_owned(), ..CommandSelector::default() };
        self.icmd(ObjectType::Psf, Command::Purge, None, &selector)
    }

    /// Shut down one conversation.
    pub fn shutdown_conversation(&mut self, conv_id: &str, option: Option<CisOption>) -> Result<CisHeader> {
        let selector = CommandSelector { conv_id: conv_id.to_owned(), ..CommandSelector::default() };
        self.icmd(ObjectType::Conversation, Command::Shutdown, option, &selector)
    }

    /// Shut down a server by sequence number or physical user id.
    pub fn shutdown_server(&mut self, seqno: u32, puid: &[u8], option: Option<CisOption>) -> Result<CisHeader> {
        let selector = CommandSelector { seqno, puid: puid.to_vec(), ..CommandSelector::default() };
        self.icmd(ObjectType::Server, Command::Shutdown, option, &selector)
    }

    /// Shut down a service.
    pub fn shutdown_service(
        &mut self,
        server_class: &str,
        server: &str,
        service: &str,
        option: Option<CisOption>,
    ) -> Result<CisHeader> {
        let selector = CommandSelector {
            server_class: server_class.to_owned(),
            server: server.to_owned(),
            service: service.to_owned(),
            ..CommandSelector::default()
        };
        self.icmd(ObjectType::Service, Command::Shutdown, option, &selector)
    }

    /// Shut down a participant. Requires the `PARTICIPANT-SHUTDOWN` service.
    pub fn shutdown_participant(&mut self, uid: &str, token: &str, seqno: u32) -> Result<CisHeader> {
        let selector =
            CommandSelector { uid: uid.to_owned(), token: token.to_owned(), seqno, ..CommandSelector::default() };
        self.icmd(ObjectType::Participant, Command::Shutdown, None, &selector)
    }
}

impl Drop for Cis {
    fn drop(&mut self) {
        if let Err(err) = self.logoff() {
            warn!(error = %err, broker_id = %self.config.broker_id, "logoff failed");
        }
    }
}

/// Build an information request for `object_type`, rejecting types outside
/// `allowed`.
fn info_request(
    object_type: ObjectType,
    selector: &InfoSelector,
    allowed: &[ObjectType],
    receive_length: usize,
) -> Result<(&'static Layout, Record)> {
    let version =
        if object_type == ObjectType::UowStatistics { CIS_VERSION_UOW_STATISTICS } else { CIS_VERSION_LEGACY };
    let block_length = u32::try_from(receive_length - HEADER_LEN)
        .map_err(|_| AciError::Config(format!("receive_length {receive_length} too large")))?;
    let mut request = InfoRequest::new(version, block_length)?;
    request.set("object_type", object_type.to_raw())?;
    selector.apply(&mut request)?;
    let request = request.into_record();

    let layout = match cis::info::layout(object_type) {
        Some(layout) if allowed.contains(&object_type) => layout?,
        _ => {
            return Err(local_error(format!("Invalid CIS object type {object_type} for this request"), object_type, request));
        },
    };
    Ok((layout, request))
}

fn extract_single(
    buf: &[u8],
    layout: &'static Layout,
    object_type: ObjectType,
    request: &Record,
) -> Result<Option<InfoRecord>> {
    let page = Page::parse(buf, layout)?;
    let header = page.header();
    let error = |message: String, code: u32| -> AciError {
        CisError { message, code, object_type, request: request.clone(), header: Some(header.clone()) }.into()
    };
    match header.error_code() {
        0 => {},
        NOTHING_FOUND => return Ok(None),
        code => {
            let text = info_error_text(code).map_or_else(|| header.etb_error_text(), str::to_owned);
            return Err(error(format!("Broker Information Service Error {code}: {text}"), code));
        },
    }
    if header.totobj() != 1 {
        return Err(error("Nothing returned from Broker CIS".to_owned(), 0));
    }
    match page.records().next() {
        Some(record) => Ok(Some(InfoRecord::new(object_type, record?))),
        None => Err(error("Nothing returned from Broker CIS".to_owned(), 0)),
    }
}

fn local_error(message: String, object_type: ObjectType, request: Record) -> AciError {
    CisError { message, code: 0, object_type, request, header: None }.into()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting() -> (Arc<AtomicUsize>, Arc<dyn Transport>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let transport = move |_: &mut [u8], _: &mut [u8], _: &mut [u8], _: &mut [u8]| {
            seen.fetch_add(1, Ordering::SeqCst);
            0
        };
        (calls, Arc::new(transport))
    }

    fn local_message(err: AciError) -> String {
        let AciError::Cis(cis) = err else {
            unreachable!("expected a CIS error");
        };
        assert_eq!(cis.code, 0);
        assert!(cis.header.is_none());
        cis.message
    }

    #[test]
    fn unsupported_object_types_rejected_locally() {
        let (calls, transport) = counting();
        let mut cis = Cis::new(CisConfig::default(), transport).unwrap();

        let err = cis.iget(ObjectType::Service, &InfoSelector::default()).unwrap_err();
        assert!(local_message(err).contains("SERVICE"));
        let err = cis.iread(ObjectType::Broker, &InfoSelector::default()).unwrap_err();
        assert!(local_message(err).contains("BROKER"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn information_service_refuses_commands() {
        let (calls, transport) = counting();
        let mut cis = Cis::new(CisConfig::default(), transport).unwrap();
        let err = cis.set_trace_level(3).unwrap_err();
        assert_eq!(local_message(err), "service INFO does not accept commands");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn session_addresses_cis_service() {
        let (_, transport) = counting();
        let config = CisConfig { service: CisService::Cmd, ..CisConfig::default() };
        let cis = Cis::new(config, transport).unwrap();
        let cb = cis.broker().control_block();
        assert_eq!(cb.text("server_class").unwrap(), "SAG");
        assert_eq!(cb.text("server_name").unwrap(), "ETBCIS");
        assert_eq!(cb.text("service").unwrap(), "CMD");
        assert_eq!(cb.send_buffer().len(), 548);
        assert_eq!(cb.receive_buffer().len(), 32_768);
    }

    #[test]
    fn dropping_unopened_session_sends_nothing() {
        let (calls, transport) = counting();
        drop(Cis::new(CisConfig::default(), transport).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
