//! Model broker kernel.
//!
//! [`SimKernel`] implements [`Transport`] entirely in memory. It parses the
//! control block at the version the caller sent, answers the functions the
//! session layer uses and records every call, so tests can assert on the
//! exact traffic an operation produced.
//!
//! - VERSION / KERNELVERS report configurable version texts and interface
//!   level.
//! - SEND to `SAG/ETBCIS/INFO` (or `USER-INFO`) answers information
//!   requests from the configured objects, split into pages by the object
//!   type's [`PagePlan`]. The first page comes back with the SEND; the rest
//!   wait on the conversation for RECEIVE.
//! - SEND to any other CIS service records a command and answers with a
//!   bare header.
//! - SEND / RECEIVE / SYNCPOINT / EOC on ordinary services model
//!   conversations and unit-of-work ids.
//! - RECEIVE with nothing to deliver times out (`00740074`).
//!
//! Faults queued with [`SimKernel::inject`] replace the next call of the
//! given function.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};

use aci_core::Transport;
use aci_proto::{
    AciOption, ErrorCode, Function, LayoutError, Record, UowStatus,
    cis::{
        Command, ObjectType, PageBuilder,
        codes::NOTHING_FOUND,
        info,
        request::{command_layout, info_layout},
    },
    control_block::{self, CONV_NEW, CONV_NONE},
    layout::encode_text,
};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::plan::PagePlan;

/// Stub version text returned by VERSION.
pub const STUB_VERSION: &str = "EntireX ACI stub 10.5";

/// Kernel version text returned by KERNELVERS unless configured otherwise.
pub const KERNEL_VERSION: &str = "Version 9.12.0.1";

/// Native return code for a control block the stub cannot make sense of.
pub const RC_BAD_CONTROL_BLOCK: i32 = 9;

const CONVERSATION_NOT_FOUND: &str = "00030003";
const INVALID_CONVERSATION_ID: &str = "00080003";
const INVALID_FUNCTION: &str = "00100001";

/// A replacement outcome for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Kernel error code plus error-text buffer content
    Kernel {
        /// Code written to `error_code`
        code: ErrorCode,
        /// Text written to the error-text buffer
        errtext: String,
    },
    /// Native return code; the control block is left untouched
    ReturnCode(i32),
}

impl Fault {
    /// Kernel error `code` without error text.
    pub fn kernel(code: &str) -> Self {
        Self::Kernel { code: ErrorCode::from_text(code), errtext: String::new() }
    }

    /// Kernel wait timeout.
    pub fn wait_timeout() -> Self {
        Self::Kernel { code: ErrorCode::WAIT_TIMEOUT, errtext: String::new() }
    }
}

/// One observed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Function, `None` for an unknown code
    pub function: Option<Function>,
    /// Option as sent
    pub option: Option<AciOption>,
    /// Conversation id as sent
    pub conv_id: String,
    /// Service as sent
    pub service: String,
    /// Interface version as sent
    pub api_version: u8,
    /// Control block length as sent
    pub len: usize,
}

/// One CIS command received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCall {
    /// Object type, `None` for an unknown code
    pub object_type: Option<ObjectType>,
    /// Command, `None` for an unknown code
    pub command: Option<Command>,
    /// Raw command option
    pub option: u16,
    /// The request record
    pub request: Record,
}

#[derive(Debug, Default)]
struct Conversation {
    service: String,
    pages: VecDeque<Bytes>,
}

enum Outcome {
    Kernel(ErrorCode),
    Layout(LayoutError),
}

impl From<LayoutError> for Outcome {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

fn kernel_error(code: &str) -> Outcome {
    Outcome::Kernel(ErrorCode::from_text(code))
}

#[derive(Debug)]
struct State {
    kernel_version: String,
    api_version: u8,
    max_message_size: u32,
    logged_on: bool,
    calls: Vec<Call>,
    faults: Vec<(Function, Fault)>,
    objects: HashMap<ObjectType, Vec<Record>>,
    plans: HashMap<ObjectType, PagePlan>,
    info_errors: HashMap<ObjectType, u32>,
    command_errors: HashMap<Command, u32>,
    commands: Vec<CommandCall>,
    conversations: BTreeMap<String, Conversation>,
    ended: Vec<String>,
    inbound: VecDeque<Vec<u8>>,
    next_conv: u64,
    next_uow: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            kernel_version: KERNEL_VERSION.to_owned(),
            api_version: 10,
            max_message_size: 1_048_576,
            logged_on: false,
            calls: Vec::new(),
            faults: Vec::new(),
            objects: HashMap::new(),
            plans: HashMap::new(),
            info_errors: HashMap::new(),
            command_errors: HashMap::new(),
            commands: Vec::new(),
            conversations: BTreeMap::new(),
            ended: Vec::new(),
            inbound: VecDeque::new(),
            next_conv: 0,
            next_uow: 0,
        }
    }
}

/// In-memory broker kernel.
#[derive(Debug, Default)]
pub struct SimKernel {
    state: Mutex<State>,
}

impl SimKernel {
    /// Kernel reporting [`KERNEL_VERSION`] and interface version 10.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Report `text` from KERNELVERS.
    #[must_use]
    pub fn with_kernel_version(self, text: &str) -> Self {
        text.clone_into(&mut self.lock().kernel_version);
        self
    }

    /// Report interface `version` from VERSION and KERNELVERS.
    #[must_use]
    pub fn with_api_version(self, version: u8) -> Self {
        self.lock().api_version = version;
        self
    }

    /// Add information objects of `object_type`.
    pub fn add_objects(&self, object_type: ObjectType, records: impl IntoIterator<Item = Record>) {
        self.lock().objects.entry(object_type).or_default().extend(records);
    }

    /// Page split for results of `object_type`.
    pub fn set_page_plan(&self, object_type: ObjectType, plan: PagePlan) {
        self.lock().plans.insert(object_type, plan);
    }

    /// Answer information requests for `object_type` with CIS error `code`.
    pub fn fail_info(&self, object_type: ObjectType, code: u32) {
        self.lock().info_errors.insert(object_type, code);
    }

    /// Answer `command` with CIS error `code`.
    pub fn fail_command(&self, command: Command, code: u32) {
        self.lock().command_errors.insert(command, code);
    }

    /// Replace the next call of `function` with `fault`.
    pub fn inject(&self, function: Function, fault: Fault) {
        self.lock().faults.push((function, fault));
    }

    /// Remove and return every fault not yet applied.
    pub fn take_faults(&self) -> Vec<(Function, Fault)> {
        std::mem::take(&mut self.lock().faults)
    }

    /// Queue a message for the next RECEIVE of a new conversation.
    pub fn deliver(&self, message: &[u8]) {
        self.lock().inbound.push_back(message.to_vec());
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls of `function` so far.
    pub fn count(&self, function: Function) -> usize {
        self.lock().calls.iter().filter(|c| c.function == Some(function)).count()
    }

    /// CIS commands received so far.
    pub fn commands(&self) -> Vec<CommandCall> {
        self.lock().commands.clone()
    }

    /// Conversations ended by EOC, SYNCPOINT or SEND with EOC, in order.
    pub fn ended_conversations(&self) -> Vec<String> {
        self.lock().ended.clone()
    }

    /// Conversations still open.
    pub fn open_conversations(&self) -> Vec<String> {
        self.lock().conversations.keys().cloned().collect()
    }

    /// True between LOGON and LOGOFF.
    pub fn is_logged_on(&self) -> bool {
        self.lock().logged_on
    }
}

impl Transport for SimKernel {
    fn call(&self, control: &mut [u8], send: &mut [u8], receive: &mut [u8], errtext: &mut [u8]) -> i32 {
        self.lock().handle(control, send, receive, errtext)
    }
}

impl State {
    fn handle(&mut self, control: &mut [u8], send: &[u8], receive: &mut [u8], errtext: &mut [u8]) -> i32 {
        let version = control.get(1).copied().unwrap_or_default();
        let layout = match control_block::layout(version) {
            Ok(layout) if layout.len() == control.len() => layout,
            _ => {
                warn!(version, len = control.len(), "control block length does not match its version");
                return RC_BAD_CONTROL_BLOCK;
            },
        };
        let mut cb = match Record::from_bytes(layout, control) {
            Ok(cb) => cb,
            Err(err) => {
                warn!(error = %err, "unreadable control block");
                return RC_BAD_CONTROL_BLOCK;
            },
        };

        let function = cb.uint("function").ok().and_then(|f| u8::try_from(f).ok()).and_then(Function::from_raw);
        let option = cb.uint("option").ok().and_then(|o| u8::try_from(o).ok()).and_then(AciOption::from_raw);
        let call = Call {
            function,
            option,
            conv_id: cb.text("conv_id").unwrap_or_default(),
            service: cb.text("service").unwrap_or_default(),
            api_version: version,
            len: control.len(),
        };
        debug!(?function, ?option, conv_id = %call.conv_id, service = %call.service, "sim kernel call");
        self.calls.push(call);

        let outcome = match function {
            Some(function) => match self.faults.iter().position(|(f, _)| *f == function) {
                Some(pos) => match self.faults.remove(pos).1 {
                    Fault::ReturnCode(rc) => return rc,
                    Fault::Kernel { code, errtext: text } => {
                        encode_text(&text, errtext);
                        Err(Outcome::Kernel(code))
                    },
                },
                None => self.dispatch(function, option, &mut cb, send, receive, errtext),
            },
            None => Err(kernel_error(INVALID_FUNCTION)),
        };

        let code = match outcome {
            Ok(()) => ErrorCode::SUCCESS,
            Err(Outcome::Kernel(code)) => code,
            Err(Outcome::Layout(err)) => {
                warn!(error = %err, "sim kernel failed to answer");
                return RC_BAD_CONTROL_BLOCK;
            },
        };
        if cb.set("error_code", code.to_string()).is_err() {
            return RC_BAD_CONTROL_BLOCK;
        }
        control.copy_from_slice(cb.as_bytes());
        0
    }

    fn dispatch(
        &mut self,
        function: Function,
        option: Option<AciOption>,
        cb: &mut Record,
        send: &[u8],
        receive: &mut [u8],
        errtext: &mut [u8],
    ) -> Result<(), Outcome> {
        match function {
            Function::Version => {
                let mut text = STUB_VERSION.as_bytes().to_vec();
                text.push(0);
                reply(cb, receive, &text)?;
                cb.set("api_version", self.api_version)?;
            },
            Function::KernelVers => {
                encode_text(&self.kernel_version, errtext);
                cb.set("return_length", self.max_message_size)?;
                cb.set("api_version", self.api_version)?;
                if cb.layout().slot("kernel_security").is_ok() {
                    cb.set("kernel_security", "N")?;
                }
            },
            Function::Logon => self.logged_on = true,
            Function::Logoff => self.logged_on = false,
            Function::Send => self.send(option, cb, send, receive)?,
            Function::Receive => self.receive(cb, receive)?,
            Function::Eoc => {
                let conv_id = cb.text("conv_id")?;
                self.end(&conv_id)?;
            },
            Function::Syncpoint => match option {
                Some(AciOption::Commit) => set_uow_status(cb, UowStatus::Processed)?,
                Some(AciOption::Backout) => set_uow_status(cb, UowStatus::Backedout)?,
                Some(AciOption::Eoc) => {
                    set_uow_status(cb, UowStatus::Processed)?;
                    let conv_id = cb.text("conv_id")?;
                    self.end(&conv_id)?;
                },
                _ => {},
            },
            _ => {},
        }
        Ok(())
    }

    fn open(&mut self, service: &str) -> String {
        self.next_conv += 1;
        let conv_id = format!("{:016}", 1_000_000_000_000_000 + self.next_conv);
        self.conversations
            .insert(conv_id.clone(), Conversation { service: service.to_owned(), pages: VecDeque::new() });
        conv_id
    }

    fn end(&mut self, conv_id: &str) -> Result<(), Outcome> {
        if conv_id.is_empty() || conv_id == CONV_NONE || conv_id == CONV_NEW {
            return Err(kernel_error(INVALID_CONVERSATION_ID));
        }
        match self.conversations.remove(conv_id) {
            Some(conv) => {
                debug!(conv_id, service = %conv.service, "conversation ended");
                self.ended.push(conv_id.to_owned());
                Ok(())
            },
            None => Err(kernel_error(CONVERSATION_NOT_FOUND)),
        }
    }

    fn send(&mut self, option: Option<AciOption>, cb: &mut Record, send: &[u8], receive: &mut [u8]) -> Result<(), Outcome> {
        let class = cb.text("server_class")?;
        let server = cb.text("server_name")?;
        let service = cb.text("service")?;
        let conv_id = cb.text("conv_id")?;

        if class == "SAG" && server == "ETBCIS" {
            if service == "INFO" || service == "USER-INFO" {
                if conv_id != CONV_NEW {
                    return Err(kernel_error(INVALID_CONVERSATION_ID));
                }
                let conv_id = self.open(&service);
                cb.set("conv_id", conv_id.as_str())?;
                return self.information(&conv_id, send, cb, receive);
            }
            return self.command(send, cb, receive);
        }

        let conv_id = if conv_id == CONV_NEW {
            let conv_id = self.open(&service);
            cb.set("conv_id", conv_id.as_str())?;
            conv_id
        } else if self.conversations.contains_key(&conv_id) {
            conv_id
        } else {
            return Err(kernel_error(CONVERSATION_NOT_FOUND));
        };

        if cb.layout().slot("uow_id").is_ok() {
            if cb.text("uow_id")?.is_empty() {
                self.next_uow += 1;
                cb.set("uow_id", format!("{:016}", 2_000_000_000_000_000 + self.next_uow))?;
            }
            let status = match option {
                Some(AciOption::Commit | AciOption::Eoc) => UowStatus::Accepted,
                _ => UowStatus::Received,
            };
            set_uow_status(cb, status)?;
        }
        cb.set("return_length", 0u32)?;
        if option == Some(AciOption::Eoc) {
            self.end(&conv_id)?;
        }
        Ok(())
    }

    fn receive(&mut self, cb: &mut Record, receive: &mut [u8]) -> Result<(), Outcome> {
        let conv_id = cb.text("conv_id")?;
        if conv_id == CONV_NEW {
            let Some(message) = self.inbound.pop_front() else {
                return Err(Outcome::Kernel(ErrorCode::WAIT_TIMEOUT));
            };
            let service = cb.text("service")?;
            let conv_id = self.open(&service);
            cb.set("conv_id", conv_id.as_str())?;
            if cb.layout().slot("conv_stat").is_ok() {
                cb.set("conv_stat", aci_proto::ConvStat::New.to_raw())?;
            }
            return reply(cb, receive, &message);
        }

        let Some(conv) = self.conversations.get_mut(&conv_id) else {
            return Err(kernel_error(CONVERSATION_NOT_FOUND));
        };
        match conv.pages.pop_front() {
            Some(page) => reply(cb, receive, &page),
            None => Err(Outcome::Kernel(ErrorCode::WAIT_TIMEOUT)),
        }
    }

    fn information(&mut self, conv_id: &str, send: &[u8], cb: &mut Record, receive: &mut [u8]) -> Result<(), Outcome> {
        let request = Record::from_bytes(info_layout()?, send)?;
        let Some(object_type) = u16::try_from(request.uint("object_type")?).ok().and_then(ObjectType::from_raw)
        else {
            return reply(cb, receive, &PageBuilder::error(5)?.finish()?);
        };
        if let Some(&code) = self.info_errors.get(&object_type) {
            return reply(cb, receive, &PageBuilder::error(code)?.finish()?);
        }
        let Some(layout) = info::layout(object_type).transpose()? else {
            return reply(cb, receive, &PageBuilder::error(5)?.finish()?);
        };

        let matching: Vec<&Record> = self
            .objects
            .get(&object_type)
            .map(|records| records.iter().filter(|r| selected(&request, r)).collect())
            .unwrap_or_default();
        if matching.is_empty() {
            return reply(cb, receive, &PageBuilder::error(NOTHING_FOUND)?.finish()?);
        }

        let total = u32::try_from(matching.len()).unwrap_or(u32::MAX);
        let block_length = usize::try_from(request.uint("block_length")?).unwrap_or(usize::MAX);
        let capacity = u32::try_from(block_length / layout.len()).unwrap_or(u32::MAX);
        let sizes = self.plans.get(&object_type).cloned().unwrap_or_default().split(total, capacity);

        let mut pages = VecDeque::new();
        let mut records = matching.into_iter();
        for size in sizes {
            let mut page = PageBuilder::new(total)?;
            for record in records.by_ref().take(size as usize) {
                page.push(record);
            }
            pages.push_back(page.finish()?);
        }
        debug!(%object_type, total, pages = pages.len(), "information result");

        let first = pages.pop_front().unwrap_or_default();
        if let Some(conv) = self.conversations.get_mut(conv_id) {
            conv.pages = pages;
        }
        reply(cb, receive, &first)
    }

    fn command(&mut self, send: &[u8], cb: &mut Record, receive: &mut [u8]) -> Result<(), Outcome> {
        let request = Record::from_bytes(command_layout()?, send)?;
        let object_type = u16::try_from(request.uint("object_type")?).ok().and_then(ObjectType::from_raw);
        let command = u16::try_from(request.uint("command")?).ok().and_then(Command::from_raw);
        let option = u16::try_from(request.uint("option")?).unwrap_or_default();
        let code = command.and_then(|c| self.command_errors.get(&c).copied()).unwrap_or(0);
        debug!(?object_type, ?command, option, code, "cis command");
        self.commands.push(CommandCall { object_type, command, option, request });

        let page = if code > 0 { PageBuilder::error(code)? } else { PageBuilder::new(0)? };
        reply(cb, receive, &page.finish()?)
    }
}

/// True if every set text selector of `request` that `record` carries
/// matches.
fn selected(request: &Record, record: &Record) -> bool {
    ["uid", "token", "server_class", "server", "service", "conv_id", "uowid"].iter().all(|&name| {
        let wanted = request.text(name).unwrap_or_default();
        wanted.is_empty()
            || record.layout().slot(name).is_err()
            || record.text(name).is_ok_and(|have| have == wanted)
    })
}

fn set_uow_status(cb: &mut Record, status: UowStatus) -> Result<(), Outcome> {
    if cb.layout().slot("uow_status").is_ok() {
        cb.set("uow_status", status.to_raw())?;
    }
    Ok(())
}

fn reply(cb: &mut Record, receive: &mut [u8], data: &[u8]) -> Result<(), Outcome> {
    let len = data.len().min(receive.len());
    receive[..len].copy_from_slice(&data[..len]);
    cb.set("return_length", len)?;
    Ok(())
}
