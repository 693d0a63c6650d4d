//! CIS object types, commands, options and error texts.

use std::fmt;

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::codes::code_enum;

code_enum! {
    /// Object a CIS request applies to.
    ObjectType: u16 {
        /// Active servers
        Server = 1 => "SERVER",
        /// Active clients
        Client = 2 => "CLIENT",
        /// Active conversations
        Conversation = 4 => "CONVERSATION",
        /// Active services
        Service = 6 => "SERVICE",
        /// The broker itself
        Broker = 7 => "BROKER",
        /// Worker usage
        Worker = 8 => "WORKER",
        /// Units of work in the persistent store
        Psf = 9 => "PSF",
        /// Persistent store messages
        PsfMsg = 10 => "PSFMSG",
        /// DIV persistent store
        PsfDiv = 11 => "PSFDIV",
        /// Adabas persistent store
        PsfAda = 12 => "PSFADA",
        /// File persistent store
        PsfFile = 13 => "PSFFILE",
        /// Subscribers
        Subscriber = 14 => "SUBSCRIBER",
        /// Publishers
        Publisher = 15 => "PUBLISHER",
        /// Publications
        Publication = 16 => "PUBLICATION",
        /// Topics
        Topic = 17 => "TOPIC",
        /// Participants
        Participant = 18 => "PARTICIPANT",
        /// TCP communicator
        Tcp = 19 => "TCP",
        /// c-tree persistent store
        PsfCtree = 20 => "PSFCTREE",
        /// Security
        Security = 21 => "SECURITY",
        /// SSL communicator
        Ssl = 22 => "SSL",
        /// Command log filters
        CmdlogFilter = 23 => "CMDLOG_FILTER",
        /// NET communicator
        Net = 24 => "NET",
        /// Pool usage
        PoolUsage = 25 => "POOL_USAGE",
        /// Resource usage
        ResourceUsage = 26 => "RESOURCE_USAGE",
        /// Broker statistics
        Statistics = 27 => "STATISTICS",
        /// All users
        User = 28 => "USER",
        /// Transport
        Transport = 29 => "TRANSPORT",
        /// Per-service UOW statistics
        UowStatistics = 31 => "UOW_STATISTICS",
    }
}

code_enum! {
    /// CIS command.
    Command: u16 {
        /// Switch kernel trace on
        TraceOn = 1 => "TRACE_ON",
        /// Switch kernel trace off
        TraceOff = 2 => "TRACE_OFF",
        /// Shut down a participant, service or conversation
        Shutdown = 8 => "SHUTDOWN",
        /// Purge a unit of work
        Purge = 12 => "PURGE",
        /// Allow new UOW messages
        AllowNewUowMsgs = 13 => "ALLOW_NEWUOWMSGS",
        /// Forbid new UOW messages
        ForbidNewUowMsgs = 14 => "FORBID_NEWUOWMSGS",
        /// Subscribe
        Subscribe = 15 => "SUBSCRIBE",
        /// Unsubscribe
        Unsubscribe = 16 => "UNSUBSCRIBE",
        /// Connect the persistent store
        ConnectPstore = 17 => "CONNECT_PSTORE",
        /// Disconnect the persistent store
        DisconnectPstore = 18 => "DISCONNECT_PSTORE",
        /// Set a command log filter
        SetCmdlogFilter = 19 => "SET_CMDLOG_FILTER",
        /// Clear a command log filter
        ClearCmdlogFilter = 20 => "CLEAR_CMDLOG_FILTER",
        /// Enable a command log filter
        EnableCmdlogFilter = 21 => "ENABLE_CMDLOG_FILTER",
        /// Disable a command log filter
        DisableCmdlogFilter = 22 => "DISABLE_CMDLOG_FILTER",
        /// Enable command logging
        EnableCmdlog = 23 => "ENABLE_CMDLOG",
        /// Disable command logging
        DisableCmdlog = 24 => "DISABLE_CMDLOG",
        /// Produce statistics
        ProduceStatistics = 25 => "PRODUCE_STATISTICS",
        /// Switch command log files
        SwitchCmdlog = 26 => "SWITCH_CMDLOG",
        /// Enable accounting
        EnableAccounting = 27 => "ENABLE_ACCOUNTING",
        /// Disable accounting
        DisableAccounting = 28 => "DISABLE_ACCOUNTING",
        /// Reset a user
        ResetUser = 29 => "RESET_USER",
        /// Suspend a communicator
        Suspend = 30 => "SUSPEND",
        /// Resume a communicator
        Resume = 31 => "RESUME",
        /// Stop a communicator
        Stop = 32 => "STOP",
        /// Start a communicator
        Start = 33 => "START",
        /// Trap an error code
        TrapError = 34 => "TRAP_ERROR",
        /// Flush the trace
        TraceFlush = 35 => "TRACE_FLUSH",
        /// Communicator status
        Status = 36 => "STATUS",
        /// Disable dynamic workers
        DisableDynWorker = 37 => "DISABLE_DYN_WORKER",
        /// Enable dynamic workers
        EnableDynWorker = 38 => "ENABLE_DYN_WORKER",
        /// Single-conversation mode for a service
        SetSingleConversation = 40 => "SET_SINGLE_CONVERSATION",
        /// Set a UOW status
        SetUowStatus = 42 => "SET_UOW_STATUS",
        /// Display request counts
        DisplayRequests = 45 => "DISPLAY_REQUESTS",
        /// No operation
        NoOperation = 88 => "NO_OPERATION",
    }
}

code_enum! {
    /// CIS command option.
    CisOption: u16 {
        /// Immediately
        Immed = 3 => "IMMED",
        /// After current work completes
        Quiesce = 4 => "QUIESCE",
        /// Trace level 1
        TrLevel1 = 11 => "TR_LEVEL1",
        /// Trace level 2
        TrLevel2 = 12 => "TR_LEVEL2",
        /// Trace level 3
        TrLevel3 = 13 => "TR_LEVEL3",
        /// Trace level 4
        TrLevel4 = 14 => "TR_LEVEL4",
        /// Trace level 5
        TrLevel5 = 15 => "TR_LEVEL5",
        /// Trace level 6
        TrLevel6 = 16 => "TR_LEVEL6",
        /// Trace level 7
        TrLevel7 = 17 => "TR_LEVEL7",
        /// Trace level 8
        TrLevel8 = 18 => "TR_LEVEL8",
        /// UOW status accepted
        UowStatusAccepted = 20 => "UOW_STATUS_ACCEPTED",
        /// UOW status cancelled
        UowStatusCancelled = 21 => "UOW_STATUS_CANCELLED",
        /// Forced operation
        EtbForce = 26 => "ETB_FORCE",
        /// Prefetch
        EtbPrefetch = 27 => "ETB_PREFETCH",
    }
}

impl CisOption {
    /// Trace option for `level` 1..=8; larger levels clamp to 8.
    pub fn trace_level(level: u8) -> Option<Self> {
        match level {
            0 => None,
            n => Self::from_raw(u16::from(n.min(8)) + 10),
        }
    }
}

/// Information service result code meaning an empty result.
pub const NOTHING_FOUND: u32 = 4;

/// Text for an information service error code.
pub fn info_error_text(code: u32) -> Option<&'static str> {
    Some(match code {
        0 => "Successful response",
        1 => "Invalid block length",
        2 => "Invalid VERSION",
        3 => "OBJECT-TYPE missing",
        4 => "Nothing found for this request",
        5 => "Invalid OBJECT-TYPE",
        6 => "Invalid Info Level",
        7 => "Block length too short for Object Type",
        8 => "User selection must be unique",
        9 => "Service selection must be unique",
        10 => "Topic name must be specified (deprecated)",
        11 => "PUID not possible with Info Level SHORT",
        _ => return None,
    })
}

/// Text for a command service error code.
pub fn command_error_text(code: u32) -> Option<&'static str> {
    Some(match code {
        0 => "Successful response",
        2 => "Invalid VERSION",
        3 => "OBJECT-TYPE is missing",
        5 => "Invalid OBJECT-TYPE",
        20 => "The user is not authorized to issue Broker commands",
        21 => "Invalid COMMAND",
        22 => "Invalid OPTION",
        23 => "Shutdown possible for servers only",
        24 => "Participant not found",
        25 => "Purge UOW failed",
        26 => "User specification must be unique",
        27 => "Topic name must be specified (deprecated)",
        28 => "Add subscription failed (deprecated)",
        29 => "Remove subscription failed (deprecated)",
        30 => "User must be specified",
        31 => "Class/Server/Service must be unique",
        32 => "Class and Topic cannot both be specified (deprecated)",
        33 => "Class, Topic or User must be specified",
        34 => "Set command log filter failed",
        35 => "Clear command log filter failed",
        36 => "Enable command log filter failed",
        37 => "Disable command log filter failed",
        38 => "Switch command log files failed",
        39 => "Set security trace level failed",
        40 => "Set PSTORE (PSF) trace level failed",
        41 => "Enable command logging failed",
        42 => "Disable command logging failed",
        43 => "Connect PSTORE failed",
        44 => "Disconnect PSTORE failed",
        45 => "Allow new UOW messages failed",
        46 => "Forbid new UOW messages failed",
        47 => "Enable accounting failed",
        48 => "Disable accounting failed",
        49 => "Reset user failed",
        50 => "Command refused in current RUN-MODE",
        51 => "Service must be specified",
        52 => "Service not found",
        53 => "CONVID must be specified",
        54 => "Conversation not found",
        55 => "Cannot inhibit Conversation",
        56 => "Only supported for messages",
        57 => "Cannot lock Conversation",
        58 => "Not for currently running Conversation",
        59 => "Security violation detected",
        60 => "Invalid transport ID",
        61 => "Cannot execute command",
        62 => "Command ignored. Only one Communicator left",
        63 => "Command ignored. Cannot stop all Communicators",
        64 => "Communicator currently not suspended",
        65 => "Communicator currently not stopped",
        66 => "Communicator currently not active",
        67 => "Enable Dynamic Worker Management failed",
        68 => "Disable Dynamic Worker Management failed",
        69 => "Transport reserved for Broker Service",
        70 => "TRACE-FLUSH failed",
        71 => {
            "Cannot set single-conversation mode because service is being used in other mode \
             (still active conversations for service)"
        },
        72 => "Verification of attribute file failed",
        73 => "Cannot delete deferred service with UOW",
        74 => "Cannot set UOW status",
        75 => "Cannot add service to SCM record",
        76 => "Update SCM record failed",
        77 => "Conversation contains unprocessed UOWs",
        _ => return None,
    })
}
