//! Information record layouts.
//!
//! The record type is implied by the request's object type; records carry no
//! type tag of their own. All records of one response stream share a width.
//! These layouts match CIS interface version 8 (UOW statistics: 9).

use once_cell::sync::OnceCell;

use super::codes::ObjectType;
use crate::{
    errors::Result,
    field::{Field, Format},
    layout::Layout,
    record::Record,
    value::Value,
};

#[rustfmt::skip]
const BROKER: &[Field] = &[
    Field::text("platform", 8),
    Field::uint("runtime", 4).format(Format::Interval),
    Field::uint("num_worker_act", 4),
    Field::uint("num_long", 4),
    Field::uint("long_act", 4),
    Field::uint("long_high", 4),
    Field::uint("num_short", 4),
    Field::uint("short_act", 4),
    Field::uint("short_high", 4),
    Field::uint("long_size", 4),
    Field::uint("short_size", 4),
    Field::uint("num_service", 4),
    Field::uint("service_act", 4),
    Field::uint("num_server", 4),
    Field::uint("server_act", 4),
    Field::uint("server_high", 4),
    Field::uint("num_client", 4),
    Field::uint("client_act", 4),
    Field::uint("client_high", 4),
    Field::uint("num_conv", 4),
    Field::uint("conv_high", 4),
    Field::uint("trace_level", 2),
    Field::filler("unused1", 2),
    Field::uint("maxuows", 4).at(92),
    Field::uint("maxuowmsg", 4),
    Field::uint("uwtime", 4).format(Format::Interval),
    Field::uint("maxdelcnt", 4),
    Field::uint("maxmsgsize", 4),
    Field::uint("totaluows", 4),
    Field::uint("store", 1),
    Field::uint("pstore", 1).format(Format::PStore),
    Field::uint("uwstatp", 1),
    Field::uint("deferred", 1),
    Field::text("accounting", 3).at(120),
    Field::uint("authdefault", 1),
    Field::uint("sslport", 4),
    Field::uint("new_uow_msgs", 1),
    Field::uint("snmp_licensed", 1),
    Field::filler("unused2", 2),
    Field::text("platformname", 32),
    Field::text("pstoretype", 8),
    Field::uint("pub_sub", 1).at(172),
    Field::uint("apiversion", 1),
    Field::uint("cisversion", 1),
    Field::uint("pstore_connected", 1),
    Field::uint("num_topic", 4),
    Field::uint("topic_act", 4),
    Field::uint("num_subscriber", 4),
    Field::uint("subscriber_act", 4),
    Field::uint("subscriber_high", 4),
    Field::uint("num_publisher", 4),
    Field::uint("publisher_act", 4),
    Field::uint("publisher_high", 4),
    Field::uint("num_publication", 4),
    Field::uint("publication_high", 4),
    Field::uint("attach_mgrs_act", 4),
    Field::uint("uwstat_add_time", 4),
    Field::text("product_version", 16),
    Field::text("license_expiration", 10).at(240),
    Field::uint("security_type", 1),
    Field::uint("accounting_enabled", 1),
    Field::uint("num_free_ccb", 4),
    Field::uint("num_free_pcb", 4),
    Field::uint("num_free_pcb_ext", 4),
    Field::uint("num_free_scb", 4),
    Field::uint("num_free_scb_ext", 4),
    Field::uint("num_free_subscb", 4),
    Field::uint("num_free_tcb", 4),
    Field::uint("num_free_tcb_ext", 4),
    Field::uint("num_free_toq", 4),
    Field::uint("num_free_uwcb", 4),
    Field::uint("num_com_buffer", 4),
    Field::uint("num_com_slot", 4),
    Field::uint("num_com_slot_free", 4),
    Field::uint("num_cmdlog_filter", 4),
    Field::uint("num_cmdlog_filter_act", 4),
    Field::uint("cmdlog", 1),
    Field::uint("cmdlog_enabled", 1),
    Field::filler("unused3", 2),
    Field::text("attribute_file_name", 256).at(316),
    Field::text("log_file_name", 256),
    Field::uint("log_file_size", 4),
    Field::text("license_file_name", 256),
    Field::uint("cmdlog_size_max", 4),
    Field::text("cmdlog_open_name", 256),
    Field::uint("cmdlog_open_size", 4),
    Field::text("cmdlog_closed_name", 256),
    Field::uint("cmdlog_closed_size", 4),
    Field::filler("unused4", 4),
    Field::text("accounting_file_name", 256).at(1616),
    Field::uint("accounting_file_size", 4),
    Field::uint("control_interval", 4),
    Field::uint("max_takeover_attempts", 4),
    Field::text("run_mode", 16),
    Field::text("partner_cluster_addr", 32),
    Field::uint("num_cmdlog_switch_siz", 4),
    Field::uint("num_cmdlog_switch_cis", 4),
    Field::uint("client_nonact", 4).format(Format::Interval).at(1940),
    Field::uint("work_queue_entries", 4),
    Field::uint("total_storage_alloc", 4),
    Field::uint("total_storage_high", 4),
    Field::uint("total_storage_limit", 4),
    Field::text("broker_id", 32),
    Field::text("host_name", 256),
    Field::text("sysplex_name", 8),
    Field::uint("auto_logon", 1),
    Field::uint("dyn_memory_management", 1),
    Field::uint("dyn_worker_management", 1),
    Field::uint("service_updates", 1),
    Field::uint("topic_updates", 1),
    Field::uint("transport_net", 1),
    Field::uint("transport_ssl", 1),
    Field::uint("transport_tcp", 1),
    Field::uint("trap_error", 4).at(2264),
];

#[rustfmt::skip]
const CONVERSATION: &[Field] = &[
    Field::text("conv_id", 16),
    Field::text("serveruid", 32),
    Field::bytes("serverpuid", 28),
    Field::text("serverpuidtrans", 28).hidden(),
    Field::text("servertoken", 32),
    Field::text("clientuid", 32),
    Field::bytes("clientpuid", 28),
    Field::text("clientpuidtrans", 28).hidden(),
    Field::text("clienttoken", 32),
    Field::text("server_class", 32).hidden(),
    Field::text("server", 32).hidden(),
    Field::text("service", 32).format(Format::ServicePath),
    Field::uint("conv_nonact", 4).format(Format::Interval).at(352),
    Field::uint("last_active", 4).format(Format::Interval),
    Field::uint("type", 2),
    Field::filler("unused1", 2),
    Field::uint("totaluows", 4),
    Field::text("client_rpc_libname", 128),
    Field::text("client_rpc_progname", 128),
    Field::text("server_rpc_libname", 128),
    Field::text("server_rpc_progname", 128),
];

#[rustfmt::skip]
const CLIENT_SERVER: &[Field] = &[
    Field::text("uid", 32),
    Field::text("puid", 28),
    Field::text("puidTrans", 28).hidden(),
    Field::text("token", 32),
    Field::uint("charset", 2),
    Field::uint("highorderfirst", 2),
    Field::uint("status", 2).format(Format::Waiting),
    Field::filler("unused1", 2),
    Field::text("waitconvid", 16).at(128),
    Field::text("server_class", 32).hidden(),
    Field::text("server", 32).hidden(),
    Field::text("service", 32).format(Format::ServicePath),
    Field::uint("conv_act", 4),
    Field::uint("service_act", 4),
    Field::uint("last_active", 4).format(Format::Interval),
    Field::uint("nonact", 4).format(Format::Interval),
    Field::uint("waited_new", 4).format(Format::Interval),
    Field::uint("waits_new", 4),
    Field::uint("waited_old", 4).format(Format::Interval),
    Field::uint("waits_old", 4),
    Field::uint("convs", 4),
    Field::uint("active_uow", 4),
    Field::text("ipv4_address", 16).at(280),
    Field::text("host_name", 256),
    Field::uint("recv_option", 1).format(Format::AciOption),
    Field::uint("attach_mgr", 1),
    Field::filler("unused2", 2),
    Field::filler("reserved_etbinfo_v73_1", 32),
    Field::text("app_name", 64).at(588),
    Field::text("app_type", 8),
    Field::filler("reserved_etbinfo_v73_3", 32),
    Field::uint("authsucc", 4),
    Field::uint("authfail", 4),
    Field::uint("created", 4).format(Format::LocalTime),
    Field::text("rpclib", 128),
    Field::text("rpcpgm", 128),
    Field::uint("seqno", 4),
    Field::text("app_version", 16),
    Field::text("ipv6_address", 46),
    Field::filler("unused", 2),
];

#[rustfmt::skip]
const PSF: &[Field] = &[
    Field::text("uow_id", 16),
    Field::text("conv_id", 16),
    Field::text("senderuid", 32),
    Field::text("sendertoken", 32),
    Field::text("senderserver", 32),
    Field::text("senderclass", 32),
    Field::text("senderservice", 32),
    Field::text("recvruid", 32),
    Field::text("recvrtoken", 32),
    Field::text("recvrserver", 32),
    Field::text("recvrclass", 32),
    Field::text("recvrservice", 32),
    Field::text("userstatus", 32),
    Field::uint("uowstatus", 1).format(Format::UowStatus).at(384),
    Field::uint("eoc", 1),
    Field::uint("store", 1),
    Field::uint("uowstatstore", 1),
    Field::uint("eocreason", 4),
    Field::uint("deliveries", 4),
    Field::uint("msgcnt", 4),
    Field::uint("msgsize", 4),
    Field::text("uwstatus_lifetime", 32),
    Field::text("uwcreate_time", 32),
    Field::uint("uw_lifetime", 4).format(Format::Interval).at(468),
];

#[rustfmt::skip]
const SERVICE: &[Field] = &[
    Field::text("server_class", 32).hidden(),
    Field::text("server", 32).hidden(),
    Field::text("service", 32).format(Format::ServicePath),
    Field::text("translate", 8),
    Field::uint("conv_nonact", 4).format(Format::Interval).at(104),
    Field::uint("servers_act", 4),
    Field::uint("conv_act", 4),
    Field::uint("conv_high", 4),
    Field::uint("longbuffer_act", 4),
    Field::uint("longbuffer_high", 4),
    Field::uint("shortbuffer_act", 4),
    Field::uint("shortbuffer_high", 4),
    Field::uint("waitserver", 4),
    Field::uint("server_occupied", 4),
    Field::uint("pending", 4),
    Field::uint("pending_high", 4),
    Field::uint("total_requests", 4),
    Field::uint("maxuows", 4),
    Field::uint("maxuowmsg", 4),
    Field::uint("uwtime", 4).format(Format::Interval),
    Field::uint("maxdelcnt", 4),
    Field::uint("maxmsgsize", 4),
    Field::uint("totaluows", 4),
    Field::uint("store", 1).at(180),
    Field::uint("uwstatp", 1),
    Field::uint("deferred", 1),
    Field::uint("enclevel", 1),
    Field::uint("attachmgrs_act", 4),
    Field::uint("uwstat_addtime", 4),
    Field::uint("num_conv", 4),
    Field::uint("num_server", 4),
    Field::uint("longbuffers", 4),
    Field::uint("shortbuffers", 4),
    Field::text("conversion", 8),
    Field::text("conversion_parms", 255),
    Field::filler("unused1", 5),
];

#[rustfmt::skip]
const UOW_STATISTICS: &[Field] = &[
    Field::text("server_class", 32).hidden(),
    Field::text("server", 32).hidden(),
    Field::text("service", 32).format(Format::ServicePath),
    Field::uint("uows", 8),
    Field::uint("messages", 8),
    Field::uint("bytes", 8),
    Field::uint("max_messages", 4),
    Field::uint("max_bytes", 4),
    Field::text("oldest_uow", 32),
    Field::text("newest_uow", 32),
];

static BROKER_LAYOUT: OnceCell<Layout> = OnceCell::new();
static CONVERSATION_LAYOUT: OnceCell<Layout> = OnceCell::new();
static CLIENT_LAYOUT: OnceCell<Layout> = OnceCell::new();
static SERVER_LAYOUT: OnceCell<Layout> = OnceCell::new();
static PSF_LAYOUT: OnceCell<Layout> = OnceCell::new();
static SERVICE_LAYOUT: OnceCell<Layout> = OnceCell::new();
static UOW_STATISTICS_LAYOUT: OnceCell<Layout> = OnceCell::new();

fn cached(cell: &'static OnceCell<Layout>, name: &'static str, fields: &[Field]) -> Result<&'static Layout> {
    cell.get_or_try_init(|| Layout::define(name, fields))
}

/// Record layout for `object_type`, `None` for types without a known
/// information record.
pub fn layout(object_type: ObjectType) -> Option<Result<&'static Layout>> {
    Some(match object_type {
        ObjectType::Broker => cached(&BROKER_LAYOUT, "Broker", BROKER),
        ObjectType::Conversation => cached(&CONVERSATION_LAYOUT, "Conversation", CONVERSATION),
        ObjectType::Client => cached(&CLIENT_LAYOUT, "Client", CLIENT_SERVER),
        ObjectType::Server => cached(&SERVER_LAYOUT, "Server", CLIENT_SERVER),
        ObjectType::Psf => cached(&PSF_LAYOUT, "PersistentMessage", PSF),
        ObjectType::Service => cached(&SERVICE_LAYOUT, "Service", SERVICE),
        ObjectType::UowStatistics => cached(&UOW_STATISTICS_LAYOUT, "UOW Statistics", UOW_STATISTICS),
        _ => return None,
    })
}

/// One information record, copied out of the receive buffer it arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRecord {
    object_type: ObjectType,
    record: Record,
}

impl InfoRecord {
    /// Wrap a record of `object_type`.
    pub const fn new(object_type: ObjectType, record: Record) -> Self {
        Self { object_type, record }
    }

    /// Object type the record describes.
    pub const fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Underlying record.
    pub const fn record(&self) -> &Record {
        &self.record
    }

    /// Field value.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.record.get(name)
    }

    /// Text field, empty if absent or not text.
    pub fn text(&self, name: &str) -> String {
        self.record.text(name).unwrap_or_default()
    }

    /// Integer field, zero if absent or not an integer.
    pub fn uint(&self, name: &str) -> u64 {
        self.record.uint(name).unwrap_or_default()
    }

    /// `class/server/service` of the record, for types that carry one.
    pub fn service_path(&self) -> String {
        format!("{}/{}/{}", self.text("server_class"), self.text("server"), self.text("service"))
    }
}
