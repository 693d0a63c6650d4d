//! Broker service explorer.
//!
//! Walks the services matching a selector, their servers and either their
//! UOW statistics or, in detail mode, their conversations and persistent
//! messages. Clients can be listed by user-id prefix, annotated with the
//! conversations and UOWs seen for them while walking the services.
//!
//! Per-client totals are accumulated here, keyed by each conversation's
//! `(clientuid, clienttoken)`; the paging reader knows nothing about them.

use std::{collections::HashMap, fmt, fmt::Write as _};

use aci_proto::cis::{InfoRecord, ObjectType};

use crate::{
    cis::{Cis, InfoSelector},
    error::Result,
};

/// Broker fields shown in a report.
pub const BROKER_FIELDS: &[&str] =
    &["runtime", "maxmsgsize", "platformname", "product_version", "pstoretype", "pstore", "uwtime", "client_nonact"];

/// Service fields shown in a report.
pub const SERVICE_FIELDS: &[&str] =
    &["service", "conv_nonact", "servers_act", "conv_act", "uwtime", "totaluows", "store", "deferred"];

/// Conversation fields shown in a detail report.
pub const CONV_FIELDS: &[&str] = &[
    "conv_id",
    "service",
    "conv_nonact",
    "serveruid",
    "servertoken",
    "clientuid",
    "clienttoken",
    "last_active",
    "totaluows",
];

/// Persistent message columns shown in a detail report.
pub const PSF_FIELDS: &[&str] =
    &["uow_id", "uowstatus", "uwcreate_time", "uw_lifetime", "eoc", "deliveries", "msgcnt", "msgsize"];

/// Client and server fields shown in a report.
pub const CS_FIELDS: &[&str] = &[
    "uid",
    "puid",
    "puidTrans",
    "token",
    "status",
    "waitconvid",
    "service",
    "conv_act",
    "service_act",
    "last_active",
    "nonact",
    "waits_new",
    "waits_old",
    "convs",
    "active_uow",
    "recv_option",
    "created",
    "seqno",
];

/// What to explore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExploreOptions {
    /// Server class selector, empty for all
    pub server_class: String,
    /// Server name selector, empty for all
    pub server: String,
    /// Service selector, empty for all
    pub service: String,
    /// List clients whose user id starts with this prefix
    pub uid_prefix: Option<String>,
    /// Walk conversations and persistent messages instead of UOW statistics
    pub detail: bool,
}

impl ExploreOptions {
    /// Options selecting `class/server/service`; missing leading parts
    /// select all. Parts beyond the third are ignored.
    pub fn for_path(path: &str) -> Self {
        let mut parts: Vec<&str> = path.split('/').take(3).collect();
        let service = parts.pop().unwrap_or_default().to_owned();
        let server = parts.pop().unwrap_or_default().to_owned();
        let server_class = parts.pop().unwrap_or_default().to_owned();
        Self { server_class, server, service, ..Self::default() }
    }
}

/// A conversation and its persistent messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationReport {
    /// Conversation record
    pub conversation: InfoRecord,
    /// Persistent messages, read only for conversations with UOWs
    pub messages: Vec<InfoRecord>,
}

/// A service with what was found for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    /// Service record
    pub service: InfoRecord,
    /// Servers registered for the service
    pub servers: Vec<InfoRecord>,
    /// UOW statistics, outside detail mode and when the kernel has some
    pub uow_statistics: Option<InfoRecord>,
    /// Conversations, in detail mode
    pub conversations: Vec<ConversationReport>,
}

/// A client with the totals seen for it across the explored services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientReport {
    /// Client record
    pub client: InfoRecord,
    /// Conversations seen
    pub conversations: u64,
    /// Committed UOWs receivable
    pub uows: u64,
    /// `class/server/service` of the services used
    pub services: Vec<String>,
}

/// Everything an exploration found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exploration {
    /// Broker record
    pub broker: Option<InfoRecord>,
    /// Services matching the selector
    pub services: Vec<ServiceReport>,
    /// Clients matching the user-id prefix
    pub clients: Vec<ClientReport>,
    /// Detail mode
    pub detail: bool,
}

#[derive(Debug, Default)]
struct ClientUsage {
    conversations: u64,
    uows: u64,
    services: Vec<String>,
}

/// Walk the broker as described by `options`.
pub fn explore(cis: &mut Cis, options: &ExploreOptions) -> Result<Exploration> {
    let broker = cis.iget(ObjectType::Broker, &InfoSelector::default())?;
    let mut usage: HashMap<(String, String), ClientUsage> = HashMap::new();
    let mut services = Vec::new();

    let selector = InfoSelector::service(&options.server_class, &options.server, &options.service);
    for service in cis.iread(ObjectType::Service, &selector)? {
        let service = service?;
        let this = InfoSelector::service_of(&service);
        let servers = cis.iread(ObjectType::Server, &this)?.collect::<Result<Vec<_>>>()?;

        let mut report = ServiceReport { service, servers, uow_statistics: None, conversations: Vec::new() };
        if options.detail {
            for conversation in cis.iread(ObjectType::Conversation, &this)? {
                let conversation = conversation?;
                let totaluows = conversation.uint("totaluows");
                let entry = usage
                    .entry((conversation.text("clientuid"), conversation.text("clienttoken")))
                    .or_default();
                let path = conversation.service_path();
                if !entry.services.contains(&path) {
                    entry.services.push(path);
                }
                entry.conversations += 1;
                entry.uows += totaluows;

                let messages = if totaluows > 0 {
                    let selector = this.clone().with_conv_id(&conversation.text("conv_id"));
                    cis.iread(ObjectType::Psf, &selector)?.collect::<Result<Vec<_>>>()?
                } else {
                    Vec::new()
                };
                report.conversations.push(ConversationReport { conversation, messages });
            }
        } else {
            report.uow_statistics = cis.iget(ObjectType::UowStatistics, &this)?;
        }
        services.push(report);
    }

    let mut clients = Vec::new();
    if let Some(prefix) = &options.uid_prefix {
        for client in cis.iread(ObjectType::Client, &InfoSelector::default())? {
            let client = client?;
            if !client.text("uid").starts_with(prefix.as_str()) {
                continue;
            }
            let seen = usage.remove(&(client.text("uid"), client.text("token"))).unwrap_or_default();
            clients.push(ClientReport {
                client,
                conversations: seen.conversations,
                uows: seen.uows,
                services: seen.services,
            });
        }
    }

    Ok(Exploration { broker, services, clients, detail: options.detail })
}

fn rule(f: &mut String, c: char) {
    f.extend(std::iter::repeat_n(c, 80));
    f.push('\n');
}

impl Exploration {
    /// Text report in the layout of the broker's CIS tooling.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(broker) = &self.broker {
            out.push_str(&broker.record().dump_fields(Some(BROKER_FIELDS)));
        }

        for report in &self.services {
            rule(&mut out, '-');
            out.push_str(&report.service.record().dump_fields(Some(SERVICE_FIELDS)));
            for server in &report.servers {
                out.push_str(&server.record().dump_fields(Some(CS_FIELDS)));
            }

            if self.detail {
                for (i, conv) in report.conversations.iter().enumerate() {
                    let _ = writeln!(out, "Conversation {}", i + 1);
                    out.push_str(&conv.conversation.record().dump_fields(Some(CONV_FIELDS)));
                    if let Some(first) = conv.messages.first() {
                        let _ = writeln!(
                            out,
                            "Persistent messages for conversation {}",
                            conv.conversation.text("conv_id")
                        );
                        let _ = writeln!(out, "{}", first.record().header_line(Some(PSF_FIELDS)));
                        for msg in &conv.messages {
                            let _ = writeln!(out, "{}", msg.record().line(Some(PSF_FIELDS)));
                        }
                        out.push('\n');
                    }
                }
            } else {
                out.push('\n');
                match &report.uow_statistics {
                    Some(stats) => out.push_str(&stats.record().dump_fields(None)),
                    None => {
                        let _ = writeln!(out, "No UOW statistics available for {}\n", report.service.service_path());
                    },
                }
            }
        }

        if !self.clients.is_empty() {
            rule(&mut out, '=');
        }
        for report in &self.clients {
            out.push_str(&report.client.record().dump_fields(Some(CS_FIELDS)));
            if !report.services.is_empty() {
                let _ = writeln!(
                    out,
                    " Client has total of {} CONVs and {} committed UOWs receivable with services",
                    report.conversations, report.uows
                );
                for path in &report.services {
                    let _ = writeln!(out, "\t {path}");
                }
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Exploration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
