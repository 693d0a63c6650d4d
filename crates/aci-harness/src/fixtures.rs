//! Information record fixtures.
//!
//! Each builder fills the fields the explorer and the scenarios look at and
//! leaves everything else zeroed, the way an idle kernel reports it.

use aci_proto::{
    Layout, Record,
    cis::{ObjectType, info},
};

fn blank(object_type: ObjectType) -> aci_proto::Result<Record> {
    let layout: &'static Layout = match info::layout(object_type) {
        Some(layout) => layout?,
        None => return Err(aci_proto::LayoutError::UnknownField { layout: "info", field: object_type.to_string() }),
    };
    Ok(Record::new(layout))
}

/// Broker record.
pub fn broker(platform: &str, maxmsgsize: u32) -> aci_proto::Result<Record> {
    let mut rec = blank(ObjectType::Broker)?;
    rec.set("platformname", platform)?;
    rec.set("product_version", "9.12.0.1")?;
    rec.set("maxmsgsize", maxmsgsize)?;
    rec.set("runtime", 3600u32)?;
    rec.set("uwtime", 86_400u32)?;
    rec.set("client_nonact", 900u32)?;
    Ok(rec)
}

/// Service record for `class/server/service`.
pub fn service(server_class: &str, server: &str, service: &str) -> aci_proto::Result<Record> {
    let mut rec = blank(ObjectType::Service)?;
    rec.set("server_class", server_class)?;
    rec.set("server", server)?;
    rec.set("service", service)?;
    rec.set("conv_nonact", 600u32)?;
    rec.set("servers_act", 1u32)?;
    Ok(rec)
}

/// Server record registered for `class/server/service`.
pub fn server(uid: &str, server_class: &str, server: &str, service: &str) -> aci_proto::Result<Record> {
    let mut rec = blank(ObjectType::Server)?;
    rec.set("uid", uid)?;
    rec.set("server_class", server_class)?;
    rec.set("server", server)?;
    rec.set("service", service)?;
    Ok(rec)
}

/// Client record.
pub fn client(uid: &str, token: &str) -> aci_proto::Result<Record> {
    let mut rec = blank(ObjectType::Client)?;
    rec.set("uid", uid)?;
    rec.set("token", token)?;
    Ok(rec)
}

/// Conversation between a client and `class/server/service`.
pub fn conversation(
    conv_id: &str,
    path: (&str, &str, &str),
    client: (&str, &str),
    totaluows: u32,
) -> aci_proto::Result<Record> {
    let mut rec = blank(ObjectType::Conversation)?;
    rec.set("conv_id", conv_id)?;
    rec.set("server_class", path.0)?;
    rec.set("server", path.1)?;
    rec.set("service", path.2)?;
    rec.set("clientuid", client.0)?;
    rec.set("clienttoken", client.1)?;
    rec.set("totaluows", totaluows)?;
    Ok(rec)
}

/// Persistent message of a unit of work on `conv_id`, addressed to
/// `class/server/service`.
pub fn psf(uow_id: &str, conv_id: &str, path: (&str, &str, &str), msgcnt: u32) -> aci_proto::Result<Record> {
    let mut rec = blank(ObjectType::Psf)?;
    rec.set("uow_id", uow_id)?;
    rec.set("conv_id", conv_id)?;
    rec.set("recvrclass", path.0)?;
    rec.set("recvrserver", path.1)?;
    rec.set("recvrservice", path.2)?;
    rec.set("msgcnt", msgcnt)?;
    Ok(rec)
}

/// UOW statistics of `class/server/service`.
pub fn uow_statistics(path: (&str, &str, &str), uows: u32) -> aci_proto::Result<Record> {
    let mut rec = blank(ObjectType::UowStatistics)?;
    rec.set("server_class", path.0)?;
    rec.set("server", path.1)?;
    rec.set("service", path.2)?;
    rec.set("uows", uows)?;
    Ok(rec)
}

/// `count` numbered client records, `USER0000`, `USER0001`, ...
pub fn clients(count: u32) -> aci_proto::Result<Vec<Record>> {
    (0..count).map(|i| client(&format!("USER{i:04}"), "")).collect()
}
