//! Service explorer over a populated model kernel.

use std::sync::Arc;

use aci_core::{
    Cis, CisConfig, Transport,
    explorer::{ExploreOptions, explore},
};
use aci_harness::{PagePlan, SimKernel, fixtures};
use aci_proto::cis::ObjectType;

const OUT4: (&str, &str, &str) = ("REPTOR", "MMSERV", "OUT4");
const IN1: (&str, &str, &str) = ("REPTOR", "MMSERV", "IN1");

fn populated() -> Arc<SimKernel> {
    let kernel = Arc::new(SimKernel::new());
    kernel.add_objects(ObjectType::Broker, [fixtures::broker("Linux", 1_048_576).unwrap()]);
    kernel.add_objects(ObjectType::Service, [
        fixtures::service(OUT4.0, OUT4.1, OUT4.2).unwrap(),
        fixtures::service(IN1.0, IN1.1, IN1.2).unwrap(),
        fixtures::service("ACLASS", "ASERVER", "OTHER").unwrap(),
    ]);
    kernel.add_objects(ObjectType::Server, [fixtures::server("SRV1", OUT4.0, OUT4.1, OUT4.2).unwrap()]);
    kernel.add_objects(ObjectType::Conversation, [
        fixtures::conversation("C1", OUT4, ("USER0001", ""), 2).unwrap(),
        fixtures::conversation("C2", OUT4, ("USER0002", ""), 0).unwrap(),
        fixtures::conversation("C3", IN1, ("USER0001", ""), 1).unwrap(),
    ]);
    kernel.add_objects(ObjectType::Psf, [
        fixtures::psf("U1", "C1", OUT4, 1).unwrap(),
        fixtures::psf("U2", "C1", OUT4, 3).unwrap(),
        fixtures::psf("U3", "C3", IN1, 1).unwrap(),
    ]);
    kernel.add_objects(ObjectType::Client, [
        fixtures::client("USER0001", "").unwrap(),
        fixtures::client("USER0002", "").unwrap(),
        fixtures::client("ADMIN", "").unwrap(),
    ]);
    kernel.add_objects(ObjectType::UowStatistics, [fixtures::uow_statistics(OUT4, 7).unwrap()]);
    kernel.set_page_plan(ObjectType::Conversation, PagePlan::sizes([1]));
    kernel
}

fn open(kernel: &Arc<SimKernel>) -> Cis {
    let transport: Arc<dyn Transport> = kernel.clone();
    let mut cis = Cis::new(CisConfig::default(), transport).unwrap();
    cis.open().unwrap();
    cis
}

#[test]
fn detail_mode_walks_conversations_and_aggregates_clients() {
    let kernel = populated();
    let mut cis = open(&kernel);
    let options = ExploreOptions { uid_prefix: Some("USER".to_owned()), detail: true, ..ExploreOptions::for_path("REPTOR/MMSERV/") };

    let found = explore(&mut cis, &options).unwrap();

    assert_eq!(found.broker.as_ref().map(|b| b.text("platformname")).as_deref(), Some("Linux"));
    let paths: Vec<String> = found.services.iter().map(|s| s.service.service_path()).collect();
    assert_eq!(paths, ["REPTOR/MMSERV/OUT4", "REPTOR/MMSERV/IN1"]);

    let out4 = &found.services[0];
    assert_eq!(out4.servers.len(), 1);
    assert!(out4.uow_statistics.is_none());
    let convs: Vec<(String, usize)> =
        out4.conversations.iter().map(|c| (c.conversation.text("conv_id"), c.messages.len())).collect();
    assert_eq!(convs, [("C1".to_owned(), 2), ("C2".to_owned(), 0)]);

    let in1 = &found.services[1];
    assert!(in1.servers.is_empty());
    assert_eq!(in1.conversations.len(), 1);
    assert_eq!(in1.conversations[0].messages[0].text("uow_id"), "U3");

    let clients: Vec<(String, u64, u64, Vec<String>)> = found
        .clients
        .iter()
        .map(|c| (c.client.text("uid"), c.conversations, c.uows, c.services.clone()))
        .collect();
    assert_eq!(clients, [
        (
            "USER0001".to_owned(),
            2,
            3,
            vec!["REPTOR/MMSERV/OUT4".to_owned(), "REPTOR/MMSERV/IN1".to_owned()]
        ),
        ("USER0002".to_owned(), 1, 0, vec!["REPTOR/MMSERV/OUT4".to_owned()]),
    ]);

    let report = found.to_string();
    assert!(report.contains("Persistent messages for conversation C1"));
    assert!(report.contains(" Client has total of 2 CONVs and 3 committed UOWs receivable with services"));
    assert!(report.contains(&"-".repeat(80)));
    assert!(report.contains(&"=".repeat(80)));

    assert!(kernel.open_conversations().is_empty());
}

#[test]
fn summary_mode_reads_uow_statistics() {
    let kernel = populated();
    let mut cis = open(&kernel);

    let found = explore(&mut cis, &ExploreOptions::for_path("REPTOR/MMSERV/")).unwrap();

    assert!(found.clients.is_empty());
    let stats: Vec<Option<u64>> =
        found.services.iter().map(|s| s.uow_statistics.as_ref().map(|u| u.uint("uows"))).collect();
    assert_eq!(stats, [Some(7), None]);
    assert!(found.services.iter().all(|s| s.conversations.is_empty()));

    let report = found.render();
    assert!(report.contains("No UOW statistics available for REPTOR/MMSERV/IN1"));
    assert!(!report.contains(&"=".repeat(80)));
    assert!(kernel.open_conversations().is_empty());
}

#[test]
fn single_service_selector() {
    let kernel = populated();
    let mut cis = open(&kernel);

    let found = explore(&mut cis, &ExploreOptions::for_path("OTHER")).unwrap();

    assert_eq!(found.services.len(), 1);
    assert_eq!(found.services[0].service.service_path(), "ACLASS/ASERVER/OTHER");
}
